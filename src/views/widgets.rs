use ratatui::widgets::ListState;

use crate::models::post::{Media, MediaKind};

pub struct StatefulList<T> {
    pub state: ListState,
    pub items: Vec<T>,
}

impl<T> StatefulList<T> {
    pub fn with_items(items: Vec<T>) -> StatefulList<T> {
        let mut state = ListState::default();
        // Start with the first item selected
        if !items.is_empty() {
            state.select(Some(0));
        }
        StatefulList { state, items }
    }

    pub fn selected(&self) -> Option<&T> {
        self.items.get(self.state.selected()?)
    }

    pub fn selected_mut(&mut self) -> Option<&mut T> {
        let index = self.state.selected()?;
        self.items.get_mut(index)
    }

    /// Swap in a fresh item list, keeping the selection in bounds.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.items = items;
        if self.items.is_empty() {
            self.state.select(None);
        } else {
            let index = self.state.selected().unwrap_or(0);
            self.state.select(Some(index.min(self.items.len() - 1)));
        }
    }

    pub fn next(&mut self) {
        let i = match self.state.selected() {
            Some(i) => {
                if i >= self.items.len().saturating_sub(1) {
                    i
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    i
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn first(&mut self) {
        if !self.items.is_empty() {
            self.state.select(Some(0));
        }
    }

    pub fn last(&mut self) {
        if !self.items.is_empty() {
            self.state.select(Some(self.items.len() - 1));
        }
    }
}

/// Swipeable view over a post's media. Holds the per-item kind alongside
/// the URL and a cursor the arrow keys move.
pub struct MediaCarousel {
    items: Vec<(String, MediaKind)>,
    position: usize,
}

impl MediaCarousel {
    pub fn new(media: &Media) -> MediaCarousel {
        let items = media
            .urls()
            .into_iter()
            .map(|url| (url.to_string(), MediaKind::classify(url)))
            .collect();
        MediaCarousel { items, position: 0 }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current(&self) -> Option<(&str, MediaKind)> {
        self.items
            .get(self.position)
            .map(|(url, kind)| (url.as_str(), *kind))
    }

    pub fn next(&mut self) {
        if self.position + 1 < self.items.len() {
            self.position += 1;
        }
    }

    pub fn previous(&mut self) {
        if self.position > 0 {
            self.position -= 1;
        }
    }

    /// Positional indicator, `1/2` style.
    pub fn indicator(&self) -> String {
        if self.items.is_empty() {
            "0/0".to_string()
        } else {
            format!("{}/{}", self.position + 1, self.items.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carousel_walks_a_gallery_with_indicator() {
        let media = Media::from_wire("[\"a.jpg\",\"b.mp4\"]");
        let mut carousel = MediaCarousel::new(&media);

        assert_eq!(carousel.len(), 2);
        assert_eq!(carousel.indicator(), "1/2");
        let (url, kind) = carousel.current().unwrap();
        assert_eq!(url, "a.jpg");
        assert_eq!(kind, MediaKind::Image);

        carousel.next();
        assert_eq!(carousel.indicator(), "2/2");
        let (url, kind) = carousel.current().unwrap();
        assert_eq!(url, "b.mp4");
        assert_eq!(kind, MediaKind::Video);

        // Stops at the edges instead of wrapping
        carousel.next();
        assert_eq!(carousel.indicator(), "2/2");
        carousel.previous();
        carousel.previous();
        assert_eq!(carousel.indicator(), "1/2");
    }

    #[test]
    fn carousel_over_single_url() {
        let media = Media::from_wire("a.jpg");
        let carousel = MediaCarousel::new(&media);
        assert_eq!(carousel.len(), 1);
        assert_eq!(carousel.indicator(), "1/1");
    }

    #[test]
    fn replace_items_clamps_selection() {
        let mut list = StatefulList::with_items(vec![1, 2, 3]);
        list.last();
        list.replace_items(vec![1]);
        assert_eq!(list.state.selected(), Some(0));

        list.replace_items(Vec::new());
        assert_eq!(list.state.selected(), None);
    }
}
