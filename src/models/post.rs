use chrono::{DateTime, Local, TimeZone, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Author {
    /// Name shown in the feed; falls back to "User" when the profile
    /// carries nothing usable.
    pub fn label(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ if !self.username.is_empty() => &self.username,
            _ => "User",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author: Author,
    pub content: String,
    #[serde(default)]
    pub media: Option<Media>,
    #[serde(default)]
    pub likes_count: u32,
    #[serde(default)]
    pub comments_count: u32,
    #[serde(default)]
    pub reposts_count: u32,
    #[serde(default)]
    pub saves_count: u32,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub is_reposted: bool,
    #[serde(default)]
    pub is_saved: bool,
    pub created_at: u64,
    // Filled in client-side after fetch, not part of the wire body
    #[serde(default)]
    pub datetime: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub author: Author,
    pub content: String,
    #[serde(default)]
    pub replies_count: u32,
    pub created_at: u64,
    #[serde(default)]
    pub datetime: String,
}

/// Media attached to a post. The server sends one string that is either a
/// bare URL or a JSON-stringified array of URLs; decoding keeps that
/// distinction as an explicit variant instead of re-sniffing at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum Media {
    Single(String),
    Gallery(Vec<String>),
}

impl Media {
    /// Decode the wire value. An array parse is attempted whenever the
    /// string leads with `[`; anything that fails to parse is treated as a
    /// plain URL so a malformed value never breaks the render.
    pub fn from_wire(raw: &str) -> Media {
        if raw.trim_start().starts_with('[') {
            if let Ok(urls) = serde_json::from_str::<Vec<String>>(raw) {
                return Media::Gallery(urls);
            }
        }
        Media::Single(raw.to_string())
    }

    pub fn to_wire(&self) -> String {
        match self {
            Media::Single(url) => url.clone(),
            Media::Gallery(urls) => serde_json::to_string(urls).unwrap_or_default(),
        }
    }

    pub fn urls(&self) -> Vec<&str> {
        match self {
            Media::Single(url) => vec![url.as_str()],
            Media::Gallery(urls) => urls.iter().map(String::as_str).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Media::Single(_) => 1,
            Media::Gallery(urls) => urls.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for Media {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Media {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Media::from_wire(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "m4v", "avi", "mkv"];

impl MediaKind {
    /// Classify a URL by its file extension. Anything without a recognized
    /// video extension renders as an image.
    pub fn classify(url: &str) -> MediaKind {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        match path.rsplit_once('.') {
            Some((_, ext)) if VIDEO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
                MediaKind::Video
            }
            _ => MediaKind::Image,
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Local display form of a unix timestamp, in the feed header format.
pub fn format_local_datetime(secs: u64) -> String {
    match Utc.timestamp_opt(secs as i64, 0).single() {
        Some(utc) => {
            let local: DateTime<Local> = DateTime::from(utc);
            local.format("%H:%M %h-%d-%Y").to_string()
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(display_name: Option<&str>) -> Author {
        Author {
            id: "u1".to_string(),
            username: "vendor42".to_string(),
            display_name: display_name.map(str::to_string),
            avatar_url: None,
        }
    }

    #[test]
    fn media_wire_array_decodes_to_gallery() {
        let media = Media::from_wire("[\"a.jpg\",\"b.mp4\"]");
        assert_eq!(
            media,
            Media::Gallery(vec!["a.jpg".to_string(), "b.mp4".to_string()])
        );
        assert_eq!(media.len(), 2);
        assert_eq!(MediaKind::classify(media.urls()[0]), MediaKind::Image);
        assert_eq!(MediaKind::classify(media.urls()[1]), MediaKind::Video);
    }

    #[test]
    fn media_wire_bare_url_decodes_to_single() {
        let media = Media::from_wire("https://cdn.example/a.jpg");
        assert_eq!(media, Media::Single("https://cdn.example/a.jpg".to_string()));
        assert_eq!(media.len(), 1);
    }

    #[test]
    fn media_wire_malformed_array_falls_back_to_single() {
        let media = Media::from_wire("[not json");
        assert_eq!(media, Media::Single("[not json".to_string()));
    }

    #[test]
    fn media_wire_round_trips() {
        let gallery = Media::from_wire("[\"a.jpg\",\"b.mp4\"]");
        assert_eq!(Media::from_wire(&gallery.to_wire()), gallery);
        let single = Media::from_wire("a.jpg");
        assert_eq!(Media::from_wire(&single.to_wire()), single);
    }

    #[test]
    fn classify_ignores_query_and_case() {
        assert_eq!(MediaKind::classify("clip.MP4?sig=abc"), MediaKind::Video);
        assert_eq!(MediaKind::classify("photo.jpeg#frag"), MediaKind::Image);
        assert_eq!(MediaKind::classify("no-extension"), MediaKind::Image);
    }

    #[test]
    fn post_decodes_camel_case_wire_fields() {
        let body = r#"{
            "id": "p1",
            "author": {"id": "u1", "username": "vendor42"},
            "content": "hello",
            "media": "[\"a.jpg\",\"b.mp4\"]",
            "likesCount": 5,
            "isLiked": false,
            "createdAt": 1700000000
        }"#;
        let post: Post = serde_json::from_str(body).unwrap();
        assert_eq!(post.likes_count, 5);
        assert!(!post.is_liked);
        assert_eq!(post.comments_count, 0);
        assert_eq!(post.media.as_ref().map(Media::len), Some(2));
    }

    #[test]
    fn author_label_falls_back_to_generic_name() {
        assert_eq!(author(Some("Shop Owner")).label(), "Shop Owner");
        assert_eq!(author(Some("")).label(), "vendor42");
        assert_eq!(author(None).label(), "vendor42");

        let anonymous = Author {
            id: "u2".to_string(),
            username: String::new(),
            display_name: None,
            avatar_url: None,
        };
        assert_eq!(anonymous.label(), "User");
    }
}
