use std::collections::{HashMap, HashSet};

use crate::models::post::Comment;

/// Two-level comment tree for one post: top-level comments in server order,
/// each with its ordered replies. Which reply lists are shown is pure
/// client-side state and never reaches the server.
#[derive(Debug, Default)]
pub struct CommentThread {
    top_level: Vec<Comment>,
    replies: HashMap<String, Vec<Comment>>,
    expanded: HashSet<String>,
}

impl CommentThread {
    /// Assemble the tree from the flat list the server returns. A reply
    /// whose parent is not a top-level comment in the list degrades to
    /// top-level rather than being dropped.
    pub fn from_flat(comments: Vec<Comment>) -> CommentThread {
        let top_ids: HashSet<String> = comments
            .iter()
            .filter(|c| c.parent_id.is_none())
            .map(|c| c.id.clone())
            .collect();

        let mut thread = CommentThread::default();
        for comment in comments {
            match &comment.parent_id {
                Some(parent) if top_ids.contains(parent) => {
                    thread
                        .replies
                        .entry(parent.clone())
                        .or_default()
                        .push(comment);
                }
                _ => thread.top_level.push(comment),
            }
        }
        thread
    }

    pub fn top_level(&self) -> &[Comment] {
        &self.top_level
    }

    pub fn replies_of(&self, id: &str) -> &[Comment] {
        self.replies.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn toggle_replies(&mut self, id: &str) {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.to_string());
        }
    }

    /// Re-apply an expansion after the thread has been rebuilt from a fresh
    /// fetch.
    pub fn expand(&mut self, id: &str) {
        self.expanded.insert(id.to_string());
    }

    pub fn total_len(&self) -> usize {
        self.top_level.len() + self.replies.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.top_level.is_empty()
    }
}

/// One visible row of a rendered thread.
#[derive(Debug, Clone)]
pub struct ThreadRow {
    pub comment: Comment,
    pub is_reply: bool,
}

/// Flatten a thread into its currently visible rows: every top-level
/// comment, plus the replies of the expanded ones, indented under their
/// parent.
pub fn thread_rows(thread: &CommentThread) -> Vec<ThreadRow> {
    let mut rows = Vec::with_capacity(thread.total_len());
    for comment in thread.top_level() {
        let id = comment.id.clone();
        rows.push(ThreadRow {
            comment: comment.clone(),
            is_reply: false,
        });
        if thread.is_expanded(&id) {
            for reply in thread.replies_of(&id) {
                rows.push(ThreadRow {
                    comment: reply.clone(),
                    is_reply: true,
                });
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::Author;

    fn comment(id: &str, parent: Option<&str>) -> Comment {
        Comment {
            id: id.to_string(),
            post_id: "p1".to_string(),
            parent_id: parent.map(str::to_string),
            author: Author {
                id: "u1".to_string(),
                username: "someone".to_string(),
                display_name: None,
                avatar_url: None,
            },
            content: format!("comment {}", id),
            replies_count: 0,
            created_at: 1,
            datetime: String::new(),
        }
    }

    #[test]
    fn flat_list_assembles_into_two_levels() {
        let thread = CommentThread::from_flat(vec![
            comment("a", None),
            comment("a1", Some("a")),
            comment("b", None),
            comment("a2", Some("a")),
        ]);

        let top: Vec<&str> = thread.top_level().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(top, vec!["a", "b"]);

        let replies: Vec<&str> = thread.replies_of("a").iter().map(|c| c.id.as_str()).collect();
        assert_eq!(replies, vec!["a1", "a2"]);
        assert!(thread.replies_of("b").is_empty());
        assert_eq!(thread.total_len(), 4);
    }

    #[test]
    fn orphan_reply_degrades_to_top_level() {
        let thread = CommentThread::from_flat(vec![
            comment("a", None),
            comment("x1", Some("gone")),
        ]);

        let top: Vec<&str> = thread.top_level().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(top, vec!["a", "x1"]);
    }

    #[test]
    fn expansion_is_local_and_toggles() {
        let mut thread = CommentThread::from_flat(vec![
            comment("a", None),
            comment("a1", Some("a")),
        ]);

        assert!(!thread.is_expanded("a"));
        assert_eq!(thread_rows(&thread).len(), 1);

        thread.toggle_replies("a");
        assert!(thread.is_expanded("a"));
        let rows = thread_rows(&thread);
        assert_eq!(rows.len(), 2);
        assert!(rows[1].is_reply);

        thread.toggle_replies("a");
        assert_eq!(thread_rows(&thread).len(), 1);
    }
}
