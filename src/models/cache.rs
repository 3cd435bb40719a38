use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AgoratuiError;
use crate::models::post::Post;

/// Identifier of one cached collection, e.g. `feed`, `saved`, `user:42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn feed() -> QueryKey {
        QueryKey("feed".to_string())
    }

    pub fn saved() -> QueryKey {
        QueryKey("saved".to_string())
    }

    pub fn user(id: &str) -> QueryKey {
        QueryKey(format!("user:{}", id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Client-side cache of posts, keyed by query. Mutation handlers get this
/// passed in explicitly; they may rewrite the single entry they target (or
/// snapshot/restore a whole collection for rollback), while fetch paths may
/// replace collections wholesale. Nothing else writes here.
#[derive(Debug, Default)]
pub struct FeedCache {
    collections: HashMap<QueryKey, Vec<Post>>,
}

impl FeedCache {
    pub fn new() -> FeedCache {
        FeedCache::default()
    }

    pub fn collection(&self, key: &QueryKey) -> Option<&[Post]> {
        self.collections.get(key).map(Vec::as_slice)
    }

    /// Replace a collection wholesale. Used by fetches, never by mutations.
    pub fn set_collection(&mut self, key: QueryKey, posts: Vec<Post>) {
        self.collections.insert(key, posts);
    }

    /// Merge freshly fetched posts into a collection, skipping ids already
    /// present, then re-sort newest first. Refresh-only: mutations never
    /// reorder.
    pub fn merge_new(&mut self, key: &QueryKey, new_posts: Vec<Post>) {
        let posts = self.collections.entry(key.clone()).or_default();
        for post in new_posts {
            if !posts.iter().any(|p| p.id == post.id) {
                posts.push(post);
            }
        }
        posts.sort_by_key(|post| std::cmp::Reverse(post.created_at));
    }

    pub fn get_post(&self, key: &QueryKey, id: &str) -> Option<&Post> {
        self.collections.get(key)?.iter().find(|p| p.id == id)
    }

    /// Rewrite the single entry matching `id` in place. Order and all other
    /// entries are untouched. Returns false when the entry is not cached.
    pub fn update_post<F>(&mut self, key: &QueryKey, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut Post),
    {
        match self
            .collections
            .get_mut(key)
            .and_then(|posts| posts.iter_mut().find(|p| p.id == id))
        {
            Some(post) => {
                f(post);
                true
            }
            None => false,
        }
    }

    /// Drop an entry. Only called once a delete has been confirmed by the
    /// server.
    pub fn remove_post(&mut self, key: &QueryKey, id: &str) -> Option<Post> {
        let posts = self.collections.get_mut(key)?;
        let index = posts.iter().position(|p| p.id == id)?;
        Some(posts.remove(index))
    }

    /// Verbatim copy of a collection, captured before an optimistic apply.
    pub fn snapshot(&self, key: &QueryKey) -> Option<Vec<Post>> {
        self.collections.get(key).cloned()
    }

    /// Restore a snapshot taken by [`FeedCache::snapshot`]. Full rollback,
    /// not a partial undo.
    pub fn restore(&mut self, key: QueryKey, snapshot: Vec<Post>) {
        self.collections.insert(key, snapshot);
    }
}

pub fn cache_file() -> Result<PathBuf, AgoratuiError> {
    // Check the XDG_CACHE_HOME environment variable first
    let base_cache_dir = env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = env::var_os("HOME").unwrap_or_default();
            Path::new(&home).join(".cache")
        });

    let app_cache_dir = base_cache_dir.join("agoratui");

    fs::create_dir_all(&app_cache_dir)
        .map_err(|e| AgoratuiError::Cache(format!("Failed to create cache directory: {}", e)))?;

    Ok(app_cache_dir.join("posts.json"))
}

pub fn load_cached_posts() -> Result<Vec<Post>, AgoratuiError> {
    load_cached_posts_from(&cache_file()?)
}

fn load_cached_posts_from(cache_path: &Path) -> Result<Vec<Post>, AgoratuiError> {
    match fs::read_to_string(cache_path) {
        Ok(data) => serde_json::from_str(&data)
            .map_err(|e| AgoratuiError::Cache(format!("Failed to parse cache data: {}", e))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(AgoratuiError::Cache(format!(
            "Failed to read cache file: {}",
            e
        ))),
    }
}

pub fn save_posts_to_cache(new_posts: Vec<Post>) -> Result<(), AgoratuiError> {
    save_posts_to_cache_at(&cache_file()?, new_posts)
}

fn save_posts_to_cache_at(cache_path: &Path, new_posts: Vec<Post>) -> Result<(), AgoratuiError> {
    let mut cached_posts = load_cached_posts_from(cache_path)?;

    for post in new_posts {
        if !cached_posts.iter().any(|p| p.id == post.id) {
            cached_posts.push(post);
        }
    }

    let json = serde_json::to_string(&cached_posts)
        .map_err(|e| AgoratuiError::Cache(format!("Failed to serialize posts: {}", e)))?;

    fs::write(cache_path, json)
        .map_err(|e| AgoratuiError::Cache(format!("Failed to write cache file: {}", e)))?;

    Ok(())
}

#[cfg(test)]
pub(crate) fn test_post(id: &str, created_at: u64) -> Post {
    use crate::models::post::Author;

    Post {
        id: id.to_string(),
        author: Author {
            id: "u1".to_string(),
            username: "someone".to_string(),
            display_name: None,
            avatar_url: None,
        },
        content: format!("post {}", id),
        media: None,
        likes_count: 0,
        comments_count: 0,
        reposts_count: 0,
        saves_count: 0,
        is_liked: false,
        is_reposted: false,
        is_saved: false,
        created_at,
        datetime: String::new(),
    }
}
