use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::AgoratuiError;
use crate::models::cache::{FeedCache, QueryKey};
use crate::models::post::{Comment, Post};

/// Cache handle shared between the event loop and in-flight mutations.
pub type SharedCache = Arc<Mutex<FeedCache>>;

/// The three viewer toggles. Each flips one per-viewer flag and moves the
/// matching counter by one, floored at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleKind {
    Like,
    Repost,
    Save,
}

impl ToggleKind {
    pub fn verb(&self) -> &'static str {
        match self {
            ToggleKind::Like => "like",
            ToggleKind::Repost => "repost",
            ToggleKind::Save => "save",
        }
    }

    fn flag(&self, post: &Post) -> bool {
        match self {
            ToggleKind::Like => post.is_liked,
            ToggleKind::Repost => post.is_reposted,
            ToggleKind::Save => post.is_saved,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LikeOutcome {
    pub liked: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepostOutcome {
    pub is_reposted: bool,
    #[serde(default)]
    pub reposts_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    pub is_saved: bool,
}

/// Network seam of the mutation engine. Implemented by [`ApiClient`] against
/// the real server and by scripted mocks in tests.
///
/// [`ApiClient`]: crate::models::client::ApiClient
#[async_trait]
pub trait PostApi: Send + Sync {
    async fn toggle_like(&self, id: &str) -> Result<LikeOutcome, AgoratuiError>;
    async fn toggle_repost(&self, id: &str) -> Result<RepostOutcome, AgoratuiError>;
    async fn save_post(&self, id: &str) -> Result<SaveOutcome, AgoratuiError>;
    async fn unsave_post(&self, id: &str) -> Result<SaveOutcome, AgoratuiError>;
    async fn create_comment(
        &self,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<Comment, AgoratuiError>;
    async fn update_post(&self, id: &str, content: &str) -> Result<(), AgoratuiError>;
    async fn delete_post(&self, id: &str) -> Result<(), AgoratuiError>;
}

enum ServerOutcome {
    Like(LikeOutcome),
    Repost(RepostOutcome),
    Save(SaveOutcome),
}

/// Toggle a viewer flag on a cached post.
///
/// Snapshot first, apply the flip locally, then send. On failure the
/// snapshot is restored verbatim; on success the server's authoritative
/// fields are merged into the same entry in place, so neither path changes
/// the collection order.
pub async fn toggle<A>(
    cache: &SharedCache,
    api: &A,
    key: &QueryKey,
    id: &str,
    kind: ToggleKind,
) -> Result<(), AgoratuiError>
where
    A: PostApi + ?Sized,
{
    let (snapshot, was_set) = {
        let mut guard = cache.lock().await;
        let snapshot = guard.snapshot(key).ok_or_else(|| {
            AgoratuiError::Cache(format!("no cached collection {}", key.as_str()))
        })?;
        let target = guard.get_post(key, id).ok_or_else(|| {
            AgoratuiError::Cache(format!("post {} not cached under {}", id, key.as_str()))
        })?;
        let was_set = kind.flag(target);
        guard.update_post(key, id, |post| apply_toggle(post, kind));
        (snapshot, was_set)
    };

    // Sole suspension point. The lock is not held across the wire call, so
    // other mutations and the renderer proceed; when the user re-toggles
    // before this resolves, the last response to land wins.
    let outcome = match kind {
        ToggleKind::Like => api.toggle_like(id).await.map(ServerOutcome::Like),
        ToggleKind::Repost => api.toggle_repost(id).await.map(ServerOutcome::Repost),
        ToggleKind::Save => {
            let result = if was_set {
                api.unsave_post(id).await
            } else {
                api.save_post(id).await
            };
            result.map(ServerOutcome::Save)
        }
    };

    let mut guard = cache.lock().await;
    match outcome {
        Ok(outcome) => {
            guard.update_post(key, id, |post| merge_outcome(post, &outcome));
            Ok(())
        }
        Err(err) => {
            guard.restore(key.clone(), snapshot);
            Err(err)
        }
    }
}

/// Rewrite a post's content. Only the content field changes optimistically;
/// a failure restores the snapshot.
pub async fn edit<A>(
    cache: &SharedCache,
    api: &A,
    key: &QueryKey,
    id: &str,
    content: &str,
) -> Result<(), AgoratuiError>
where
    A: PostApi + ?Sized,
{
    let snapshot = {
        let mut guard = cache.lock().await;
        let snapshot = guard.snapshot(key).ok_or_else(|| {
            AgoratuiError::Cache(format!("no cached collection {}", key.as_str()))
        })?;
        guard.update_post(key, id, |post| post.content = content.to_string());
        snapshot
    };

    match api.update_post(id, content).await {
        Ok(()) => Ok(()),
        Err(err) => {
            cache.lock().await.restore(key.clone(), snapshot);
            Err(err)
        }
    }
}

/// Delete a post. There is no optimistic removal: the entry stays visible
/// until the server confirms, so a transient failure cannot make a post
/// vanish from the feed.
pub async fn delete<A>(
    cache: &SharedCache,
    api: &A,
    key: &QueryKey,
    id: &str,
) -> Result<(), AgoratuiError>
where
    A: PostApi + ?Sized,
{
    api.delete_post(id).await?;
    cache.lock().await.remove_post(key, id);
    Ok(())
}

/// Create a comment on a post. A top-level comment bumps the post's comment
/// counter optimistically; a reply does not touch any counter here, the
/// caller re-fetches the thread so the parent's reply count comes from the
/// server.
pub async fn comment<A>(
    cache: &SharedCache,
    api: &A,
    key: &QueryKey,
    post_id: &str,
    content: &str,
    parent_id: Option<&str>,
) -> Result<Comment, AgoratuiError>
where
    A: PostApi + ?Sized,
{
    if parent_id.is_some() {
        return api.create_comment(post_id, content, parent_id).await;
    }

    let snapshot = {
        let mut guard = cache.lock().await;
        let snapshot = guard.snapshot(key).ok_or_else(|| {
            AgoratuiError::Cache(format!("no cached collection {}", key.as_str()))
        })?;
        guard.update_post(key, post_id, |post| {
            post.comments_count = post.comments_count.saturating_add(1);
        });
        snapshot
    };

    match api.create_comment(post_id, content, None).await {
        Ok(created) => Ok(created),
        Err(err) => {
            cache.lock().await.restore(key.clone(), snapshot);
            Err(err)
        }
    }
}

fn apply_toggle(post: &mut Post, kind: ToggleKind) {
    match kind {
        ToggleKind::Like => {
            if post.is_liked {
                post.likes_count = post.likes_count.saturating_sub(1);
            } else {
                post.likes_count = post.likes_count.saturating_add(1);
            }
            post.is_liked = !post.is_liked;
        }
        ToggleKind::Repost => {
            if post.is_reposted {
                post.reposts_count = post.reposts_count.saturating_sub(1);
            } else {
                post.reposts_count = post.reposts_count.saturating_add(1);
            }
            post.is_reposted = !post.is_reposted;
        }
        ToggleKind::Save => {
            if post.is_saved {
                post.saves_count = post.saves_count.saturating_sub(1);
            } else {
                post.saves_count = post.saves_count.saturating_add(1);
            }
            post.is_saved = !post.is_saved;
        }
    }
}

fn merge_outcome(post: &mut Post, outcome: &ServerOutcome) {
    match outcome {
        ServerOutcome::Like(o) => post.is_liked = o.liked,
        ServerOutcome::Repost(o) => {
            post.is_reposted = o.is_reposted;
            // The count stays optimistic unless the server sent one
            if let Some(count) = o.reposts_count {
                post.reposts_count = count;
            }
        }
        ServerOutcome::Save(o) => post.is_saved = o.is_saved,
    }
}
