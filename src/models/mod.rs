pub mod cache;
pub mod client;
pub mod comments;
pub mod config;
pub mod mutation;
pub mod post;

// Re-export important structs for convenience
pub use cache::{FeedCache, QueryKey};
pub use client::ApiClient;
pub use comments::CommentThread;
pub use config::Config;
pub use mutation::{PostApi, SharedCache, ToggleKind};
pub use post::{Author, Comment, Media, MediaKind, Post};
