use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::error::AgoratuiError;
use crate::models::mutation::{LikeOutcome, PostApi, RepostOutcome, SaveOutcome};
use crate::models::post::{format_local_datetime, Comment, Media, Post};

// Registration is the one request that races a fixed deadline
const REGISTER_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin wrappers over the server's REST endpoints. The bearer token lives
/// behind a lock so a 401 can discard it mid-flight; the cookie store keeps
/// the session cookie riding along as the credential fallback.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Mutex<Option<String>>,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiClient {
    pub fn new(server: &str, token: Option<String>) -> Result<ApiClient, AgoratuiError> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(ApiClient {
            http,
            base_url: server.trim_end_matches('/').to_string(),
            token: Mutex::new(token),
        })
    }

    pub async fn token(&self) -> Option<String> {
        self.token.lock().await.clone()
    }

    pub async fn set_token(&self, token: Option<String>) {
        *self.token.lock().await = token;
    }

    async fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = self.token.lock().await.as_deref() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn check(
        &self,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, AgoratuiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // A rejected token is not worth keeping around
            *self.token.lock().await = None;
            return Err(AgoratuiError::Auth(
                "authorization rejected, stored token discarded".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|e| e.message)
                .ok()
                .filter(|m| !m.is_empty())
                .or_else(|| if body.is_empty() { None } else { Some(body) })
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(AgoratuiError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    pub async fn fetch_feed(&self, since: Option<u64>) -> Result<Vec<Post>, AgoratuiError> {
        let path = match since {
            Some(ts) => format!("/api/posts?since={}", ts),
            None => "/api/posts".to_string(),
        };
        let response = self.request(Method::GET, &path).await.send().await?;
        let mut posts: Vec<Post> = self.check(response).await?.json().await?;
        for post in &mut posts {
            post.datetime = format_local_datetime(post.created_at);
        }
        Ok(posts)
    }

    pub async fn fetch_saved(&self) -> Result<Vec<Post>, AgoratuiError> {
        let response = self
            .request(Method::GET, "/api/posts/saved")
            .await
            .send()
            .await?;
        let mut posts: Vec<Post> = self.check(response).await?.json().await?;
        for post in &mut posts {
            post.datetime = format_local_datetime(post.created_at);
        }
        Ok(posts)
    }

    pub async fn fetch_comments(&self, post_id: &str) -> Result<Vec<Comment>, AgoratuiError> {
        let response = self
            .request(Method::GET, &format!("/api/posts/{}/comments", post_id))
            .await
            .send()
            .await?;
        let mut comments: Vec<Comment> = self.check(response).await?.json().await?;
        for comment in &mut comments {
            comment.datetime = format_local_datetime(comment.created_at);
        }
        Ok(comments)
    }

    pub async fn create_post(
        &self,
        content: &str,
        media: Option<&Media>,
    ) -> Result<Post, AgoratuiError> {
        let mut body = json!({ "content": content });
        if let Some(media) = media {
            body["media"] = json!(media.to_wire());
        }
        let response = self
            .request(Method::POST, "/api/posts")
            .await
            .json(&body)
            .send()
            .await?;
        let mut post: Post = self.check(response).await?.json().await?;
        post.datetime = format_local_datetime(post.created_at);
        Ok(post)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String, AgoratuiError> {
        let response = self
            .request(Method::POST, "/api/auth/login")
            .await
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        let auth: AuthResponse = self.check(response).await?.json().await?;
        self.set_token(Some(auth.token.clone())).await;
        Ok(auth.token)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<String, AgoratuiError> {
        let send = self
            .request(Method::POST, "/api/auth/register")
            .await
            .json(&json!({ "username": username, "password": password }))
            .send();
        let response = match timeout(REGISTER_TIMEOUT, send).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AgoratuiError::Timeout(
                    "registration gave up after 30 seconds".to_string(),
                ))
            }
        };
        let auth: AuthResponse = self.check(response).await?.json().await?;
        self.set_token(Some(auth.token.clone())).await;
        Ok(auth.token)
    }
}

#[async_trait]
impl PostApi for ApiClient {
    async fn toggle_like(&self, id: &str) -> Result<LikeOutcome, AgoratuiError> {
        let response = self
            .request(Method::POST, &format!("/api/posts/{}/like", id))
            .await
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    async fn toggle_repost(&self, id: &str) -> Result<RepostOutcome, AgoratuiError> {
        let response = self
            .request(Method::POST, &format!("/api/posts/{}/repost", id))
            .await
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    async fn save_post(&self, id: &str) -> Result<SaveOutcome, AgoratuiError> {
        let response = self
            .request(Method::POST, &format!("/api/posts/{}/save", id))
            .await
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    async fn unsave_post(&self, id: &str) -> Result<SaveOutcome, AgoratuiError> {
        let response = self
            .request(Method::DELETE, &format!("/api/posts/{}/save", id))
            .await
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    async fn create_comment(
        &self,
        post_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> Result<Comment, AgoratuiError> {
        let mut body = json!({ "content": content });
        if let Some(parent) = parent_id {
            body["parentId"] = json!(parent);
        }
        let response = self
            .request(Method::POST, &format!("/api/posts/{}/comments", post_id))
            .await
            .json(&body)
            .send()
            .await?;
        let mut comment: Comment = self.check(response).await?.json().await?;
        comment.datetime = format_local_datetime(comment.created_at);
        Ok(comment)
    }

    async fn update_post(&self, id: &str, content: &str) -> Result<(), AgoratuiError> {
        let response = self
            .request(Method::PUT, &format!("/api/posts/{}", id))
            .await
            .json(&json!({ "content": content }))
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }

    async fn delete_post(&self, id: &str) -> Result<(), AgoratuiError> {
        let response = self
            .request(Method::DELETE, &format!("/api/posts/{}", id))
            .await
            .send()
            .await?;
        self.check(response).await?;
        Ok(())
    }
}
