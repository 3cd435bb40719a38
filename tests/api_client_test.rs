use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agoratui::error::AgoratuiError;
use agoratui::models::client::ApiClient;
use agoratui::models::mutation::PostApi;
use agoratui::models::post::Media;

fn client_for(server: &MockServer, token: Option<&str>) -> ApiClient {
    ApiClient::new(&server.uri(), token.map(str::to_string)).unwrap()
}

#[tokio::test]
async fn like_request_carries_bearer_token_and_decodes_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/p1/like"))
        .and(header("authorization", "Bearer sekrit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "liked": true })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("sekrit"));
    let outcome = client.toggle_like("p1").await.unwrap();
    assert!(outcome.liked);
}

#[tokio::test]
async fn unauthorized_response_discards_cached_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/p1/like"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("stale"));
    let err = client.toggle_like("p1").await.unwrap_err();
    assert!(matches!(err, AgoratuiError::Auth(_)));
    assert!(client.token().await.is_none());
}

#[tokio::test]
async fn server_error_surfaces_body_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/posts/p1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "post unavailable" })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.update_post("p1", "new text").await.unwrap_err();
    match err {
        AgoratuiError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "post unavailable");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn repost_decodes_authoritative_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/p1/repost"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "isReposted": true, "repostsCount": 12 })),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let outcome = client.toggle_repost("p1").await.unwrap();
    assert!(outcome.is_reposted);
    assert_eq!(outcome.reposts_count, Some(12));
}

#[tokio::test]
async fn save_and_unsave_hit_the_same_path_with_different_methods() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/p1/save"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "isSaved": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/posts/p1/save"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "isSaved": false })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    assert!(client.save_post("p1").await.unwrap().is_saved);
    assert!(!client.unsave_post("p1").await.unwrap().is_saved);
}

#[tokio::test]
async fn delete_treats_empty_success_as_ok() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/posts/p1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    client.delete_post("p1").await.unwrap();
}

#[tokio::test]
async fn feed_decodes_wire_posts_and_media() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "p1",
                "author": { "id": "u1", "username": "vendor42" },
                "content": "two attachments",
                "media": "[\"a.jpg\",\"b.mp4\"]",
                "likesCount": 5,
                "isLiked": false,
                "createdAt": 1700000000u64
            },
            {
                "id": "p2",
                "author": { "id": "u2", "username": "other" },
                "content": "plain",
                "createdAt": 1700000100u64
            }
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let posts = client.fetch_feed(None).await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].likes_count, 5);
    assert_eq!(posts[0].media.as_ref().map(Media::len), Some(2));
    assert!(posts[1].media.is_none());
    // Display timestamps are derived client-side
    assert!(!posts[0].datetime.is_empty());
}

#[tokio::test]
async fn replies_carry_parent_id_in_the_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/p1/comments"))
        .and(body_partial_json(json!({ "content": "me too", "parentId": "c1" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "c9",
            "postId": "p1",
            "parentId": "c1",
            "author": { "id": "u1", "username": "vendor42" },
            "content": "me too",
            "createdAt": 1700000200u64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let comment = client.create_comment("p1", "me too", Some("c1")).await.unwrap();
    assert_eq!(comment.parent_id.as_deref(), Some("c1"));
}
