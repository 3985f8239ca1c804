//! Mock API fixtures: JSONPlaceholder-shaped posts and comments served by wiremock.

use std::time::Duration;

use fanfold::{Config, SourceConfig};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Post JSON as returned by `/posts`
pub fn post_json(id: i64) -> Value {
    json!({
        "userId": (id - 1) / 10 + 1,
        "id": id,
        "title": format!("post title {id}"),
        "body": format!("post body {id}")
    })
}

/// Comment JSON as returned by `/posts/{id}/comments`
pub fn comment_json(post_id: i64, id: i64) -> Value {
    json!({
        "postId": post_id,
        "id": id,
        "name": format!("comment {id}"),
        "email": format!("user{id}@example.com"),
        "body": format!("comment body {id}")
    })
}

/// Serve the post listing for `ids`.
pub async fn mount_posts(server: &MockServer, ids: &[i64]) {
    let posts: Vec<Value> = ids.iter().map(|id| post_json(*id)).collect();
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts))
        .expect(1)
        .mount(server)
        .await;
}

/// Serve `count` comments for `post_id`, optionally after a delay.
pub async fn mount_comments(server: &MockServer, post_id: i64, count: i64, delay: Duration) {
    let comments: Vec<Value> = (1..=count)
        .map(|n| comment_json(post_id, post_id * 100 + n))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/posts/{post_id}/comments")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(comments)
                .set_delay(delay),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Answer the comments request for `post_id` with `status`.
pub async fn mount_comments_status(server: &MockServer, post_id: i64, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/posts/{post_id}/comments")))
        .respond_with(ResponseTemplate::new(status))
        .expect(1)
        .mount(server)
        .await;
}

/// Configuration pointing at the mock server with a short timeout.
pub fn config_for(server: &MockServer) -> Config {
    Config {
        source: SourceConfig {
            base_url: server.uri(),
            request_timeout: Duration::from_secs(5),
            ..SourceConfig::default()
        },
        ..Config::default()
    }
}
