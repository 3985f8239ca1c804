//! End-to-end tests: listing fetch, concurrent comment fetches and aggregation against
//! a mock JSONPlaceholder API.

mod common;

use std::time::Duration;

use common::{config_for, mount_comments, mount_comments_status, mount_posts};
use fanfold::{EntryStatus, Error, ParentId, PostWithComments, fetch_posts_with_comments};
use wiremock::MockServer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn posts_with_comments_empty_and_failed_fetches() {
    let server = MockServer::start().await;
    mount_posts(&server, &[1, 2, 3]).await;
    mount_comments(&server, 1, 2, Duration::ZERO).await;
    mount_comments(&server, 2, 0, Duration::ZERO).await;
    mount_comments_status(&server, 3, 500).await;

    let result = fetch_posts_with_comments(&config_for(&server))
        .await
        .expect("listing succeeded, run must succeed");

    assert_eq!(result.len(), 3);
    assert_eq!(result.status(ParentId(1)), Some(EntryStatus::Populated(2)));
    assert_eq!(result.status(ParentId(2)), Some(EntryStatus::Empty));
    assert_eq!(result.status(ParentId(3)), Some(EntryStatus::Failed));
    assert!(result.children(ParentId(3)).unwrap().is_empty());
    assert!(result.error(ParentId(3)).unwrap().message.contains("500"));
    assert_eq!(result.stats().reported, 3);

    server.verify().await;
}

#[tokio::test]
async fn comments_are_attached_to_their_own_post() {
    let server = MockServer::start().await;
    let ids: Vec<i64> = (1..=12).collect();
    mount_posts(&server, &ids).await;
    for id in &ids {
        // Later posts answer first, so completion order is the reverse of listing order.
        let delay = Duration::from_millis((13 - *id as u64) * 10);
        mount_comments(&server, *id, *id % 4, delay).await;
    }

    let result = fetch_posts_with_comments(&config_for(&server))
        .await
        .unwrap();

    assert!(result.is_complete_success());
    assert_eq!(
        result.total_children(),
        ids.iter().map(|id| (id % 4) as usize).sum::<usize>()
    );

    let ordered: Vec<PostWithComments> = result
        .into_ordered()
        .into_iter()
        .map(PostWithComments::from)
        .collect();
    let listed: Vec<i64> = ordered.iter().map(|p| p.post.id).collect();
    assert_eq!(listed, ids, "ordered output follows the listing");
    for post in &ordered {
        assert!(post.comments.iter().all(|c| c.post_id == post.post.id));
    }
}

#[tokio::test]
async fn comment_fetches_overlap_in_time() {
    let server = MockServer::start().await;
    let ids: Vec<i64> = (1..=10).collect();
    mount_posts(&server, &ids).await;
    for id in &ids {
        mount_comments(&server, *id, 1, Duration::from_millis(300)).await;
    }

    let result = fetch_posts_with_comments(&config_for(&server))
        .await
        .unwrap();

    // Ten sequential 300ms fetches would take 3s.
    assert!(
        result.stats().elapsed < Duration::from_millis(2000),
        "fetches did not run concurrently: {:?}",
        result.stats().elapsed
    );
    assert_eq!(result.total_children(), 10);
}

#[tokio::test]
async fn listing_failure_is_fatal_and_starts_no_fetches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetch_posts_with_comments(&config_for(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Listing { .. }), "got {err:?}");
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "only the listing may be requested");
}

#[tokio::test]
async fn empty_listing_yields_an_empty_result() {
    let server = MockServer::start().await;
    mount_posts(&server, &[]).await;

    let result = fetch_posts_with_comments(&config_for(&server))
        .await
        .unwrap();

    assert!(result.is_empty());
    assert!(result.is_complete_success());
}

#[tokio::test]
async fn invalid_configuration_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    let mut config = config_for(&server);
    config.source.children_path = "comments".to_string();

    let err = fetch_posts_with_comments(&config).await.unwrap_err();

    assert!(matches!(err, Error::Config { .. }), "got {err:?}");
    assert!(server.received_requests().await.unwrap().is_empty());
}
