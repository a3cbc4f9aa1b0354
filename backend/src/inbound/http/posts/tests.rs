//! Tests for post and comment API handlers.

use crate::domain::{NOT_AUTHOR_MESSAGE, POST_NOT_FOUND_MESSAGE};
use crate::inbound::http::test_utils::{TestHarness, signup_as};
use actix_web::http::StatusCode;
use actix_web::test;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, TimeZone, Utc};
use rstest::rstest;
use serde_json::{Value, json};

fn contents(page: &Value) -> Vec<String> {
    page.get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("content").and_then(Value::as_str))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[actix_web::test]
async fn publishing_with_an_image_stores_the_upload() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let cookie = signup_as(&app, "ada").await;

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .cookie(cookie)
            .set_json(json!({
                "content": "first light",
                "image": {"fileName": "moon.PNG", "data": STANDARD.encode(b"\x89PNG fake")}
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let post: Value = test::read_body_json(res).await;
    assert_eq!(post.get("content").and_then(Value::as_str), Some("first light"));
    assert_eq!(post.get("own").and_then(Value::as_bool), Some(true));
    let url = post
        .get("imageUrl")
        .and_then(Value::as_str)
        .expect("image url");
    assert!(url.ends_with(".png"), "stored with canonical extension: {url}");
    assert_eq!(harness.images.file_names().len(), 1);
}

#[rstest]
#[case::blank_content(json!({"content": "   "}), "content")]
#[case::bad_extension(json!({"content": "hi", "image": {"fileName": "x.bmp", "data": "AAAA"}}), "image")]
#[case::bad_base64(json!({"content": "hi", "image": {"fileName": "x.png", "data": "***"}}), "image")]
#[actix_web::test]
async fn invalid_posts_are_rejected(#[case] payload: Value, #[case] field: &str) {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let cookie = signup_as(&app, "ada").await;
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .cookie(cookie)
            .set_json(payload)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body.pointer("/details/field").and_then(Value::as_str),
        Some(field)
    );
    assert!(harness.images.file_names().is_empty());
}

#[actix_web::test]
async fn publishing_requires_a_session() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .set_json(json!({"content": "hello"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn votes_toggle_and_show_on_the_post() {
    let harness = TestHarness::new();
    let author = harness.store.seed_user("grace");
    let post = harness.store.seed_post(&author, "hello");
    let app = test::init_service(harness.app()).await;
    let cookie = signup_as(&app, "ada").await;

    let vote = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/posts/{post}/vote"))
            .insert_header(("Accept", "application/json"))
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(vote.status(), StatusCode::OK);
    let state: Value = test::read_body_json(vote).await;
    assert_eq!(state, json!({"active": true}));

    let detail = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/posts/{post}"))
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    let detail: Value = test::read_body_json(detail).await;
    assert_eq!(detail.get("votes").and_then(Value::as_u64), Some(1));
    assert_eq!(detail.get("voted").and_then(Value::as_bool), Some(true));
    assert_eq!(detail.get("own").and_then(Value::as_bool), Some(false));
    assert_eq!(detail.get("voters"), Some(&json!(["ada"])));

    let anonymous = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/posts/{post}"))
            .to_request(),
    )
    .await;
    let anonymous: Value = test::read_body_json(anonymous).await;
    assert_eq!(anonymous.get("voted").and_then(Value::as_bool), Some(false));

    let unvote = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/posts/{post}/vote"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(unvote.status(), StatusCode::FOUND);
    assert_eq!(harness.store.edge_count(), 0);
}

#[actix_web::test]
async fn only_the_author_deletes_a_post() {
    let harness = TestHarness::new();
    let author = harness.store.seed_user("grace");
    let post = harness.store.seed_post(&author, "mine");
    let app = test::init_service(harness.app()).await;
    let cookie = signup_as(&app, "ada").await;

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/posts/{post}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some(NOT_AUTHOR_MESSAGE)
    );
}

#[actix_web::test]
async fn authors_delete_their_posts() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let cookie = signup_as(&app, "ada").await;
    let created = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/posts")
            .cookie(cookie.clone())
            .set_json(json!({"content": "short lived"}))
            .to_request(),
    )
    .await;
    let created: Value = test::read_body_json(created).await;
    let id = created.get("id").and_then(Value::as_str).expect("post id");

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/posts/{id}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let gone = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/posts/{id}"))
            .to_request(),
    )
    .await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(gone).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some(POST_NOT_FOUND_MESSAGE)
    );
}

#[actix_web::test]
async fn malformed_post_ids_are_not_found() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/posts/not-a-uuid")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn comments_are_added_listed_and_removed() {
    let harness = TestHarness::new();
    let author = harness.store.seed_user("grace");
    let post = harness.store.seed_post(&author, "discuss");
    let app = test::init_service(harness.app()).await;
    let cookie = signup_as(&app, "ada").await;

    let added = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/posts/{post}/comments"))
            .cookie(cookie.clone())
            .set_json(json!({"content": "well said"}))
            .to_request(),
    )
    .await;
    assert_eq!(added.status(), StatusCode::CREATED);
    let comment: Value = test::read_body_json(added).await;
    let comment_id = comment.get("id").and_then(Value::as_str).expect("comment id");

    let listed = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/posts/{post}/comments"))
            .to_request(),
    )
    .await;
    let listed: Value = test::read_body_json(listed).await;
    assert_eq!(contents(&listed), ["well said"]);

    let removed = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/api/v1/posts/{post}/comments/{comment_id}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(removed.status(), StatusCode::NO_CONTENT);
    assert_eq!(harness.store.comment_count(), 0);
}

#[actix_web::test]
async fn feed_pages_do_not_overlap() {
    let harness = TestHarness::new();
    let author = harness.store.seed_user("grace");
    let base = Utc
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("valid time");
    for n in 1..=25_i64 {
        harness
            .store
            .seed_post_at(&author, &format!("post {n}"), base - Duration::minutes(n))
            .expect("seed post");
    }
    let app = test::init_service(harness.app()).await;
    let cookie = signup_as(&app, "ada").await;
    let follow = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/users/{author}/follow"))
            .insert_header(("Accept", "application/json"))
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    assert_eq!(follow.status(), StatusCode::OK);

    let first = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/feed?limit=10")
            .cookie(cookie.clone())
            .to_request(),
    )
    .await;
    let first: Value = test::read_body_json(first).await;
    let expected_first: Vec<String> = (1..=10).map(|n| format!("post {n}")).collect();
    assert_eq!(contents(&first), expected_first);

    let cursor = first
        .get("nextCursor")
        .and_then(Value::as_str)
        .expect("next cursor");
    let second = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/feed?limit=10&cursor={cursor}"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    let second: Value = test::read_body_json(second).await;
    let expected_second: Vec<String> = (11..=20).map(|n| format!("post {n}")).collect();
    assert_eq!(contents(&second), expected_second);
}

#[actix_web::test]
async fn posts_by_user_are_public() {
    let harness = TestHarness::new();
    let author = harness.store.seed_user("grace");
    harness.store.seed_post(&author, "public words");
    let app = test::init_service(harness.app()).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/grace/posts")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let page: Value = test::read_body_json(res).await;
    assert_eq!(contents(&page), ["public words"]);
}

#[actix_web::test]
async fn feed_requires_a_session() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/feed").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
