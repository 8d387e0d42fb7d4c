use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use super::*;
use crate::state::test_helpers;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn healthz_returns_ok() {
    let app = app(test_helpers::test_app_state(), Path::new("./__no_static_dir__"));
    let resp = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_path_without_static_file_is_404() {
    let app = app(test_helpers::test_app_state(), Path::new("./__no_static_dir__"));
    let resp = app.oneshot(get("/nope.html")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_index_is_served_at_root() {
    let dir = std::env::temp_dir().join(format!("chatline-static-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>chat</h1>").unwrap();

    let app = app(test_helpers::test_app_state(), &dir);
    let resp = app.oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"<h1>chat</h1>");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn get_on_post_route_is_method_not_allowed() {
    let app = app(test_helpers::test_app_state(), Path::new("./__no_static_dir__"));
    let resp = app.oneshot(get("/clear-chat")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn bundled_page_seeds_hidden_sender_fields_on_load() {
    let page = include_str!("../../public/index.html");
    assert!(page.contains(r#"class="from-copy""#));
    assert!(page.contains("el.value = from.value;"));
}
