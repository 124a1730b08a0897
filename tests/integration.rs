use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

use rax_file_server::api::{AppState, router};
use rax_file_server::storage::Sandbox;

const BOUNDARY: &str = "raxboundary7MA4YWxkTrZu0gW";
const DEFAULT_CAP: u64 = 16 * 1024 * 1024;

// Helper to build a router over a fresh root directory
fn setup(max_upload_bytes: u64) -> (TempDir, PathBuf, Router) {
    let dir = tempdir().unwrap();
    let sandbox = Sandbox::new(&dir.path().join("root")).unwrap();
    let root = sandbox.root().to_path_buf();
    let app = router(AppState::new(sandbox, max_upload_bytes));
    (dir, root, app)
}

// Helper to send a request and collect the response body
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Bytes) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, Request::delete(uri).body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn mkdir(app: &Router, body: &str) -> (StatusCode, Value) {
    let request = Request::post("/mkdir")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn multipart_body(target_dir: Option<&str>, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(dir) = target_dir {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"path\"\r\n\r\n{dir}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn upload(
    app: &Router,
    target_dir: Option<&str>,
    filename: &str,
    content: &[u8],
) -> (StatusCode, Value) {
    let request = Request::post("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(target_dir, filename, content)))
        .unwrap();
    let (status, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn names(listing: &Value) -> Vec<String> {
    listing["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}

fn entries_under(path: &Path) -> Vec<String> {
    fs::read_dir(path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect()
}

#[tokio::test]
async fn test_index_describes_endpoints() {
    let (_dir, _root, app) = setup(DEFAULT_CAP);
    let (status, body) = get_json(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "File Server API");
    let endpoints = body["endpoints"].as_object().unwrap();
    assert!(endpoints.contains_key("GET /files"));
    assert!(endpoints.contains_key("DELETE /delete/<path>"));
}

#[tokio::test]
async fn test_list_sorts_directories_first() {
    let (_dir, root, app) = setup(DEFAULT_CAP);
    fs::write(root.join("beta.txt"), b"b").unwrap();
    fs::write(root.join("Alpha.txt"), b"a").unwrap();
    fs::create_dir(root.join("zdir")).unwrap();
    fs::create_dir(root.join("Adir")).unwrap();
    fs::create_dir_all(root.join("Adir/inner")).unwrap();

    let (status, body) = get_json(&app, "/files").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 4);
    assert_eq!(body["current_path"], "");
    assert_eq!(names(&body), ["Adir", "zdir", "Alpha.txt", "beta.txt"]);

    let (status, body) = get_json(&app, "/files/Adir").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["relative_path"], "Adir/inner");
    assert_eq!(body["items"][0]["is_directory"], true);
    assert_eq!(body["items"][0]["size"], 0);
}

#[tokio::test]
async fn test_list_errors_map_to_status() {
    let (_dir, root, app) = setup(DEFAULT_CAP);
    fs::write(root.join("a.txt"), b"a").unwrap();

    let (status, body) = get_json(&app, "/files/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, body) = get_json(&app, "/files/a.txt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "not_a_directory");
}

#[tokio::test]
async fn test_traversal_is_forbidden_everywhere() {
    let (dir, _root, app) = setup(DEFAULT_CAP);
    fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

    for uri in [
        "/files/../",
        "/files/%2e%2e/%2e%2e/etc",
        "/files/docs/..%2F..%2F..",
        "/download/../secret.txt",
        "/download/%2E%2E%2Fsecret.txt",
    ] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
        assert_eq!(body["kind"], "path_escape");
    }

    let (status, _) = delete(&app, "/delete/..%2Fsecret.txt").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(dir.path().join("secret.txt").exists());
}

#[tokio::test]
async fn test_upload_then_download_round_trip() {
    let (_dir, root, app) = setup(DEFAULT_CAP);

    let (status, body) = upload(&app, None, "a.txt", b"hello").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_info"]["name"], "a.txt");
    assert_eq!(body["file_info"]["relative_path"], "a.txt");
    assert_eq!(body["file_info"]["size"], 5);

    let response = app
        .clone()
        .oneshot(Request::get("/download/a.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"a.txt\""
    );
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"hello");

    // no staging files left behind
    assert_eq!(entries_under(&root), ["a.txt"]);
}

#[tokio::test]
async fn test_upload_into_new_directory_and_overwrite() {
    let (_dir, root, app) = setup(DEFAULT_CAP);

    let (status, body) = upload(&app, Some("photos/2024"), "cat.png", b"one").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_info"]["relative_path"], "photos/2024/cat.png");

    let (status, body) = upload(&app, Some("photos/2024"), "cat.png", b"second").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["file_info"]["size"], 6);
    assert_eq!(fs::read(root.join("photos/2024/cat.png")).unwrap(), b"second");
}

#[tokio::test]
async fn test_upload_rejects_traversal_names() {
    let (dir, root, app) = setup(DEFAULT_CAP);

    let (status, body) = upload(&app, None, "../../etc/passwd", b"root:x:0:0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_name");

    let (status, body) = upload(&app, Some("../outside"), "a.txt", b"x").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "path_escape");

    assert!(entries_under(&root).is_empty());
    assert!(!dir.path().join("outside").exists());
    assert!(!dir.path().join("etc").exists());
}

#[tokio::test]
async fn test_upload_without_file_is_bad_request() {
    let (_dir, _root, app) = setup(DEFAULT_CAP);

    let body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"path\"\r\n\r\ndocs\r\n--{BOUNDARY}--\r\n"
    );
    let request = Request::post("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    let (status, body) = send(&app, request).await;
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file selected");

    let (status, _) = upload(&app, None, "", b"data").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_over_cap_leaves_nothing() {
    let (_dir, root, app) = setup(1024);

    let (status, body) = upload(&app, None, "big.bin", &vec![7u8; 4096]).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["kind"], "payload_too_large");
    assert!(entries_under(&root).is_empty());
}

#[tokio::test]
async fn test_upload_of_17_mib_rejected_with_default_cap() {
    let (_dir, root, app) = setup(DEFAULT_CAP);

    let payload = vec![0u8; 17 * 1024 * 1024];
    let (status, _) = upload(&app, None, "huge.bin", &payload).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(entries_under(&root).is_empty());
}

#[tokio::test]
async fn test_download_directory_is_rejected() {
    let (_dir, root, app) = setup(DEFAULT_CAP);
    fs::create_dir(root.join("docs")).unwrap();

    let (status, body) = get_json(&app, "/download/docs").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "is_a_directory");

    let (status, _) = get_json(&app, "/download/nothing.txt").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mkdir_twice() {
    let (_dir, root, app) = setup(DEFAULT_CAP);

    let (status, body) = mkdir(&app, r#"{"name": "docs"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["directory_info"]["name"], "docs");
    assert_eq!(body["directory_info"]["is_directory"], true);
    assert!(root.join("docs").is_dir());

    let (status, body) = mkdir(&app, r#"{"name": "docs"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "already_exists");

    let (status, body) = mkdir(&app, r#"{"name": "inner", "path": "docs"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["directory_info"]["relative_path"], "docs/inner");
}

#[tokio::test]
async fn test_mkdir_validation() {
    let (_dir, _root, app) = setup(DEFAULT_CAP);

    let (status, body) = mkdir(&app, r#"{"path": "docs"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");

    let (status, _) = mkdir(&app, "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = mkdir(&app, r#"{"name": "!!!"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_name");

    let (status, body) = mkdir(&app, r#"{"name": "x", "path": "../.."}"#).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "path_escape");
}

#[tokio::test]
async fn test_delete_missing_and_tree() {
    let (_dir, root, app) = setup(DEFAULT_CAP);
    fs::create_dir_all(root.join("parent/tree/deep")).unwrap();
    fs::write(root.join("parent/tree/deep/file.txt"), b"x").unwrap();
    fs::write(root.join("parent/tree/top.txt"), b"y").unwrap();
    fs::write(root.join("parent/keep.txt"), b"z").unwrap();

    let (status, body) = delete(&app, "/delete/missing/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, body) = delete(&app, "/delete/parent/tree").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Deleted successfully");

    let (_, listing) = get_json(&app, "/files/parent").await;
    assert_eq!(names(&listing), ["keep.txt"]);

    let (status, _) = delete(&app, "/delete/parent/keep.txt").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!root.join("parent/keep.txt").exists());
}

#[tokio::test]
async fn test_paths_through_a_file_are_not_found() {
    let (_dir, root, app) = setup(DEFAULT_CAP);
    fs::write(root.join("a.txt"), b"a").unwrap();

    for uri in ["/files/a.txt/x", "/download/a.txt/x"] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["kind"], "not_found");
    }

    let (status, body) = delete(&app, "/delete/a.txt/x").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");
    assert!(root.join("a.txt").exists());
}

#[tokio::test]
async fn test_undecodable_path_gets_json_error() {
    let (_dir, _root, app) = setup(DEFAULT_CAP);

    for uri in ["/files/%FF", "/download/%FF"] {
        let (status, body) = get_json(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["kind"], "bad_request");
        assert!(body["error"].is_string());
    }

    let (status, body) = delete(&app, "/delete/%FF").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "bad_request");
}

#[tokio::test]
async fn test_staging_files_are_invisible() {
    let (_dir, root, app) = setup(DEFAULT_CAP);
    fs::write(root.join(".upload-42-0.tmp"), b"partial").unwrap();
    fs::write(root.join("a.txt"), b"a").unwrap();

    let (status, listing) = get_json(&app, "/files").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&listing), ["a.txt"]);

    let (status, _) = get_json(&app, "/download/.upload-42-0.tmp").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = delete(&app, "/delete/.upload-42-0.tmp").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(root.join(".upload-42-0.tmp").exists());
}
