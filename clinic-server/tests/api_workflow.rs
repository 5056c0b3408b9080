//! HTTP-level tests against the assembled router.
//!
//! Uses the oneshot extension to drive the full middleware stack without
//! binding a socket.

use axum::Router;
use axum::body::{Body, to_bytes};
use clinic_server::routes::{OneshotRouter, build_app};
use clinic_server::{Config, ServerState};
use http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tempfile::TempDir;

async fn setup() -> (TempDir, ServerState, Router<ServerState>) {
    let dir = TempDir::new().expect("temp dir");
    let config = Config::with_overrides(dir.path().to_string_lossy().into_owned(), 0);
    let state = ServerState::initialize(&config).await;
    let app = build_app(&state);
    (dir, state, app)
}

async fn send_json(
    app: &mut Router<ServerState>,
    state: &ServerState,
    method: Method,
    path: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(path).method(method);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };

    let response = app.oneshot(state, request).await.expect("oneshot");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn send_raw(
    app: &mut Router<ServerState>,
    state: &ServerState,
    request: Request<Body>,
) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(state, request).await.expect("oneshot");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    (status, bytes.to_vec())
}

async fn register_and_login(
    app: &mut Router<ServerState>,
    state: &ServerState,
    username: &str,
    email: &str,
    role: &str,
) -> String {
    let (status, _) = send_json(
        app,
        state,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": email,
            "password": "sup3r-secret",
            "role": role,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        app,
        state,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": username, "password": "sup3r-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");
    body["access_token"].as_str().expect("token").to_string()
}

fn multipart_body(boundary: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

async fn upload_photo(
    app: &mut Router<ServerState>,
    state: &ServerState,
    token: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> (StatusCode, Value) {
    let boundary = "clinic-test-boundary";
    let request = Request::builder()
        .uri("/api/facesim/upload")
        .method(Method::POST)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(multipart_body(
            boundary,
            filename,
            content_type,
            data,
        )))
        .expect("request");
    let (status, bytes) = send_raw(app, state, request).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let (_dir, state, mut app) = setup().await;

    let (status, body) = send_json(&mut app, &state, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send_json(
        &mut app,
        &state,
        Method::GET,
        "/health/detailed",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checks"]["database"]["status"], "ok");
    assert_eq!(body["checks"]["storage"]["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_token() {
    let (_dir, state, mut app) = setup().await;

    let (status, body) = send_json(
        &mut app,
        &state,
        Method::GET,
        "/api/facesim/simulations",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E3001");

    let (status, body) = send_json(
        &mut app,
        &state,
        Method::GET,
        "/api/facesim/simulations",
        Some("not-a-real-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E3002");
}

#[tokio::test]
async fn register_login_and_me_flow() {
    let (_dir, state, mut app) = setup().await;

    let token = register_and_login(&mut app, &state, "dr_wang", "wang@clinic.cn", "doctor").await;

    let (status, body) = send_json(
        &mut app,
        &state,
        Method::GET,
        "/api/auth/me",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "dr_wang");
    assert_eq!(body["email"], "wang@clinic.cn");
    assert_eq!(body["role"], "doctor");
    assert!(body.get("hashed_password").is_none());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let (_dir, state, mut app) = setup().await;

    let _ = register_and_login(&mut app, &state, "lina", "lina@clinic.cn", "consultant").await;

    let (status, body) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "lina",
            "email": "other@clinic.cn",
            "password": "sup3r-secret",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E0004");

    let (status, _) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "lina2",
            "email": "lina@clinic.cn",
            "password": "sup3r-secret",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_failures_use_one_message() {
    let (_dir, state, mut app) = setup().await;

    let _ = register_and_login(&mut app, &state, "reva", "reva@clinic.cn", "consultant").await;

    let (status, body) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "reva", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let wrong_password_message = body["message"].clone();

    let (status, body) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "no_such_user", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    // Same message whether the username exists or not
    assert_eq!(body["message"], wrong_password_message);
}

#[tokio::test]
async fn facesim_end_to_end_workflow() {
    let (_dir, state, mut app) = setup().await;
    let token = register_and_login(&mut app, &state, "dr_chen", "chen@clinic.cn", "doctor").await;

    // 1. Upload a photo; the stub quality gate passes it
    let photo = b"not-a-real-jpeg-but-good-enough";
    let (status, image) =
        upload_photo(&mut app, &state, &token, "selfie.jpg", "image/jpeg", photo).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(image["quality_status"], "passed");
    let image_id = image["id"].as_i64().expect("image id");
    let stored_path = image["file_path"].as_str().expect("file path").to_string();
    assert!(stored_path.starts_with("uploads/facesim/"));

    // 2. Analyze with the default category set
    let (status, batch) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/facesim/analyze",
        Some(&token),
        Some(json!({ "image_id": image_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let analyses = batch["analyses"].as_array().expect("analyses");
    assert_eq!(analyses.len(), 2);
    assert_eq!(analyses[0]["issue_type"], "acne");
    assert_eq!(analyses[1]["issue_type"], "spot");
    let analysis_id = analyses[0]["id"].as_i64().expect("analysis id");

    // 3. Simulate a treatment for the acne finding
    let (status, simulation) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/facesim/simulate",
        Some(&token),
        Some(json!({
            "analysis_id": analysis_id,
            "treatment_type": "祛痘",
            "intensity": 7,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(simulation["status"], "completed");
    assert_eq!(simulation["intensity"], 7);
    let simulation_id = simulation["id"].as_i64().expect("simulation id");
    let simulated_path = simulation["simulated_image_path"]
        .as_str()
        .expect("simulated path")
        .to_string();
    let comparison_path = simulation["comparison_image_path"]
        .as_str()
        .expect("comparison path")
        .to_string();
    assert!(simulated_path.starts_with("uploads/facesim/sim_"));
    assert!(comparison_path.starts_with("uploads/facesim/comp_"));
    assert!(simulation["completed_at"].is_i64());

    // 4. The listing shows it newest first with the total
    let (status, page) = send_json(
        &mut app,
        &state,
        Method::GET,
        "/api/facesim/simulations",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], simulation_id);

    // 5. Detail is owner-scoped
    let detail_uri = format!("/api/facesim/simulations/{simulation_id}");
    let (status, detail) = send_json(
        &mut app,
        &state,
        Method::GET,
        &detail_uri,
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["analysis_id"], analysis_id);

    let other = register_and_login(&mut app, &state, "intruder", "x@clinic.cn", "doctor").await;
    let (status, _) = send_json(
        &mut app,
        &state,
        Method::GET,
        &detail_uri,
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 6. The comparison artifact is served without auth
    let artifact_name = simulated_path
        .rsplit('/')
        .next()
        .expect("artifact filename");
    let request = Request::builder()
        .uri(format!("/uploads/facesim/{artifact_name}"))
        .method(Method::GET)
        .body(Body::empty())
        .expect("request");
    let (status, bytes) = send_raw(&mut app, &state, request).await;
    assert_eq!(status, StatusCode::OK);
    // The stub renderer copies the original photo
    assert_eq!(bytes, photo);

    // 7. Deleting the image removes the whole chain
    let delete_uri = format!("/api/facesim/images/{image_id}");
    let (status, deleted) = send_json(
        &mut app,
        &state,
        Method::DELETE,
        &delete_uri,
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted, Value::Bool(true));

    let (status, _) = send_json(
        &mut app,
        &state,
        Method::GET,
        &detail_uri,
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/facesim/analyze",
        Some(&token),
        Some(json!({ "image_id": image_id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_rejects_non_image_files() {
    let (_dir, state, mut app) = setup().await;
    let token = register_and_login(&mut app, &state, "uploader", "u@clinic.cn", "doctor").await;

    let (status, body) = upload_photo(
        &mut app,
        &state,
        &token,
        "notes.txt",
        "text/plain",
        b"just some text",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn simulate_rejects_out_of_range_intensity() {
    let (_dir, state, mut app) = setup().await;
    let token = register_and_login(&mut app, &state, "dr_liu", "liu@clinic.cn", "doctor").await;

    let (_, image) = upload_photo(
        &mut app,
        &state,
        &token,
        "selfie.jpg",
        "image/jpeg",
        b"bytes",
    )
    .await;
    let (_, batch) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/facesim/analyze",
        Some(&token),
        Some(json!({ "image_id": image["id"] })),
    )
    .await;
    let analysis_id = batch["analyses"][0]["id"].as_i64().expect("analysis id");

    let (status, body) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/facesim/simulate",
        Some(&token),
        Some(json!({
            "analysis_id": analysis_id,
            "treatment_type": "祛痘",
            "intensity": 11,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn simulations_pagination_window() {
    let (_dir, state, mut app) = setup().await;
    let token = register_and_login(&mut app, &state, "dr_sun", "sun@clinic.cn", "doctor").await;

    let (_, image) = upload_photo(
        &mut app,
        &state,
        &token,
        "selfie.jpg",
        "image/jpeg",
        b"bytes",
    )
    .await;
    let (_, batch) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/facesim/analyze",
        Some(&token),
        Some(json!({ "image_id": image["id"] })),
    )
    .await;
    let analysis_id = batch["analyses"][0]["id"].as_i64().expect("analysis id");

    for _ in 0..3 {
        let (status, _) = send_json(
            &mut app,
            &state,
            Method::POST,
            "/api/facesim/simulate",
            Some(&token),
            Some(json!({ "analysis_id": analysis_id, "treatment_type": "祛痘" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, page) = send_json(
        &mut app,
        &state,
        Method::GET,
        "/api/facesim/simulations?skip=0&limit=2",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["items"].as_array().expect("items").len(), 2);

    let (status, page) = send_json(
        &mut app,
        &state,
        Method::GET,
        "/api/facesim/simulations?skip=2&limit=2",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["items"].as_array().expect("items").len(), 1);
}

#[tokio::test]
async fn template_creation_requires_manager() {
    let (_dir, state, mut app) = setup().await;
    let staff = register_and_login(&mut app, &state, "staff", "s@clinic.cn", "consultant").await;
    let manager = register_and_login(&mut app, &state, "boss", "b@clinic.cn", "manager").await;

    let payload = json!({
        "name": "夏日主推模板",
        "layout_config": { "blocks": ["title", "body", "logo"] },
    });

    let (status, body) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/brandguard/templates",
        Some(&staff),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "E2001");

    let (status, template) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/brandguard/templates",
        Some(&manager),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(template["width"], 1080);
    assert_eq!(template["height"], 1920);

    // The catalogue is shared: any authenticated staff can read it
    let (status, templates) = send_json(
        &mut app,
        &state,
        Method::GET,
        "/api/brandguard/templates",
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(templates.as_array().expect("templates").len(), 1);
}

#[tokio::test]
async fn vi_config_upsert_roundtrip() {
    let (_dir, state, mut app) = setup().await;
    let token = register_and_login(&mut app, &state, "marketer", "m@clinic.cn", "marketing").await;

    let (status, _) = send_json(
        &mut app,
        &state,
        Method::GET,
        "/api/brandguard/vi-config",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, config) = send_json(
        &mut app,
        &state,
        Method::PUT,
        "/api/brandguard/vi-config",
        Some(&token),
        Some(json!({ "brand_name": "美肤诊所" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(config["brand_name"], "美肤诊所");
    assert_eq!(config["primary_color"], "#00A0E9");
    assert_eq!(config["font_family"], "PingFang SC");
    let first_id = config["id"].as_i64().expect("config id");

    // A second save replaces the row instead of adding one
    let (status, config) = send_json(
        &mut app,
        &state,
        Method::PUT,
        "/api/brandguard/vi-config",
        Some(&token),
        Some(json!({ "brand_name": "焕颜医美", "primary_color": "#1890FF" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(config["id"].as_i64().expect("config id"), first_id);
    assert_eq!(config["brand_name"], "焕颜医美");
    assert_eq!(config["primary_color"], "#1890FF");
}

#[tokio::test]
async fn poster_generation_records_compliance_issues() {
    let (_dir, state, mut app) = setup().await;
    let token = register_and_login(&mut app, &state, "promoter", "p@clinic.cn", "marketing").await;

    let (status, poster) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/brandguard/generate",
        Some(&token),
        Some(json!({
            "title": "夏日特惠",
            "content": "本产品可以根治痘痘",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(poster["compliance_checked"], true);
    let issues = poster["compliance_issues"].as_array().expect("issues");
    assert_eq!(issues[0], "包含违禁词: 根治");
    assert!(
        poster["image_url"]
            .as_str()
            .expect("image url")
            .contains("夏日特惠")
    );

    // Clean copy generates with no recorded issues
    let (status, poster) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/brandguard/generate",
        Some(&token),
        Some(json!({
            "title": "护肤讲座",
            "content": "改善肌肤状态",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(poster["compliance_issues"].is_null());

    let (status, posters) = send_json(
        &mut app,
        &state,
        Method::GET,
        "/api/brandguard/posters",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(posters.as_array().expect("posters").len(), 2);

    // Referencing a template that does not exist is a 404
    let (status, _) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/brandguard/generate",
        Some(&token),
        Some(json!({
            "title": "无效模板",
            "content": "改善肌肤状态",
            "template_id": 999999,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn compliance_check_endpoint() {
    let (_dir, state, mut app) = setup().await;
    let token = register_and_login(&mut app, &state, "writer", "w@clinic.cn", "marketing").await;

    let (status, report) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/brandguard/check-compliance",
        Some(&token),
        Some(json!({ "content": "本产品可以根治痘痘" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["is_compliant"], false);
    assert_eq!(report["issues"][0], "包含违禁词: 根治");

    let (status, report) = send_json(
        &mut app,
        &state,
        Method::POST,
        "/api/brandguard/check-compliance",
        Some(&token),
        Some(json!({ "content": "改善肌肤状态" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["is_compliant"], true);
    assert_eq!(report["issues"].as_array().expect("issues").len(), 0);
}
