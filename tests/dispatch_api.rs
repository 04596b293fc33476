// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::test;
use common::{ADMIN_KEY, ADMIN_PATH, LIMITED_KEY, TestHarness};
use nop_gallery::admin::API_KEY_HEADER;
use serde_json::{Value, json};

async fn fetch_nonce<S>(app: &S, api_key: &str, scope: &str) -> String
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri(&format!("{}/nonce-api", ADMIN_PATH))
        .insert_header((API_KEY_HEADER, api_key))
        .set_json(json!({"scope": scope}))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    body["nonce"].as_str().expect("nonce").to_string()
}

async fn call_action<S>(app: &S, api_key: Option<&str>, body: Value) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let mut req = test::TestRequest::post()
        .uri(&format!("{}/action-api", ADMIN_PATH))
        .set_json(body);
    if let Some(api_key) = api_key {
        req = req.insert_header((API_KEY_HEADER, api_key));
    }
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

#[actix_web::test]
async fn gallery_crud_round_trip() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let nonce = fetch_nonce(&app, ADMIN_KEY, "gallery-admin").await;

    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({
            "action": "gallery/create",
            "nonce": nonce,
            "name": " Summer ",
            "columns": "5",
            "lightbox": "0",
            "transition": "fade",
        }),
    )
    .await;
    assert_eq!(status, 200, "create failed: {}", body);
    assert_eq!(body["success"], true);
    let gallery = &body["data"]["gallery"];
    assert_eq!(gallery["name"], "Summer");
    assert_eq!(gallery["columns"], "5");
    assert_eq!(gallery["lightbox"], "0");
    assert_eq!(gallery["hover_zoom"], "inherit");
    let id = gallery["id"].as_u64().expect("id");

    // Rename must not clear any stored override.
    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({
            "action": "gallery/rename",
            "nonce": nonce,
            "id": id,
            "name": "Winter",
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["gallery"]["name"], "Winter");
    assert_eq!(body["data"]["gallery"]["columns"], "5");
    assert_eq!(body["data"]["gallery"]["transition"], "fade");

    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({
            "action": "gallery/set_images",
            "nonce": nonce,
            "id": id,
            "image_ids": "1,2,2,99,0",
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["gallery"]["image_ids"], json!([1, 2, 99]));

    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/delete", "nonce": nonce, "id": id}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["deleted"], id);

    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/delete", "nonce": nonce, "id": id}),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], format!("Gallery {} not found", id));
}

#[actix_web::test]
async fn unknown_action_is_a_404() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/explode", "nonce": "x"}),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Unknown action");
}

#[actix_web::test]
async fn capability_failure_wins_over_nonce_failure() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;

    // The limited key lacks manage_galleries, and the nonce is garbage:
    // the response must be the capability message, never the nonce one.
    let (status, body) = call_action(
        &app,
        Some(LIMITED_KEY),
        json!({"action": "gallery/create", "nonce": "bogus", "name": "X"}),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Not allowed");

    // Same for a request with no key at all.
    let (status, body) = call_action(
        &app,
        None,
        json!({"action": "gallery/create", "nonce": "bogus", "name": "X"}),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Not allowed");
}

#[actix_web::test]
async fn bad_nonce_fails_after_capability_passes() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/create", "nonce": "bogus", "name": "X"}),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Nonce verification failed");
}

#[actix_web::test]
async fn nonces_are_scope_bound() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let category_nonce = fetch_nonce(&app, ADMIN_KEY, "category-admin").await;

    // A category-admin nonce does not open gallery-admin actions.
    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/create", "nonce": category_nonce, "name": "X"}),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(body["message"], "Nonce verification failed");
}

#[actix_web::test]
async fn empty_scope_action_needs_no_nonce() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "template/list"}),
    )
    .await;
    assert_eq!(status, 200, "template/list failed: {}", body);
    assert_eq!(body["data"]["templates"]["basic-grid"]["available"], true);
    assert_eq!(body["data"]["templates"]["masonry"]["is_pro"], false);
}

#[actix_web::test]
async fn category_flow_with_scoped_nonce() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let nonce = fetch_nonce(&app, LIMITED_KEY, "category-admin").await;

    let (status, body) = call_action(
        &app,
        Some(LIMITED_KEY),
        json!({
            "action": "category/assign",
            "nonce": nonce,
            "object_id": 1,
            "names": "Travel, travel , Beach",
        }),
    )
    .await;
    assert_eq!(status, 200, "assign failed: {}", body);
    let terms = body["data"]["terms"].as_array().expect("terms");
    assert_eq!(terms.len(), 2);
    assert_eq!(terms[0]["name"], "Beach");
    assert_eq!(terms[1]["name"], "Travel");

    let (status, body) = call_action(
        &app,
        Some(LIMITED_KEY),
        json!({
            "action": "category/suggest",
            "nonce": nonce,
            "query": "tra",
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["terms"][0]["name"], "Travel");

    // Unknown object: NotFound through the uniform envelope.
    let (status, body) = call_action(
        &app,
        Some(LIMITED_KEY),
        json!({
            "action": "category/assign",
            "nonce": nonce,
            "object_id": 55,
            "names": "Travel",
        }),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Image 55 not found");
}

#[actix_web::test]
async fn settings_update_clamps_and_merges() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let nonce = fetch_nonce(&app, ADMIN_KEY, "gallery-admin").await;

    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({
            "action": "settings/update",
            "nonce": nonce,
            "template": "basic-grid",
            "columns": "12",
            "hover_zoom": "off",
        }),
    )
    .await;
    assert_eq!(status, 200, "settings update failed: {}", body);
    assert_eq!(body["data"]["settings"]["columns"], 6);
    assert_eq!(body["data"]["settings"]["hover_zoom_enabled"], false);
    assert_eq!(body["data"]["settings"]["lightbox_enabled"], true);
}

#[actix_web::test]
async fn validation_errors_use_the_runtime_status_class() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let nonce = fetch_nonce(&app, ADMIN_KEY, "gallery-admin").await;

    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/create", "nonce": nonce, "name": "   "}),
    )
    .await;
    assert_eq!(status, 500);
    assert_eq!(body["message"], "Gallery name is required");
}

#[actix_web::test]
async fn publish_page_writes_a_stub() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let nonce = fetch_nonce(&app, ADMIN_KEY, "gallery-admin").await;

    let (_, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/create", "nonce": nonce, "name": "Harbor Nights"}),
    )
    .await;
    let id = body["data"]["gallery"]["id"].as_u64().expect("id");

    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/publish_page", "nonce": nonce, "id": id}),
    )
    .await;
    assert_eq!(status, 200, "publish failed: {}", body);
    assert_eq!(body["data"]["page"]["path"], "/harbor-nights");

    let page_file = harness.runtime_paths.pages_dir.join("harbor-nights.yaml");
    let written = std::fs::read_to_string(page_file).expect("page stub");
    assert!(written.contains(&format!("((gallery id={}))", id)));
}

#[actix_web::test]
async fn image_membership_via_the_api() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;
    let nonce = fetch_nonce(&app, ADMIN_KEY, "gallery-admin").await;

    let (_, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/create", "nonce": nonce, "name": "A"}),
    )
    .await;
    let a = body["data"]["gallery"]["id"].as_u64().unwrap();
    let (_, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/create", "nonce": nonce, "name": "B"}),
    )
    .await;
    let b = body["data"]["gallery"]["id"].as_u64().unwrap();

    call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/set_images", "nonce": nonce, "id": a, "image_ids": [1, 2]}),
    )
    .await;
    call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "gallery/set_images", "nonce": nonce, "id": b, "image_ids": [2]}),
    )
    .await;

    // Clearing membership removes the image from every gallery.
    let (status, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "image/set_galleries", "nonce": nonce, "image_id": 2, "gallery_ids": ""}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["gallery_ids"], json!([]));

    let (_, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "image/galleries", "nonce": nonce, "image_id": 2}),
    )
    .await;
    assert_eq!(body["data"]["gallery_ids"], json!([]));

    let (_, body) = call_action(
        &app,
        Some(ADMIN_KEY),
        json!({"action": "image/galleries", "nonce": nonce, "image_id": 1}),
    )
    .await;
    assert_eq!(body["data"]["gallery_ids"], json!([a]));
}

#[actix_web::test]
async fn catalog_endpoint_publishes_actions_and_templates() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;

    let req = test::TestRequest::get()
        .uri(&format!("{}/catalog-api", ADMIN_PATH))
        .insert_header((API_KEY_HEADER, ADMIN_KEY))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;

    let actions = body["actions"].as_array().expect("actions");
    let create = actions
        .iter()
        .find(|action| action["name"] == "gallery/create")
        .expect("gallery/create in catalog");
    assert_eq!(create["capability"], "manage_galleries");
    assert_eq!(create["nonce_scope"], "gallery-admin");
    assert!(body["templates"]["masonry"].is_object());

    // No key, no catalog.
    let req = test::TestRequest::get()
        .uri(&format!("{}/catalog-api", ADMIN_PATH))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn nonce_endpoint_requires_a_resolved_session() {
    let harness = TestHarness::new();
    let app = test::init_service(harness.app()).await;

    let req = test::TestRequest::post()
        .uri(&format!("{}/nonce-api", ADMIN_PATH))
        .set_json(json!({"scope": "gallery-admin"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri(&format!("{}/nonce-api", ADMIN_PATH))
        .insert_header((API_KEY_HEADER, ADMIN_KEY))
        .set_json(json!({"scope": "  "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}
