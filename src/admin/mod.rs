// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Admin HTTP surface: one dispatch endpoint for the whole action catalog,
//! a nonce issue endpoint, and the catalog read endpoint the UI builds
//! its requests from. Actor resolution matches the configured API keys;
//! an unmatched request dispatches as the anonymous actor, so it fails the
//! capability check rather than leaking nonce state.

use crate::app_state::AppState;
use crate::config::ValidatedConfig;
use crate::dispatch::{ActionRequest, Payload};
use crate::security::Actor;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result, web};
use serde::Deserialize;
use serde_json::{Value, json};

pub const API_KEY_HEADER: &str = "X-Api-Key";

pub fn configure(cfg: &mut web::ServiceConfig, admin_path: &str) {
    cfg.service(
        web::scope(admin_path)
            .route("/action-api", web::post().to(action_api))
            .route("/nonce-api", web::post().to(nonce_api))
            .route("/catalog-api", web::get().to(catalog_api)),
    );
}

fn resolve_actor(req: &HttpRequest, config: &ValidatedConfig) -> Actor {
    let presented = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if presented.is_empty() {
        return Actor::anonymous();
    }
    for api_key in &config.admin.api_keys {
        if api_key.key == presented {
            let capabilities: Vec<&str> = api_key
                .capabilities
                .iter()
                .map(|capability| capability.as_str())
                .collect();
            return Actor::new(api_key.id.clone(), &capabilities);
        }
    }
    log::warn!("Request presented an unknown API key");
    Actor::anonymous()
}

/// The single dispatch endpoint. The body is a flat JSON object carrying
/// `action`, `nonce`, and the operation's own fields.
async fn action_api(
    req: HttpRequest,
    body: web::Json<Value>,
    app_state: web::Data<AppState>,
    config: web::Data<ValidatedConfig>,
) -> Result<HttpResponse> {
    let actor = resolve_actor(&req, config.as_ref());
    let mut fields = match body.into_inner() {
        Value::Object(fields) => fields,
        _ => {
            return Ok(HttpResponse::InternalServerError()
                .json(json!({"success": false, "message": "Request payload must be an object"})));
        }
    };
    let action = fields
        .remove("action")
        .and_then(|value| value.as_str().map(|text| text.to_string()))
        .unwrap_or_default();
    let nonce = fields
        .remove("nonce")
        .and_then(|value| value.as_str().map(|text| text.to_string()))
        .unwrap_or_default();

    let outcome = app_state
        .dispatcher
        .dispatch(
            &actor,
            ActionRequest {
                action,
                nonce,
                payload: Payload::new(fields),
            },
        )
        .await;
    let status =
        StatusCode::from_u16(outcome.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok(HttpResponse::build(status).json(outcome.body))
}

#[derive(Debug, Deserialize)]
struct NonceRequest {
    scope: String,
}

/// Issue (or refresh) the caller's nonce for one scope. Scopes come from
/// the published action catalog.
async fn nonce_api(
    req: HttpRequest,
    body: web::Json<NonceRequest>,
    app_state: web::Data<AppState>,
    config: web::Data<ValidatedConfig>,
) -> Result<HttpResponse> {
    let actor = resolve_actor(&req, config.as_ref());
    if actor.session_id.is_empty() {
        return Ok(HttpResponse::Unauthorized().json(json!({
            "error": "Authentication required"
        })));
    }
    if body.scope.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Scope is required"
        })));
    }
    let nonce = app_state.nonce_store.issue(&actor.session_id, &body.scope);
    Ok(HttpResponse::Ok().json(json!({
        "nonce": nonce,
        "expires_in_seconds": app_state.nonce_store.expiry_seconds(),
    })))
}

/// The action catalog (names, capabilities, nonce scopes) and the resolved
/// template catalog, so UI layers never duplicate these constants.
async fn catalog_api(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    config: web::Data<ValidatedConfig>,
) -> Result<HttpResponse> {
    let actor = resolve_actor(&req, config.as_ref());
    if actor.session_id.is_empty() {
        return Ok(HttpResponse::Unauthorized().json(json!({
            "error": "Authentication required"
        })));
    }
    Ok(HttpResponse::Ok().json(json!({
        "actions": app_state.dispatcher.catalog(),
        "templates": app_state.pipeline.list_templates(),
    })))
}
