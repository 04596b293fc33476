// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Action dispatch: named operations behind capability and nonce checks.
//!
//! Per-request state machine: Unvalidated → CapabilityChecked →
//! NonceChecked → Dispatched → {Succeeded, Failed}. The capability check
//! always runs before the nonce check, so an unauthorized caller learns
//! nothing about nonce validity. An empty nonce scope on a registration
//! bypasses the nonce check entirely; that fail-open is an explicit opt-out
//! reserved for read-only catalog actions and is logged when taken.
//!
//! The dispatcher is built with its full action map up front; there is no
//! ambient registration.

pub mod actions;
pub mod payload;

pub use actions::builtin_registrations;
pub use payload::Payload;

use crate::errors::DomainError;
use crate::gallery::GalleryStore;
use crate::media::MediaLibrary;
use crate::pages::PagePublisher;
use crate::render::RenderPipeline;
use crate::security::{Actor, CapabilityGate};
use crate::terms::TermStore;
use futures_util::future::BoxFuture;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

pub trait NonceGate: Send + Sync {
    fn verify(&self, token: &str, session_id: &str, scope: &str) -> bool;
}

/// Post-dispatch hook: may extend or rewrite a successful response before
/// it is sent. Applied in registration order.
pub trait ResponseTransform: Send + Sync {
    fn apply(&self, action: &str, data: Value) -> Value;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ActionDescriptor {
    pub name: &'static str,
    pub capability: &'static str,
    pub nonce_scope: &'static str,
}

pub type ActionHandler = Arc<
    dyn Fn(Payload, Arc<DispatchContext>) -> BoxFuture<'static, Result<Value, DomainError>>
        + Send
        + Sync,
>;

pub struct ActionRegistration {
    pub descriptor: ActionDescriptor,
    pub handler: ActionHandler,
}

/// Shared collaborators handed to every handler.
pub struct DispatchContext {
    pub store: Arc<GalleryStore>,
    pub terms: Arc<TermStore>,
    pub media: Arc<dyn MediaLibrary>,
    pub pages: Arc<dyn PagePublisher>,
    pub pipeline: Arc<RenderPipeline>,
}

/// One parsed inbound request: action name, anti-forgery token, and the
/// flat payload map.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action: String,
    pub nonce: String,
    pub payload: Payload,
}

/// Terminal result of a dispatch, transport-agnostic: a status class and
/// the response body.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub status: u16,
    pub body: Value,
}

impl DispatchOutcome {
    fn success(data: Value) -> Self {
        Self {
            status: 200,
            body: json!({"success": true, "data": data}),
        }
    }

    fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({"success": false, "message": message.into()}),
        }
    }
}

pub struct Dispatcher {
    actions: BTreeMap<&'static str, ActionRegistration>,
    capability_gate: Arc<dyn CapabilityGate>,
    nonce_gate: Arc<dyn NonceGate>,
    context: Arc<DispatchContext>,
    transforms: Vec<Arc<dyn ResponseTransform>>,
}

impl Dispatcher {
    /// Build a dispatcher from its full action map. Malformed registrations
    /// (empty name or capability, duplicate name) are logged and skipped,
    /// never fatal.
    pub fn new(
        registrations: Vec<ActionRegistration>,
        capability_gate: Arc<dyn CapabilityGate>,
        nonce_gate: Arc<dyn NonceGate>,
        context: Arc<DispatchContext>,
    ) -> Self {
        let mut actions = BTreeMap::new();
        for registration in registrations {
            let descriptor = &registration.descriptor;
            if descriptor.name.is_empty() || descriptor.capability.is_empty() {
                log::warn!(
                    "Skipping malformed action registration '{}'",
                    descriptor.name
                );
                continue;
            }
            if actions.contains_key(descriptor.name) {
                log::warn!("Skipping duplicate action registration '{}'", descriptor.name);
                continue;
            }
            actions.insert(descriptor.name, registration);
        }
        Self {
            actions,
            capability_gate,
            nonce_gate,
            context,
            transforms: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: Arc<dyn ResponseTransform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// The published action catalog, for UI layers that need to construct
    /// aligned action names and nonce scopes.
    pub fn catalog(&self) -> Vec<ActionDescriptor> {
        self.actions
            .values()
            .map(|registration| registration.descriptor.clone())
            .collect()
    }

    pub async fn dispatch(&self, actor: &Actor, request: ActionRequest) -> DispatchOutcome {
        let registration = match self.actions.get(request.action.as_str()) {
            Some(registration) => registration,
            None => {
                log::debug!("Unknown action '{}'", request.action);
                return DispatchOutcome::failure(404, "Unknown action");
            }
        };
        let descriptor = &registration.descriptor;

        if !self
            .capability_gate
            .allows(actor, descriptor.capability)
        {
            log::debug!(
                "Capability '{}' denied for action '{}'",
                descriptor.capability,
                descriptor.name
            );
            return DispatchOutcome::failure(403, "Not allowed");
        }

        if descriptor.nonce_scope.is_empty() {
            log::debug!("Nonce check bypassed for action '{}'", descriptor.name);
        } else if !self.nonce_gate.verify(
            &request.nonce,
            &actor.session_id,
            descriptor.nonce_scope,
        ) {
            return DispatchOutcome::failure(403, "Nonce verification failed");
        }

        match (registration.handler)(request.payload, self.context.clone()).await {
            Ok(mut data) => {
                if let Value::Object(fields) = &mut data {
                    fields.insert("action".to_string(), Value::String(descriptor.name.into()));
                }
                for transform in &self.transforms {
                    data = transform.apply(descriptor.name, data);
                }
                DispatchOutcome::success(data)
            }
            Err(err) => {
                log::debug!("Action '{}' failed: {}", descriptor.name, err);
                DispatchOutcome::failure(err.kind().status(), err.message())
            }
        }
    }
}
