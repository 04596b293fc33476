// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Anti-forgery nonce store. Tokens are UUIDs bound to a (session, scope)
//! pair, renewed on successful validation and expired after one hour. All
//! state lives on a dedicated worker thread; callers talk to it over a
//! channel, so the store itself needs no locking.

use crate::dispatch::NonceGate;
use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use uuid::Uuid;

const NONCE_EXPIRY_SECONDS: u64 = 3600;

#[derive(Clone, Debug)]
struct NonceData {
    created_at: Instant,
    session_id: String,
    scope: String,
}

enum NonceCommand {
    IssueOrRefresh {
        session_id: String,
        scope: String,
        reply: mpsc::Sender<String>,
    },
    ValidateAndRenew {
        token: String,
        session_id: String,
        scope: String,
        reply: mpsc::Sender<bool>,
    },
    CleanupSession {
        session_id: String,
    },
}

#[derive(Clone)]
pub struct NonceStore {
    sender: mpsc::Sender<NonceCommand>,
}

impl NonceStore {
    pub fn new() -> Self {
        Self {
            sender: start_nonce_worker(),
        }
    }

    pub fn expiry_seconds(&self) -> u64 {
        NONCE_EXPIRY_SECONDS
    }

    fn request<T>(&self, build: impl FnOnce(mpsc::Sender<T>) -> NonceCommand, fallback: T) -> T {
        let (reply, receive) = mpsc::channel();
        if self.sender.send(build(reply)).is_err() {
            log::error!("Nonce store channel closed");
            return fallback;
        }
        receive.recv().unwrap_or(fallback)
    }

    /// Returns the session's existing token for the scope (refreshed) or a
    /// new one.
    pub fn issue(&self, session_id: &str, scope: &str) -> String {
        self.request(
            |reply| NonceCommand::IssueOrRefresh {
                session_id: session_id.to_string(),
                scope: scope.to_string(),
                reply,
            },
            String::new(),
        )
    }

    /// Validates a token against session and scope. A valid token is
    /// renewed rather than consumed; a token presented for the wrong
    /// session or scope is removed.
    pub fn validate_and_renew(&self, token: &str, session_id: &str, scope: &str) -> bool {
        self.request(
            |reply| NonceCommand::ValidateAndRenew {
                token: token.to_string(),
                session_id: session_id.to_string(),
                scope: scope.to_string(),
                reply,
            },
            false,
        )
    }

    /// Drop all tokens of a session (host logout hook).
    pub fn cleanup_session(&self, session_id: &str) {
        if self
            .sender
            .send(NonceCommand::CleanupSession {
                session_id: session_id.to_string(),
            })
            .is_err()
        {
            log::error!("Nonce store channel closed");
        }
    }
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NonceGate for NonceStore {
    fn verify(&self, token: &str, session_id: &str, scope: &str) -> bool {
        self.validate_and_renew(token, session_id, scope)
    }
}

fn start_nonce_worker() -> mpsc::Sender<NonceCommand> {
    let (sender, receiver) = mpsc::channel();
    let thread = thread::Builder::new().name("nonce-store".to_string());
    if let Err(err) = thread.spawn(move || run_nonce_worker(receiver)) {
        log::error!("Nonce store worker failed to start: {}", err);
    }
    sender
}

fn run_nonce_worker(receiver: mpsc::Receiver<NonceCommand>) {
    let mut tokens: HashMap<String, NonceData> = HashMap::new();
    while let Ok(command) = receiver.recv() {
        let now = Instant::now();
        tokens.retain(|_, data| {
            now.duration_since(data.created_at) < Duration::from_secs(NONCE_EXPIRY_SECONDS)
        });
        match command {
            NonceCommand::IssueOrRefresh {
                session_id,
                scope,
                reply,
            } => {
                let mut refreshed = None;
                for (token, data) in tokens.iter_mut() {
                    if data.session_id == session_id && data.scope == scope {
                        data.created_at = now;
                        refreshed = Some(token.clone());
                        break;
                    }
                }
                let token = refreshed.unwrap_or_else(|| {
                    let token = Uuid::new_v4().to_string();
                    tokens.insert(
                        token.clone(),
                        NonceData {
                            created_at: now,
                            session_id: session_id.clone(),
                            scope: scope.clone(),
                        },
                    );
                    log::debug!("Issued nonce for session '{}' scope '{}'", session_id, scope);
                    token
                });
                let _ = reply.send(token);
            }
            NonceCommand::ValidateAndRenew {
                token,
                session_id,
                scope,
                reply,
            } => {
                let valid = match tokens.get_mut(&token) {
                    Some(data) => {
                        if data.session_id == session_id && data.scope == scope {
                            data.created_at = now;
                            true
                        } else {
                            log::warn!(
                                "Nonce presented for wrong session/scope (expected scope '{}', got '{}')",
                                data.scope,
                                scope
                            );
                            tokens.remove(&token);
                            false
                        }
                    }
                    None => false,
                };
                let _ = reply.send(valid);
            }
            NonceCommand::CleanupSession { session_id } => {
                tokens.retain(|_, data| data.session_id != session_id);
            }
        }
    }
}
