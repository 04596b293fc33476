// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::Utc;
use nop_gallery::admin;
use nop_gallery::app_state::AppState;
use nop_gallery::config::{AdminConfig, ApiKeyConfig, AppConfig, ValidatedConfig};
use nop_gallery::media::{TrackedImage, YamlMediaLibrary};
use nop_gallery::public;
use nop_gallery::runtime_paths::RuntimePaths;
use nop_gallery::security::{ALL_CAPABILITIES, CAP_MANAGE_CATEGORIES};

pub const ADMIN_KEY: &str = "test-admin-key";
pub const LIMITED_KEY: &str = "test-limited-key";
pub const ADMIN_PATH: &str = "/admin";

pub struct TestHarness {
    pub fixture: tempfile::TempDir,
    pub runtime_paths: RuntimePaths,
    pub app_state: web::Data<AppState>,
    pub config_data: web::Data<ValidatedConfig>,
}

pub fn sample_image(id: u64, title: &str) -> TrackedImage {
    TrackedImage {
        id,
        title: title.to_string(),
        alt_text: String::new(),
        mime_type: "image/jpeg".to_string(),
        uploaded_at: Utc::now(),
        uploaded_by: "operator@example.com".to_string(),
        url: format!("/media/{}.jpg", id),
        width: Some(1600),
        height: Some(1200),
        file_size: Some(250_000),
    }
}

impl TestHarness {
    /// Fresh runtime root with three seeded media images and two API keys:
    /// a full admin and one limited to category management.
    pub fn new() -> Self {
        let fixture = tempfile::tempdir().expect("fixture root");
        let runtime_paths = RuntimePaths::from_root(fixture.path());
        runtime_paths
            .ensure_directories()
            .expect("runtime directories");

        let media =
            YamlMediaLibrary::open(runtime_paths.media_file.clone()).expect("media library");
        for (id, title) in [(1, "Shore"), (2, "Dunes"), (3, "Cliffs")] {
            media.insert(sample_image(id, title)).expect("seed image");
        }
        drop(media);

        let config = AppConfig {
            admin: AdminConfig {
                path: ADMIN_PATH.to_string(),
                api_keys: vec![
                    ApiKeyConfig {
                        id: "admin".to_string(),
                        key: ADMIN_KEY.to_string(),
                        capabilities: ALL_CAPABILITIES
                            .iter()
                            .map(|capability| capability.to_string())
                            .collect(),
                    },
                    ApiKeyConfig {
                        id: "limited".to_string(),
                        key: LIMITED_KEY.to_string(),
                        capabilities: vec![CAP_MANAGE_CATEGORIES.to_string()],
                    },
                ],
            },
            ..AppConfig::default()
        }
        .validate()
        .expect("test config");

        let app_state = AppState::build(&config, runtime_paths.clone()).expect("app state");

        Self {
            fixture,
            runtime_paths,
            app_state: web::Data::new(app_state),
            config_data: web::Data::new(config),
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.app_state.clone())
            .app_data(self.config_data.clone())
            .configure(|cfg| admin::configure(cfg, ADMIN_PATH))
            .configure(public::configure)
    }
}
