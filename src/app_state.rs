// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use crate::config::ValidatedConfig;
use crate::dispatch::{DispatchContext, Dispatcher, builtin_registrations};
use crate::errors::DomainError;
use crate::gallery::GalleryStore;
use crate::media::{MediaLibrary, YamlMediaLibrary};
use crate::pages::YamlPagePublisher;
use crate::render::RenderPipeline;
use crate::runtime_paths::RuntimePaths;
use crate::security::ActorCapabilityGate;
use crate::templates::{MiniJinjaEngine, TemplateEngine};
use crate::util::NonceStore;

pub struct AppState {
    pub templates: Arc<dyn TemplateEngine>,
    pub dispatcher: Arc<Dispatcher>,
    pub pipeline: Arc<RenderPipeline>,
    pub nonce_store: Arc<NonceStore>,
    pub runtime_paths: RuntimePaths,
}

impl AppState {
    /// Assemble stores, pipeline, and dispatcher from the runtime layout.
    pub fn build(
        config: &ValidatedConfig,
        runtime_paths: RuntimePaths,
    ) -> Result<Self, DomainError> {
        let store = Arc::new(GalleryStore::open(runtime_paths.galleries_file.clone())?);
        let terms = Arc::new(crate::terms::TermStore::open(
            runtime_paths.terms_file.clone(),
        )?);
        let media: Arc<dyn MediaLibrary> =
            Arc::new(YamlMediaLibrary::open(runtime_paths.media_file.clone())?);
        let public_galleries = config.public_galleries;
        let pipeline = Arc::new(
            RenderPipeline::new(store.clone(), media.clone())
                .with_render_gate(Arc::new(move || public_galleries)),
        );
        let context = Arc::new(DispatchContext {
            store,
            terms,
            media,
            pages: Arc::new(YamlPagePublisher::new(runtime_paths.pages_dir.clone())),
            pipeline: pipeline.clone(),
        });
        let nonce_store = Arc::new(NonceStore::new());
        let dispatcher = Arc::new(Dispatcher::new(
            builtin_registrations(),
            Arc::new(ActorCapabilityGate),
            nonce_store.clone(),
            context,
        ));
        Ok(Self {
            templates: Arc::new(MiniJinjaEngine::new()),
            dispatcher,
            pipeline,
            nonce_store,
            runtime_paths,
        })
    }
}
