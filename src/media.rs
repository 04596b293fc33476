// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Attachment metadata collaborator. The gallery module never owns image
//! files; it reads metadata from the media library and writes back only
//! through the narrow `update_meta` interface.

use crate::errors::DomainError;
use crate::util::yaml_store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

const STORE_LABEL: &str = "media";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedImage {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub alt_text: String,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub uploaded_by: String,
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Default, Clone)]
pub struct ImageMetaUpdate {
    pub title: Option<String>,
    pub alt_text: Option<String>,
}

pub trait MediaLibrary: Send + Sync {
    fn image(&self, id: u64) -> Option<TrackedImage>;

    fn contains(&self, id: u64) -> bool {
        self.image(id).is_some()
    }

    fn update_meta(&self, id: u64, update: ImageMetaUpdate) -> Result<TrackedImage, DomainError>;
}

/// YAML-backed media library. Production deployments point this at the
/// upload pipeline's metadata file; tests seed it directly.
pub struct YamlMediaLibrary {
    file: PathBuf,
    state: RwLock<BTreeMap<u64, TrackedImage>>,
}

fn store_error(err: impl std::fmt::Display) -> DomainError {
    DomainError::upstream(format!("Media library error: {}", err))
}

impl YamlMediaLibrary {
    pub fn open(file: PathBuf) -> Result<Self, DomainError> {
        let state: BTreeMap<u64, TrackedImage> = yaml_store::read_yaml_file(&file, STORE_LABEL)
            .map_err(store_error)?
            .unwrap_or_default();
        Ok(Self {
            file,
            state: RwLock::new(state),
        })
    }

    pub fn insert(&self, image: TrackedImage) -> Result<(), DomainError> {
        let mut next = self
            .state
            .read()
            .map_err(|_| DomainError::upstream("Media library lock poisoned"))?
            .clone();
        next.insert(image.id, image);
        yaml_store::write_yaml_file(&self.file, STORE_LABEL, &next).map_err(store_error)?;
        let mut guard = self
            .state
            .write()
            .map_err(|_| DomainError::upstream("Media library lock poisoned"))?;
        *guard = next;
        Ok(())
    }
}

impl MediaLibrary for YamlMediaLibrary {
    fn image(&self, id: u64) -> Option<TrackedImage> {
        self.state
            .read()
            .ok()
            .and_then(|guard| guard.get(&id).cloned())
    }

    fn update_meta(&self, id: u64, update: ImageMetaUpdate) -> Result<TrackedImage, DomainError> {
        let mut next = self
            .state
            .read()
            .map_err(|_| DomainError::upstream("Media library lock poisoned"))?
            .clone();
        let image = next
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("Image {} not found", id)))?;
        if let Some(title) = update.title {
            image.title = title.trim().to_string();
        }
        if let Some(alt_text) = update.alt_text {
            image.alt_text = alt_text.trim().to_string();
        }
        let updated = image.clone();
        yaml_store::write_yaml_file(&self.file, STORE_LABEL, &next).map_err(store_error)?;
        let mut guard = self
            .state
            .write()
            .map_err(|_| DomainError::upstream("Media library lock poisoned"))?;
        *guard = next;
        Ok(updated)
    }
}

#[cfg(test)]
pub fn test_image(id: u64, title: &str) -> TrackedImage {
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
