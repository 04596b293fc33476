// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Gallery and global-settings store, persisted as one YAML document.
//!
//! Mutations are read-entire-state, mutate-in-memory, write-entire-state;
//! the file write is atomic, the in-memory swap happens only after a
//! successful write. Concurrent writers are last-writer-wins; this store
//! does not attempt finer-grained locking.

use crate::errors::DomainError;
use crate::gallery::{
    DEFAULT_TEMPLATE, Gallery, GlobalTemplateSettings, Transition, clamp_columns,
};
use crate::util::yaml_store;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

const STORE_LABEL: &str = "galleries";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct GalleryFile {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    galleries: BTreeMap<u64, Gallery>,
    #[serde(default)]
    settings: BTreeMap<String, GlobalTemplateSettings>,
}

/// Fields accepted by create/update. Override members are the values to
/// store when overrides are applied; `None` stores "inherit".
#[derive(Debug, Default, Clone)]
pub struct GalleryFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub template: Option<String>,
    pub columns_override: Option<u8>,
    pub lightbox_override: Option<bool>,
    pub hover_zoom_override: Option<bool>,
    pub full_width_override: Option<bool>,
    pub transition_override: Option<Transition>,
}

/// Partial update for one template's global settings; only provided fields
/// are merged.
#[derive(Debug, Default, Clone)]
pub struct GlobalSettingsPatch {
    pub columns: Option<i64>,
    pub lightbox_enabled: Option<bool>,
    pub hover_zoom_enabled: Option<bool>,
    pub full_width: Option<bool>,
    pub transition: Option<Transition>,
}

pub struct GalleryStore {
    file: PathBuf,
    state: RwLock<GalleryFile>,
}

/// Drop non-positive ids and duplicates, preserving first-seen order.
pub fn normalize_image_ids(ids: &[u64]) -> Vec<u64> {
    let mut seen = Vec::new();
    for &id in ids {
        if id > 0 && !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

fn store_error(err: impl std::fmt::Display) -> DomainError {
    DomainError::upstream(format!("Gallery store error: {}", err))
}

fn normalized_template(raw: Option<String>) -> Option<String> {
    raw.map(|template| {
        let trimmed = template.trim().to_string();
        if trimmed.is_empty() {
            DEFAULT_TEMPLATE.to_string()
        } else {
            trimmed
        }
    })
}

impl GalleryStore {
    pub fn open(file: PathBuf) -> Result<Self, DomainError> {
        let mut state: GalleryFile = yaml_store::read_yaml_file(&file, STORE_LABEL)
            .map_err(store_error)?
            .unwrap_or_default();
        // The allocator never re-issues an id, even across restarts.
        let high_water = state.galleries.keys().next_back().copied().unwrap_or(0);
        state.next_id = state.next_id.max(high_water + 1).max(1);
        Ok(Self {
            file,
            state: RwLock::new(state),
        })
    }

    fn snapshot(&self) -> Result<GalleryFile, DomainError> {
        self.state
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| DomainError::upstream("Gallery store lock poisoned"))
    }

    fn commit<T>(
        &self,
        apply: impl FnOnce(&mut GalleryFile) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut next = self.snapshot()?;
        let result = apply(&mut next)?;
        yaml_store::write_yaml_file(&self.file, STORE_LABEL, &next).map_err(store_error)?;
        let mut guard = self
            .state
            .write()
            .map_err(|_| DomainError::upstream("Gallery store lock poisoned"))?;
        *guard = next;
        Ok(result)
    }

    /// Global settings for one template kind, materialized with defaults on
    /// first access.
    pub fn get_global_settings(&self, template: &str) -> Result<GlobalTemplateSettings, DomainError> {
        {
            let guard = self
                .state
                .read()
                .map_err(|_| DomainError::upstream("Gallery store lock poisoned"))?;
            if let Some(settings) = guard.settings.get(template) {
                return Ok(settings.clone());
            }
        }
        self.commit(|state| {
            Ok(state
                .settings
                .entry(template.to_string())
                .or_default()
                .clone())
        })
    }

    pub fn update_global_settings(
        &self,
        template: &str,
        patch: GlobalSettingsPatch,
    ) -> Result<GlobalTemplateSettings, DomainError> {
        self.commit(|state| {
            let settings = state.settings.entry(template.to_string()).or_default();
            if let Some(columns) = patch.columns {
                settings.columns = clamp_columns(columns);
            }
            if let Some(lightbox) = patch.lightbox_enabled {
                settings.lightbox_enabled = lightbox;
            }
            if let Some(hover_zoom) = patch.hover_zoom_enabled {
                settings.hover_zoom_enabled = hover_zoom;
            }
            if let Some(full_width) = patch.full_width {
                settings.full_width = full_width;
            }
            if let Some(transition) = patch.transition {
                settings.transition = transition;
            }
            settings.columns = clamp_columns(settings.columns as i64);
            Ok(settings.clone())
        })
    }

    pub fn list_galleries(&self) -> Result<Vec<Gallery>, DomainError> {
        let guard = self
            .state
            .read()
            .map_err(|_| DomainError::upstream("Gallery store lock poisoned"))?;
        Ok(guard.galleries.values().cloned().collect())
    }

    pub fn gallery(&self, id: u64) -> Result<Gallery, DomainError> {
        let guard = self
            .state
            .read()
            .map_err(|_| DomainError::upstream("Gallery store lock poisoned"))?;
        guard
            .galleries
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Gallery {} not found", id)))
    }

    pub fn create_gallery(&self, fields: GalleryFields) -> Result<Gallery, DomainError> {
        let name = fields
            .name
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_string();
        if name.is_empty() {
            return Err(DomainError::validation("Gallery name is required"));
        }
        self.commit(move |state| {
            let id = state.next_id;
            state.next_id += 1;
            let gallery = Gallery {
                id,
                name,
                description: fields.description.unwrap_or_default(),
                template: normalized_template(fields.template)
                    .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
                columns_override: fields
                    .columns_override
                    .map(|columns| clamp_columns(columns as i64)),
                lightbox_override: fields.lightbox_override,
                hover_zoom_override: fields.hover_zoom_override,
                full_width_override: fields.full_width_override,
                transition_override: fields.transition_override,
                created_at: Utc::now(),
                image_ids: Vec::new(),
            };
            state.galleries.insert(id, gallery.clone());
            log::info!("Created gallery {} ('{}')", id, gallery.name);
            Ok(gallery)
        })
    }

    /// Update name/description/template, and the override record only when
    /// `apply_overrides` is set. A plain rename never touches stored
    /// overrides; that asymmetry is part of the store's contract.
    pub fn update_gallery(
        &self,
        id: u64,
        fields: GalleryFields,
        apply_overrides: bool,
    ) -> Result<Gallery, DomainError> {
        if let Some(name) = fields.name.as_deref()
            && name.trim().is_empty()
        {
            return Err(DomainError::validation("Gallery name is required"));
        }
        self.commit(move |state| {
            let gallery = state
                .galleries
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found(format!("Gallery {} not found", id)))?;
            if let Some(name) = fields.name {
                gallery.name = name.trim().to_string();
            }
            if let Some(description) = fields.description {
                gallery.description = description;
            }
            if let Some(template) = normalized_template(fields.template) {
                gallery.template = template;
            }
            if apply_overrides {
                gallery.columns_override = fields
                    .columns_override
                    .map(|columns| clamp_columns(columns as i64));
                gallery.lightbox_override = fields.lightbox_override;
                gallery.hover_zoom_override = fields.hover_zoom_override;
                gallery.full_width_override = fields.full_width_override;
                gallery.transition_override = fields.transition_override;
            }
            Ok(gallery.clone())
        })
    }

    pub fn delete_gallery(&self, id: u64) -> Result<(), DomainError> {
        self.commit(|state| {
            if state.galleries.remove(&id).is_none() {
                return Err(DomainError::not_found(format!("Gallery {} not found", id)));
            }
            log::info!("Deleted gallery {}", id);
            Ok(())
        })
    }

    /// Replace a gallery's image list, order preserved exactly as given.
    pub fn set_gallery_images(&self, id: u64, image_ids: &[u64]) -> Result<Gallery, DomainError> {
        let image_ids = normalize_image_ids(image_ids);
        self.commit(move |state| {
            let gallery = state
                .galleries
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found(format!("Gallery {} not found", id)))?;
            gallery.image_ids = image_ids;
            Ok(gallery.clone())
        })
    }

    /// Union new image ids into a gallery, appending at the end of the
    /// existing order.
    pub fn add_images_to_gallery(
        &self,
        id: u64,
        image_ids: &[u64],
    ) -> Result<Gallery, DomainError> {
        let image_ids = normalize_image_ids(image_ids);
        self.commit(move |state| {
            let gallery = state
                .galleries
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found(format!("Gallery {} not found", id)))?;
            for image_id in image_ids {
                if !gallery.image_ids.contains(&image_id) {
                    gallery.image_ids.push(image_id);
                }
            }
            Ok(gallery.clone())
        })
    }

    /// Replace one image's membership across all galleries: remove it from
    /// every gallery not in `gallery_ids`, append it to every gallery in the
    /// set it is not yet part of. Unknown gallery ids are dropped silently.
    /// Returns the image's resulting membership.
    pub fn set_image_galleries(
        &self,
        image_id: u64,
        gallery_ids: &[u64],
    ) -> Result<Vec<u64>, DomainError> {
        if image_id == 0 {
            return Err(DomainError::validation("Image id must be positive"));
        }
        let wanted: Vec<u64> = gallery_ids.iter().copied().filter(|&id| id > 0).collect();
        self.commit(move |state| {
            let mut membership = Vec::new();
            for (gallery_id, gallery) in state.galleries.iter_mut() {
                let should_contain = wanted.contains(gallery_id);
                let contains = gallery.image_ids.contains(&image_id);
                if should_contain && !contains {
                    gallery.image_ids.push(image_id);
                } else if !should_contain && contains {
                    gallery.image_ids.retain(|&id| id != image_id);
                }
                if should_contain {
                    membership.push(*gallery_id);
                }
            }
            Ok(membership)
        })
    }

    pub fn gallery_ids_for_image(&self, image_id: u64) -> Result<Vec<u64>, DomainError> {
        let guard = self
            .state
            .read()
            .map_err(|_| DomainError::upstream("Gallery store lock poisoned"))?;
        Ok(guard
            .galleries
            .iter()
            .filter(|(_, gallery)| gallery.image_ids.contains(&image_id))
            .map(|(&id, _)| id)
            .collect())
    }
}
