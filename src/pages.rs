// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Page creation collaborator: publishing a gallery as a standalone page.
//! The host CMS owns pages and navigation; this module only hands over a
//! title and a body embedding the gallery shortcode.

use crate::errors::DomainError;
use crate::gallery::Gallery;
use crate::terms::slugify;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedPage {
    pub title: String,
    pub path: String,
}

pub trait PagePublisher: Send + Sync {
    fn publish_gallery_page(&self, gallery: &Gallery) -> Result<PublishedPage, DomainError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PageRecord {
    title: String,
    body: String,
}

/// Writes page stubs into the host's pages directory. Failures surface as
/// upstream errors; the dispatch layer reports them without retry.
pub struct YamlPagePublisher {
    pages_dir: PathBuf,
}

impl YamlPagePublisher {
    pub fn new(pages_dir: PathBuf) -> Self {
        Self { pages_dir }
    }
}

impl PagePublisher for YamlPagePublisher {
    fn publish_gallery_page(&self, gallery: &Gallery) -> Result<PublishedPage, DomainError> {
        let slug = {
            let base = slugify(&gallery.name);
            if base.is_empty() {
                format!("gallery-{}", gallery.id)
            } else {
                base
            }
        };
        fs::create_dir_all(&self.pages_dir).map_err(|err| {
            DomainError::upstream(format!("Failed to create pages directory: {}", err))
        })?;
        let record = PageRecord {
            title: gallery.name.clone(),
            body: format!("((gallery id={}))", gallery.id),
        };
        crate::util::yaml_store::write_yaml_file(
            &self.pages_dir.join(format!("{}.yaml", slug)),
            "page",
            &record,
        )
        .map_err(|err| DomainError::upstream(format!("Page creation failed: {}", err)))?;
        log::info!("Published gallery {} as page '{}'", gallery.id, slug);
        Ok(PublishedPage {
            title: gallery.name.clone(),
            path: format!("/{}", slug),
        })
    }
}
