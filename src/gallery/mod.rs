// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod overrides;
pub mod resolve;
pub mod store;

pub use overrides::{
    INHERIT_TOKEN, decode_bool_override, decode_columns_override, decode_transition_override,
    encode_bool_override, encode_columns_override, encode_transition_override,
};
pub use resolve::resolve;
pub use store::{GalleryFields, GalleryStore, GlobalSettingsPatch};

pub const MIN_COLUMNS: u8 = 2;
pub const MAX_COLUMNS: u8 = 6;
pub const DEFAULT_COLUMNS: u8 = 4;
pub const DEFAULT_TEMPLATE: &str = "basic-grid";

/// Client-side viewer transition effect for the lightbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    None,
    Slide,
    Fade,
    Explode,
    Implode,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::None => "none",
            Transition::Slide => "slide",
            Transition::Fade => "fade",
            Transition::Explode => "explode",
            Transition::Implode => "implode",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Transition::None),
            "slide" => Some(Transition::Slide),
            "fade" => Some(Transition::Fade),
            "explode" => Some(Transition::Explode),
            "implode" => Some(Transition::Implode),
            _ => None,
        }
    }
}

pub fn clamp_columns(value: i64) -> u8 {
    value.clamp(MIN_COLUMNS as i64, MAX_COLUMNS as i64) as u8
}

/// Site-wide display settings for one template kind. Every field holds a
/// concrete value; "inherit" only exists on the per-gallery override side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalTemplateSettings {
    pub columns: u8,
    pub lightbox_enabled: bool,
    pub hover_zoom_enabled: bool,
    pub full_width: bool,
    pub transition: Transition,
}

impl Default for GlobalTemplateSettings {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            lightbox_enabled: true,
            hover_zoom_enabled: true,
            full_width: false,
            transition: Transition::None,
        }
    }
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

/// A named, ordered collection of image ids with per-attribute display
/// overrides. `None` in an override field means "inherit the global value";
/// it is a stored state of its own, distinct from an explicit `false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gallery {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default)]
    pub columns_override: Option<u8>,
    #[serde(default)]
    pub lightbox_override: Option<bool>,
    #[serde(default)]
    pub hover_zoom_override: Option<bool>,
    #[serde(default)]
    pub full_width_override: Option<bool>,
    #[serde(default)]
    pub transition_override: Option<Transition>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub image_ids: Vec<u64>,
}

/// The per-gallery display attributes after override resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveDisplay {
    pub columns: u8,
    pub lightbox_enabled: bool,
    pub hover_zoom_enabled: bool,
    pub full_width: bool,
    pub transition: Transition,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_parse_is_case_insensitive() {
        assert_eq!(Transition::parse("FADE"), Some(Transition::Fade));
        assert_eq!(Transition::parse("  slide "), Some(Transition::Slide));
        assert_eq!(Transition::parse("wipe"), None);
    }

    #[test]
    fn clamp_columns_bounds() {
        assert_eq!(clamp_columns(1), MIN_COLUMNS);
        assert_eq!(clamp_columns(4), 4);
        assert_eq!(clamp_columns(99), MAX_COLUMNS);
        assert_eq!(clamp_columns(-3), MIN_COLUMNS);
    }

    #[test]
    fn global_settings_defaults() {
        let settings = GlobalTemplateSettings::default();
        assert_eq!(settings.columns, 4);
        assert!(settings.lightbox_enabled);
        assert!(settings.hover_zoom_enabled);
        assert!(!settings.full_width);
        assert_eq!(settings.transition, Transition::None);
    }
}
