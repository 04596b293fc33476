// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Override resolution: global template settings vs. per-gallery overrides.
//!
//! Pure and total. Each attribute resolves independently: a non-null gallery
//! override wins, otherwise the global value applies. Columns are clamped on
//! the way out so a stored out-of-range value can never leak into a render.
//! Callers rendering several galleries on one page invoke this once per
//! gallery; `full_width` in particular is only meaningful per gallery and is
//! always taken from the gallery being resolved, never from a page-level
//! aggregate.

use crate::gallery::{EffectiveDisplay, Gallery, GlobalTemplateSettings, clamp_columns};

pub fn resolve(global: &GlobalTemplateSettings, gallery: &Gallery) -> EffectiveDisplay {
    let columns = gallery.columns_override.unwrap_or(global.columns);
    EffectiveDisplay {
        columns: clamp_columns(columns as i64),
        lightbox_enabled: gallery.lightbox_override.unwrap_or(global.lightbox_enabled),
        hover_zoom_enabled: gallery
            .hover_zoom_override
            .unwrap_or(global.hover_zoom_enabled),
        full_width: gallery.full_width_override.unwrap_or(global.full_width),
        transition: gallery.transition_override.unwrap_or(global.transition),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::{MAX_COLUMNS, MIN_COLUMNS, Transition};
    use chrono::Utc;

    fn gallery() -> Gallery {
        Gallery {
            id: 1,
            name: "Test".to_string(),
            description: String::new(),
            template: "basic-grid".to_string(),
            columns_override: None,
            lightbox_override: None,
            hover_zoom_override: None,
            full_width_override: None,
            transition_override: None,
            created_at: Utc::now(),
            image_ids: Vec::new(),
        }
    }

    #[test]
    fn inherits_all_globals_when_no_overrides() {
        let global = GlobalTemplateSettings::default();
        let effective = resolve(&global, &gallery());
        assert_eq!(effective.columns, global.columns);
        assert_eq!(effective.lightbox_enabled, global.lightbox_enabled);
        assert_eq!(effective.hover_zoom_enabled, global.hover_zoom_enabled);
        assert_eq!(effective.full_width, global.full_width);
        assert_eq!(effective.transition, global.transition);
    }

    #[test]
    fn overrides_win_per_attribute() {
        let global = GlobalTemplateSettings {
            columns: 2,
            lightbox_enabled: true,
            hover_zoom_enabled: false,
            full_width: false,
            transition: Transition::None,
        };
        let mut g = gallery();
        g.columns_override = Some(5);
        g.lightbox_override = Some(false);
        g.hover_zoom_override = Some(true);
        g.full_width_override = Some(true);

        let effective = resolve(&global, &g);
        assert_eq!(effective.columns, 5);
        assert!(!effective.lightbox_enabled);
        assert!(effective.hover_zoom_enabled);
        assert!(effective.full_width);
        assert_eq!(effective.transition, Transition::None);
    }

    #[test]
    fn explicit_false_is_not_inherit() {
        let global = GlobalTemplateSettings {
            lightbox_enabled: true,
            ..GlobalTemplateSettings::default()
        };
        let mut g = gallery();
        g.lightbox_override = Some(false);
        assert!(!resolve(&global, &g).lightbox_enabled);

        g.lightbox_override = None;
        assert!(resolve(&global, &g).lightbox_enabled);
    }

    #[test]
    fn columns_always_in_range() {
        // Stored values can predate the clamp; resolution repairs them.
        let mut global = GlobalTemplateSettings::default();
        global.columns = 0;
        let mut g = gallery();
        assert_eq!(resolve(&global, &g).columns, MIN_COLUMNS);

        g.columns_override = Some(200);
        assert_eq!(resolve(&global, &g).columns, MAX_COLUMNS);
    }

    #[test]
    fn transition_override_wins() {
        let global = GlobalTemplateSettings {
            transition: Transition::Slide,
            ..GlobalTemplateSettings::default()
        };
        let mut g = gallery();
        assert_eq!(resolve(&global, &g).transition, Transition::Slide);
        g.transition_override = Some(Transition::Implode);
        assert_eq!(resolve(&global, &g).transition, Transition::Implode);
    }
}
