// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Markup emission for a render tree. The template slug picks the embedded
//! minijinja template; unknown slugs fall through to the basic grid so a
//! tree produced against a custom catalog still renders.

use crate::render::RenderTree;
use crate::templates::TemplateEngine;
use minijinja::Value;

pub fn render_tree_html(
    engine: &dyn TemplateEngine,
    tree: &RenderTree,
) -> Result<String, minijinja::Error> {
    if tree.is_empty() {
        return Ok(String::new());
    }
    let template_name = match tree.template.as_str() {
        "masonry" => "render/masonry.html",
        _ => "render/basic_grid.html",
    };
    engine.render(template_name, Value::from_serialize(tree))
}
