// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod shortcode;

use crate::app_state::AppState;
use crate::render::RenderAttributes;
use crate::render::RenderPipeline;
use crate::render::html::render_tree_html;
use crate::templates::TemplateEngine;
use actix_web::{HttpResponse, Result, web};
use serde::Deserialize;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/galleries/{id}", web::get().to(gallery_page));
}

#[derive(Debug, Deserialize)]
pub struct GalleryPageQuery {
    #[serde(default)]
    template: Option<String>,
}

/// Public single-gallery page. The template query parameter mirrors the
/// shortcode attribute; everything else resolves from stored settings.
async fn gallery_page(
    path: web::Path<u64>,
    query: web::Query<GalleryPageQuery>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let attributes = RenderAttributes {
        template: query
            .template
            .clone()
            .filter(|template| !template.is_empty()),
    };
    let tree = app_state.pipeline.render(Some(id), &attributes);
    if tree.is_empty() {
        return Ok(HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body("<h1>Gallery not found</h1>"));
    }

    let body = match render_tree_html(app_state.templates.as_ref(), &tree) {
        Ok(body) => body,
        Err(err) => {
            log::error!("Gallery {} render failed: {}", id, err);
            return Ok(HttpResponse::InternalServerError()
                .content_type("text/html; charset=utf-8")
                .body("<h1>Render error</h1>"));
        }
    };
    let title = tree
        .sections
        .first()
        .map(|section| section.name.clone())
        .unwrap_or_else(|| "Galleries".to_string());

    match app_state.templates.render(
        "public/gallery_page.html",
        minijinja::context! { title => title, body => body },
    ) {
        Ok(page) => Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(page)),
        Err(err) => {
            log::error!("Gallery page shell render failed: {}", err);
            Ok(HttpResponse::InternalServerError()
                .content_type("text/html; charset=utf-8")
                .body("<h1>Render error</h1>"))
        }
    }
}

/// Replace every gallery shortcode in host page text with rendered markup.
/// An empty render (unknown gallery, permission denial) replaces the
/// shortcode with nothing; only an engine failure leaves it in place.
pub fn process_page_text(
    text: &str,
    pipeline: &RenderPipeline,
    engine: &dyn TemplateEngine,
) -> String {
    shortcode::process_page_text(text, |parsed| {
        let tree = pipeline.render(parsed.gallery_id(), &parsed.render_attributes());
        render_tree_html(engine, &tree).ok()
    })
}
