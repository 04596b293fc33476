// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! The built-in action catalog. Every handler decodes its payload into a
//! typed command first; domain logic only ever sees the command structs.
//! Gallery overrides travel as wire tokens ("inherit", "1"/"0", effect
//! literals) in both directions.

use crate::dispatch::{
    ActionDescriptor, ActionRegistration, DispatchContext, Payload,
};
use crate::errors::DomainError;
use crate::gallery::{
    DEFAULT_TEMPLATE, Gallery, GalleryFields, GlobalSettingsPatch, decode_bool_override,
    decode_columns_override, decode_transition_override, encode_bool_override,
    encode_columns_override, encode_transition_override,
};
use crate::security::{
    CAP_MANAGE_CATEGORIES, CAP_MANAGE_GALLERIES, CAP_MANAGE_MEDIA, CAP_MANAGE_SETTINGS,
    CAP_PUBLISH_PAGES,
};
use futures_util::future::BoxFuture;
use serde_json::{Value, json};
use std::sync::Arc;

pub const SCOPE_GALLERY_ADMIN: &str = "gallery-admin";
pub const SCOPE_CATEGORY_ADMIN: &str = "category-admin";

const DEFAULT_SUGGEST_LIMIT: usize = 10;

type HandlerFn = fn(Payload, Arc<DispatchContext>) -> BoxFuture<'static, Result<Value, DomainError>>;

fn registration(
    name: &'static str,
    capability: &'static str,
    nonce_scope: &'static str,
    handler: HandlerFn,
) -> ActionRegistration {
    ActionRegistration {
        descriptor: ActionDescriptor {
            name,
            capability,
            nonce_scope,
        },
        handler: Arc::new(handler),
    }
}

/// The full action map handed to the dispatcher at construction time.
pub fn builtin_registrations() -> Vec<ActionRegistration> {
    vec![
        registration(
            "gallery/list",
            CAP_MANAGE_GALLERIES,
            SCOPE_GALLERY_ADMIN,
            gallery_list,
        ),
        registration(
            "gallery/create",
            CAP_MANAGE_GALLERIES,
            SCOPE_GALLERY_ADMIN,
            gallery_create,
        ),
        registration(
            "gallery/rename",
            CAP_MANAGE_GALLERIES,
            SCOPE_GALLERY_ADMIN,
            gallery_rename,
        ),
        registration(
            "gallery/update",
            CAP_MANAGE_GALLERIES,
            SCOPE_GALLERY_ADMIN,
            gallery_update,
        ),
        registration(
            "gallery/delete",
            CAP_MANAGE_GALLERIES,
            SCOPE_GALLERY_ADMIN,
            gallery_delete,
        ),
        registration(
            "gallery/set_images",
            CAP_MANAGE_GALLERIES,
            SCOPE_GALLERY_ADMIN,
            gallery_set_images,
        ),
        registration(
            "gallery/add_images",
            CAP_MANAGE_GALLERIES,
            SCOPE_GALLERY_ADMIN,
            gallery_add_images,
        ),
        registration(
            "gallery/publish_page",
            CAP_PUBLISH_PAGES,
            SCOPE_GALLERY_ADMIN,
            gallery_publish_page,
        ),
        registration(
            "image/set_galleries",
            CAP_MANAGE_GALLERIES,
            SCOPE_GALLERY_ADMIN,
            image_set_galleries,
        ),
        registration(
            "image/galleries",
            CAP_MANAGE_GALLERIES,
            SCOPE_GALLERY_ADMIN,
            image_galleries,
        ),
        registration(
            "image/update_meta",
            CAP_MANAGE_MEDIA,
            SCOPE_GALLERY_ADMIN,
            image_update_meta,
        ),
        registration(
            "settings/get",
            CAP_MANAGE_SETTINGS,
            SCOPE_GALLERY_ADMIN,
            settings_get,
        ),
        registration(
            "settings/update",
            CAP_MANAGE_SETTINGS,
            SCOPE_GALLERY_ADMIN,
            settings_update,
        ),
        registration(
            "category/suggest",
            CAP_MANAGE_CATEGORIES,
            SCOPE_CATEGORY_ADMIN,
            category_suggest,
        ),
        registration(
            "category/list",
            CAP_MANAGE_CATEGORIES,
            SCOPE_CATEGORY_ADMIN,
            category_list,
        ),
        registration(
            "category/assign",
            CAP_MANAGE_CATEGORIES,
            SCOPE_CATEGORY_ADMIN,
            category_assign,
        ),
        // Read-only catalog; nonce check deliberately opted out.
        registration("template/list", CAP_MANAGE_GALLERIES, "", template_list),
    ]
}

/// Shared write command for create and full update. Override fields decode
/// from wire tokens; an absent field reads as "inherit" exactly like the
/// explicit token.
#[derive(Debug, Default)]
struct GalleryWriteCommand {
    fields: GalleryFields,
}

impl GalleryWriteCommand {
    fn decode(payload: &Payload) -> Self {
        let token = |key: &str| payload.text(key).unwrap_or_default();
        Self {
            fields: GalleryFields {
                name: payload.text("name"),
                description: payload.text("description"),
                template: payload.text("template"),
                columns_override: decode_columns_override(&token("columns")),
                lightbox_override: decode_bool_override(&token("lightbox")),
                hover_zoom_override: decode_bool_override(&token("hover_zoom")),
                full_width_override: decode_bool_override(&token("full_width")),
                transition_override: decode_transition_override(&token("transition")),
            },
        }
    }
}

fn gallery_payload(gallery: &Gallery) -> Value {
    json!({
        "id": gallery.id,
        "name": gallery.name,
        "description": gallery.description,
        "template": gallery.template,
        "columns": encode_columns_override(gallery.columns_override),
        "lightbox": encode_bool_override(gallery.lightbox_override),
        "hover_zoom": encode_bool_override(gallery.hover_zoom_override),
        "full_width": encode_bool_override(gallery.full_width_override),
        "transition": encode_transition_override(gallery.transition_override),
        "created_at": gallery.created_at.to_rfc3339(),
        "image_ids": gallery.image_ids,
    })
}

fn gallery_list(
    _payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let galleries: Vec<Value> = ctx
            .store
            .list_galleries()?
            .iter()
            .map(gallery_payload)
            .collect();
        Ok(json!({"galleries": galleries}))
    })
}

fn gallery_create(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let command = GalleryWriteCommand::decode(&payload);
        let gallery = ctx.store.create_gallery(command.fields)?;
        Ok(json!({"gallery": gallery_payload(&gallery)}))
    })
}

/// Rename touches name and description only; stored overrides stay exactly
/// as they are.
fn gallery_rename(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let id = payload.required_id("id")?;
        let fields = GalleryFields {
            name: payload.text("name"),
            description: payload.text("description"),
            ..GalleryFields::default()
        };
        let gallery = ctx.store.update_gallery(id, fields, false)?;
        Ok(json!({"gallery": gallery_payload(&gallery)}))
    })
}

fn gallery_update(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let id = payload.required_id("id")?;
        let command = GalleryWriteCommand::decode(&payload);
        let gallery = ctx.store.update_gallery(id, command.fields, true)?;
        Ok(json!({"gallery": gallery_payload(&gallery)}))
    })
}

fn gallery_delete(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let id = payload.required_id("id")?;
        ctx.store.delete_gallery(id)?;
        Ok(json!({"deleted": id}))
    })
}

fn gallery_set_images(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let id = payload.required_id("id")?;
        let image_ids = payload.id_list("image_ids");
        let gallery = ctx.store.set_gallery_images(id, &image_ids)?;
        Ok(json!({"gallery": gallery_payload(&gallery)}))
    })
}

fn gallery_add_images(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let id = payload.required_id("id")?;
        let image_ids = payload.id_list("image_ids");
        let gallery = ctx.store.add_images_to_gallery(id, &image_ids)?;
        Ok(json!({"gallery": gallery_payload(&gallery)}))
    })
}

fn gallery_publish_page(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let id = payload.required_id("id")?;
        let gallery = ctx.store.gallery(id)?;
        let page = ctx.pages.publish_gallery_page(&gallery)?;
        Ok(json!({"page": {"title": page.title, "path": page.path}}))
    })
}

fn image_set_galleries(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let image_id = payload.required_id("image_id")?;
        let gallery_ids = payload.id_list("gallery_ids");
        let membership = ctx.store.set_image_galleries(image_id, &gallery_ids)?;
        Ok(json!({"image_id": image_id, "gallery_ids": membership}))
    })
}

fn image_galleries(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let image_id = payload.required_id("image_id")?;
        let membership = ctx.store.gallery_ids_for_image(image_id)?;
        Ok(json!({"image_id": image_id, "gallery_ids": membership}))
    })
}

fn image_update_meta(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let image_id = payload.required_id("image_id")?;
        let update = crate::media::ImageMetaUpdate {
            title: payload.text("title"),
            alt_text: payload.text("alt_text"),
        };
        let image = ctx.media.update_meta(image_id, update)?;
        let image = serde_json::to_value(&image)
            .map_err(|err| DomainError::upstream(format!("Image encode failed: {}", err)))?;
        Ok(json!({"image": image}))
    })
}

fn settings_payload(template: &str, settings: &crate::gallery::GlobalTemplateSettings) -> Value {
    json!({
        "template": template,
        "columns": settings.columns,
        "lightbox_enabled": settings.lightbox_enabled,
        "hover_zoom_enabled": settings.hover_zoom_enabled,
        "full_width": settings.full_width,
        "transition": settings.transition.as_str(),
    })
}

fn settings_get(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let template = payload
            .text("template")
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
        let settings = ctx.store.get_global_settings(&template)?;
        Ok(json!({"settings": settings_payload(&template, &settings)}))
    })
}

/// Merge provided fields into one template's global settings. Globals hold
/// concrete values; a token that decodes to "inherit" leaves the field
/// unchanged.
fn settings_update(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let template = payload
            .text("template")
            .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());
        let token = |key: &str| payload.text(key).unwrap_or_default();
        let patch = GlobalSettingsPatch {
            columns: payload
                .text("columns")
                .and_then(|raw| raw.trim().parse::<i64>().ok()),
            lightbox_enabled: decode_bool_override(&token("lightbox")),
            hover_zoom_enabled: decode_bool_override(&token("hover_zoom")),
            full_width: decode_bool_override(&token("full_width")),
            transition: decode_transition_override(&token("transition")),
        };
        let settings = ctx.store.update_global_settings(&template, patch)?;
        Ok(json!({"settings": settings_payload(&template, &settings)}))
    })
}

fn term_payload(term: &crate::terms::CategoryTerm) -> Value {
    json!({
        "id": term.id,
        "name": term.name,
        "slug": term.slug,
        "count": term.count,
    })
}

fn category_suggest(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let query = payload.text("query").unwrap_or_default();
        let limit = payload.usize_or("limit", DEFAULT_SUGGEST_LIMIT);
        let terms: Vec<Value> = ctx
            .terms
            .suggest(&query, limit)?
            .iter()
            .map(term_payload)
            .collect();
        Ok(json!({"terms": terms}))
    })
}

fn category_list(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let object_id = payload.required_id("object_id")?;
        let terms: Vec<Value> = ctx
            .terms
            .list_for_object(object_id)?
            .iter()
            .map(term_payload)
            .collect();
        Ok(json!({"object_id": object_id, "terms": terms}))
    })
}

fn category_assign(
    payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let object_id = payload.required_id("object_id")?;
        if !ctx.media.contains(object_id) {
            return Err(DomainError::not_found(format!(
                "Image {} not found",
                object_id
            )));
        }
        let names = payload.text_list("names");
        let terms: Vec<Value> = ctx
            .terms
            .assign_to_object(object_id, &names)?
            .iter()
            .map(term_payload)
            .collect();
        Ok(json!({"object_id": object_id, "terms": terms}))
    })
}

fn template_list(
    _payload: Payload,
    ctx: Arc<DispatchContext>,
) -> BoxFuture<'static, Result<Value, DomainError>> {
    Box::pin(async move {
        let templates = ctx.pipeline.list_templates();
        let templates = serde_json::to_value(&templates)
            .map_err(|err| DomainError::upstream(format!("Catalog encode failed: {}", err)))?;
        Ok(json!({"templates": templates}))
    })
}
