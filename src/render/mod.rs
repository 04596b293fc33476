// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Gallery rendering: template catalog, slug resolution, and the pipeline
//! that turns stored galleries into a render tree. The tree is markup
//! agnostic; `html` turns it into markup through the template engine.

pub mod html;

use crate::gallery::{EffectiveDisplay, GalleryStore, resolve};
use crate::media::MediaLibrary;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const FALLBACK_TEMPLATE: &str = "basic-grid";

#[derive(Debug, Clone)]
pub struct TemplateInfo {
    pub slug: String,
    pub label: String,
    pub is_pro: bool,
}

/// Extension point: each provider contributes templates to the catalog.
pub trait TemplateProvider: Send + Sync {
    fn templates(&self) -> Vec<TemplateInfo>;
}

pub struct BuiltinTemplates;

impl TemplateProvider for BuiltinTemplates {
    fn templates(&self) -> Vec<TemplateInfo> {
        vec![
            TemplateInfo {
                slug: "basic-grid".to_string(),
                label: "Basic grid".to_string(),
                is_pro: false,
            },
            TemplateInfo {
                slug: "masonry".to_string(),
                label: "Masonry".to_string(),
                is_pro: false,
            },
        ]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateDescriptor {
    pub slug: String,
    pub label: String,
    pub is_pro: bool,
    pub available: bool,
}

/// Entitlement hook deciding whether a template may be selected. The
/// default locks pro templates out.
pub type AvailabilityHook = Arc<dyn Fn(&TemplateInfo) -> bool + Send + Sync>;

/// Global render permission; a denial yields an empty tree regardless of
/// data.
pub type RenderGate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Extension point: transforms applied to the finished tree, in order.
pub trait RenderTransform: Send + Sync {
    fn apply(&self, tree: RenderTree) -> RenderTree;
}

#[derive(Debug, Clone, Default)]
pub struct RenderAttributes {
    /// Explicitly requested template slug, if any.
    pub template: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LightboxMeta {
    pub group: String,
    pub transition: crate::gallery::Transition,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageRenderItem {
    pub image_id: u64,
    pub title: String,
    pub alt_text: String,
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Present iff the lightbox is enabled for the owning gallery.
    pub lightbox: Option<LightboxMeta>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GallerySection {
    pub gallery_id: u64,
    pub name: String,
    pub description: String,
    pub style: EffectiveDisplay,
    pub items: Vec<ImageRenderItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderTree {
    pub template: String,
    pub sections: Vec<GallerySection>,
}

impl RenderTree {
    pub fn empty() -> Self {
        Self {
            template: String::new(),
            sections: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Slug resolution: the requested slug if present and available, else the
/// first available template in catalog order, else the hard fallback —
/// selection never fails, even against an empty catalog.
pub fn resolve_template_slug(
    requested: &str,
    templates: &BTreeMap<String, TemplateDescriptor>,
) -> String {
    if !requested.is_empty()
        && let Some(descriptor) = templates.get(requested)
        && descriptor.available
    {
        return requested.to_string();
    }
    templates
        .values()
        .find(|descriptor| descriptor.available)
        .map(|descriptor| descriptor.slug.clone())
        .unwrap_or_else(|| FALLBACK_TEMPLATE.to_string())
}

pub struct RenderPipeline {
    store: Arc<GalleryStore>,
    media: Arc<dyn MediaLibrary>,
    providers: Vec<Arc<dyn TemplateProvider>>,
    availability: AvailabilityHook,
    render_gate: RenderGate,
    transforms: Vec<Arc<dyn RenderTransform>>,
}

impl RenderPipeline {
    pub fn new(store: Arc<GalleryStore>, media: Arc<dyn MediaLibrary>) -> Self {
        Self {
            store,
            media,
            providers: vec![Arc::new(BuiltinTemplates)],
            availability: Arc::new(|info: &TemplateInfo| !info.is_pro),
            render_gate: Arc::new(|| true),
            transforms: Vec::new(),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn TemplateProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_availability_hook(mut self, hook: AvailabilityHook) -> Self {
        self.availability = hook;
        self
    }

    pub fn with_render_gate(mut self, gate: RenderGate) -> Self {
        self.render_gate = gate;
        self
    }

    pub fn with_transform(mut self, transform: Arc<dyn RenderTransform>) -> Self {
        self.transforms.push(transform);
        self
    }

    /// The resolved template catalog in deterministic slug order. The first
    /// provider to claim a slug wins.
    pub fn list_templates(&self) -> BTreeMap<String, TemplateDescriptor> {
        let mut catalog = BTreeMap::new();
        for provider in &self.providers {
            for info in provider.templates() {
                if catalog.contains_key(&info.slug) {
                    continue;
                }
                let available = (self.availability)(&info);
                catalog.insert(
                    info.slug.clone(),
                    TemplateDescriptor {
                        slug: info.slug,
                        label: info.label,
                        is_pro: info.is_pro,
                        available,
                    },
                );
            }
        }
        catalog
    }

    /// Build the render tree for all galleries, or a single one when
    /// `filter` is set. Overrides resolve once per gallery; images with no
    /// media record are dropped without error.
    pub fn render(&self, filter: Option<u64>, attributes: &RenderAttributes) -> RenderTree {
        if !(self.render_gate)() {
            log::debug!("Render permission denied, returning empty tree");
            return RenderTree::empty();
        }

        let mut galleries = match self.store.list_galleries() {
            Ok(galleries) => galleries,
            Err(err) => {
                log::error!("Gallery load failed during render: {}", err);
                return RenderTree::empty();
            }
        };
        if let Some(id) = filter
            && id > 0
        {
            galleries.retain(|gallery| gallery.id == id);
        }
        if galleries.is_empty() {
            return RenderTree::empty();
        }

        let mut requested = attributes.template.clone().unwrap_or_default();
        // A single matched gallery brings its own stored template when the
        // caller did not request one.
        if requested.is_empty() && galleries.len() == 1 {
            requested = galleries[0].template.clone();
        }
        let templates = self.list_templates();
        let slug = resolve_template_slug(&requested, &templates);

        let global = match self.store.get_global_settings(&slug) {
            Ok(global) => global,
            Err(err) => {
                log::error!("Global settings load failed during render: {}", err);
                return RenderTree::empty();
            }
        };

        let mut sections = Vec::new();
        for gallery in &galleries {
            let style = resolve(&global, gallery);
            let mut items = Vec::new();
            for &image_id in gallery.image_ids.iter().filter(|&&id| id > 0) {
                let Some(image) = self.media.image(image_id) else {
                    log::debug!(
                        "Dropping dangling image {} from gallery {}",
                        image_id,
                        gallery.id
                    );
                    continue;
                };
                let lightbox = style.lightbox_enabled.then(|| LightboxMeta {
                    group: format!("npg-gallery-{}", gallery.id),
                    transition: style.transition,
                });
                items.push(ImageRenderItem {
                    image_id,
                    title: image.title,
                    alt_text: image.alt_text,
                    url: image.url,
                    width: image.width,
                    height: image.height,
                    lightbox,
                });
            }
            sections.push(GallerySection {
                gallery_id: gallery.id,
                name: gallery.name.clone(),
                description: gallery.description.clone(),
                style,
                items,
            });
        }

        let mut tree = RenderTree {
            template: slug,
            sections,
        };
        for transform in &self.transforms {
            tree = transform.apply(tree);
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::{GalleryFields, Transition};
    use crate::media::{YamlMediaLibrary, test_image};

    struct ProTemplates;

    impl TemplateProvider for ProTemplates {
        fn templates(&self) -> Vec<TemplateInfo> {
            vec![TemplateInfo {
                slug: "pro-grid".to_string(),
                label: "Pro grid".to_string(),
                is_pro: true,
            }]
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Arc<GalleryStore>,
        media: Arc<YamlMediaLibrary>,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("tempdir");
            let store =
                Arc::new(GalleryStore::open(dir.path().join("galleries.yaml")).expect("store"));
            let media =
                Arc::new(YamlMediaLibrary::open(dir.path().join("media.yaml")).expect("media"));
            Self {
                _dir: dir,
                store,
                media,
            }
        }

        fn pipeline(&self) -> RenderPipeline {
            RenderPipeline::new(self.store.clone(), self.media.clone())
        }
    }

    #[test]
    fn catalog_is_slug_ordered_and_gates_pro() {
        let fixture = Fixture::new();
        let pipeline = fixture.pipeline().with_provider(Arc::new(ProTemplates));
        let catalog = pipeline.list_templates();

        let slugs: Vec<&str> = catalog.keys().map(|slug| slug.as_str()).collect();
        assert_eq!(slugs, vec!["basic-grid", "masonry", "pro-grid"]);
        assert!(catalog["basic-grid"].available);
        assert!(!catalog["pro-grid"].available);
    }

    #[test]
    fn slug_resolution_falls_back_in_order() {
        let fixture = Fixture::new();
        let pipeline = fixture.pipeline().with_provider(Arc::new(ProTemplates));
        let catalog = pipeline.list_templates();

        assert_eq!(resolve_template_slug("masonry", &catalog), "masonry");
        // Pro-locked templates are never selected implicitly.
        assert_eq!(resolve_template_slug("pro-grid", &catalog), "basic-grid");
        assert_eq!(resolve_template_slug("unknown", &catalog), "basic-grid");
        assert_eq!(resolve_template_slug("", &catalog), "basic-grid");
        // Hard fallback even against an empty catalog.
        assert_eq!(resolve_template_slug("x", &BTreeMap::new()), "basic-grid");
    }

    #[test]
    fn availability_hook_can_unlock_pro_templates() {
        let fixture = Fixture::new();
        let pipeline = fixture
            .pipeline()
            .with_provider(Arc::new(ProTemplates))
            .with_availability_hook(Arc::new(|_info| true));
        let catalog = pipeline.list_templates();
        assert!(catalog["pro-grid"].available);
        assert_eq!(resolve_template_slug("pro-grid", &catalog), "pro-grid");
    }

    #[test]
    fn render_gate_denial_yields_empty_tree() {
        let fixture = Fixture::new();
        fixture
            .store
            .create_gallery(GalleryFields {
                name: Some("G".to_string()),
                ..GalleryFields::default()
            })
            .expect("create");
        let pipeline = fixture.pipeline().with_render_gate(Arc::new(|| false));
        assert!(pipeline.render(None, &RenderAttributes::default()).is_empty());
    }

    #[test]
    fn no_matching_gallery_yields_empty_tree() {
        let fixture = Fixture::new();
        let pipeline = fixture.pipeline();
        assert!(pipeline.render(None, &RenderAttributes::default()).is_empty());
        assert!(
            pipeline
                .render(Some(17), &RenderAttributes::default())
                .is_empty()
        );
    }

    #[test]
    fn single_match_adopts_the_gallery_template() {
        let fixture = Fixture::new();
        let gallery = fixture
            .store
            .create_gallery(GalleryFields {
                name: Some("Walls".to_string()),
                template: Some("masonry".to_string()),
                ..GalleryFields::default()
            })
            .expect("create");

        let pipeline = fixture.pipeline();
        let tree = pipeline.render(Some(gallery.id), &RenderAttributes::default());
        assert_eq!(tree.template, "masonry");

        // An explicit request still wins over the stored template.
        let tree = pipeline.render(
            Some(gallery.id),
            &RenderAttributes {
                template: Some("basic-grid".to_string()),
            },
        );
        assert_eq!(tree.template, "basic-grid");
    }

    #[test]
    fn dangling_images_are_dropped_silently() {
        let fixture = Fixture::new();
        fixture.media.insert(test_image(1, "Kept")).expect("seed");
        let gallery = fixture
            .store
            .create_gallery(GalleryFields {
                name: Some("G".to_string()),
                ..GalleryFields::default()
            })
            .expect("create");
        fixture
            .store
            .set_gallery_images(gallery.id, &[1, 99])
            .expect("set images");

        let tree = fixture
            .pipeline()
            .render(Some(gallery.id), &RenderAttributes::default());
        assert_eq!(tree.sections.len(), 1);
        assert_eq!(tree.sections[0].items.len(), 1);
        assert_eq!(tree.sections[0].items[0].image_id, 1);
    }

    #[test]
    fn lightbox_meta_follows_resolved_settings() {
        let fixture = Fixture::new();
        fixture.media.insert(test_image(1, "Img")).expect("seed");
        let gallery = fixture
            .store
            .create_gallery(GalleryFields {
                name: Some("G".to_string()),
                transition_override: Some(Transition::Fade),
                ..GalleryFields::default()
            })
            .expect("create");
        fixture
            .store
            .set_gallery_images(gallery.id, &[1])
            .expect("set images");

        let pipeline = fixture.pipeline();
        let tree = pipeline.render(Some(gallery.id), &RenderAttributes::default());
        let lightbox = tree.sections[0].items[0].lightbox.as_ref().expect("meta");
        assert_eq!(lightbox.transition, Transition::Fade);
        assert_eq!(lightbox.group, format!("npg-gallery-{}", gallery.id));

        // Disabling the lightbox per gallery removes the anchors.
        fixture
            .store
            .update_gallery(
                gallery.id,
                GalleryFields {
                    lightbox_override: Some(false),
                    ..GalleryFields::default()
                },
                true,
            )
            .expect("update");
        let tree = pipeline.render(Some(gallery.id), &RenderAttributes::default());
        assert!(tree.sections[0].items[0].lightbox.is_none());
    }

    #[test]
    fn transforms_apply_in_order() {
        struct DropDescriptions;
        impl RenderTransform for DropDescriptions {
            fn apply(&self, mut tree: RenderTree) -> RenderTree {
                for section in &mut tree.sections {
                    section.description.clear();
                }
                tree
            }
        }

        let fixture = Fixture::new();
        fixture
            .store
            .create_gallery(GalleryFields {
                name: Some("G".to_string()),
                description: Some("secret".to_string()),
                ..GalleryFields::default()
            })
            .expect("create");
        let tree = fixture
            .pipeline()
            .with_transform(Arc::new(DropDescriptions))
            .render(None, &RenderAttributes::default());
        assert_eq!(tree.sections[0].description, "");
    }
}
