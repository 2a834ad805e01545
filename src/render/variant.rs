use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use base64::Engine as _;
use rayon::prelude::*;

use crate::assets::photo::{DefaultPhotoLoader, PhotoLoader};
use crate::compose::assign::{Member, assign, order_members};
use crate::config::EngineConfig;
use crate::encode::png_dpi::embed_dpi;
use crate::foundation::error::{CollageError, CollageResult, TemplateFamily};
use crate::render::composite::{composite, encode_png, load_photos};
use crate::template::catalog::{self, SlotLayout, TemplateVariant};
use crate::template::registry::HexTemplateRegistry;

/// Who goes into the collage. Shared by every variant rendered for the same group.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub members: Vec<Member>,
    #[serde(default)]
    pub center_member_id: Option<String>,
}

impl RenderRequest {
    /// Members that end up on the border (everyone except a matched center member).
    pub fn border_count(&self) -> u32 {
        let (_, border) = order_members(&self.members, self.center_member_id.as_deref());
        u32::try_from(border.len()).unwrap_or(u32::MAX)
    }
}

/// Outcome of rendering one template variant. `output_image` is `None` when rendering failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedVariant {
    pub variant_id: String,
    pub variant: TemplateVariant,
    pub center_member_id: Option<String>,
    pub output_image: Option<Vec<u8>>,
}

impl RenderedVariant {
    pub fn to_data_uri(&self) -> Option<String> {
        self.output_image.as_ref().map(|png| {
            format!(
                "data:image/png;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(png)
            )
        })
    }
}

/// `"{family}-{member_count}"`, plus `"@{center}"` when a center member is requested.
pub fn variant_id(variant: TemplateVariant, center_member_id: Option<&str>) -> String {
    match center_member_id {
        Some(center) => format!("{}-{}@{center}", variant.family, variant.member_count),
        None => format!("{}-{}", variant.family, variant.member_count),
    }
}

/// One template variant bound to one request. Renders at most once, however many threads ask.
///
/// A caller first claims the variant; only the claimant renders; everyone else waits for the
/// published result. [`Engine::render_variants`] claims on the calling thread and never waits
/// inside the pool.
#[derive(Debug)]
pub struct RenderVariant {
    variant: TemplateVariant,
    request: Arc<RenderRequest>,
    id: String,
    claimed: AtomicBool,
    done: OnceLock<RenderedVariant>,
}

impl RenderVariant {
    pub fn new(variant: TemplateVariant, request: impl Into<Arc<RenderRequest>>) -> Self {
        let request = request.into();
        Self {
            id: variant_id(variant, request.center_member_id.as_deref()),
            variant,
            request,
            claimed: AtomicBool::new(false),
            done: OnceLock::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn variant(&self) -> TemplateVariant {
        self.variant
    }

    pub fn request(&self) -> &RenderRequest {
        &self.request
    }

    pub fn center_member_id(&self) -> Option<&str> {
        self.request.center_member_id.as_deref()
    }

    pub fn is_rendered(&self) -> bool {
        self.done.get().is_some()
    }

    pub fn get(&self) -> Option<&RenderedVariant> {
        self.done.get()
    }

    /// Render on first call; later (or concurrent) callers block until the result is published.
    ///
    /// Blocks the calling thread while another caller renders. Inside a rayon task prefer
    /// [`Engine::render_variants`].
    pub fn render(&self, engine: &Engine) -> &RenderedVariant {
        if self.claim() {
            self.render_claimed(engine)
        } else {
            self.wait()
        }
    }

    fn claim(&self) -> bool {
        !self.claimed.swap(true, Ordering::AcqRel)
    }

    fn wait(&self) -> &RenderedVariant {
        self.done.wait()
    }

    /// Claimant only; the cell is never initialized concurrently.
    fn render_claimed(&self, engine: &Engine) -> &RenderedVariant {
        let _publish = PublishOnUnwind(self);
        self.done
            .get_or_init(|| engine.render(self.variant, &self.request))
    }

    fn failed(&self) -> RenderedVariant {
        RenderedVariant {
            variant_id: self.id.clone(),
            variant: self.variant,
            center_member_id: self.request.center_member_id.clone(),
            output_image: None,
        }
    }
}

/// Publishes a failed result if the claimant unwinds.
struct PublishOnUnwind<'a>(&'a RenderVariant);

impl Drop for PublishOnUnwind<'_> {
    fn drop(&mut self) {
        if self.0.done.get().is_none() {
            tracing::warn!(variant = %self.0.id, "variant render panicked");
            let _ = self.0.done.set(self.0.failed());
        }
    }
}

/// Owns everything a render needs: settings, the hexagon registry, the photo loader, and an
/// optional dedicated thread pool.
pub struct Engine {
    config: EngineConfig,
    registry: HexTemplateRegistry,
    loader: Arc<dyn PhotoLoader>,
    pool: Option<rayon::ThreadPool>,
    renders: AtomicUsize,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("renders", &self.render_count())
            .finish_non_exhaustive()
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> CollageResult<Self> {
        config.validate()?;
        let registry = match &config.templates_dir {
            Some(dir) => HexTemplateRegistry::from_dir(dir)?,
            None => HexTemplateRegistry::new(),
        };
        let loader: Arc<dyn PhotoLoader> =
            Arc::new(DefaultPhotoLoader::new(config.assets_root.clone()));
        let pool = build_pool(config.threads)?;
        tracing::debug!(
            hexagon_templates = registry.len(),
            threads = ?config.threads,
            "engine ready"
        );
        Ok(Self {
            config,
            registry,
            loader,
            pool,
            renders: AtomicUsize::new(0),
        })
    }

    pub fn with_loader(mut self, loader: Arc<dyn PhotoLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_registry(mut self, registry: HexTemplateRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &HexTemplateRegistry {
        &self.registry
    }

    /// Number of renders actually performed (not counting cached [`RenderVariant`] hits).
    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::Relaxed)
    }

    pub fn available_templates(&self, member_count: u32) -> Vec<TemplateVariant> {
        catalog::available_templates(member_count, &self.registry)
    }

    /// The variants for a request, each wrapped for at-most-once rendering.
    pub fn variants_for(&self, request: impl Into<Arc<RenderRequest>>) -> Vec<RenderVariant> {
        let request = request.into();
        self.available_templates(request.border_count())
            .into_iter()
            .map(|v| RenderVariant::new(v, Arc::clone(&request)))
            .collect()
    }

    /// Variants for every candidate center member: the same group laid out once per center.
    /// Each candidate overrides `request.center_member_id`.
    pub fn variants_for_centers<S: AsRef<str>>(
        &self,
        request: &RenderRequest,
        centers: &[S],
    ) -> Vec<RenderVariant> {
        centers
            .iter()
            .flat_map(|center| {
                self.variants_for(RenderRequest {
                    members: request.members.clone(),
                    center_member_id: Some(center.as_ref().to_owned()),
                })
            })
            .collect()
    }

    pub fn initial_variant_index(
        &self,
        variants: &[TemplateVariant],
        preferred: Option<TemplateFamily>,
    ) -> Option<usize> {
        catalog::initial_template_index(variants, preferred)
    }

    pub fn layout(&self, variant: TemplateVariant) -> CollageResult<SlotLayout> {
        catalog::build_slots(variant, &self.registry, &self.config.grid)
    }

    /// Full pipeline for one variant: slots, assignment, photo loading, compositing, PNG
    /// encoding, and DPI tagging.
    #[tracing::instrument(level = "debug", skip(self, request), fields(members = request.members.len()))]
    pub fn try_render(
        &self,
        variant: TemplateVariant,
        request: &RenderRequest,
    ) -> CollageResult<Vec<u8>> {
        self.renders.fetch_add(1, Ordering::Relaxed);

        let layout = self.layout(variant)?;
        let photo_map = assign(
            &layout.slots,
            &request.members,
            request.center_member_id.as_deref(),
            &self.config.placeholders,
        );
        let photos = load_photos(&photo_map, self.loader.as_ref());
        let failed = photos.iter().filter(|p| p.is_err()).count();
        if failed > 0 {
            tracing::debug!(failed, slots = photos.len(), "some photos fell back to placeholder fill");
        }

        let raw = composite(
            &layout.slots,
            &photos,
            layout.view_box,
            self.config.scale,
            &self.config.style,
        )?;
        let png = encode_png(&raw)?;
        Ok(embed_dpi(png, self.config.dpi))
    }

    /// Like [`Engine::try_render`], but a failure becomes an empty `output_image`.
    pub fn render(&self, variant: TemplateVariant, request: &RenderRequest) -> RenderedVariant {
        let variant_id = variant_id(variant, request.center_member_id.as_deref());
        let output_image = match self.try_render(variant, request) {
            Ok(png) => Some(png),
            Err(e) => {
                tracing::warn!(variant = %variant_id, error = %e, "variant render failed");
                None
            }
        };
        RenderedVariant {
            variant_id,
            variant,
            center_member_id: request.center_member_id.clone(),
            output_image,
        }
    }

    /// Render variants concurrently. Each one completes or fails on its own.
    ///
    /// Variants are claimed on the calling thread; the pool renders only the ones claimed here.
    /// Variants claimed by an overlapping call are awaited after the pool is done, outside it.
    #[tracing::instrument(level = "debug", skip_all, fields(variants = variants.len()))]
    pub fn render_variants<'a>(&self, variants: &'a [RenderVariant]) -> Vec<&'a RenderedVariant> {
        let claimed: Vec<&RenderVariant> = variants.iter().filter(|v| v.claim()).collect();
        tracing::debug!(claimed = claimed.len(), "rendering claimed variants");
        // A panic in the pool may skip claims that never started.
        let _publish: Vec<PublishOnUnwind<'_>> =
            claimed.iter().map(|v| PublishOnUnwind(v)).collect();
        let run = || {
            claimed.par_iter().for_each(|v| {
                v.render_claimed(self);
            })
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
        variants.iter().map(RenderVariant::wait).collect()
    }
}

fn build_pool(threads: Option<usize>) -> CollageResult<Option<rayon::ThreadPool>> {
    let Some(n) = threads else {
        return Ok(None);
    };
    if n == 0 {
        return Err(CollageError::validation("'threads' must be >= 1 when set"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(n)
        .build()
        .map(Some)
        .map_err(|e| CollageError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/render/variant.rs"]
mod tests;
