//! Composition engine: draws form text onto a preset's template image.
//!
//! [`compose`] is a pure function of template bytes, font bytes, preset and
//! form. [`Composer`] resolves the asset files first and then runs
//! [`compose_cancellable`] on the blocking pool. Dropping the render future
//! cancels the blocking work at its next text item.
//!
//! Output is always a baseline JPEG at [`JPEG_QUALITY`], whatever the template
//! format. Any alpha channel is dropped before encoding.

use std::collections::HashMap;

use ab_glyph::{Font, FontVec, PxScale};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use imageproc::drawing::draw_text_mut;
use tokio_util::sync::CancellationToken;

use crate::assets::AssetStore;
use crate::error::CoreError;
use crate::form::InvitationForm;
use crate::preset::{parse_color, Preset};

/// Fixed encoder quality; identical inputs must give identical bytes.
pub const JPEG_QUALITY: u8 = 90;

/// Font file bytes keyed by the filename used in presets.
pub type FontBytes = HashMap<String, Vec<u8>>;

/* --------------------------------------------------------------------------
   Pure rendering
   -------------------------------------------------------------------------- */

/// Render `form` onto `template` following `preset.texts` in order.
///
/// Every font named by the preset must be present in `fonts`.
pub fn compose(
    template: &[u8],
    fonts: &FontBytes,
    preset: &Preset,
    form: &InvitationForm,
) -> Result<Vec<u8>, CoreError> {
    compose_cancellable(template, fonts, preset, form, &CancellationToken::new())
}

/// [`compose`], checking `cancel` before each text item.
pub fn compose_cancellable(
    template: &[u8],
    fonts: &FontBytes,
    preset: &Preset,
    form: &InvitationForm,
    cancel: &CancellationToken,
) -> Result<Vec<u8>, CoreError> {
    let mut canvas: RgbaImage = image::load_from_memory(template)
        .map_err(|e| {
            CoreError::Validation(format!(
                "Invalid template image '{}': {e}",
                preset.template
            ))
        })?
        .to_rgba8();

    let mut parsed: HashMap<&str, FontVec> = HashMap::new();

    for item in &preset.texts {
        if cancel.is_cancelled() {
            return Err(CoreError::Internal("Rendering aborted".to_string()));
        }
        if !parsed.contains_key(item.font.as_str()) {
            let bytes = fonts
                .get(&item.font)
                .ok_or_else(|| CoreError::not_found("Font", item.font.clone()))?;
            let font = FontVec::try_from_vec(bytes.clone()).map_err(|e| {
                CoreError::Validation(format!("Invalid font file '{}': {e}", item.font))
            })?;
            parsed.insert(item.font.as_str(), font);
        }
        let font = &parsed[item.font.as_str()];

        let color = parse_color(&item.color)?;
        let scale = em_scale(font, item.size as f32);
        draw_text_mut(
            &mut canvas,
            color,
            item.x,
            item.y,
            scale,
            font,
            form.text_for(item.kind),
        );
    }

    encode_jpeg(DynamicImage::ImageRgba8(canvas))
}

/// Scale at which one em is `size` pixels tall.
fn em_scale(font: &impl Font, size: f32) -> PxScale {
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(size * font.height_unscaled() / units),
        _ => PxScale::from(size),
    }
}

fn encode_jpeg(image: DynamicImage) -> Result<Vec<u8>, CoreError> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| CoreError::Internal(format!("JPEG encoding failed: {e}")))?;
    Ok(out)
}

/* --------------------------------------------------------------------------
   Asset-backed renderer
   -------------------------------------------------------------------------- */

/// Renders presets using fonts and templates from the asset stores.
#[derive(Debug, Clone)]
pub struct Composer {
    templates: AssetStore,
    fonts: AssetStore,
}

impl Composer {
    pub fn new(templates: AssetStore, fonts: AssetStore) -> Self {
        Self { templates, fonts }
    }

    /// Resolve assets and render.
    ///
    /// The template is resolved first, then fonts in text-item order, so the
    /// first missing file is the one reported.
    pub async fn render(
        &self,
        preset: &Preset,
        form: &InvitationForm,
    ) -> Result<Vec<u8>, CoreError> {
        let template = self.templates.read(&preset.template).await?;

        let mut fonts = FontBytes::new();
        for item in &preset.texts {
            if !fonts.contains_key(&item.font) {
                let bytes = self.fonts.read(&item.font).await?;
                fonts.insert(item.font.clone(), bytes);
            }
        }

        let preset = preset.clone();
        let form = form.clone();
        let cancel = CancellationToken::new();
        // Fires if this future is dropped before the blocking task finishes.
        let _abort = cancel.clone().drop_guard();
        let jpeg = tokio::task::spawn_blocking(move || {
            compose_cancellable(&template, &fonts, &preset, &form, &cancel)
        })
        .await
            .map_err(|e| CoreError::Internal(format!("Render task failed: {e}")))??;

        tracing::debug!(bytes = jpeg.len(), "Invitation rendered");
        Ok(jpeg)
    }
}

/* --------------------------------------------------------------------------
   Tests
   -------------------------------------------------------------------------- */
