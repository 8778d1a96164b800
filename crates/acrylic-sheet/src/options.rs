use crate::constants::*;
use crate::knockout::KnockoutParams;
use crate::layout::SheetGeometry;
use crate::types::*;
use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Knockout configuration as supplied by the caller
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KnockoutOptions {
    pub pattern: KnockoutPattern,
    pub threshold: u8,
    /// Erosion amount in millimetres; `0` disables erosion
    pub shrink_mm: f32,
    pub steepness: f32,
    /// Gaussian sigma applied before erosion (px)
    pub blur_radius: f32,
}

impl Default for KnockoutOptions {
    fn default() -> Self {
        Self {
            pattern: KnockoutPattern::Binary,
            threshold: DEFAULT_KNOCKOUT_THRESHOLD,
            shrink_mm: DEFAULT_KNOCKOUT_SHRINK_MM,
            steepness: DEFAULT_STEEPNESS,
            blur_radius: DEFAULT_EROSION_BLUR_RADIUS,
        }
    }
}

impl KnockoutOptions {
    /// Apply one of the threshold presets
    pub fn with_strength(mut self, strength: KnockoutStrength) -> Self {
        self.threshold = strength.threshold();
        self
    }
}

/// Comprehensive sheet generation configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SheetOptions {
    // Physical layout
    pub sheet_size: SheetSize,
    pub card_width_px: u32,
    pub card_height_px: u32,
    pub cutline_mm: f32,
    pub margin_mm: f32,
    pub spacing_mm: f32,
    pub label_gutter_mm: f32,

    // Knockout
    pub knockout: KnockoutOptions,

    // Image normalization
    pub upscale: UpscalePolicy,

    // Execution
    pub parallel: bool,
    pub load_workers: Option<usize>,
    pub render_workers: Option<usize>,

    // Output
    pub single_page: bool,
    pub output_prefix: String,

    // Labels
    pub label_font: Option<PathBuf>,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            sheet_size: SheetSize::default(),
            card_width_px: DEFAULT_CARD_WIDTH_PX,
            card_height_px: DEFAULT_CARD_HEIGHT_PX,
            cutline_mm: DEFAULT_CUTLINE_MM,
            margin_mm: DEFAULT_MARGIN_MM,
            spacing_mm: DEFAULT_SPACING_MM,
            label_gutter_mm: DEFAULT_LABEL_GUTTER_MM,
            knockout: KnockoutOptions::default(),
            upscale: UpscalePolicy::default(),
            parallel: true,
            load_workers: None,
            render_workers: None,
            single_page: false,
            output_prefix: "sheet".to_string(),
            label_font: None,
        }
    }
}

impl SheetOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| SheetError::Config(format!("Failed to parse config: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SheetError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.card_width_px == 0 || self.card_height_px == 0 {
            return Err(SheetError::Config(
                "Card canvas must be at least 1x1 pixel".to_string(),
            ));
        }

        let lengths = [
            ("cut line", self.cutline_mm),
            ("margin", self.margin_mm),
            ("spacing", self.spacing_mm),
            ("label gutter", self.label_gutter_mm),
            ("knockout shrink", self.knockout.shrink_mm),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(SheetError::Config(format!(
                    "{} must be a non-negative length, got {}",
                    name, value
                )));
            }
        }

        if !(self.knockout.steepness.is_finite() && self.knockout.steepness > 0.0) {
            return Err(SheetError::Config(format!(
                "Knockout steepness must be positive, got {}",
                self.knockout.steepness
            )));
        }
        if !self.knockout.blur_radius.is_finite() || self.knockout.blur_radius < 0.0 {
            return Err(SheetError::Config(format!(
                "Knockout blur radius must be non-negative, got {}",
                self.knockout.blur_radius
            )));
        }

        if self.load_workers == Some(0) || self.render_workers == Some(0) {
            return Err(SheetError::Config(
                "Worker counts must be at least 1".to_string(),
            ));
        }

        if self.output_prefix.is_empty() {
            return Err(SheetError::Config("Output prefix must not be empty".to_string()));
        }

        Ok(())
    }

    /// Workers used to decode source images
    pub fn resolved_load_workers(&self) -> usize {
        self.load_workers.unwrap_or(DEFAULT_MAX_WORKERS)
    }

    /// Workers used to render pages; defaults to the core count, capped
    pub fn resolved_render_workers(&self) -> usize {
        self.render_workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(DEFAULT_MAX_WORKERS)
        })
    }
}

/// Label placement values in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelPlacement {
    pub margin_px: i64,
    pub right_shift_px: i64,
    pub min_left_px: i64,
}

/// Narrow a converted length to `u32`, rejecting values that do not fit
fn pixel_length(what: &str, px: i64) -> Result<u32> {
    u32::try_from(px)
        .map_err(|_| SheetError::Geometry(format!("{} of {}px is out of range", what, px)))
}

/// Pixel-space parameters derived once from [`SheetOptions`]
///
/// Every component receives this by reference; nothing is recomputed per
/// card or per page.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetParams {
    pub dpi: u32,
    pub geometry: SheetGeometry,
    pub knockout: KnockoutParams,
    pub upscale: UpscalePolicy,
    pub label: LabelPlacement,
    pub output_prefix: String,
}

impl SheetParams {
    pub fn from_options(options: &SheetOptions) -> Result<Self> {
        options.validate()?;
        let dpi = PRINT_DPI;

        let width_px = mm_to_px(options.sheet_size.width_mm, dpi);
        let height_px = mm_to_px(options.sheet_size.height_mm, dpi);
        if width_px <= 0 || height_px <= 0 {
            return Err(SheetError::Geometry(format!(
                "sheet {}x{}mm converts to {}x{}px",
                options.sheet_size.width_mm, options.sheet_size.height_mm, width_px, height_px
            )));
        }

        let border_px = mm_to_px(options.cutline_mm, dpi);
        let margin_px = mm_to_px(options.margin_mm, dpi);
        let spacing_px = mm_to_px(options.spacing_mm, dpi);
        let left_margin_px = margin_px.saturating_add(mm_to_px(options.label_gutter_mm, dpi));

        let geometry = SheetGeometry {
            width_px: pixel_length("sheet width", width_px)?,
            height_px: pixel_length("sheet height", height_px)?,
            card_width_px: options.card_width_px,
            card_height_px: options.card_height_px,
            margin_px: pixel_length("margin", margin_px)?,
            left_margin_px: pixel_length("left margin", left_margin_px)?,
            spacing_px: pixel_length("spacing", spacing_px)?,
            border_px: pixel_length("cut line", border_px)?,
        };
        geometry.validate()?;

        let erosion_radius = if options.knockout.shrink_mm > 0.0 {
            pixel_length("knockout shrink", mm_to_px(options.knockout.shrink_mm, dpi).max(1))?
        } else {
            0
        };

        Ok(Self {
            dpi,
            geometry,
            knockout: KnockoutParams {
                pattern: options.knockout.pattern,
                threshold: options.knockout.threshold,
                steepness: options.knockout.steepness,
                erosion_radius,
                blur_radius: options.knockout.blur_radius,
            },
            upscale: options.upscale,
            label: LabelPlacement {
                margin_px: mm_to_px(LABEL_MARGIN_MM, dpi),
                right_shift_px: LABEL_RIGHT_SHIFT_PX,
                min_left_px: LABEL_MIN_LEFT_PX,
            },
            output_prefix: options.output_prefix.clone(),
        })
    }

    /// Card canvas size as `(width, height)`
    pub fn card_size(&self) -> (u32, u32) {
        (self.geometry.card_width_px, self.geometry.card_height_px)
    }
}
