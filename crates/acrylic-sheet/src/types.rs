use image::RgbaImage;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::constants::DEFAULT_KNOCKOUT_THRESHOLD;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("Failed to decode asset for card `{key}` ({}): {source}", path.display())]
    AssetDecode {
        key: String,
        path: PathBuf,
        #[source]
        source: Arc<image::ImageError>,
    },
    #[error("Failed to load card `{key}`: {reason}")]
    LoadTask { key: String, reason: String },
    #[error("{count} cards requested but the sheet holds only {capacity}")]
    CapacityExceeded { count: usize, capacity: usize },
    #[error("Invalid sheet geometry: {0}")]
    Geometry(String),
    #[error("Failed to render page {page}: {reason}")]
    RenderTask { page: usize, reason: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Font error: {0}")]
    Font(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("PNG encoding error: {0}")]
    Png(#[from] png::EncodingError),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, SheetError>;

/// Physical sheet size in millimetres
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetSize {
    pub width_mm: f32,
    pub height_mm: f32,
}

impl SheetSize {
    pub fn new(width_mm: f32, height_mm: f32) -> Self {
        Self {
            width_mm,
            height_mm,
        }
    }

    /// Parse a `WIDTHxHEIGHT` string such as `280x580`
    pub fn parse(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let (w, h) = lower
            .split_once('x')
            .ok_or_else(|| SheetError::Config(format!("Sheet size must look like 280x580, got `{s}`")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f32>()
                .map_err(|_| SheetError::Config(format!("Invalid sheet dimension `{v}`")))
        };
        Ok(Self::new(parse(w)?, parse(h)?))
    }
}

impl Default for SheetSize {
    fn default() -> Self {
        let (width_mm, height_mm) = crate::constants::DEFAULT_SHEET_MM;
        Self {
            width_mm,
            height_mm,
        }
    }
}

/// Alpha-to-white-ink transfer function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum KnockoutPattern {
    /// Hard silhouette: full white at or above the threshold
    #[default]
    Binary,
    /// Output follows the source alpha above the threshold
    Gradient,
    /// Power curve that pushes faint alpha toward full white
    #[cfg_attr(feature = "serde", serde(alias = "steep"))]
    SteepGradient,
}

impl KnockoutPattern {
    pub const ALL: [KnockoutPattern; 3] = [
        KnockoutPattern::Binary,
        KnockoutPattern::Gradient,
        KnockoutPattern::SteepGradient,
    ];

    /// Whether intermediate mask values carry density (and must be composited)
    pub fn is_graded(self) -> bool {
        !matches!(self, KnockoutPattern::Binary)
    }

    pub fn name(self) -> &'static str {
        match self {
            KnockoutPattern::Binary => "binary",
            KnockoutPattern::Gradient => "gradient",
            KnockoutPattern::SteepGradient => "steep",
        }
    }
}

/// Threshold presets for the knockout transfer function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum KnockoutStrength {
    #[default]
    Normal,
    /// Lower threshold: faint pixels still print white
    Aggressive,
    /// Higher threshold: only clearly opaque pixels print white
    Minimal,
}

impl KnockoutStrength {
    pub fn threshold(self) -> u8 {
        match self {
            KnockoutStrength::Normal => DEFAULT_KNOCKOUT_THRESHOLD,
            KnockoutStrength::Aggressive => 10,
            KnockoutStrength::Minimal => 50,
        }
    }
}

/// Whether each asset class may be scaled above its native size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpscalePolicy {
    pub character: bool,
    pub background: bool,
    pub logo: bool,
}

impl Default for UpscalePolicy {
    fn default() -> Self {
        Self {
            character: false,
            background: true,
            logo: true,
        }
    }
}

/// One line of the input order list
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardRequest {
    pub key: String,
    #[cfg_attr(feature = "serde", serde(alias = "char"))]
    pub character_path: PathBuf,
    #[cfg_attr(feature = "serde", serde(default, alias = "bg"))]
    pub background_path: Option<PathBuf>,
    #[cfg_attr(feature = "serde", serde(default, alias = "logo"))]
    pub logo_path: Option<PathBuf>,
    #[cfg_attr(feature = "serde", serde(default, alias = "userName"))]
    pub display_name: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            alias = "orderId",
            deserialize_with = "crate::io::deserialize_order_key"
        )
    )]
    pub order_key: Option<String>,
    #[cfg_attr(
        feature = "serde",
        serde(default = "default_quantity", alias = "amount")
    )]
    pub quantity: u32,
    /// Overrides the batch-wide pattern for this card's character knockout
    #[cfg_attr(feature = "serde", serde(default))]
    pub knockout_pattern: Option<KnockoutPattern>,
}

#[cfg(feature = "serde")]
fn default_quantity() -> u32 {
    1
}

impl CardRequest {
    pub fn new(key: impl Into<String>, character_path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            character_path: character_path.into(),
            background_path: None,
            logo_path: None,
            display_name: None,
            order_key: None,
            quantity: 1,
            knockout_pattern: None,
        }
    }

    pub fn with_background(mut self, path: impl Into<PathBuf>) -> Self {
        self.background_path = Some(path.into());
        self
    }

    pub fn with_logo(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo_path = Some(path.into());
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_order_key(mut self, key: impl Into<String>) -> Self {
        self.order_key = Some(key.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_knockout_pattern(mut self, pattern: KnockoutPattern) -> Self {
        self.knockout_pattern = Some(pattern);
        self
    }
}

/// A request whose assets have been decoded
///
/// Image buffers are reference counted: the quantity copies of one request
/// share a single decode.
#[derive(Debug, Clone)]
pub struct LoadedCard {
    pub key: String,
    pub character_image: Arc<RgbaImage>,
    /// Transparent placeholder when the request had no background
    pub background_image: Arc<RgbaImage>,
    pub has_background: bool,
    pub logo_image: Option<Arc<RgbaImage>>,
    pub display_name: String,
    pub order_key: Option<String>,
    pub knockout_pattern: Option<KnockoutPattern>,
}

/// A loaded card plus the number of copies the request asked for
#[derive(Debug, Clone)]
pub struct LoadedItem {
    pub card: LoadedCard,
    pub quantity: u32,
}
