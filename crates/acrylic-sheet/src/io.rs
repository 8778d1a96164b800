//! Asset decoding, request lists and layer PNG output

use image::RgbaImage;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::constants::dpi_to_pixels_per_meter;
use crate::types::*;

/// A decoded request, plus any recoverable problem found while loading it
#[derive(Debug)]
pub struct CardLoad {
    pub item: LoadedItem,
    /// Set when the logo could not be decoded and the card was kept without it
    pub logo_error: Option<SheetError>,
}

type Decoded = std::result::Result<Arc<RgbaImage>, Arc<image::ImageError>>;

/// Decoded source images keyed by path
///
/// Requests sharing a background or logo file decode it once and hold the
/// same pixels. Concurrent requests for a path wait on the first decode.
#[derive(Debug, Default)]
pub struct AssetCache {
    entries: Mutex<HashMap<PathBuf, Arc<OnceLock<Decoded>>>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct paths requested so far
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<OnceLock<Decoded>>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decode `path` on first use; later calls share the result
    pub fn decode(&self, key: &str, path: &Path) -> Result<Arc<RgbaImage>> {
        let slot = Arc::clone(self.lock().entry(path.to_path_buf()).or_default());
        let decoded = slot.get_or_init(|| {
            log::debug!("Decoding {}", path.display());
            image::open(path)
                .map(|image| Arc::new(image.to_rgba8()))
                .map_err(Arc::new)
        });

        decoded.clone().map_err(|source| SheetError::AssetDecode {
            key: key.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Decode every asset a request refers to.
///
/// The character and background are required once named; a bad logo only
/// drops the logo.
pub fn load_card(
    request: &CardRequest,
    card_size: (u32, u32),
    cache: &AssetCache,
) -> Result<CardLoad> {
    let character = cache.decode(&request.key, &request.character_path)?;

    let (background, has_background) = match &request.background_path {
        Some(path) => (cache.decode(&request.key, path)?, true),
        None => (Arc::new(RgbaImage::new(card_size.0, card_size.1)), false),
    };

    let (logo, logo_error) = match &request.logo_path {
        Some(path) => match cache.decode(&request.key, path) {
            Ok(logo) => (Some(logo), None),
            Err(e) => {
                log::warn!("Dropping logo for card `{}`: {}", request.key, e);
                (None, Some(e))
            }
        },
        None => (None, None),
    };

    let display_name = request
        .display_name
        .clone()
        .unwrap_or_else(|| request.key.clone());

    let card = LoadedCard {
        key: request.key.clone(),
        character_image: character,
        background_image: background,
        has_background,
        logo_image: logo,
        display_name,
        order_key: request.order_key.clone(),
        knockout_pattern: request.knockout_pattern,
    };

    Ok(CardLoad {
        item: LoadedItem {
            card,
            quantity: request.quantity,
        },
        logo_error,
    })
}

/// Write `image` as an RGBA PNG carrying a `pHYs` chunk for `dpi`.
pub fn save_png(path: impl AsRef<Path>, image: &RgbaImage, dpi: u32) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);

    let mut encoder = png::Encoder::new(writer, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let ppm = dpi_to_pixels_per_meter(dpi);
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppm,
        yppu: ppm,
        unit: png::Unit::Meter,
    }));

    let mut writer = encoder.write_header()?;
    writer.write_image_data(image.as_raw())?;
    writer.finish()?;
    Ok(())
}

/// Load a JSON array of card requests
#[cfg(feature = "serde")]
pub async fn load_requests(path: impl AsRef<Path>) -> Result<Vec<CardRequest>> {
    let bytes = tokio::fs::read(path).await?;
    parse_requests(&bytes)
}

/// Parse a JSON array of card requests
#[cfg(feature = "serde")]
pub fn parse_requests(json: &[u8]) -> Result<Vec<CardRequest>> {
    serde_json::from_slice(json)
        .map_err(|e| SheetError::Config(format!("Failed to parse card list: {}", e)))
}

/// Accept an order key written either as a string or as an integer
#[cfg(feature = "serde")]
pub(crate) fn deserialize_order_key<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawKey {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(Option::<RawKey>::deserialize(deserializer)?.map(|key| match key {
        RawKey::Text(s) => s,
        RawKey::Signed(n) => n.to_string(),
        RawKey::Unsigned(n) => n.to_string(),
    }))
}
