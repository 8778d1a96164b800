use image::RgbaImage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::io::save_png;
use crate::types::Result;

/// The named layers a sheet is split into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LayerKind {
    Cutline,
    Glare,
    Logos,
    LogoKnockout,
    Character,
    CharKnockout,
    BackgroundKnockout,
    Background,
    Labels,
}

impl LayerKind {
    /// Output order, top of the print stack first
    pub const ALL: [LayerKind; 9] = [
        LayerKind::Cutline,
        LayerKind::Glare,
        LayerKind::Logos,
        LayerKind::LogoKnockout,
        LayerKind::Character,
        LayerKind::CharKnockout,
        LayerKind::BackgroundKnockout,
        LayerKind::Background,
        LayerKind::Labels,
    ];

    /// Suffix used in the layer's file name
    pub fn name(self) -> &'static str {
        match self {
            LayerKind::Cutline => "cutline",
            LayerKind::Glare => "glare",
            LayerKind::Logos => "logos",
            LayerKind::LogoKnockout => "logo_knock",
            LayerKind::Character => "character",
            LayerKind::CharKnockout => "char_knock",
            LayerKind::BackgroundKnockout => "bg_knock",
            LayerKind::Background => "background",
            LayerKind::Labels => "labels",
        }
    }

    /// File name of this layer for the given prefix
    pub fn file_name(self, prefix: &str) -> String {
        format!("{}_{}.png", prefix, self.name())
    }
}

/// Transparent sheet-sized canvases, one per populated layer
///
/// Canvases are allocated the first time a card writes to them, so a layer
/// no card contributes to never exists and is never written.
#[derive(Debug, Clone)]
pub struct SheetLayers {
    width: u32,
    height: u32,
    layers: BTreeMap<LayerKind, RgbaImage>,
}

impl SheetLayers {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: BTreeMap::new(),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Canvas for `kind`, allocating it on first use
    pub fn layer_mut(&mut self, kind: LayerKind) -> &mut RgbaImage {
        let (width, height) = (self.width, self.height);
        self.layers
            .entry(kind)
            .or_insert_with(|| RgbaImage::new(width, height))
    }

    pub fn get(&self, kind: LayerKind) -> Option<&RgbaImage> {
        self.layers.get(&kind)
    }

    pub fn is_populated(&self, kind: LayerKind) -> bool {
        self.layers.contains_key(&kind)
    }

    /// Populated layers in output order
    pub fn populated(&self) -> Vec<LayerKind> {
        LayerKind::ALL
            .into_iter()
            .filter(|kind| self.is_populated(*kind))
            .collect()
    }

    /// Write every populated layer as `<dir>/<prefix>_<layer>.png`
    pub fn save(&self, dir: impl AsRef<Path>, prefix: &str, dpi: u32) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let mut written = Vec::new();
        for kind in self.populated() {
            if let Some(image) = self.layers.get(&kind) {
                let path = dir.join(kind.file_name(prefix));
                save_png(&path, image, dpi)?;
                log::debug!("Saved layer {}", path.display());
                written.push(path);
            }
        }
        Ok(written)
    }
}
