//! Embedded pictures.
//!
//! Image decoding lives outside the document: a [`PictureDecoder`] turns
//! the raw `\pict` payload into a [`Picture`], which keeps its original
//! bytes so it can be written back out unchanged.

use crate::error::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// Twips per pixel at 96 DPI.
pub const TWIPS_PER_PIXEL: f32 = 15.0;

/// Encoded image format, named after its RTF keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PictureKind {
    /// `\wmetafile1`
    WindowsMetafile,
    /// `\emfblip`
    EnhancedMetafile,
    /// `\pngblip`
    Png,
    /// `\jpegblip`
    Jpeg,
}

impl PictureKind {
    /// RTF control word naming this format.
    #[must_use]
    pub const fn rtf_keyword(self) -> &'static str {
        match self {
            Self::WindowsMetafile => "wmetafile1",
            Self::EnhancedMetafile => "emfblip",
            Self::Png => "pngblip",
            Self::Jpeg => "jpegblip",
        }
    }

    /// Look up a format by RTF control word (`wmetafile` with any mapping mode).
    #[must_use]
    pub fn from_rtf_keyword(word: &str) -> Option<Self> {
        match word {
            "emfblip" => Some(Self::EnhancedMetafile),
            "pngblip" => Some(Self::Png),
            "jpegblip" => Some(Self::Jpeg),
            w if w.starts_with("wmetafile") => Some(Self::WindowsMetafile),
            _ => None,
        }
    }
}

/// A decoded picture: its size plus the original encoded bytes.
#[derive(Clone, PartialEq)]
pub struct Picture {
    kind: PictureKind,
    data: Arc<[u8]>,
    width: f32,
    height: f32,
}

impl Picture {
    /// Build a picture with an explicit pixel size.
    #[must_use]
    pub fn new(kind: PictureKind, data: impl Into<Arc<[u8]>>, width: f32, height: f32) -> Self {
        Self {
            kind,
            data: data.into(),
            width,
            height,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PictureKind {
        self.kind
    }

    /// Original encoded bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Width in twips.
    #[must_use]
    pub fn width_twips(&self) -> i32 {
        (self.width * TWIPS_PER_PIXEL).round() as i32
    }

    /// Height in twips.
    #[must_use]
    pub fn height_twips(&self) -> i32 {
        (self.height * TWIPS_PER_PIXEL).round() as i32
    }
}

impl fmt::Debug for Picture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Picture")
            .field("kind", &self.kind)
            .field("bytes", &self.data.len())
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Turns an encoded payload into a [`Picture`].
pub trait PictureDecoder: fmt::Debug {
    /// Decode `data`. `goal_width`/`goal_height` are the `\picwgoal` /
    /// `\pichgoal` values in twips when present.
    fn decode(
        &self,
        kind: PictureKind,
        data: Vec<u8>,
        goal_width: Option<i32>,
        goal_height: Option<i32>,
    ) -> Result<Picture>;
}

/// Decoder that keeps the bytes as-is and sizes from the RTF goal values,
/// falling back to the PNG header when the goals are missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct RawPictureDecoder;

impl RawPictureDecoder {
    fn png_size(data: &[u8]) -> Option<(u32, u32)> {
        const SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
        if data.len() < 24 || !data.starts_with(SIGNATURE) || &data[12..16] != b"IHDR" {
            return None;
        }
        let width = u32::from_be_bytes(data[16..20].try_into().ok()?);
        let height = u32::from_be_bytes(data[20..24].try_into().ok()?);
        Some((width, height))
    }
}

impl PictureDecoder for RawPictureDecoder {
    fn decode(
        &self,
        kind: PictureKind,
        data: Vec<u8>,
        goal_width: Option<i32>,
        goal_height: Option<i32>,
    ) -> Result<Picture> {
        if data.is_empty() {
            return Err(Error::InvalidArgument("empty picture payload".into()));
        }
        let (width, height) = match (goal_width, goal_height) {
            (Some(w), Some(h)) => (w as f32 / TWIPS_PER_PIXEL, h as f32 / TWIPS_PER_PIXEL),
            _ => match (kind, Self::png_size(&data)) {
                (PictureKind::Png, Some((w, h))) => (w as f32, h as f32),
                _ => (32.0, 32.0),
            },
        };
        Ok(Picture::new(kind, data, width, height))
    }
}
