use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::io;

use crate::cancel::CancelToken;
use crate::error::Error;

/// The 8-byte signature that every PNG stream begins with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A decoded source image, ready to be rasterized at any number of sizes.
///
/// Decoding happens exactly once, at construction; every rasterized size
/// reuses the same pixel buffer. The image is immutable after construction.
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    /// Decodes an encoded image (PNG or JPEG) from memory.
    pub fn decode(bytes: &[u8]) -> Result<SourceImage, Error> {
        let image = image::load_from_memory(bytes)
            .map_err(|err| Error::Decode(err.to_string()))?;
        Ok(SourceImage::from(image))
    }

    /// Returns the width of the source, in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Returns the height of the source, in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

impl From<DynamicImage> for SourceImage {
    fn from(image: DynamicImage) -> SourceImage {
        SourceImage { pixels: image.to_rgba8() }
    }
}

/// One rasterized square bitmap, losslessly PNG-encoded.
pub struct SizedBitmap {
    size: u32,
    data: Vec<u8>,
}

impl SizedBitmap {
    /// Creates a bitmap from an edge length and PNG-encoded bytes.
    pub fn new(size: u32, data: Vec<u8>) -> SizedBitmap {
        SizedBitmap { size, data }
    }

    /// Returns the edge length (width == height) of the bitmap, in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the PNG-encoded bytes of the bitmap.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the encoded length of the bitmap, in bytes.
    pub fn byte_length(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the bitmap's bytes begin with the PNG signature.
    pub fn has_png_signature(&self) -> bool {
        self.data.starts_with(&PNG_SIGNATURE)
    }
}

/// Rasterizes the source at each requested size, returning the bitmaps
/// keyed by edge length.
///
/// Each size gets its own square surface; the source is stretched to fill
/// it exactly (icons are always square, non-square inputs distort) using
/// Lanczos resampling, then encoded losslessly to PNG. Sizes rasterize
/// independently and in parallel; a size that fails is logged and omitted
/// from the result rather than aborting the others.
pub fn rasterize(source: &SourceImage, sizes: &[u32]) -> BTreeMap<u32, SizedBitmap> {
    rasterize_cancelable(source, sizes, &CancelToken::new())
}

/// Like [`rasterize`], but skips sizes not yet started once the token is
/// canceled.
pub fn rasterize_cancelable(
    source: &SourceImage,
    sizes: &[u32],
    cancel: &CancelToken,
) -> BTreeMap<u32, SizedBitmap> {
    sizes
        .par_iter()
        .filter_map(|&size| {
            if cancel.is_canceled() {
                return None;
            }
            match rasterize_one(source, size) {
                Ok(bitmap) => Some((size, bitmap)),
                Err(err) => {
                    log::warn!("{}", err);
                    None
                }
            }
        })
        .collect()
}

fn rasterize_one(source: &SourceImage, size: u32) -> Result<SizedBitmap, Error> {
    if size == 0 {
        return Err(Error::Raster { size, reason: "zero-size surface".to_string() });
    }
    let surface = imageops::resize(&source.pixels, size, size, FilterType::Lanczos3);
    let data = encode_png(&surface)
        .map_err(|err| Error::Raster { size, reason: err.to_string() })?;
    Ok(SizedBitmap { size, data })
}

/// Encodes an RGBA surface to an in-memory PNG stream.
fn encode_png(surface: &RgbaImage) -> io::Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut encoder = png::Encoder::new(&mut data, surface.width(), surface.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(surface.as_raw())?;
    writer.finish()?;
    Ok(data)
}
