//! Frame payload decoding.

use crate::error::StoreError;
use image::DynamicImage;

/// Turns an encoded frame payload into an image.
///
/// The engines treat this as opaque: they never inspect payload bytes.
pub trait FrameDecoder {
    fn decode(&self, payload: &[u8]) -> Result<DynamicImage, StoreError>;
}

/// Decoder backed by the `image` crate's format sniffing.
///
/// Handles whatever encodings the enabled `image` features cover (PNG, JPEG).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameDecoder for ImageCrateDecoder {
    fn decode(&self, payload: &[u8]) -> Result<DynamicImage, StoreError> {
        Ok(image::load_from_memory(payload)?)
    }
}

/// Encodes an image as PNG bytes, the inverse of [`ImageCrateDecoder`].
///
/// Used to build synthetic frame payloads.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, StoreError> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image.write_to(&mut buffer, image::ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
