/// Avatar image normalization
///
/// Uploads are constrained by filename extension and byte size, then
/// cover-resized to a fixed 250x250 canvas and re-encoded as PNG. Everything
/// stored and served is therefore a predictable, bounded PNG regardless of
/// what the client uploaded.
use std::io::Cursor;

use image::{imageops::FilterType, ImageFormat};

/// Maximum accepted upload size in bytes
pub const MAX_AVATAR_BYTES: usize = 1_000_000;

/// Output canvas edge length in pixels
pub const AVATAR_DIMENSION: u32 = 250;

/// Error type for avatar processing
#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    /// Filename extension not in the accepted set
    #[error("Please upload a JPG, JPEG, or PNG file.")]
    UnsupportedFile,

    /// Upload exceeds the byte limit
    #[error("Avatar must be at most {MAX_AVATAR_BYTES} bytes.")]
    TooLarge,

    /// Bytes could not be decoded as an image
    #[error("Could not read image data: {0}")]
    Decode(String),

    /// Re-encoding the normalized image failed
    #[error("Could not encode image: {0}")]
    Encode(String),
}

/// Checks a filename for an accepted image extension (case-insensitive)
pub fn has_allowed_extension(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    lower.ends_with(".jpg") || lower.ends_with(".jpeg") || lower.ends_with(".png")
}

/// Normalizes uploaded bytes into the stored avatar format
///
/// Decodes the input, cover-resizes to exactly
/// [`AVATAR_DIMENSION`]x[`AVATAR_DIMENSION`] (scaling to fill and cropping
/// the overflow), and re-encodes as PNG.
///
/// # Errors
///
/// [`AvatarError::TooLarge`] when the input exceeds [`MAX_AVATAR_BYTES`];
/// [`AvatarError::Decode`] when the bytes are not a decodable image.
pub fn normalize(bytes: &[u8]) -> Result<Vec<u8>, AvatarError> {
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(AvatarError::TooLarge);
    }

    let img = image::load_from_memory(bytes).map_err(|e| AvatarError::Decode(e.to_string()))?;

    let resized = img.resize_to_fill(AVATAR_DIMENSION, AVATAR_DIMENSION, FilterType::Triangle);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| AvatarError::Encode(e.to_string()))?;

    Ok(out.into_inner())
}
