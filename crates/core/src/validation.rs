//! Input checks applied before a request leaves the client.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use validator::{Validate, ValidationError};

use crate::error::CoreError;

/// Largest accepted upload, in bytes.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Run the derived [`Validate`] rules and convert failures to [`CoreError`].
pub fn validate<T: Validate>(value: &T) -> Result<(), CoreError> {
    value.validate().map_err(CoreError::from)
}

/// Reject empty or whitespace-only strings.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Finite degrees within [-90, 90]. NaN fails every range comparison, so
/// it is checked explicitly.
pub fn latitude(value: f64) -> Result<(), ValidationError> {
    degrees_within(value, 90.0, "latitude must be within [-90, 90]")
}

/// Finite degrees within [-180, 180].
pub fn longitude(value: f64) -> Result<(), ValidationError> {
    degrees_within(value, 180.0, "longitude must be within [-180, 180]")
}

fn degrees_within(value: f64, limit: f64, message: &'static str) -> Result<(), ValidationError> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        return Ok(());
    }
    let mut err = ValidationError::new("range");
    err.message = Some(message.into());
    Err(err)
}

/// An image file ready to be attached to a door submission.
///
/// Construction sniffs the container format from the header bytes and
/// reads the pixel dimensions without decoding the full image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, CoreError> {
        if bytes.is_empty() {
            return Err(CoreError::InvalidImage("file is empty".into()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(CoreError::InvalidImage(format!(
                "file is {} bytes, limit is {MAX_IMAGE_BYTES}",
                bytes.len()
            )));
        }

        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| CoreError::InvalidImage(e.to_string()))?;

        let content_type = match reader.format() {
            Some(ImageFormat::Jpeg) => "image/jpeg",
            Some(ImageFormat::Png) => "image/png",
            Some(ImageFormat::WebP) => "image/webp",
            Some(other) => {
                return Err(CoreError::InvalidImage(format!(
                    "unsupported format {other:?}"
                )))
            }
            None => return Err(CoreError::InvalidImage("unrecognised format".into())),
        };

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| CoreError::InvalidImage(e.to_string()))?;

        Ok(Self {
            file_name: file_name.into(),
            content_type,
            width,
            height,
            bytes,
        })
    }
}

/// Smallest valid PNG: 1x1 transparent pixel.
#[cfg(test)]
pub(crate) const TINY_PNG: &[u8] = include_bytes!("../testdata/pixel.png");
