use bytes::Bytes;

use crate::error::MemeError;
use crate::store::size_in_mb;

/// An uploaded image part, validated to carry an `image/*` content type.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    content_type: String,
    extension: String,
    data: Bytes,
}

impl ImageUpload {
    /// Validate the content type and wrap the bytes.
    ///
    /// The extension is the MIME subtype with any parameters stripped, so
    /// `image/png` becomes `png`.
    pub fn new(content_type: &str, data: Bytes) -> Result<Self, MemeError> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let extension = match essence.strip_prefix("image/") {
            Some(subtype) if !subtype.is_empty() && !subtype.contains('/') => subtype.to_string(),
            _ => {
                return Err(MemeError::UnsupportedMediaType {
                    content_type: content_type.to_string(),
                })
            }
        };

        Ok(Self {
            content_type: essence,
            extension,
            data,
        })
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size in megabytes, rounded to two decimals.
    pub fn size_mb(&self) -> f64 {
        size_in_mb(self.data.len())
    }
}
