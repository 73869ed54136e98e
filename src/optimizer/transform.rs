//! Per-type resource transforms applied before a payload is cached.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use tracing::{debug, warn};

use crate::optimizer::Resource;

/// Result of a transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub bytes: Bytes,
    /// True when the payload was actually rewritten
    pub optimized: bool,
}

impl Transformed {
    fn unchanged(bytes: Bytes) -> Self {
        Self {
            bytes,
            optimized: false,
        }
    }
}

// == Resource Transform ==
/// Rewrites a fetched payload. Transforms are synchronous and may be CPU
/// heavy; the optimizer runs them on the blocking pool.
pub trait ResourceTransform: Send + Sync {
    fn transform(&self, resource: &Resource, bytes: Bytes) -> Transformed;
}

// == Pass Through ==
/// Leaves the payload untouched. Default for scripts, styles, fonts and data.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl ResourceTransform for PassThrough {
    fn transform(&self, _resource: &Resource, bytes: Bytes) -> Transformed {
        Transformed::unchanged(bytes)
    }
}

// == Image Recompressor ==
/// Re-encodes images above a size threshold as JPEG at a fixed quality.
///
/// Payloads that cannot be decoded, or whose JPEG would not be smaller, are
/// passed through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct ImageRecompressor {
    threshold_bytes: u64,
    quality: u8,
}

impl ImageRecompressor {
    /// `quality` is a factor in `(0, 1]`, mapped onto the JPEG 1-100 scale.
    pub fn new(threshold_bytes: u64, quality: f32) -> Self {
        let quality = (quality.clamp(0.01, 1.0) * 100.0).round() as u8;
        Self {
            threshold_bytes,
            quality,
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    fn recompress(&self, bytes: &[u8]) -> image::ImageResult<Vec<u8>> {
        // JPEG has no alpha channel
        let decoded = image::load_from_memory(bytes)?.to_rgb8();

        let mut out = Vec::with_capacity(bytes.len() / 2);
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, self.quality);
            encoder.encode_image(&decoded)?;
        }
        Ok(out)
    }
}

impl ResourceTransform for ImageRecompressor {
    fn transform(&self, resource: &Resource, bytes: Bytes) -> Transformed {
        if bytes.len() as u64 <= self.threshold_bytes {
            return Transformed::unchanged(bytes);
        }

        match self.recompress(&bytes) {
            Ok(encoded) if encoded.len() >= bytes.len() => {
                debug!(
                    "Keeping original '{}': re-encoded size {} is not smaller than {}",
                    resource.id,
                    encoded.len(),
                    bytes.len()
                );
                Transformed::unchanged(bytes)
            }
            Ok(encoded) => {
                debug!(
                    "Recompressed '{}': {} -> {} bytes",
                    resource.id,
                    bytes.len(),
                    encoded.len()
                );
                Transformed {
                    bytes: Bytes::from(encoded),
                    optimized: true,
                }
            }
            Err(err) => {
                warn!("Error optimizing image '{}': {}", resource.id, err);
                Transformed::unchanged(bytes)
            }
        }
    }
}
