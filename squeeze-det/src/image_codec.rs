use crate::common::*;
use image::{codecs::jpeg::JpegEncoder, ColorType};

/// Converts between decoded images and the opaque bytes stored in records.
pub trait ImageCodec
where
    Self: Debug + Send + Sync,
{
    fn encode_image(&self, image: &DynamicImage) -> Result<Vec<u8>>;

    fn decode_image(&self, bytes: &[u8]) -> Result<DynamicImage>;
}

/// Stores images as baseline RGB JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegCodec {
    pub quality: u8,
}

impl JpegCodec {
    pub fn new(quality: u8) -> Result<Self> {
        ensure!(
            (1..=100).contains(&quality),
            "JPEG quality must be within 1..=100, but get {}",
            quality
        );
        Ok(Self { quality })
    }
}

impl ImageCodec for JpegCodec {
    fn encode_image(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let rgb = image.to_rgb8();
        let mut bytes = vec![];
        JpegEncoder::new_with_quality(&mut bytes, self.quality).encode(
            &rgb,
            rgb.width(),
            rgb.height(),
            ColorType::Rgb8,
        )?;
        Ok(bytes)
    }

    fn decode_image(&self, bytes: &[u8]) -> Result<DynamicImage> {
        let image = image::load_from_memory(bytes).context("failed to decode image bytes")?;
        Ok(image)
    }
}
