use crate::{common::*, encode_bboxes, MAX_IMAGE_SIZE, MAX_LABEL_SIZE};

/// One training example: an opaque encoded image and its boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub image: Vec<u8>,
    pub bboxes: Vec<BBoxLabel>,
}

impl Record {
    pub fn new(image: Vec<u8>, bboxes: Vec<BBoxLabel>) -> Self {
        Self { image, bboxes }
    }

    /// Number of bytes this record occupies in a brick stream.
    pub fn encoded_len(&self) -> usize {
        crate::IMAGE_SIZE_BYTES
            + self.image.len()
            + crate::LABEL_SIZE_BYTES
            + self.bboxes.len() * crate::BBOX_ENTRY_SIZE
    }

    /// Serialize the image frame followed by the label frame.
    ///
    /// Size limits are checked before anything is written, so a rejected
    /// record never leaves a partial frame behind.
    pub fn encode_to<W>(&self, mut writer: W) -> Result<()>
    where
        W: Write,
    {
        let image_size = u16::try_from(self.image.len()).map_err(|_| Error::ImageTooLarge {
            size: self.image.len(),
            max: MAX_IMAGE_SIZE,
        })?;
        let label_bytes = encode_bboxes(&self.bboxes);
        let label_size = u32::try_from(label_bytes.len()).map_err(|_| Error::LabelTooLarge {
            size: label_bytes.len(),
            max: MAX_LABEL_SIZE,
        })?;

        writer.write_u16::<LittleEndian>(image_size)?;
        writer.write_all(&self.image)?;
        writer.write_u32::<LittleEndian>(label_size)?;
        writer.write_all(&label_bytes)?;
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_to(&mut buf)?;
        Ok(buf)
    }
}
