//! Fixed-width encoding of a single bounding box entry.

use crate::common::*;

/// Number of bytes occupied by one encoded box.
pub const BBOX_ENTRY_SIZE: usize = 20;

/// Pack a box as `cx, cy, w, h` (f32) followed by the class id (i32), all little-endian.
pub fn encode_bbox(label: &BBoxLabel) -> [u8; BBOX_ENTRY_SIZE] {
    let mut buf = [0u8; BBOX_ENTRY_SIZE];
    let [cx, cy, w, h] = label.cxcywh();
    LittleEndian::write_f32(&mut buf[0..4], cx);
    LittleEndian::write_f32(&mut buf[4..8], cy);
    LittleEndian::write_f32(&mut buf[8..12], w);
    LittleEndian::write_f32(&mut buf[12..16], h);
    LittleEndian::write_i32(&mut buf[16..20], label.class);
    buf
}

/// Concatenate the encoded entries of all boxes.
pub fn encode_bboxes(labels: &[BBoxLabel]) -> Vec<u8> {
    labels.iter().flat_map(encode_bbox).collect()
}

/// Decode exactly one entry.
pub fn decode_bbox(bytes: &[u8; BBOX_ENTRY_SIZE]) -> Option<BBoxLabel> {
    let cx = LittleEndian::read_f32(&bytes[0..4]);
    let cy = LittleEndian::read_f32(&bytes[4..8]);
    let w = LittleEndian::read_f32(&bytes[8..12]);
    let h = LittleEndian::read_f32(&bytes[12..16]);
    let class = LittleEndian::read_i32(&bytes[16..20]);
    BBoxLabel::try_from_fields([cx, cy, w, h], class).ok()
}

/// Decode a label blob into boxes.
///
/// The blob length must be an exact multiple of [BBOX_ENTRY_SIZE].
pub fn decode_bboxes(bytes: &[u8]) -> Result<Vec<BBoxLabel>> {
    if bytes.len() % BBOX_ENTRY_SIZE != 0 {
        return Err(Error::MalformedLabel { len: bytes.len() });
    }

    bytes
        .chunks_exact(BBOX_ENTRY_SIZE)
        .enumerate()
        .map(|(index, chunk)| {
            let entry: &[u8; BBOX_ENTRY_SIZE] = chunk
                .try_into()
                .map_err(|_| Error::MalformedLabel { len: bytes.len() })?;
            decode_bbox(entry).ok_or(Error::InvalidBBox { index })
        })
        .collect()
}
