//! The brick record format.
//!
//! A brick file is a plain concatenation of records. Each record carries one
//! encoded image and the bounding boxes labelled on it:
//!
//! ```text
//! record      := image_frame label_frame
//! image_frame := image_size:u16-LE image_bytes[image_size]
//! label_frame := label_size:u32-LE label_bytes[label_size]
//! label_bytes := box_entry*
//! box_entry   := cx:f32-LE cy:f32-LE w:f32-LE h:f32-LE class:i32-LE
//! ```
//!
//! There is no file header or record count. Readers stop when the stream
//! ends exactly on a record boundary.

mod common;

pub mod bbox_codec;
pub mod error;
pub mod reader;
pub mod record;
pub mod writer;

pub use bbox_codec::*;
pub use error::*;
pub use reader::*;
pub use record::*;
pub use writer::*;

/// Width of the image size field in bytes.
pub const IMAGE_SIZE_BYTES: usize = 2;

/// Width of the label size field in bytes.
pub const LABEL_SIZE_BYTES: usize = 4;

/// Largest image blob the image size field can describe.
pub const MAX_IMAGE_SIZE: usize = u16::MAX as usize;

/// Largest label blob the label size field can describe.
pub const MAX_LABEL_SIZE: usize = u32::MAX as usize;
