//! Safe bounding box types and functions.

mod common;

pub use cxcywh::*;
pub mod cxcywh;

pub use ltrb::*;
pub mod ltrb;

pub use rect::*;
pub mod rect;

pub mod prelude {
    pub use crate::rect::{Rect, RectFloat, RectNum};
}
