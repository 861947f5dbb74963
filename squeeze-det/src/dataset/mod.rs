//! Dataset loading toolkit.

mod kitti;

pub use kitti::*;
