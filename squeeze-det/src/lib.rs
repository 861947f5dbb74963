//! Anchor-grid label encoding for single-shot detectors and the KITTI
//! conversion pipeline that feeds brick record files.

mod common;
pub mod anchor;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod grid_label;
pub mod image_codec;

pub use anchor::{Anchor, AnchorGrid, AnchorGridInit, AnchorIndex};
pub use config::Config;
pub use grid_label::{
    EncodeStats, GridLabel, GridLabelEncoder, GridLabelEncoderInit, MatchMetric,
};
pub use image_codec::{ImageCodec, JpegCodec};
