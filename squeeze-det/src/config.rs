//! Conversion and encoding configuration.

use crate::{
    anchor::{AnchorGrid, AnchorGridInit},
    common::*,
    constants,
    grid_label::{GridLabelEncoder, GridLabelEncoderInit},
    image_codec::JpegCodec,
};

/// The main configuration. Missing fields fall back to the KITTI reference values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub image_width: usize,
    pub image_height: usize,
    pub grid_width: usize,
    pub grid_height: usize,
    /// Anchor (width, height) pairs in pixels.
    pub anchor_shapes: Vec<[R32; 2]>,
    /// Known class names. The position of a name is its class id.
    pub classes: Vec<String>,
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_width: constants::IMAGE_WIDTH,
            image_height: constants::IMAGE_HEIGHT,
            grid_width: constants::GRID_WIDTH,
            grid_height: constants::GRID_HEIGHT,
            anchor_shapes: constants::ANCHOR_SHAPES
                .iter()
                .map(|&[w, h]| [r32(w), r32(h)])
                .collect(),
            classes: constants::CLASSES.iter().map(|name| name.to_string()).collect(),
            jpeg_quality: constants::JPEG_QUALITY,
        }
    }
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: Self = json5::from_str(&text)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.classes.is_empty(), "the class list must not be empty");
        let unique: HashSet<_> = self.classes.iter().map(|name| name.to_lowercase()).collect();
        ensure!(
            unique.len() == self.classes.len(),
            "duplicated class names found"
        );
        JpegCodec::new(self.jpeg_quality)?;
        Ok(())
    }

    /// Class names keyed by lowercase name, in class id order.
    pub fn class_index(&self) -> IndexSet<String> {
        self.classes.iter().map(|name| name.to_lowercase()).collect()
    }

    pub fn anchor_grid(&self) -> Result<AnchorGrid> {
        AnchorGridInit {
            num_x: self.grid_width,
            num_y: self.grid_height,
            image_width: self.image_width,
            image_height: self.image_height,
            shapes: self
                .anchor_shapes
                .iter()
                .map(|&[w, h]| [w.raw(), h.raw()])
                .collect(),
        }
        .build()
    }

    pub fn grid_label_encoder(&self, anchors: Arc<AnchorGrid>) -> Result<GridLabelEncoder> {
        GridLabelEncoderInit {
            grid_width: self.grid_width,
            grid_height: self.grid_height,
            anchors_per_cell: self.anchor_shapes.len(),
        }
        .build(anchors)
    }

    pub fn image_codec(&self) -> Result<JpegCodec> {
        JpegCodec::new(self.jpeg_quality)
    }
}
