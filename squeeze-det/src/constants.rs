//! Reference geometry of the KITTI SqueezeDet model.

pub const IMAGE_WIDTH: usize = 1242;
pub const IMAGE_HEIGHT: usize = 375;

pub const GRID_WIDTH: usize = 76;
pub const GRID_HEIGHT: usize = 22;

pub const ANCHORS_PER_GRID: usize = 9;

/// Geometry values stored per anchor slot: cx, cy, w, h.
pub const NUM_GEOMETRY_CHANNELS: usize = 4;

pub const NUM_OUT_CHANNELS: usize = ANCHORS_PER_GRID * NUM_GEOMETRY_CHANNELS;

/// Anchor (width, height) pairs in pixels, in slot order.
pub const ANCHOR_SHAPES: [[f32; 2]; ANCHORS_PER_GRID] = [
    [36.0, 37.0],
    [366.0, 174.0],
    [115.0, 59.0],
    [162.0, 87.0],
    [38.0, 90.0],
    [258.0, 173.0],
    [224.0, 108.0],
    [78.0, 170.0],
    [72.0, 43.0],
];

/// Known categories. The position of a name is its class id.
pub const CLASSES: [&str; 3] = ["car", "pedestrian", "cyclist"];

pub const JPEG_QUALITY: u8 = 75;
