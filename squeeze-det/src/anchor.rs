//! Anchor boxes tiled over the image.
//!
//! Anchors are stored in one flat table ordered by grid column (x) first,
//! then grid row (y), then anchor shape. The flat index of shape `k` in the
//! cell at `(grid_x, grid_y)` is
//!
//! ```text
//! index = (grid_x * num_y + grid_y) * num_shapes + k
//! ```
//!
//! and [AnchorGrid::locate] inverts it with the matching division and modulo.
//! Consumers decoding a grid label tensor must use the same arithmetic.

use crate::common::*;

/// An anchor box in absolute pixel units.
pub type Anchor = CxCyWH<f32>;

/// Position of an anchor within the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorIndex {
    pub grid_x: usize,
    pub grid_y: usize,
    pub shape: usize,
}

/// Parameters of an evenly spaced anchor grid.
#[derive(Debug, Clone)]
pub struct AnchorGridInit {
    pub num_x: usize,
    pub num_y: usize,
    pub image_width: usize,
    pub image_height: usize,
    /// Anchor (width, height) pairs, in slot order.
    pub shapes: Vec<[f32; 2]>,
}

impl AnchorGridInit {
    /// Generate the anchor table.
    ///
    /// Each axis is split into `num + 1` equal intervals and the `num`
    /// interior breakpoints become anchor centers, so no center lies on the
    /// image border.
    pub fn build(self) -> Result<AnchorGrid> {
        let Self {
            num_x,
            num_y,
            image_width,
            image_height,
            shapes,
        } = self;

        ensure!(
            num_x > 0 && num_y > 0,
            "the grid must have at least one column and one row"
        );
        ensure!(
            image_width > 0 && image_height > 0,
            "image size must be positive"
        );
        ensure!(!shapes.is_empty(), "at least one anchor shape is required");
        for &[w, h] in &shapes {
            ensure!(
                w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0,
                "anchor shape ({}, {}) must be positive and finite",
                w,
                h
            );
        }

        let xs = interior_points(image_width, num_x);
        let ys = interior_points(image_height, num_y);
        let anchors: Vec<Anchor> = iproduct!(xs, ys, shapes.iter())
            .map(|(cx, cy, &[w, h])| Anchor::try_from_cxcywh([cx, cy, w, h]))
            .try_collect()?;

        Ok(AnchorGrid {
            num_x,
            num_y,
            num_shapes: shapes.len(),
            anchors,
        })
    }
}

/// The immutable anchor table shared by all encoders.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorGrid {
    num_x: usize,
    num_y: usize,
    num_shapes: usize,
    anchors: Vec<Anchor>,
}

impl AnchorGrid {
    /// Build a grid from an explicit anchor table.
    ///
    /// The table must already follow the x, y, shape ordering.
    pub fn from_anchors(
        num_x: usize,
        num_y: usize,
        num_shapes: usize,
        anchors: Vec<Anchor>,
    ) -> Result<Self> {
        ensure!(
            num_x > 0 && num_y > 0 && num_shapes > 0,
            "anchor grid dimensions must be positive"
        );
        ensure!(
            anchors.len() == num_x * num_y * num_shapes,
            "expect {} anchors for a {}x{}x{} grid, but get {}",
            num_x * num_y * num_shapes,
            num_x,
            num_y,
            num_shapes,
            anchors.len()
        );
        Ok(Self {
            num_x,
            num_y,
            num_shapes,
            anchors,
        })
    }

    pub fn num_x(&self) -> usize {
        self.num_x
    }

    pub fn num_y(&self) -> usize {
        self.num_y
    }

    pub fn num_shapes(&self) -> usize {
        self.num_shapes
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn get(&self, index: usize) -> Option<&Anchor> {
        self.anchors.get(index)
    }

    /// Recover the grid position of a flat anchor index.
    pub fn locate(&self, index: usize) -> Option<AnchorIndex> {
        if index >= self.anchors.len() {
            return None;
        }
        let shape = index % self.num_shapes;
        let cell = index / self.num_shapes;
        Some(AnchorIndex {
            grid_x: cell / self.num_y,
            grid_y: cell % self.num_y,
            shape,
        })
    }

    /// The flat index of a grid position.
    pub fn index_of(&self, index: AnchorIndex) -> Option<usize> {
        let AnchorIndex {
            grid_x,
            grid_y,
            shape,
        } = index;
        (grid_x < self.num_x && grid_y < self.num_y && shape < self.num_shapes)
            .then(|| (grid_x * self.num_y + grid_y) * self.num_shapes + shape)
    }
}

/// The `num` interior breakpoints of `[0, length]` split into `num + 1` parts.
fn interior_points(length: usize, num: usize) -> Vec<f32> {
    let step = length as f64 / (num + 1) as f64;
    (1..=num).map(|nth| (step * nth as f64) as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    #[test]
    fn kitti_anchor_count() -> Result<()> {
        let grid = AnchorGridInit {
            num_x: GRID_WIDTH,
            num_y: GRID_HEIGHT,
            image_width: IMAGE_WIDTH,
            image_height: IMAGE_HEIGHT,
            shapes: ANCHOR_SHAPES.to_vec(),
        }
        .build()?;

        assert_eq!(grid.len(), GRID_WIDTH * GRID_HEIGHT * ANCHORS_PER_GRID);
        assert!(grid.anchors().iter().all(|anchor| {
            let [cx, cy, _, _] = anchor.cxcywh();
            cx > 0.0 && cx < IMAGE_WIDTH as f32 && cy > 0.0 && cy < IMAGE_HEIGHT as f32
        }));
        Ok(())
    }

    #[test]
    fn anchor_order_is_x_then_y_then_shape() -> Result<()> {
        let grid = AnchorGridInit {
            num_x: 3,
            num_y: 2,
            image_width: 400,
            image_height: 300,
            shapes: vec![[10.0, 20.0], [30.0, 40.0]],
        }
        .build()?;

        let centers: Vec<_> = grid
            .anchors()
            .iter()
            .map(|anchor| (anchor.cx(), anchor.cy()))
            .collect();
        assert_eq!(
            centers,
            vec![
                (100.0, 100.0),
                (100.0, 100.0),
                (100.0, 200.0),
                (100.0, 200.0),
                (200.0, 100.0),
                (200.0, 100.0),
                (200.0, 200.0),
                (200.0, 200.0),
                (300.0, 100.0),
                (300.0, 100.0),
                (300.0, 200.0),
                (300.0, 200.0),
            ]
        );
        assert_eq!(grid.anchors()[5].cxcywh(), [200.0, 100.0, 30.0, 40.0]);
        Ok(())
    }

    #[test]
    fn locate_inverts_index_of() -> Result<()> {
        let grid = AnchorGridInit {
            num_x: 4,
            num_y: 3,
            image_width: 100,
            image_height: 100,
            shapes: vec![[1.0, 1.0], [2.0, 2.0]],
        }
        .build()?;

        for index in 0..grid.len() {
            let position = grid.locate(index).unwrap();
            assert_eq!(grid.index_of(position), Some(index));
        }
        assert_eq!(
            grid.locate(11),
            Some(AnchorIndex {
                grid_x: 1,
                grid_y: 2,
                shape: 1
            })
        );
        assert_eq!(grid.locate(grid.len()), None);
        Ok(())
    }

    #[test]
    fn reject_bad_parameters() {
        let init = AnchorGridInit {
            num_x: 2,
            num_y: 2,
            image_width: 100,
            image_height: 100,
            shapes: vec![[1.0, 1.0]],
        };
        assert!(AnchorGridInit {
            num_x: 0,
            ..init.clone()
        }
        .build()
        .is_err());
        assert!(AnchorGridInit {
            shapes: vec![],
            ..init.clone()
        }
        .build()
        .is_err());
        assert!(AnchorGridInit {
            shapes: vec![[1.0, 0.0]],
            ..init
        }
        .build()
        .is_err());
    }

    #[test]
    fn explicit_table_must_match_dimensions() {
        let anchor = Anchor::try_from_cxcywh([1.0, 1.0, 1.0, 1.0]).unwrap();
        assert!(AnchorGrid::from_anchors(2, 2, 1, vec![anchor; 4]).is_ok());
        assert!(AnchorGrid::from_anchors(2, 2, 1, vec![anchor; 3]).is_err());
    }
}
