//! Assignment of ground-truth boxes to anchors and the dense label tensor.

use crate::{anchor::AnchorGrid, common::*, constants::NUM_GEOMETRY_CHANNELS};

/// The score used to pick an anchor for a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMetric {
    /// Intersection over union, larger is better.
    Iou,
    /// Euclidean distance of `[cx, cy, w, h]`, used when the box overlaps no anchor.
    Distance,
}

/// Counters collected while encoding one example.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    /// Boxes written into the tensor.
    pub assigned: usize,
    /// Boxes whose best anchor was already claimed by an earlier box.
    pub dropped: usize,
    /// Boxes matched by distance because they overlap no anchor.
    pub fallback: usize,
}

impl std::ops::AddAssign for EncodeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.assigned += rhs.assigned;
        self.dropped += rhs.dropped;
        self.fallback += rhs.fallback;
    }
}

/// The encoded label of one example.
#[derive(Debug, Clone)]
pub struct GridLabel {
    /// Tensor in `[channel, grid_y, grid_x]` layout.
    pub tensor: Array3<f32>,
    pub stats: EncodeStats,
}

#[derive(Debug, Clone)]
pub struct GridLabelEncoderInit {
    pub grid_width: usize,
    pub grid_height: usize,
    pub anchors_per_cell: usize,
}

impl GridLabelEncoderInit {
    pub fn build(self, anchors: Arc<AnchorGrid>) -> Result<GridLabelEncoder> {
        let Self {
            grid_width,
            grid_height,
            anchors_per_cell,
        } = self;

        ensure!(
            grid_width > 0 && grid_height > 0 && anchors_per_cell > 0,
            "grid dimensions must be positive"
        );
        ensure!(
            anchors.num_x() == grid_width
                && anchors.num_y() == grid_height
                && anchors.num_shapes() == anchors_per_cell,
            "the anchor grid ({}x{}x{}) does not match the label grid ({}x{}x{})",
            anchors.num_x(),
            anchors.num_y(),
            anchors.num_shapes(),
            grid_width,
            grid_height,
            anchors_per_cell
        );

        Ok(GridLabelEncoder {
            anchors,
            grid_width,
            grid_height,
            anchors_per_cell,
        })
    }
}

/// Encodes box lists into `[anchors_per_cell * 4, grid_height, grid_width]` tensors.
///
/// Shape slot `k` of a cell occupies channels `4k..4k + 4`, holding
/// `cx, cy, w, h` of the assigned box. Class ids are not encoded.
///
/// The encoder only reads the shared anchor table, so one instance can serve
/// many threads. Every call to [GridLabelEncoder::encode] keeps its own set of
/// claimed anchors.
#[derive(Debug, Clone)]
pub struct GridLabelEncoder {
    anchors: Arc<AnchorGrid>,
    grid_width: usize,
    grid_height: usize,
    anchors_per_cell: usize,
}

impl GridLabelEncoder {
    pub fn anchors(&self) -> &AnchorGrid {
        &self.anchors
    }

    pub fn num_channels(&self) -> usize {
        self.anchors_per_cell * NUM_GEOMETRY_CHANNELS
    }

    /// Tensor shape as `(channels, grid_height, grid_width)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.num_channels(), self.grid_height, self.grid_width)
    }

    /// Pick the best anchor for a box.
    ///
    /// Scores every anchor by IoU. If all IoUs are zero, the anchor nearest
    /// in `[cx, cy, w, h]` wins instead. Ties go to the lowest index.
    pub fn select_anchor(&self, rect: &CxCyWH<f32>) -> (usize, MatchMetric) {
        let anchors = self.anchors.anchors();
        let ious = anchors.iter().map(|anchor| rect.iou_with(anchor, 0.0));

        match first_argmax(ious) {
            Some((index, iou)) if iou > 0.0 => (index, MatchMetric::Iou),
            _ => {
                let scores = anchors.iter().map(|anchor| -rect.distance_to(anchor));
                let (index, _) = first_argmax(scores).unwrap_or((0, 0.0));
                (index, MatchMetric::Distance)
            }
        }
    }

    /// Encode the boxes of one example.
    ///
    /// Boxes are assigned in input order. A box whose best anchor was
    /// claimed by an earlier box is dropped, never moved to another anchor.
    pub fn encode(&self, bboxes: &[BBoxLabel]) -> GridLabel {
        let mut tensor = Array3::zeros(self.shape());
        let stats = self.encode_into(bboxes, tensor.view_mut());
        GridLabel { tensor, stats }
    }

    /// Encode a batch into a `[batch, channels, grid_height, grid_width]` tensor.
    pub fn encode_batch<B>(&self, batch: &[B]) -> (Array4<f32>, EncodeStats)
    where
        B: AsRef<[BBoxLabel]>,
    {
        let (channels, height, width) = self.shape();
        let mut tensor = Array4::zeros((batch.len(), channels, height, width));
        let mut stats = EncodeStats::default();

        for (bboxes, example) in batch.iter().zip(tensor.outer_iter_mut()) {
            stats += self.encode_into(bboxes.as_ref(), example);
        }

        (tensor, stats)
    }

    fn encode_into(&self, bboxes: &[BBoxLabel], mut tensor: ArrayViewMut3<f32>) -> EncodeStats {
        debug_assert_eq!(tensor.dim(), self.shape());

        let mut claimed = HashSet::new();
        let mut stats = EncodeStats::default();

        for bbox in bboxes {
            let (anchor_index, metric) = self.select_anchor(&bbox.rect);
            if metric == MatchMetric::Distance {
                stats.fallback += 1;
            }

            if !claimed.insert(anchor_index) {
                debug!(
                    "drop box {:?} because anchor {} is already taken",
                    bbox, anchor_index
                );
                stats.dropped += 1;
                continue;
            }

            let position = match self.anchors.locate(anchor_index) {
                Some(position) => position,
                None => unreachable!("anchor index {} out of range", anchor_index),
            };
            let channel = position.shape * NUM_GEOMETRY_CHANNELS;
            let values = bbox.cxcywh();
            tensor
                .slice_mut(s![
                    channel..channel + NUM_GEOMETRY_CHANNELS,
                    position.grid_y,
                    position.grid_x
                ])
                .iter_mut()
                .zip(values)
                .for_each(|(dst, src)| *dst = src);
            stats.assigned += 1;
        }

        stats
    }
}

/// Find the first maximum. NaN scores never win.
fn first_argmax<I>(scores: I) -> Option<(usize, f32)>
where
    I: IntoIterator<Item = f32>,
{
    scores
        .into_iter()
        .enumerate()
        .fold(None, |best, (index, score)| match best {
            Some((_, best_score)) if !(score > best_score) => best,
            None if score.is_nan() => None,
            _ => Some((index, score)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{Anchor, AnchorGridInit};
    use approx::assert_abs_diff_eq;

    fn bbox(cxcywh: [f32; 4], class: i32) -> BBoxLabel {
        BBoxLabel::try_from_fields(cxcywh, class).unwrap()
    }

    fn encoder(
        num_x: usize,
        num_y: usize,
        width: usize,
        height: usize,
        shapes: Vec<[f32; 2]>,
    ) -> GridLabelEncoder {
        let anchors = AnchorGridInit {
            num_x,
            num_y,
            image_width: width,
            image_height: height,
            shapes: shapes.clone(),
        }
        .build()
        .unwrap();
        GridLabelEncoderInit {
            grid_width: num_x,
            grid_height: num_y,
            anchors_per_cell: shapes.len(),
        }
        .build(Arc::new(anchors))
        .unwrap()
    }

    #[test]
    fn first_argmax_prefers_lowest_index() {
        assert_eq!(first_argmax(vec![0.5, 0.9, 0.9, 0.1]), Some((1, 0.9)));
        assert_eq!(first_argmax(vec![f32::NAN, 0.2, 0.2]), Some((1, 0.2)));
        assert_eq!(first_argmax(vec![]), None);
    }

    #[test]
    fn box_on_anchor_center() {
        // anchors sit at 50, 100 and 150 on both axes
        let encoder = encoder(3, 3, 200, 200, vec![[50.0, 50.0]]);
        let label = encoder.encode(&[bbox([100.0, 100.0, 50.0, 50.0], 0)]);

        assert_eq!(label.tensor.dim(), (4, 3, 3));
        assert_eq!(
            label.stats,
            EncodeStats {
                assigned: 1,
                dropped: 0,
                fallback: 0
            }
        );
        let values: Vec<f32> = label.tensor.slice(s![.., 1, 1]).to_vec();
        assert_eq!(values, vec![100.0, 100.0, 50.0, 50.0]);
        assert_abs_diff_eq!(label.tensor.sum(), 300.0);
    }

    #[test]
    fn shape_slot_selects_channels() {
        let encoder = encoder(1, 1, 100, 100, vec![[10.0, 10.0], [60.0, 30.0]]);
        let (index, metric) = encoder.select_anchor(&bbox([50.0, 50.0, 58.0, 32.0], 1).rect);
        assert_eq!((index, metric), (1, MatchMetric::Iou));

        let label = encoder.encode(&[bbox([50.0, 50.0, 58.0, 32.0], 1)]);
        assert!(label.tensor.slice(s![0..4, 0, 0]).iter().all(|&v| v == 0.0));
        assert_eq!(
            label.tensor.slice(s![4..8, 0, 0]).to_vec(),
            vec![50.0, 50.0, 58.0, 32.0]
        );
    }

    #[test]
    fn batch_examples_do_not_share_claims() {
        let encoder = encoder(3, 3, 200, 200, vec![[50.0, 50.0]]);
        let same = vec![bbox([100.0, 100.0, 50.0, 50.0], 0)];
        let (tensor, stats) = encoder.encode_batch(&[same.clone(), same]);

        assert_eq!(tensor.dim(), (2, 4, 3, 3));
        assert_eq!(stats.assigned, 2);
        assert_eq!(stats.dropped, 0);
        assert_eq!(tensor[[1, 0, 1, 1]], 100.0);
    }

    #[test]
    fn reject_mismatched_grid() {
        let anchors = AnchorGrid::from_anchors(
            2,
            2,
            1,
            vec![Anchor::try_from_cxcywh([1.0, 1.0, 1.0, 1.0]).unwrap(); 4],
        )
        .unwrap();
        let result = GridLabelEncoderInit {
            grid_width: 2,
            grid_height: 3,
            anchors_per_cell: 1,
        }
        .build(Arc::new(anchors));
        assert!(result.is_err());
    }
}
