use crate::{common::*, image_codec::ImageCodec};
use brick::Record;

/// The KITTI object detection splits listed under `ImageSets/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    TrainVal,
    Val,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::TrainVal => "trainval",
            Self::Val => "val",
        }
    }
}

impl Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Ok(match text {
            "train" => Self::Train,
            "trainval" => Self::TrainVal,
            "val" => Self::Val,
            _ => bail!("unknown split '{}'", text),
        })
    }
}

/// One example of the dataset. The image is loaded on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct KittiSample {
    pub id: String,
    pub image_file: PathBuf,
    pub bboxes: Vec<BBoxLabel>,
}

impl KittiSample {
    pub fn load_image(&self) -> Result<DynamicImage> {
        let image = image::open(&self.image_file)
            .with_context(|| format!("failed to load image '{}'", self.image_file.display()))?;
        Ok(image)
    }

    /// Load the image and pack it with the boxes into a record.
    pub fn to_record<C>(&self, codec: &C) -> Result<Record>
    where
        C: ImageCodec + ?Sized,
    {
        let image = codec.encode_image(&self.load_image()?)?;
        Ok(Record::new(image, self.bboxes.clone()))
    }
}

/// The KITTI object detection dataset.
#[derive(Debug, Clone)]
pub struct KittiDataset {
    pub split: Split,
    pub classes: IndexSet<String>,
    pub samples: Vec<KittiSample>,
}

impl KittiDataset {
    /// Read the example ids of a split and the label file of every example.
    ///
    /// The directory layout is
    ///
    /// ```text
    /// <root>/ImageSets/<split>.txt
    /// <root>/training/image_2/<id>.png
    /// <root>/training/label_2/<id>.txt
    /// ```
    pub fn load<P>(root: P, split: Split, classes: IndexSet<String>) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let root = root.as_ref();
        let ids_file = root.join("ImageSets").join(format!("{}.txt", split));
        let ids: Vec<String> = fs::read_to_string(&ids_file)
            .with_context(|| format!("failed to read '{}'", ids_file.display()))?
            .lines()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();

        let image_dir = root.join("training").join("image_2");
        let label_dir = root.join("training").join("label_2");

        let samples: Vec<_> = ids
            .into_iter()
            .enumerate()
            .map(|(index, id)| -> Result<_> {
                if index > 0 && index % 1000 == 0 {
                    info!("loaded {} {} labels", index, split);
                }

                let image_file = image_dir.join(format!("{}.png", id));
                let label_file = label_dir.join(format!("{}.txt", id));
                let bboxes = read_label_file(&label_file, &classes)?;

                Ok(KittiSample {
                    id,
                    image_file,
                    bboxes,
                })
            })
            .try_collect()?;

        info!("loaded {} samples from {} split", samples.len(), split);

        Ok(Self {
            split,
            classes,
            samples,
        })
    }

    pub fn num_bboxes(&self) -> usize {
        self.samples.iter().map(|sample| sample.bboxes.len()).sum()
    }
}

/// Parse all objects of a label file, skipping unknown categories and
/// zero-area boxes.
pub fn read_label_file<P>(path: P, classes: &IndexSet<String>) -> Result<Vec<BBoxLabel>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read label file '{}'", path.display()))?;

    let bboxes: Vec<_> = text
        .lines()
        .enumerate()
        .map(|(line_index, line)| -> Result<_> {
            let object = parse_object(line, classes).with_context(|| {
                format!("invalid object at {}:{}", path.display(), line_index + 1)
            })?;
            let bbox = object.and_then(|(class, ltrb)| {
                let bbox = to_bbox(class, ltrb);
                if bbox.is_none() {
                    warn!(
                        "skip zero-area box {:?} at {}:{}",
                        ltrb,
                        path.display(),
                        line_index + 1
                    );
                }
                bbox
            });
            Ok(bbox)
        })
        .filter_map(Result::transpose)
        .try_collect()?;
    Ok(bboxes)
}

/// Parse one object line.
///
/// A line reads `class truncated occluded alpha x1 y1 x2 y2 ...`. The corner
/// coordinates are converted into center and size. Returns `Ok(None)` for
/// blank lines, for classes not in `classes` and for zero-area boxes.
pub fn parse_label_line(line: &str, classes: &IndexSet<String>) -> Result<Option<BBoxLabel>> {
    let bbox = parse_object(line, classes)?.and_then(|(class, ltrb)| {
        let bbox = to_bbox(class, ltrb);
        if bbox.is_none() {
            warn!("skip zero-area box {:?}", ltrb);
        }
        bbox
    });
    Ok(bbox)
}

/// Extract the class id and the corners of a known object.
fn parse_object(line: &str, classes: &IndexSet<String>) -> Result<Option<(i32, LTRB<f32>)>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let class_name = match fields.first() {
        Some(name) => name.to_lowercase(),
        None => return Ok(None),
    };
    let class = match classes.get_index_of(&class_name) {
        Some(class) => i32::try_from(class)?,
        None => return Ok(None),
    };
    ensure!(
        fields.len() >= 8,
        "expect at least 8 fields, but get {}",
        fields.len()
    );

    let ltrb: Vec<f32> = fields[4..8]
        .iter()
        .map(|field| {
            field
                .parse::<f32>()
                .with_context(|| format!("invalid coordinate '{}'", field))
        })
        .try_collect()?;
    let ltrb = LTRB::try_from_ltrb([ltrb[0], ltrb[1], ltrb[2], ltrb[3]])?;
    Ok(Some((class, ltrb)))
}

fn to_bbox(class: i32, ltrb: LTRB<f32>) -> Option<BBoxLabel> {
    let rect = CxCyWH::from(ltrb);
    (rect.w() > 0.0 && rect.h() > 0.0).then(|| BBoxLabel { rect, class })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CLASSES;

    fn classes() -> IndexSet<String> {
        CLASSES.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn parse_kitti_object() -> Result<()> {
        let line = "Pedestrian 0.00 0 -0.20 712.40 143.00 810.73 307.92 1.89 0.48 1.20 1.84 1.47 8.41 0.01";
        let bbox = parse_label_line(line, &classes())?.unwrap();
        assert_eq!(bbox.class, 1);
        let [cx, cy, w, h] = bbox.cxcywh();
        approx::assert_abs_diff_eq!(cx, 761.565, epsilon = 1e-3);
        approx::assert_abs_diff_eq!(cy, 225.46, epsilon = 1e-3);
        approx::assert_abs_diff_eq!(w, 98.33, epsilon = 1e-3);
        approx::assert_abs_diff_eq!(h, 164.92, epsilon = 1e-3);
        Ok(())
    }

    #[test]
    fn skip_unknown_and_blank() -> Result<()> {
        let line = "DontCare -1 -1 -10 503.89 169.71 590.61 190.13 -1 -1 -1 -1000 -1000 -1000 -10";
        assert!(parse_label_line(line, &classes())?.is_none());
        assert!(parse_label_line("   ", &classes())?.is_none());
        Ok(())
    }

    #[test]
    fn reject_short_or_invalid_lines() {
        assert!(parse_label_line("Car 0.00 0 -1.0 10 20", &classes()).is_err());
        assert!(parse_label_line("Car 0.00 0 -1.0 10 20 abc 40", &classes()).is_err());
        assert!(parse_label_line("Car 0.00 0 -1.0 30 20 10 40", &classes()).is_err());
    }

    #[test]
    fn skip_zero_area_box() -> Result<()> {
        let line = "Car 0.00 0 -1.58 587.01 173.33 587.01 200.12 1.65 1.67 3.64 -0.65 1.71 46.70 -1.59";
        assert!(parse_label_line(line, &classes())?.is_none());
        let line = "Car 0.00 0 -1.58 587.01 173.33 614.12 173.33 1.65 1.67 3.64 -0.65 1.71 46.70 -1.59";
        assert!(parse_label_line(line, &classes())?.is_none());
        Ok(())
    }

    #[test]
    fn split_names() -> Result<()> {
        assert_eq!("trainval".parse::<Split>()?, Split::TrainVal);
        assert_eq!(Split::Train.to_string(), "train");
        assert!("test".parse::<Split>().is_err());
        Ok(())
    }
}
