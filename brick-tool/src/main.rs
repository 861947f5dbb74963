use anyhow::{Context, Result};
use brick::{RecordReader, RecordWriter};
use clap::Parser;
use log::{info, warn};
use prettytable::{cell, row, Table};
use squeeze_det::{
    dataset::{KittiDataset, Split},
    Config, EncodeStats, ImageCodec,
};
use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Debug, Clone, Parser)]
/// Convert KITTI data into brick record files and inspect them.
enum Opts {
    /// Write the train and trainval splits as brick files.
    Convert {
        #[clap(long, default_value = "../data/KITTI")]
        /// root folder containing all data
        data: PathBuf,
        #[clap(long, default_value = ".")]
        /// directory receiving the .brick files
        output_dir: PathBuf,
        #[clap(long)]
        /// json5 configuration file
        config: Option<PathBuf>,
    },
    /// Read a brick file and grid-encode every record.
    Inspect {
        /// brick file
        file: PathBuf,
        #[clap(long)]
        /// json5 configuration file
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let filters = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();

    match Opts::parse() {
        Opts::Convert {
            data,
            output_dir,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            for split in [Split::Train, Split::TrainVal] {
                let output_file = output_dir.join(format!("{}.brick", split));
                convert(&config, &data, split, &output_file)?;
                info!("finished writing {}", split);
            }
        }
        Opts::Inspect { file, config } => {
            let config = load_config(config.as_deref())?;
            inspect(&config, &file)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::open(path)
            .with_context(|| format!("failed to load config file '{}'", path.display()))?,
        None => Config::default(),
    };
    Ok(config)
}

fn convert(config: &Config, data_dir: &Path, split: Split, output_file: &Path) -> Result<()> {
    let codec = config.image_codec()?;
    let dataset = KittiDataset::load(data_dir, split, config.class_index())?;
    let mut writer = RecordWriter::create(output_file)
        .with_context(|| format!("failed to create '{}'", output_file.display()))?;
    let mut num_skipped = 0;

    for (index, sample) in dataset.samples.iter().enumerate() {
        if index > 0 && index % 1000 == 0 {
            info!("saved {} images", index);
        }

        let record = sample.to_record(&codec)?;
        match writer.write(&record) {
            Ok(()) => {}
            Err(err @ brick::Error::ImageTooLarge { .. }) => {
                warn!("skip sample {}: {}", sample.id, err);
                num_skipped += 1;
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to write sample {} to '{}'", sample.id, output_file.display())
                })
            }
        }
    }
    writer.close()?;

    if num_skipped > 0 {
        warn!(
            "{} of {} samples in {} did not fit the record format",
            num_skipped,
            dataset.samples.len(),
            split
        );
    }
    Ok(())
}

fn inspect(config: &Config, file: &Path) -> Result<()> {
    let codec = config.image_codec()?;
    let anchors = Arc::new(config.anchor_grid()?);
    let encoder = config.grid_label_encoder(anchors)?;
    let mut reader = RecordReader::open(file)
        .with_context(|| format!("failed to open '{}'", file.display()))?;

    let mut stats = EncodeStats::default();
    let mut num_boxes = 0;
    let mut num_undecodable = 0;
    let mut truncated = None;

    loop {
        let record = match reader.read_record() {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(err @ brick::Error::TruncatedRecord { .. }) => {
                truncated = Some(err);
                break;
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed to read record {}", reader.records_read() + 1)
                })
            }
        };

        if codec.decode_image(&record.image).is_err() {
            num_undecodable += 1;
        }
        num_boxes += record.bboxes.len();
        stats += encoder.encode(&record.bboxes).stats;
    }

    let end_of_stream = if truncated.is_some() {
        "truncated"
    } else {
        "clean"
    };

    let mut table = Table::new();
    table.add_row(row!["records", reader.records_read()]);
    table.add_row(row!["bytes", reader.offset()]);
    table.add_row(row!["boxes", num_boxes]);
    table.add_row(row!["assigned", stats.assigned]);
    table.add_row(row!["dropped", stats.dropped]);
    table.add_row(row!["distance fallback", stats.fallback]);
    table.add_row(row!["undecodable images", num_undecodable]);
    table.add_row(row!["end of stream", end_of_stream]);
    table.printstd();

    if let Some(err) = truncated {
        warn!("'{}' is corrupt: {}", file.display(), err);
    }

    Ok(())
}
