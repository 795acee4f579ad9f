use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use yolotree::io::load_detector;
use yolotree::{DetectConfig, Detection, TensorView};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "YOLO9000 label-tree post-processing (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectConfigJson {
    score_threshold: f32,
    iou_threshold: f32,
    max_boxes: usize,
    parallel: bool,
}

impl Default for DetectConfigJson {
    fn default() -> Self {
        let cfg = DetectConfig::default();
        Self {
            score_threshold: cfg.score_threshold,
            iou_threshold: cfg.iou_threshold,
            max_boxes: cfg.max_boxes,
            parallel: cfg.parallel,
        }
    }
}

impl From<DetectConfigJson> for DetectConfig {
    fn from(value: DetectConfigJson) -> Self {
        Self {
            score_threshold: value.score_threshold,
            iou_threshold: value.iou_threshold,
            max_boxes: value.max_boxes,
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    tree_path: String,
    anchors_path: String,
    names_path: Option<String>,
    tensor_path: String,
    output_path: Option<String>,
    image_height: usize,
    image_width: usize,
    detect: DetectConfigJson,
}

/// Raw model output dumped by the model runner.
#[derive(Debug, Deserialize)]
struct TensorFile {
    shape: [usize; 4],
    data: Vec<f32>,
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    label: String,
    class: usize,
    score: f32,
    y_min: f32,
    x_min: f32,
    y_max: f32,
    x_max: f32,
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        Self {
            label: value.label,
            class: value.class,
            score: value.score,
            y_min: value.bbox.y_min,
            x_min: value.bbox.x_min,
            y_max: value.bbox.y_max,
            x_max: value.bbox.x_max,
        }
    }
}

#[derive(Debug, Serialize)]
struct ImageRecord {
    batch_index: usize,
    detections: Vec<DetectionRecord>,
}

#[derive(Debug, Serialize)]
struct Output {
    images: Vec<ImageRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("yolotree=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.tree_path.is_empty() || config.anchors_path.is_empty() || config.tensor_path.is_empty()
    {
        return Err("tree_path, anchors_path and tensor_path must be set in the config".into());
    }
    if config.image_height == 0 || config.image_width == 0 {
        return Err("image_height and image_width must be at least 1".into());
    }

    let detector = load_detector(
        &config.tree_path,
        &config.anchors_path,
        config.names_path.as_ref(),
    )?
    .with_config(config.detect.into());
    tracing::info!(
        nodes = detector.tree().len(),
        groups = detector.tree().groups().len(),
        anchors = detector.anchors().len(),
        "assets loaded"
    );

    let tensor_text = fs::read_to_string(&config.tensor_path)?;
    let tensor_file: TensorFile = serde_json::from_str(&tensor_text)?;
    let tensor = TensorView::new(&tensor_file.data, tensor_file.shape)?;

    let per_image = detector.detect_batch(tensor, config.image_height, config.image_width)?;
    let images = per_image
        .into_iter()
        .enumerate()
        .map(|(batch_index, detections)| ImageRecord {
            batch_index,
            detections: detections.into_iter().map(DetectionRecord::from).collect(),
        })
        .collect();
    let json = serde_json::to_string_pretty(&Output { images })?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
