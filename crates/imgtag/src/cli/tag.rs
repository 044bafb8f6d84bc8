//! The `imgtag tag` command: batch tagging with sidecar output.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};

use imgtag_core::{
    sidecar_path, write_sidecar, Config, ImageTagger, OnnxClassifier, OutputFormat, OutputWriter,
    PipelineError, ProcessingStats, TaggedImage, Taxonomy,
};

/// Arguments for the `tag` command.
#[derive(Args, Debug)]
pub struct TagArgs {
    /// Image file or directory to tag
    #[arg(required = true)]
    pub input: PathBuf,

    /// Model name under the model directory
    #[arg(long)]
    pub model: Option<String>,

    /// Fixed threshold for general tags
    #[arg(long)]
    pub general_threshold: Option<f32>,

    /// Use adaptive (MCut) thresholding for general tags
    #[arg(long)]
    pub general_mcut: bool,

    /// Fixed threshold for character tags
    #[arg(long)]
    pub character_threshold: Option<f32>,

    /// Use adaptive (MCut) thresholding for character tags
    #[arg(long)]
    pub character_mcut: bool,

    /// Comma-separated tags to prepend to every image's tag line
    #[arg(long, value_delimiter = ',')]
    pub prepend: Vec<String>,

    /// Skip images that already have a .txt sidecar
    #[arg(long)]
    pub skip_existing: bool,

    /// Do not write .txt sidecar files
    #[arg(long)]
    pub no_sidecar: bool,

    /// Write full tagging records (rating/character/general) to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Record format for --output (defaults to the configured output.format)
    #[arg(short, long, value_enum)]
    pub format: Option<RecordFormat>,
}

/// Record format options for `--output`.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RecordFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<RecordFormat> for OutputFormat {
    fn from(format: RecordFormat) -> Self {
        match format {
            RecordFormat::Json => OutputFormat::Json,
            RecordFormat::Jsonl => OutputFormat::JsonLines,
        }
    }
}

/// Fold CLI flags into the loaded configuration.
fn apply_overrides(config: &mut Config, args: &TagArgs) {
    if let Some(ref model) = args.model {
        config.model.name = model.clone();
    }
    if let Some(threshold) = args.general_threshold {
        config.tagging.general_threshold = threshold;
    }
    if args.general_mcut {
        config.tagging.general_mcut = true;
    }
    if let Some(threshold) = args.character_threshold {
        config.tagging.character_threshold = threshold;
    }
    if args.character_mcut {
        config.tagging.character_mcut = true;
    }
    if !args.prepend.is_empty() {
        config.tagging.prepend_tags = args.prepend.clone();
    }
}

/// Execute the tag command.
pub async fn execute(args: TagArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);

    let model_path = config.model_path();
    let tags_path = config.tags_path();
    if !model_path.exists() || !tags_path.exists() {
        anyhow::bail!(
            "Model '{}' not found.\nExpected {} and {}. Place the classifier's \
             model.onnx and selected_tags.csv there, or pass --model.",
            config.model.name,
            model_path.display(),
            tags_path.display(),
        );
    }

    let taxonomy = Arc::new(Taxonomy::load(&tags_path)?);
    tracing::info!("Loading classifier from {:?}", model_path);
    let backend = Arc::new(OnnxClassifier::load(&model_path)?);

    let tagger = ImageTagger::new(&config, backend, taxonomy);

    let files = tagger.discover(&args.input);
    if files.is_empty() {
        tracing::warn!("No supported image files found at {:?}", args.input);
        return Ok(());
    }
    tracing::info!("Found {} image(s) to tag", files.len());

    // Record output: JSONL streams as results arrive, JSON collects for the
    // closing array.
    let record_format = match args.format {
        Some(format) => OutputFormat::from(format),
        None => OutputFormat::parse(&config.output.format).unwrap_or(OutputFormat::JsonLines),
    };
    let mut stream_writer = match (&args.output, record_format) {
        (Some(path), OutputFormat::JsonLines) => {
            let file = File::create(path)?;
            Some(OutputWriter::new(
                BufWriter::new(file),
                record_format,
                false,
            ))
        }
        _ => None,
    };
    let mut collected: Vec<TaggedImage> = Vec::new();

    let single = files.len() == 1 && args.input.is_file();
    let progress = if single {
        None
    } else {
        Some(create_progress_bar(files.len() as u64))
    };

    let mut stats = ProcessingStats::default();
    let start_time = Instant::now();

    for file in &files {
        if args.skip_existing && sidecar_path(&file.path).exists() {
            stats.skipped += 1;
            if let Some(bar) = &progress {
                bar.inc(1);
            }
            continue;
        }

        match tag_one(&tagger, &file.path, args.no_sidecar).await {
            Ok(result) => {
                stats.succeeded += 1;
                if single {
                    println!("{}", result.tag_string);
                }
                if let Some(writer) = &mut stream_writer {
                    writer.write(&result)?;
                } else if args.output.is_some() {
                    collected.push(result);
                }
            }
            Err(e) => {
                stats.failed += 1;
                tracing::error!("Failed: {:?} - {}", file.path, e);
            }
        }

        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }

    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    if let Some(mut writer) = stream_writer.take() {
        writer.flush()?;
    }
    if let (Some(path), OutputFormat::Json) = (&args.output, record_format) {
        let file = File::create(path)?;
        let mut writer = OutputWriter::new(BufWriter::new(file), record_format, config.output.pretty);
        writer.write_all(&collected)?;
        writer.flush()?;
    }
    if let Some(path) = &args.output {
        tracing::info!("Records written to {:?}", path);
    }

    stats.total_seconds = start_time.elapsed().as_secs_f64();
    if stats.total_seconds > 0.0 {
        stats.images_per_second = stats.succeeded as f64 / stats.total_seconds;
    }
    tracing::info!(
        "Tagged {} image(s), {} failed, {} skipped in {:.1}s ({:.1} img/s)",
        stats.succeeded,
        stats.failed,
        stats.skipped,
        stats.total_seconds,
        stats.images_per_second,
    );

    Ok(())
}

/// Tag one image and, unless disabled, write its sidecar.
async fn tag_one(
    tagger: &ImageTagger,
    path: &std::path::Path,
    no_sidecar: bool,
) -> Result<TaggedImage, PipelineError> {
    let result = tagger.tag_image(path).await?;
    if !no_sidecar {
        write_sidecar(path, &result.tag_string)?;
    }
    Ok(result)
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> TagArgs {
        TagArgs {
            input: PathBuf::from("photos"),
            model: None,
            general_threshold: None,
            general_mcut: false,
            character_threshold: None,
            character_mcut: false,
            prepend: vec![],
            skip_existing: false,
            no_sidecar: false,
            output: None,
            format: None,
        }
    }

    #[test]
    fn test_overrides_replace_thresholds() {
        let mut config = Config::default();
        let mut args = base_args();
        args.general_threshold = Some(0.5);
        args.character_mcut = true;

        apply_overrides(&mut config, &args);
        assert_eq!(config.tagging.general_threshold, 0.5);
        assert!(config.tagging.character_mcut);
        // Untouched flags keep their config values.
        assert_eq!(config.tagging.character_threshold, 0.85);
        assert!(!config.tagging.general_mcut);
    }

    #[test]
    fn test_overrides_replace_model_and_prepend() {
        let mut config = Config::default();
        let mut args = base_args();
        args.model = Some("other-tagger".to_string());
        args.prepend = vec!["masterpiece".to_string(), "scan".to_string()];

        apply_overrides(&mut config, &args);
        assert_eq!(config.model.name, "other-tagger");
        assert_eq!(config.tagging.prepend_tags, vec!["masterpiece", "scan"]);
    }

    #[test]
    fn test_empty_prepend_keeps_config_value() {
        let mut config = Config::default();
        config.tagging.prepend_tags = vec!["from-config".to_string()];
        apply_overrides(&mut config, &base_args());
        assert_eq!(config.tagging.prepend_tags, vec!["from-config"]);
    }

    #[test]
    fn test_record_format_conversion() {
        assert_eq!(OutputFormat::from(RecordFormat::Json), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from(RecordFormat::Jsonl),
            OutputFormat::JsonLines
        );
    }
}
