use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::classify::Category;
use crate::config::DashboardConfig;
use crate::dashboard::{Dashboard, LoadStatus};
use crate::filter::FilterCriteria;
use crate::metrics::{DataSummary, Metrics};
use crate::search::{SearchEntry, highlight};
use crate::sinks::{DataSink, GeoJsonSink, GeoJsonlSink, frame_rows};
use crate::source::{DataSource, FileSource, UploadReport};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Dashboard payload: a JSON file, or an http(s) URL with the `http` feature
    #[arg(short, long)]
    pub input: String,

    /// Dashboard configuration (YAML): incident types, camera padding, search limit
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Filter criteria snapshot (YAML); everything is shown when omitted
    #[arg(long)]
    pub criteria: Option<PathBuf>,

    /// Write the filtered features to this file (.geojson, .geojsonl)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format (auto-detected from the output extension if omitted)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Search the loaded entities and include ranked matches in the report
    #[arg(short, long)]
    pub search: Option<String>,

    /// Upload an incident FeatureCollection, then reload
    #[arg(long, requires = "upload_url")]
    pub upload: Option<PathBuf>,

    /// Upload endpoint used with --upload
    #[arg(long)]
    pub upload_url: Option<String>,

    /// Include the unfiltered incident summary in the report
    #[arg(long)]
    pub summary: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum OutputFormat {
    #[value(name = "geojson")]
    GeoJson,
    #[value(name = "geojsonl", alias = "jsonl")]
    GeoJsonl,
}

pub fn output_format_label(format: &OutputFormat) -> &'static str {
    match format {
        OutputFormat::GeoJson => "geojson",
        OutputFormat::GeoJsonl => "geojsonl",
    }
}

pub fn detect_format(requested: Option<OutputFormat>, output: &Path) -> Result<OutputFormat> {
    requested
        .or_else(|| {
            let ext = output.extension()?.to_str()?;
            match ext.to_lowercase().as_str() {
                "geojson" => Some(OutputFormat::GeoJson),
                "geojsonl" | "jsonl" => Some(OutputFormat::GeoJsonl),
                _ => None,
            }
        })
        .context("CLI: Could not detect output format from extension; use --format")
}

pub fn init_sink(format: &OutputFormat, output: &Path) -> Result<Box<dyn DataSink>> {
    if output == Path::new("-") {
        anyhow::bail!("CLI: Feature output to stdout is not supported; stdout carries the report");
    }
    tracing::info!("Sink: {} -> {:?}", output_format_label(format), output);
    match format {
        OutputFormat::GeoJson => Ok(Box::new(GeoJsonSink::new(output)?)),
        OutputFormat::GeoJsonl => Ok(Box::new(GeoJsonlSink::new(output)?)),
    }
}

pub fn is_remote(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

pub fn open_source(input: &str) -> Result<Box<dyn DataSource>> {
    if is_remote(input) {
        return open_remote(input, None).map(|source| source as Box<dyn DataSource>);
    }
    Ok(Box::new(FileSource::new(input)))
}

#[cfg(feature = "http")]
fn open_remote(
    input: &str,
    upload_url: Option<String>,
) -> Result<Box<crate::source::HttpSource>> {
    Ok(Box::new(crate::source::HttpSource::new(input, upload_url)?))
}

#[cfg(not(feature = "http"))]
fn open_remote(input: &str, _upload_url: Option<String>) -> Result<Box<FileSource>> {
    anyhow::bail!("CLI: {input} is a URL but hydromap was built without the `http` feature")
}

/// Everything printed to stdout after a run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub status: LoadStatus,
    pub metrics: Metrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features_written: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload: Option<UploadReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<Vec<SearchHit>>,
    /// The top search hit, which a "go to first result" action zooms to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DataSummary>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub label: String,
    pub entity_type: String,
    pub category: Category,
    pub highlighted: String,
    /// Padded camera bounds, `[[minLat, minLng], [maxLat, maxLng]]`.
    pub bounds: Option<[[f64; 2]; 2]>,
}

impl SearchHit {
    fn new(dashboard: &Dashboard, entry: &SearchEntry, query: &str) -> Self {
        let bounds = match dashboard.zoom_bounds(&entry.feature) {
            Ok(bounds) => Some(bounds.to_array()),
            Err(err) => {
                tracing::warn!("No zoom bounds for {:?}: {}", entry.label, err);
                None
            }
        };
        SearchHit {
            label: entry.label.clone(),
            entity_type: entry.entity_type.clone(),
            category: entry.category(),
            highlighted: highlight(&entry.label, query).to_string(),
            bounds,
        }
    }
}

pub fn load_config(cli: &Cli) -> Result<(DashboardConfig, FilterCriteria)> {
    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("Config: Failed to load {:?}", path))?,
        None => DashboardConfig::default(),
    };
    let criteria = match &cli.criteria {
        Some(path) => FilterCriteria::load(path)
            .with_context(|| format!("Config: Failed to load criteria {:?}", path))?,
        None => FilterCriteria::default(),
    };
    Ok((config, criteria))
}

pub fn run(cli: &Cli) -> Result<Report> {
    let (config, criteria) = load_config(cli)?;
    tracing::info!(
        "Config: {} incident types, search limit {}",
        config.incident_types.len(),
        config.search_result_limit
    );

    let mut dashboard = Dashboard::new(config);
    let source = open_source(&cli.input)?;
    dashboard.load(&*source)?;

    let upload = match &cli.upload {
        Some(path) => Some(upload(&mut dashboard, cli, path)?),
        None => None,
    };

    let frame = dashboard.render(&criteria);
    let features_written = match &cli.output {
        Some(output) => {
            let format = detect_format(cli.format, output)?;
            let mut sink = init_sink(&format, output)?;
            let rows = frame_rows(&frame, &dashboard.config().incident_types);
            let count = rows.len();
            for row in rows {
                sink.add_feature(row)
                    .context("Sink: Failed to write feature")?;
            }
            sink.finish().context("Sink: Failed to finalize output")?;
            tracing::info!("Done! Written {} features to {:?}", count, output);
            Some(count)
        }
        None => None,
    };

    let search: Option<Vec<SearchHit>> = cli.search.as_deref().map(|query| {
        dashboard
            .search(query)
            .into_iter()
            .map(|entry| SearchHit::new(&dashboard, entry, query))
            .collect()
    });
    let selected = cli.search.as_deref().and_then(|query| {
        dashboard
            .search_index()
            .best_match(query)
            .map(|entry| SearchHit::new(&dashboard, entry, query))
    });

    Ok(Report {
        status: dashboard.status().clone(),
        metrics: frame.metrics,
        features_written,
        upload,
        search,
        selected,
        summary: cli.summary.then(|| dashboard.summary()),
    })
}

fn upload(dashboard: &mut Dashboard, cli: &Cli, path: &Path) -> Result<UploadReport> {
    if !is_remote(&cli.input) {
        anyhow::bail!("CLI: --upload needs an http(s) --input to reload from");
    }
    let remote = open_remote(&cli.input, cli.upload_url.clone())?;
    upload_with(dashboard, &remote, path)
}

#[cfg(feature = "http")]
fn upload_with(
    dashboard: &mut Dashboard,
    remote: &crate::source::HttpSource,
    path: &Path,
) -> Result<UploadReport> {
    Ok(dashboard.upload(remote, remote, path)?)
}

#[cfg(not(feature = "http"))]
fn upload_with(_dashboard: &mut Dashboard, _remote: &FileSource, _path: &Path) -> Result<UploadReport> {
    anyhow::bail!("CLI: --upload requires the `http` feature")
}
