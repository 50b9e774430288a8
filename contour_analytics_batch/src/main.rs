use clap::Parser;
use contour_analytics::{
    AnalysisConfig, Study, Structure, StructureKind, analyze_study, aperture::Beam,
    pipeline::StructureFailure, ranking::TargetDvh,
};
use env_logger::Env;
use log::{info, warn};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "contour-analytics")]
#[command(about = "Structure geometry and MLC aperture complexity for one study")]
#[command(version)]
struct Cli {
    /// Study JSON file
    input: PathBuf,

    /// Analysis configuration JSON file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report output path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Number of threads to use (default: all available cores)
    #[arg(short, long)]
    threads: Option<usize>,
}

#[derive(Debug, Error)]
enum BatchError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to set thread pool size: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to write report: {0}")]
    Report(serde_json::Error),
}

/// Structure as stored: canonical contour text plus its structure set ROI type.
#[derive(Debug, Deserialize)]
struct StructureInput {
    name: String,
    #[serde(default)]
    roi_type: String,
    #[serde(default)]
    provenance: String,
    contours: String,
}

#[derive(Debug, Deserialize)]
struct StudyInput {
    #[serde(default)]
    structures: Vec<StructureInput>,
    #[serde(default)]
    beams: Vec<Beam>,
    #[serde(default)]
    target_dvhs: Vec<TargetDvh>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, BatchError> {
    let text = fs::read_to_string(path).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| BatchError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Compose every structure. One that fails to parse or compose is recorded as failed and the
/// rest of the study is still analyzed.
fn load_study(input: StudyInput) -> Study {
    let mut structures = Vec::with_capacity(input.structures.len());
    let mut failed_structures = Vec::new();
    for s in input.structures {
        let kind = StructureKind::from_roi_type(&s.roi_type);
        match Structure::from_contour_text(s.name.as_str(), kind, s.provenance, &s.contours) {
            Ok(structure) => structures.push(structure),
            Err(e) => {
                warn!("structure '{}' not loaded: {e}", s.name);
                failed_structures.push(StructureFailure {
                    name: s.name,
                    reason: e.to_string(),
                });
            }
        }
    }
    Study {
        structures,
        failed_structures,
        beams: input.beams,
        target_dvhs: input.target_dvhs,
    }
}

fn run(cli: Cli) -> Result<(), BatchError> {
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
        info!("Using {} threads", threads);
    }

    let config: AnalysisConfig = match &cli.config {
        Some(path) => read_json(path)?,
        None => AnalysisConfig::default(),
    };
    let study = load_study(read_json(&cli.input)?);
    info!(
        "Analyzing {} structures and {} beams from {}",
        study.structures.len(),
        study.beams.len(),
        cli.input.display()
    );

    let report = analyze_study(&study, &config);
    let json = serde_json::to_string_pretty(&report).map_err(BatchError::Report)?;
    match &cli.output {
        Some(path) => fs::write(path, json).map_err(|source| BatchError::Io {
            path: path.clone(),
            source,
        })?,
        None => println!("{json}"),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "0.0,0.0,0.0,10.0,0.0,10.0,10.0,0.0,10.0:1.0,0.0,0.0,10.0,0.0,10.0,10.0,0.0,10.0";

    fn input(structures: &[(&str, &str)]) -> StudyInput {
        let structures: Vec<serde_json::Value> = structures
            .iter()
            .map(|(name, contours)| {
                serde_json::json!({ "name": name, "roi_type": "ORGAN", "contours": contours })
            })
            .collect();
        serde_json::from_value(serde_json::json!({ "structures": structures })).unwrap()
    }

    #[test]
    fn bad_structure_is_recorded_and_siblings_load() {
        let study = load_study(input(&[
            ("Bladder", SQUARE),
            ("BadZ", "nan,0.0,0.0,10.0,0.0,10.0,10.0"),
            ("Garbage", "0.0,abc,1.0"),
        ]));
        assert_eq!(study.structures.len(), 1);
        assert_eq!(study.structures[0].name(), "Bladder");
        let failed: Vec<&str> = study
            .failed_structures
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(failed, vec!["BadZ", "Garbage"]);

        let report = analyze_study(&study, &AnalysisConfig::default());
        assert_eq!(report.failed_structures.len(), 2);
        let volume = report.structures[0].volume.unwrap();
        assert!((volume - 0.2).abs() < 1e-9);
    }

    #[test]
    fn non_finite_loop_only_drops_its_slice() {
        let text = format!("{SQUARE}:2.0,0.0,nan,10.0,0.0,10.0,10.0");
        let study = load_study(input(&[("Rectum", text.as_str())]));
        assert!(study.failed_structures.is_empty());
        assert_eq!(study.structures[0].planes().len(), 2);
    }
}
