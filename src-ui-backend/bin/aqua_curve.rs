use std::error::Error;
use std::path::PathBuf;

use aqua_backend::{EqualizerConfig, EqualizerState, Viewport, init_logging, svg_path, to_path};
use aqua_iir::{CurvePoint, SampledCurve, compute_curve, compute_markers};
use clap::{Parser, ValueEnum};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One `frequency gain` line per sample
    Table,
    /// Curve and band markers as JSON
    Json,
    /// SVG path data scaled to --width x --height
    Svg,
}

#[derive(Parser)]
#[command(name = "aqua-curve")]
#[command(about = "Print the aggregate response of an equalizer state", long_about = None)]
struct Cli {
    /// Equalizer state document (JSON: filters + preamp)
    #[arg(short, long, value_name = "FILE")]
    state: PathBuf,

    /// YAML bounds file; falls back to AQUA_CONFIG, then the defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Number of log steps of the sweep (overrides the config)
    #[arg(long)]
    steps: Option<usize>,

    #[arg(long, default_value = "800")]
    width: f64,

    #[arg(long, default_value = "300")]
    height: f64,
}

#[derive(Serialize)]
struct CurveReport<'a> {
    preamp: f64,
    curve: &'a SampledCurve,
    markers: &'a [CurvePoint],
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EqualizerConfig::load(path)?,
        None => EqualizerConfig::from_env()?,
    };
    if let Some(steps) = cli.steps {
        config.graph.num_steps = steps;
        config.validate()?;
    }

    let text = std::fs::read_to_string(&cli.state)
        .map_err(|e| format!("cannot read {}: {}", cli.state.display(), e))?;
    let mut state: EqualizerState = serde_json::from_str(&text)?;
    state.sort_by_frequency();
    log::info!(
        "{} filters from {}, preamp {} dB",
        state.filters.len(),
        cli.state.display(),
        state.preamp
    );

    let curve = compute_curve(&state.filters, state.preamp, &config);
    match cli.format {
        OutputFormat::Table => {
            for p in &curve.points {
                println!("{:10.2} {:8.3}", p.frequency, p.gain);
            }
        }
        OutputFormat::Json => {
            let markers = compute_markers(&state.filters, state.preamp, &config);
            let report = CurveReport {
                preamp: state.preamp,
                curve: &curve,
                markers: &markers,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Svg => {
            let viewport = Viewport::new(cli.width, cli.height, &config);
            println!("{}", svg_path(&to_path(&curve.points, &viewport)));
        }
    }
    Ok(())
}
