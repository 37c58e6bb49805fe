//! Rootstar Topo Application
//!
//! Command-line front end for turning per-electrode EEG features into
//! topographic image stacks.
//!
//! # Usage
//!
//! ```bash
//! # Images from a JSON file with `positions` and `features`
//! rootstar-topo generate --input data.json --output images.json
//!
//! # Same, with a config file and a few overrides
//! rootstar-topo generate -i data.json -o images.json --config cfg.json --grid 16 --edgeless
//!
//! # Synthetic 16-electrode session, band powers, images
//! rootstar-topo demo --trials 40 --grid 24
//! ```

use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rootstar_topo_core::types::SensorPosition;
use rootstar_topo_core::RunningStats;
use rootstar_topo_native::features::{BandPowerExtractor, Trial};
use rootstar_topo_native::{ChannelStats, FeatureMatrix, ImageConfig, PipelineContext, PipelineOutput};

/// Rootstar Topo Application
#[derive(Parser, Debug)]
#[command(name = "rootstar-topo")]
#[command(author, version, about = "EEG feature to topographic image converter", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate images from electrode positions and a feature matrix
    Generate {
        /// Input JSON with `positions` ([x, y, z] rows) and `features` (sample rows)
        #[arg(short, long)]
        input: PathBuf,

        /// Output JSON path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Run the pipeline on a synthetic 10-20 session
    Demo {
        /// Number of simulated trials
        #[arg(long, default_value = "20")]
        trials: usize,

        /// Sample rate in Hz
        #[arg(long, default_value = "128")]
        sample_rate: f64,

        /// Time points per trial
        #[arg(long, default_value = "256")]
        n_times: usize,

        /// Optional output JSON path
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,
    },
}

/// Image settings; flags override values from `--config`
#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON file with image settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid samples per axis
    #[arg(long)]
    grid: Option<usize>,

    /// Add zero-valued corner electrodes
    #[arg(long)]
    edgeless: bool,

    /// Perturb features before interpolation
    #[arg(long)]
    augment: bool,

    /// Use PCA-space noise for augmentation
    #[arg(long)]
    pca: bool,

    /// Augmentation noise scale
    #[arg(long)]
    std_mult: Option<f64>,

    /// Principal components perturbed in PCA mode
    #[arg(long)]
    n_components: Option<usize>,

    /// Skip per-channel normalization
    #[arg(long)]
    no_normalize: bool,

    /// Replace undefined cells with this value
    #[arg(long)]
    fill: Option<f64>,

    /// Augmentation seed
    #[arg(long)]
    seed: Option<u64>,

    /// Interpolate on a single thread
    #[arg(long)]
    sequential: bool,
}

impl ConfigArgs {
    fn resolve(&self) -> anyhow::Result<ImageConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => ImageConfig::default(),
        };

        if let Some(n) = self.grid {
            config.n_gridpoints = n;
        }
        if let Some(std_mult) = self.std_mult {
            config.std_mult = std_mult;
        }
        if let Some(k) = self.n_components {
            config.n_components = k;
        }
        if self.fill.is_some() {
            config.fill_undefined = self.fill;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.edgeless |= self.edgeless;
        config.augment |= self.augment || self.pca;
        config.pca |= self.pca;
        config.normalize &= !self.no_normalize;
        config.parallel &= !self.sequential;

        config.validate()?;
        Ok(config)
    }
}

/// Input document for `generate`
#[derive(Deserialize)]
struct InputFile {
    positions: Vec<[f64; 3]>,
    features: Vec<Vec<f64>>,
}

/// Output document; undefined cells are written as `null`
#[derive(Serialize)]
struct ImageFile {
    shape: [usize; 4],
    layout: Vec<[f64; 2]>,
    channel_stats: Vec<ChannelStats>,
    data: Vec<Option<f64>>,
}

impl From<&PipelineOutput> for ImageFile {
    fn from(out: &PipelineOutput) -> Self {
        Self {
            shape: out.images.shape(),
            layout: out.layout.points().iter().map(|p| [p.x, p.y]).collect(),
            channel_stats: out.channel_stats.clone(),
            data: out
                .images
                .as_slice()
                .iter()
                .map(|&v| v.is_finite().then_some(v))
                .collect(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Rootstar Topo v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Generate {
            input,
            output,
            config,
        } => run_generate(&input, &output, &config.resolve()?),
        Commands::Demo {
            trials,
            sample_rate,
            n_times,
            output,
            config,
        } => run_demo(trials, sample_rate, n_times, output.as_deref(), &config.resolve()?),
    }
}

/// Load positions and features, generate images, write JSON
fn run_generate(input: &Path, output: &Path, config: &ImageConfig) -> anyhow::Result<()> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("reading input {}", input.display()))?;
    let doc: InputFile = serde_json::from_str(&text)
        .with_context(|| format!("parsing input {}", input.display()))?;

    let positions: Vec<SensorPosition> = doc.positions.into_iter().map(SensorPosition::from).collect();
    let features = feature_matrix(&doc.features)?;
    info!(
        "Loaded {} electrodes and {} x {} features from {}",
        positions.len(),
        features.nrows(),
        features.ncols(),
        input.display()
    );

    let ctx = PipelineContext::new(&positions, config.clone())?;
    let out = ctx.generate(&features)?;
    write_output(output, &out)
}

/// Simulate trials on a 10-20 montage and image their band powers
fn run_demo(
    n_trials: usize,
    sample_rate: f64,
    n_times: usize,
    output: Option<&Path>,
    config: &ImageConfig,
) -> anyhow::Result<()> {
    if n_trials == 0 {
        bail!("demo needs at least one trial");
    }

    let montage = montage_10_20();
    let positions: Vec<SensorPosition> = montage.iter().map(|&(_, pos)| pos).collect();
    let names: Vec<&str> = montage.iter().map(|&(name, _)| name).collect();
    info!("Simulating {} trials on {}", n_trials, names.join(" "));

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let trials: Vec<Trial> = (0..n_trials)
        .map(|_| simulate_trial(&positions, sample_rate, n_times, &mut rng))
        .collect();

    let mut extractor = BandPowerExtractor::new(n_times, sample_rate)?;
    let features = extractor.extract(&trials)?;

    let ctx = PipelineContext::new(&positions, config.clone())?;
    let out = ctx.generate(&features)?;

    for (c, band) in extractor.bands().iter().enumerate() {
        let mut stats = RunningStats::new();
        for s in 0..out.images.n_samples() {
            out.images.channel_grid(s, c).iter().for_each(|&v| stats.push(v));
        }
        info!(
            "{:>5}: mean {:+.3}, std {:.3}, {} defined cells (raw mean {:.4e})",
            band.name(),
            stats.mean(),
            stats.std_dev(),
            stats.count(),
            out.channel_stats.get(c).map_or(f64::NAN, |s| s.mean)
        );
    }
    info!(
        "Grid covers {} of {} cells inside the electrode hull",
        ctx.plan().defined_cells(),
        ctx.grid().cell_count()
    );

    match output {
        Some(path) => write_output(path, &out),
        None => Ok(()),
    }
}

fn feature_matrix(rows: &[Vec<f64>]) -> anyhow::Result<FeatureMatrix> {
    let n_columns = rows.first().map_or(0, Vec::len);
    if let Some((r, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != n_columns) {
        bail!("feature row {r} has {} values, expected {n_columns}", row.len());
    }
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Ok(FeatureMatrix::from_row_slice(rows.len(), n_columns, &flat))
}

fn write_output(path: &Path, out: &PipelineOutput) -> anyhow::Result<()> {
    let json = serde_json::to_string(&ImageFile::from(out))?;
    fs::write(path, json).with_context(|| format!("writing output {}", path.display()))?;
    info!("Wrote {:?} images to {}", out.images.shape(), path.display());
    Ok(())
}

/// Sixteen 10-20 electrodes on a unit sphere (+x right ear, +y nose, +z vertex)
fn montage_10_20() -> Vec<(&'static str, SensorPosition)> {
    const SITES: [(&str, f64, f64); 16] = [
        ("Fp1", 108.0, 0.0),
        ("Fp2", 72.0, 0.0),
        ("F7", 144.0, 0.0),
        ("F3", 130.0, 40.0),
        ("F4", 50.0, 40.0),
        ("F8", 36.0, 0.0),
        ("T7", 180.0, 0.0),
        ("C3", 180.0, 45.0),
        ("Cz", 0.0, 90.0),
        ("C4", 0.0, 45.0),
        ("T8", 0.0, 0.0),
        ("P3", 230.0, 40.0),
        ("Pz", 270.0, 54.0),
        ("P4", 310.0, 40.0),
        ("O1", 252.0, 0.0),
        ("O2", 288.0, 0.0),
    ];

    SITES
        .iter()
        .map(|&(name, az, elev)| {
            let (az, elev) = (az.to_radians(), elev.to_radians());
            let pos = SensorPosition::new(elev.cos() * az.cos(), elev.cos() * az.sin(), elev.sin());
            (name, pos)
        })
        .collect()
}

/// One trial of theta, alpha and beta rhythms plus noise, `(n_sensors, n_times)`.
///
/// Alpha grows toward the back of the head and theta toward the front.
fn simulate_trial(
    positions: &[SensorPosition],
    sample_rate: f64,
    n_times: usize,
    rng: &mut StdRng,
) -> Trial {
    let rhythms: Vec<[(f64, f64, f64); 3]> = positions
        .iter()
        .map(|p| {
            let frontal = 0.5 * (1.0 + p.y);
            [
                (6.0, 10.0 + 20.0 * frontal, rng.gen_range(0.0..2.0 * PI)),
                (10.0, 10.0 + 30.0 * (1.0 - frontal), rng.gen_range(0.0..2.0 * PI)),
                (20.0, 8.0 + rng.gen_range(0.0..4.0), rng.gen_range(0.0..2.0 * PI)),
            ]
        })
        .collect();

    Trial::from_fn(positions.len(), n_times, |s, i| {
        let t = i as f64 / sample_rate;
        let signal: f64 = rhythms[s]
            .iter()
            .map(|&(freq, amp, phase)| amp * (2.0 * PI * freq * t + phase).sin())
            .sum();
        signal + rng.gen_range(-5.0..5.0)
    })
}
