use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use config::{Config, Environment, File};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::engine::{OpticsEngine, MAX_INCIDENT_ANGLE};
use crate::geometry::Frame;
use crate::medium::{self, Medium};
use crate::tutor::TutorSettings;

/// Highest angle the interactive slider offers. Keeps the viewer away from
/// grazing incidence, which the engine rejects.
pub const DEFAULT_MAX_SLIDER_ANGLE: f64 = 89.0;

/// How reports are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Runtime configuration for the application.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Settings {
    pub angle: f64,
    pub incident_medium: String,
    pub transmitted_medium: String,
    /// Refractive index overriding `incident_medium`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n1: Option<f64>,
    /// Refractive index overriding `transmitted_medium`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n2: Option<f64>,
    #[serde(default = "default_max_slider_angle")]
    pub max_slider_angle: f64,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub frame: Frame,
    #[serde(default)]
    pub tutor: TutorSettings,
}

fn default_max_slider_angle() -> f64 {
    DEFAULT_MAX_SLIDER_ANGLE
}

impl Settings {
    pub fn incident(&self) -> Result<Medium> {
        resolve_medium(&self.incident_medium, self.n1)
    }

    pub fn transmitted(&self) -> Result<Medium> {
        resolve_medium(&self.transmitted_medium, self.n2)
    }

    pub fn engine(&self) -> OpticsEngine {
        OpticsEngine::new(self.frame)
    }
}

fn resolve_medium(name: &str, index: Option<f64>) -> Result<Medium> {
    let medium = match index {
        Some(n) => Medium::custom(n)?,
        None => medium::by_name(name)?,
    };
    Ok(medium)
}

/// Loads `config/default.toml` without local, environment or command line overrides.
pub fn load_default_config() -> Result<Settings> {
    let root = retrieve_project_root()?;
    let default_config_file = root.join("config/default.toml");

    let config: Settings = Config::builder()
        .add_source(File::from(default_config_file).required(true))
        .build()
        .context("Error loading configuration")?
        .try_deserialize()
        .context("Error deserializing configuration")?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads the configuration and applies the command line arguments of the process.
pub fn load_config() -> Result<Settings> {
    let args = CliArgs::parse();
    load_config_with(&args)
}

/// Loads the layered configuration: `config/default.toml`, or
/// `config/local.toml` when it exists, then `LUMINA_*` environment variables,
/// then the overrides in `args`.
pub fn load_config_with(args: &CliArgs) -> Result<Settings> {
    let root = retrieve_project_root()?;

    let default_config_file = root.join("config/default.toml");
    let local_config = root.join("config/local.toml");

    let config_file = if local_config.exists() {
        info!("Using local configuration: {:?}", local_config);
        local_config
    } else {
        info!("Using default configuration: {:?}", default_config_file);
        default_config_file
    };

    let mut config: Settings = Config::builder()
        .add_source(File::from(config_file).required(true))
        .add_source(
            Environment::with_prefix("LUMINA")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Error loading configuration")?
        .try_deserialize()
        .context("Error deserializing configuration")?;

    args.apply(&mut config);

    validate_config(&config)?;

    Ok(config)
}

/// Retrieve the project root directory.
/// This function tries to find the project root directory in different ways:
/// 1. If the CARGO_MANIFEST_DIR environment variable is set, use it.
/// 2. If the LUMINA_ROOT_DIR environment variable is set, use it.
/// 3. If the "config" subdirectory is found in the executable directory or any of its parents, use it.
fn retrieve_project_root() -> Result<PathBuf> {
    if let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") {
        // When running through cargo (e.g. cargo run, cargo test)
        return Ok(PathBuf::from(manifest_dir));
    }
    if let Ok(path) = env::var("LUMINA_ROOT_DIR") {
        return Ok(PathBuf::from(path));
    }

    let exe_path = env::current_exe().context("Failed to get current executable path")?;
    exe_path
        .parent()
        .and_then(find_config_ancestor)
        .ok_or_else(|| anyhow!("Could not find project root directory"))
}

fn find_config_ancestor(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join("config").is_dir())
        .map(Path::to_path_buf)
}

fn validate_config(config: &Settings) -> Result<()> {
    let frame = &config.frame;
    if !(frame.width > 0.0 && frame.height > 0.0) {
        bail!("Frame width and height must be greater than 0");
    }
    if !(frame.ray_length.is_finite() && frame.ray_length > 0.0) {
        bail!("Ray length must be greater than 0");
    }
    if !(config.max_slider_angle > 0.0 && config.max_slider_angle < MAX_INCIDENT_ANGLE) {
        bail!("Maximum slider angle must be in (0, {MAX_INCIDENT_ANGLE})");
    }
    if config.tutor.timeout_ms == 0 {
        bail!("Tutor timeout must be greater than 0");
    }
    config.incident().context("Invalid incident medium")?;
    config.transmitted().context("Invalid transmitted medium")?;
    Ok(())
}

#[derive(Parser, Debug)]
#[command(version, about = "LUMINA - Refraction and total internal reflection at a planar interface")]
pub struct CliArgs {
    /// Incident angle in degrees, measured from the interface normal. Must be in [0, 90).
    #[arg(short, long, allow_negative_numbers = true)]
    angle: Option<f64>,

    /// Catalog name of the medium the ray starts in.
    #[arg(long)]
    from: Option<String>,

    /// Catalog name of the medium the ray enters.
    #[arg(long)]
    to: Option<String>,

    /// Refractive index of the starting medium. Overrides `--from`.
    #[arg(long)]
    n1: Option<f64>,

    /// Refractive index of the entered medium. Overrides `--to`.
    #[arg(long)]
    n2: Option<f64>,

    /// Length of the drawn rays in frame units.
    #[arg(long)]
    ray_length: Option<f64>,

    /// Write reports as JSON.
    #[arg(long)]
    json: bool,

    /// Compute a table over incident angles instead of a single geometry.
    /// Format: start end step (degrees)
    #[arg(long, num_args = 3, value_delimiter = ' ', value_names = ["START", "END", "STEP"])]
    pub sweep: Option<Vec<f64>>,

    /// Print a short explanation of the result.
    #[arg(long)]
    pub explain: bool,

    /// List the media catalog and exit.
    #[arg(long)]
    pub list_media: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}

impl CliArgs {
    fn apply(&self, config: &mut Settings) {
        if let Some(angle) = self.angle {
            config.angle = angle;
        }
        if let Some(from) = &self.from {
            config.incident_medium = from.clone();
            config.n1 = None;
        }
        if let Some(to) = &self.to {
            config.transmitted_medium = to.clone();
            config.n2 = None;
        }
        if let Some(n1) = self.n1 {
            config.n1 = Some(n1);
        }
        if let Some(n2) = self.n2 {
            config.n2 = Some(n2);
        }
        if let Some(ray_length) = self.ray_length {
            config.frame.ray_length = ray_length;
        }
        if self.json {
            config.format = OutputFormat::Json;
        }
    }
}

/// Upper bound on the number of angles in one sweep.
pub const MAX_SWEEP_ANGLES: usize = 100_000;

/// Parse a sweep specification `start end step` into the list of incident angles.
/// The end is included when it falls on the step grid.
pub fn parse_sweep(values: &[f64]) -> Result<Vec<f64>, String> {
    let [start, end, step] = values else {
        return Err(format!(
            "Sweep needs exactly 3 values (start end step), got {}",
            values.len()
        ));
    };
    let (start, end, step) = (*start, *end, *step);

    if !(step > 0.0) {
        return Err(format!("Step size must be positive. Got {}", step));
    }
    if start < 0.0 || end >= MAX_INCIDENT_ANGLE {
        return Err(format!(
            "Sweep must stay within [0, {MAX_INCIDENT_ANGLE}). Got {} to {}",
            start, end
        ));
    }
    if end < start {
        return Err(format!(
            "Sweep end must not be below its start. Got {} after {}",
            end, start
        ));
    }

    let count = ((end - start) / step + 1e-9).floor() + 1.0;
    if count > MAX_SWEEP_ANGLES as f64 {
        return Err(format!(
            "Sweep would compute {:.0} angles, more than the limit of {}. Use a larger step",
            count, MAX_SWEEP_ANGLES
        ));
    }
    Ok((0..count as usize).map(|i| start + i as f64 * step).collect())
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings:
  - Incident Angle: {:.2} deg
  - Incident Medium: {}{}
  - Transmitted Medium: {}{}
  - Frame: {} x {}, ray length {}
  - Tutor: debounce {} ms, timeout {} ms
  ",
            self.angle,
            self.incident_medium,
            self.n1.map(|n| format!(" (n = {n})")).unwrap_or_default(),
            self.transmitted_medium,
            self.n2.map(|n| format!(" (n = {n})")).unwrap_or_default(),
            self.frame.width,
            self.frame.height,
            self.frame.ray_length,
            self.tutor.debounce_ms,
            self.tutor.timeout_ms,
        )
    }
}
