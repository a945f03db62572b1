use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use ifsrust_core::{Affine, Catalog, Ifs, DEFAULT_ITERATIONS};
use ifsrust_render::{RasterParams, RenderError, ShadeMode};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no jobs configured")]
    NoJobs,

    #[error("job name '{0}' is used more than once")]
    DuplicateJob(String),

    #[error("job name '{0}' must be non-empty and contain only letters, digits, '-' or '_'")]
    InvalidJobName(String),

    #[error("{iterations} iterations requested for '{job}' (at most {max} allowed)")]
    TooManyIterations {
        job: String,
        iterations: usize,
        max: usize,
    },

    #[error("--only '{0}' matches no configured job")]
    UnknownJob(String),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Upper bound on points per job. Each point is 16 bytes, so this keeps a
/// single job's point sequence under about 800 MB.
pub const MAX_ITERATIONS: usize = 50_000_000;

// ---------------------------------------------------------------------------
// Job specification
// ---------------------------------------------------------------------------

/// Where a job's transformation table comes from.
///
/// In JSON a built-in system is a bare name (`"barnsley-fern"`), a custom
/// one an object with `transformations` and `probabilities`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemSource {
    Builtin(Catalog),
    Custom {
        transformations: Vec<Affine>,
        probabilities: Vec<f64>,
    },
}

impl SystemSource {
    /// Validate the table into a ready-to-sample system.
    pub fn build(&self) -> ifsrust_core::Result<Ifs<Affine>> {
        match self {
            Self::Builtin(entry) => entry.system(),
            Self::Custom {
                transformations,
                probabilities,
            } => Ifs::new(transformations.clone(), probabilities.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Output file stem and log name.
    pub name: String,
    /// Title embedded in the PNG. Defaults to the catalog label or `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub system: SystemSource,
    #[serde(default = "default_color")]
    pub color: String,
    /// Per-job override of [`RunConfig::iterations`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<usize>,
}

impl JobSpec {
    pub fn builtin(entry: Catalog, color: &str) -> Self {
        Self {
            name: entry.name().to_string(),
            label: None,
            system: SystemSource::Builtin(entry),
            color: color.to_string(),
            iterations: None,
        }
    }

    pub fn display_label(&self) -> String {
        match (&self.label, &self.system) {
            (Some(label), _) => label.clone(),
            (None, SystemSource::Builtin(entry)) => entry.label().to_string(),
            (None, SystemSource::Custom { .. }) => self.name.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// How hit counts are shaded in the output images.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ShadeStyle {
    #[default]
    Flat,
    Log,
}

impl From<ShadeStyle> for ShadeMode {
    fn from(style: ShadeStyle) -> Self {
        match style {
            ShadeStyle::Flat => ShadeMode::Flat,
            ShadeStyle::Log => ShadeMode::LogDensity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory receiving `<job name>.png`. Defaults to the user's Desktop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(default = "default_size")]
    pub width: u32,
    #[serde(default = "default_size")]
    pub height: u32,
    #[serde(default = "default_padding")]
    pub padding: f64,
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Base seed; job `i` uses `seed + i`. A random base is drawn when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub shade: ShadeStyle,
    /// Color of pixels no point landed on.
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_jobs")]
    pub jobs: Vec<JobSpec>,
}

fn default_size() -> u32 {
    RasterParams::DEFAULT_SIZE
}

fn default_padding() -> f64 {
    RasterParams::DEFAULT_PADDING
}

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

fn default_background() -> String {
    "white".to_string()
}

fn default_color() -> String {
    "black".to_string()
}

/// Every built-in fractal with its default ink.
pub fn default_jobs() -> Vec<JobSpec> {
    vec![
        JobSpec::builtin(Catalog::Sierpinski, "black"),
        JobSpec::builtin(Catalog::BarnsleyFern, "green"),
        JobSpec::builtin(Catalog::SierpinskiCarpet, "navy"),
        JobSpec::builtin(Catalog::KochCurve, "purple"),
        JobSpec::builtin(Catalog::FractalTree, "saddlebrown"),
    ]
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            width: default_size(),
            height: default_size(),
            padding: default_padding(),
            iterations: default_iterations(),
            seed: None,
            shade: ShadeStyle::default(),
            background: default_background(),
            jobs: default_jobs(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub output_dir: Option<PathBuf>,
    pub iterations: Option<usize>,
    pub seed: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub shade: Option<ShadeStyle>,
    /// Keep only the jobs with these names.
    pub only: Vec<String>,
}

impl RunConfig {
    /// Load and validate a JSON run configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!(
            jobs = config.jobs.len(),
            "Loaded config from {}",
            path.display()
        );
        Ok(config)
    }

    /// Check the settings shared by every job.
    ///
    /// Transformation tables are not checked here: a bad table fails only its
    /// own job when the run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs.is_empty() {
            return Err(ConfigError::NoJobs);
        }
        RasterParams::new(self.width, self.height, self.padding)?;
        ifsrust_render::parse_color(&self.background)?;

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if !is_valid_job_name(&job.name) {
                return Err(ConfigError::InvalidJobName(job.name.clone()));
            }
            if !seen.insert(job.name.as_str()) {
                return Err(ConfigError::DuplicateJob(job.name.clone()));
            }
            ifsrust_render::parse_color(&job.color)?;

            let iterations = job.iterations.unwrap_or(self.iterations);
            if iterations > MAX_ITERATIONS {
                return Err(ConfigError::TooManyIterations {
                    job: job.name.clone(),
                    iterations,
                    max: MAX_ITERATIONS,
                });
            }
        }
        Ok(())
    }

    /// Apply command-line overrides, then re-validate.
    pub fn apply(&mut self, overrides: Overrides) -> Result<(), ConfigError> {
        if let Some(dir) = overrides.output_dir {
            self.output_dir = Some(dir);
        }
        if let Some(n) = overrides.iterations {
            self.iterations = n;
            for job in &mut self.jobs {
                job.iterations = None;
            }
        }
        if overrides.seed.is_some() {
            self.seed = overrides.seed;
        }
        if let Some(w) = overrides.width {
            self.width = w;
        }
        if let Some(h) = overrides.height {
            self.height = h;
        }
        if let Some(shade) = overrides.shade {
            self.shade = shade;
        }
        if !overrides.only.is_empty() {
            if let Some(unknown) = overrides
                .only
                .iter()
                .find(|name| !self.jobs.iter().any(|j| &j.name == *name))
            {
                return Err(ConfigError::UnknownJob(unknown.clone()));
            }
            self.jobs.retain(|j| overrides.only.contains(&j.name));
            debug!(kept = self.jobs.len(), "Filtered jobs with --only");
        }
        self.validate()
    }
}

fn is_valid_job_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
