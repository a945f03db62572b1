//! Runs every configured fractal as its own thread and waits for all of them.
//!
//! Jobs share nothing: each owns its RNG, point sequence, and output file, so
//! the only coordination is the final join.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, error, info};

use ifsrust_core::CoreError;
use ifsrust_render::{
    export_png, parse_color, rasterize, ExportMetadata, RasterParams, RenderError, Shading,
};

use crate::config::{ConfigError, RunConfig, SystemSource};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a single job failed. Never affects the other jobs in the run.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(std::io::Error),

    #[error("job panicked: {0}")]
    Panicked(String),
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// Everything one worker needs, resolved up front from the run config.
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub label: String,
    pub source: SystemSource,
    pub iterations: usize,
    pub seed: u64,
    pub shading: Shading,
    pub raster: RasterParams,
    pub output: PathBuf,
}

/// What a successful job produced.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub output: PathBuf,
    pub seed: u64,
    pub points_plotted: usize,
    pub elapsed: Duration,
}

#[derive(Debug)]
pub struct JobOutcome {
    pub name: String,
    pub result: Result<JobReport, JobError>,
}

/// Outcome of every job plus the wall-clock time of the whole run.
#[derive(Debug)]
pub struct RunSummary {
    pub outcomes: Vec<JobOutcome>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Turn a validated config into concrete jobs.
///
/// Job `i` is seeded with `base_seed + i`, so rerunning with the same base
/// seed reproduces every image.
pub fn plan_jobs(
    config: &RunConfig,
    output_dir: &Path,
    base_seed: u64,
) -> Result<Vec<Job>, ConfigError> {
    let raster = RasterParams::new(config.width, config.height, config.padding)?;
    let background = parse_color(&config.background)?;
    config
        .jobs
        .iter()
        .enumerate()
        .map(|(i, spec)| -> Result<Job, ConfigError> {
            let ink = parse_color(&spec.color)?;
            Ok(Job {
                name: spec.name.clone(),
                label: spec.display_label(),
                source: spec.system.clone(),
                iterations: spec.iterations.unwrap_or(config.iterations),
                seed: base_seed.wrapping_add(i as u64),
                shading: Shading::new(ink)
                    .with_background(background)
                    .with_mode(config.shade.into()),
                raster,
                output: output_dir.join(format!("{}.png", spec.name)),
            })
        })
        .collect()
}

/// Sample, rasterize, shade, and export one fractal.
pub fn run_job(job: &Job) -> Result<JobReport, JobError> {
    let start = Instant::now();

    let ifs = job.source.build()?;
    let mut rng = StdRng::seed_from_u64(job.seed);
    let points = ifs.sample(job.iterations, &mut rng);
    debug!(job = %job.name, points = points.len(), "Sampling complete");

    let raster = rasterize(&points, &job.raster)?;
    let buffer = job.shading.colorize(&raster.density);
    let metadata = ExportMetadata {
        fractal: job.name.clone(),
        label: job.label.clone(),
        map_count: ifs.map_count(),
        iterations: job.iterations,
        seed: job.seed,
        points_plotted: raster.points_plotted,
    };
    export_png(&buffer, &job.output, &metadata)?;

    Ok(JobReport {
        output: job.output.clone(),
        seed: job.seed,
        points_plotted: raster.points_plotted,
        elapsed: start.elapsed(),
    })
}

fn run_logged(job: &Job) -> Result<JobReport, JobError> {
    info!("Starting: {}", job.label);
    let result = run_job(job);
    match &result {
        Ok(report) => info!(
            elapsed_ms = report.elapsed.as_millis(),
            "Finished: {} → {}",
            job.label,
            report.output.display()
        ),
        Err(e) => error!("Failed: {}: {e}", job.label),
    }
    result
}

/// Run every job on its own thread and block until all have finished.
///
/// A failing or panicking job is reported in its [`JobOutcome`]; the other
/// jobs still run to completion. Outcomes are in the same order as `jobs`.
pub fn run_all(jobs: &[Job]) -> RunSummary {
    let start = Instant::now();

    let outcomes = thread::scope(|scope| {
        let handles: Vec<_> = jobs
            .iter()
            .map(|job| {
                let handle = thread::Builder::new()
                    .name(format!("job-{}", job.name))
                    .spawn_scoped(scope, move || run_logged(job));
                (job, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(job, handle)| {
                let result = match handle {
                    Ok(handle) => handle
                        .join()
                        .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(&*payload)))),
                    Err(e) => Err(JobError::Spawn(e)),
                };
                if let Err(e @ (JobError::Panicked(_) | JobError::Spawn(_))) = &result {
                    error!("Job {} did not complete: {e}", job.name);
                }
                JobOutcome {
                    name: job.name.clone(),
                    result,
                }
            })
            .collect()
    });

    RunSummary {
        outcomes,
        elapsed: start.elapsed(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JobSpec, ShadeStyle};
    use ifsrust_core::{Affine, Catalog};

    fn small_config() -> RunConfig {
        RunConfig {
            width: 48,
            height: 48,
            iterations: 2_000,
            seed: Some(11),
            shade: ShadeStyle::Log,
            jobs: vec![
                JobSpec::builtin(Catalog::Sierpinski, "black"),
                JobSpec::builtin(Catalog::BarnsleyFern, "green"),
            ],
            ..RunConfig::default()
        }
    }

    #[test]
    fn plan_assigns_consecutive_seeds_and_paths() {
        let dir = PathBuf::from("out");
        let jobs = plan_jobs(&small_config(), &dir, u64::MAX).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].seed, u64::MAX);
        assert_eq!(jobs[1].seed, 0, "seeds wrap instead of overflowing");
        assert_eq!(jobs[1].output, dir.join("barnsley-fern.png"));
        assert_eq!(jobs[1].label, "Barnsley Fern");
        assert_eq!(jobs[0].iterations, 2_000);
        assert_eq!(jobs[0].shading.background, [255, 255, 255, 255]);
    }

    #[test]
    fn plan_applies_configured_background() {
        let mut config = small_config();
        config.background = "black".into();
        let jobs = plan_jobs(&config, Path::new("out"), 0).unwrap();
        assert!(jobs
            .iter()
            .all(|j| j.shading.background == [0, 0, 0, 255]));
        assert_eq!(jobs[1].shading.ink, [0, 128, 0, 255]);
    }

    #[test]
    fn failing_job_does_not_stop_the_others() {
        let dir = std::env::temp_dir().join("ifsrust_test_harness");
        let _ = std::fs::remove_dir_all(&dir);

        let mut config = small_config();
        config.jobs.push(JobSpec {
            name: "broken".into(),
            label: None,
            system: SystemSource::Custom {
                transformations: vec![Affine::IDENTITY; 3],
                probabilities: vec![0.3, 0.3, 0.3],
            },
            color: "red".into(),
            iterations: None,
        });
        let jobs = plan_jobs(&config, &dir, 5).unwrap();
        let summary = run_all(&jobs);

        assert_eq!(summary.outcomes.len(), 3);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);

        let names: Vec<&str> = summary.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["sierpinski", "barnsley-fern", "broken"]);
        assert!(matches!(
            summary.outcomes[2].result,
            Err(JobError::Core(CoreError::InvalidDistribution { .. }))
        ));
        assert!(dir.join("sierpinski.png").exists());
        assert!(dir.join("barnsley-fern.png").exists());
        assert!(!dir.join("broken.png").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn same_seed_same_image() {
        let dir_a = std::env::temp_dir().join("ifsrust_test_seed_a");
        let dir_b = std::env::temp_dir().join("ifsrust_test_seed_b");
        let config = small_config();

        let a = run_all(&plan_jobs(&config, &dir_a, 77).unwrap());
        let b = run_all(&plan_jobs(&config, &dir_b, 77).unwrap());
        assert_eq!(a.failed() + b.failed(), 0);

        for name in ["sierpinski.png", "barnsley-fern.png"] {
            let bytes_a = std::fs::read(dir_a.join(name)).unwrap();
            let bytes_b = std::fs::read(dir_b.join(name)).unwrap();
            assert_eq!(bytes_a, bytes_b, "{name}");
        }

        let _ = std::fs::remove_dir_all(&dir_a);
        let _ = std::fs::remove_dir_all(&dir_b);
    }

    #[test]
    fn panic_payloads_are_readable() {
        let from_str: Box<dyn Any + Send> = Box::new("boom");
        let from_string: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(3u8);
        assert_eq!(panic_message(&*from_str), "boom");
        assert_eq!(panic_message(&*from_string), "bang");
        assert_eq!(panic_message(&*other), "unknown panic payload");
    }
}
