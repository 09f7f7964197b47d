//! Conversion driver: probe, plan, encode, report.
//!
//! Takes a [`ConvertSettings`] (config merged with command-line flags), probes
//! the source once, plans the job list and runs every job through an
//! [`ImageBackend`].
//!
//! ## Failure Policy
//!
//! Setup errors (missing source, missing tools, bad arguments, a failed probe
//! under `on_failure = "fail"`) abort before anything is written. Once jobs
//! start, a failed encode is recorded in its [`JobResult`] and the remaining
//! jobs still run. The [`RunSummary`] always says how many renditions were
//! produced out of how many were attempted.
//!
//! ## Progress Events
//!
//! Callers may pass an `mpsc::Sender<ProcessEvent>` to receive warnings and
//! per-job progress as it happens. The CLI prints these from a separate
//! thread so output stays line-buffered even when jobs run in parallel.
//!
//! ## Parallel Processing
//!
//! Jobs are independent. With [`ConvertSettings::threads`] above one they are
//! encoded concurrently on a dedicated [rayon](https://docs.rs/rayon) pool of
//! that size; otherwise they run one after another on the calling thread.
//! Results are collected in plan order, which is descending width, regardless
//! of which job finishes first.

use crate::config::{BackendKind, ProbeFailurePolicy};
use crate::imaging::{
    ImageBackend, MissingDependency, Preset, RustBackend, ToolBackend, encode_job,
    probe_or_fallback,
};
use crate::naming::default_basename;
use crate::plan::{Mode, Plan, PlanError, RenditionRequest, plan_jobs};
use crate::types::{Probe, RenditionJob, SourceImage};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error(transparent)]
    MissingDependency(#[from] MissingDependency),
    #[error("Could not read dimensions of {path}: {reason}")]
    ProbeFailed { path: PathBuf, reason: String },
    #[error("Invalid argument: {0}")]
    Plan(#[from] PlanError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything needed to convert one source, before its dimensions are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertSettings {
    pub input: PathBuf,
    pub widths: Vec<u32>,
    /// Output basename. Defaults to the input file stem.
    pub basename: Option<String>,
    pub output_dir: PathBuf,
    pub quality: u32,
    pub thumb_quality: Option<u32>,
    pub method: u32,
    pub mode: Mode,
    pub preset: Option<Preset>,
    /// Dimensions assumed when the probe fails.
    pub fallback: (u32, u32),
    pub on_failure: ProbeFailurePolicy,
    /// Renditions encoded at once. 0 and 1 both mean sequential.
    pub threads: usize,
}

/// A probed source and the jobs planned for it. Nothing has been written yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prepared {
    pub probe: Probe,
    pub plan: Plan,
}

/// Progress reported while a conversion runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    /// The probe failed and `assumed` dimensions are used instead.
    ProbeFallback {
        path: PathBuf,
        assumed: (u32, u32),
        reason: String,
    },
    /// A requested width is larger than the source and was dropped.
    WidthSkipped { width: u32, source_width: u32 },
    JobStarted {
        width: u32,
        height: u32,
        output_path: PathBuf,
    },
    JobFinished(JobResult),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobOutcome {
    Succeeded { bytes: u64 },
    Failed { error: String },
}

/// What happened to one planned rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResult {
    pub width: u32,
    pub height: u32,
    pub output_path: PathBuf,
    pub outcome: JobOutcome,
}

impl JobResult {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, JobOutcome::Succeeded { .. })
    }
}

/// Aggregate result of a run. `results` is in descending width order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub results: Vec<JobResult>,
    /// Widths dropped because they exceed the source width.
    pub skipped: Vec<u32>,
}

impl RunSummary {
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed_widths(&self) -> Vec<u32> {
        self.results
            .iter()
            .filter(|r| !r.succeeded())
            .map(|r| r.width)
            .collect()
    }

    pub fn total_bytes(&self) -> u64 {
        self.results
            .iter()
            .map(|r| match r.outcome {
                JobOutcome::Succeeded { bytes } => bytes,
                JobOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

fn emit(events: Option<&Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is listening.
        let _ = tx.send(event);
    }
}

/// Probe the source and plan its renditions.
pub fn prepare_with_backend(
    backend: &impl ImageBackend,
    settings: &ConvertSettings,
) -> Result<Prepared, ProcessError> {
    if !settings.input.is_file() {
        return Err(ProcessError::SourceNotFound(settings.input.clone()));
    }

    let basename = match &settings.basename {
        Some(name) => name.clone(),
        None => default_basename(&settings.input).ok_or(PlanError::EmptyBasename)?,
    };

    let probe = probe_or_fallback(backend, &settings.input, settings.fallback);
    if settings.on_failure == ProbeFailurePolicy::Fail {
        if let Some(reason) = &probe.fallback_reason {
            return Err(ProcessError::ProbeFailed {
                path: settings.input.clone(),
                reason: reason.clone(),
            });
        }
    }

    let request = RenditionRequest {
        source: probe.image.clone(),
        widths: settings.widths.clone(),
        basename,
        output_dir: settings.output_dir.clone(),
        quality: settings.quality,
        thumb_quality: settings.thumb_quality,
        method: settings.method,
        mode: settings.mode,
        preset: settings.preset,
    };
    let plan = plan_jobs(&request)?;

    Ok(Prepared { probe, plan })
}

/// A pool for `threads` concurrent jobs, or `None` to run sequentially.
fn job_pool(threads: usize) -> Option<rayon::ThreadPool> {
    if threads <= 1 {
        return None;
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

/// Run every planned job, `threads` at a time. Failures are isolated per job.
pub fn run(
    backend: &impl ImageBackend,
    source: &SourceImage,
    plan: &Plan,
    threads: usize,
    events: Option<Sender<ProcessEvent>>,
) -> RunSummary {
    for &width in &plan.skipped {
        emit(
            events.as_ref(),
            ProcessEvent::WidthSkipped {
                width,
                source_width: source.width,
            },
        );
    }

    let run_one = |job: &RenditionJob| -> JobResult {
        emit(
            events.as_ref(),
            ProcessEvent::JobStarted {
                width: job.width,
                height: job.height,
                output_path: job.output_path.clone(),
            },
        );
        let outcome = match encode_job(backend, &source.path, job) {
            Ok(bytes) => JobOutcome::Succeeded { bytes },
            Err(e) => JobOutcome::Failed {
                error: e.to_string(),
            },
        };
        let result = JobResult {
            width: job.width,
            height: job.height,
            output_path: job.output_path.clone(),
            outcome,
        };
        emit(events.as_ref(), ProcessEvent::JobFinished(result.clone()));
        result
    };

    // A pool that fails to build just means running sequentially
    let results: Vec<JobResult> = match job_pool(threads) {
        Some(pool) => pool.install(|| plan.jobs.par_iter().map(run_one).collect()),
        None => plan.jobs.iter().map(run_one).collect(),
    };

    RunSummary {
        results,
        skipped: plan.skipped.clone(),
    }
}

/// Probe, plan, create the output directory and run all jobs.
pub fn convert_with_backend(
    backend: &impl ImageBackend,
    settings: &ConvertSettings,
    events: Option<Sender<ProcessEvent>>,
) -> Result<RunSummary, ProcessError> {
    let prepared = prepare_with_backend(backend, settings)?;

    if let Some(reason) = &prepared.probe.fallback_reason {
        emit(
            events.as_ref(),
            ProcessEvent::ProbeFallback {
                path: settings.input.clone(),
                assumed: prepared.probe.image.dimensions(),
                reason: reason.clone(),
            },
        );
    }

    std::fs::create_dir_all(&settings.output_dir)?;
    Ok(run(
        backend,
        &prepared.probe.image,
        &prepared.plan,
        settings.threads,
        events,
    ))
}

/// Plan with the selected backend. Only the probe touches the source.
pub fn prepare(kind: BackendKind, settings: &ConvertSettings) -> Result<Prepared, ProcessError> {
    match kind {
        BackendKind::Tools => prepare_with_backend(&ToolBackend::detect()?, settings),
        BackendKind::Rust => prepare_with_backend(&RustBackend::new(), settings),
    }
}

/// Convert with the selected backend.
pub fn convert(
    kind: BackendKind,
    settings: &ConvertSettings,
    events: Option<Sender<ProcessEvent>>,
) -> Result<RunSummary, ProcessError> {
    match kind {
        BackendKind::Tools => convert_with_backend(&ToolBackend::detect()?, settings, events),
        BackendKind::Rust => convert_with_backend(&RustBackend::new(), settings, events),
    }
}
