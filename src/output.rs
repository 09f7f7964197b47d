//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every rendition is shown by its geometry first, `WIDTHxHEIGHT → file`,
//! with the outcome or encoder detail as trailing context. The same
//! [`job_line`] helper is used by the plan, progress and summary output so a
//! rendition reads the same in all three.
//!
//! # Output Format
//!
//! ## Plan
//!
//! ```text
//! photo.jpg (3000x2000)
//!     1920x1080 → photo.webp (q82, crop 1920x1280 at +0+100)
//!     1280x720 → photo-1280x720.webp (q82, crop 1280x853 at +0+66)
//!     640x360 → photo-640x360.webp (q75, crop 640x427 at +0+33)
//!     skip: 4000px
//! 3 renditions planned, 1 skipped
//! ```
//!
//! ## Progress
//!
//! ```text
//! warning: could not read dimensions of photo.jpg (...); assuming 2560x1440
//! skip: 4000px is wider than the source (3000px)
//! encoding 2560x1707 → photo.webp
//!     done 2560x1707 → photo.webp (412.3 KB)
//!     FAILED 1920x1280 → photo-1920x1280.webp: cwebp failed ...
//! ```
//!
//! ## Summary
//!
//! ```text
//! Produced 4 of 5 renditions (1.1 MB)
//!     2560x1707 → photo.webp: 412.3 KB
//!     1920x1280 → photo-1920x1280.webp: failed
//! Skipped widths: 4000
//! Failed widths: 1920
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::imaging::tool_backend::ToolStatus;
use crate::imaging::{MissingDependency, ToolBackend, calculate_fill_dimensions, center_crop_offset};
use crate::process::{JobOutcome, JobResult, Prepared, ProcessEvent, RunSummary};
use crate::types::RenditionJob;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// File name of `path`, falling back to the whole path.
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `WIDTHxHEIGHT → file.webp`
fn job_line(width: u32, height: u32, output: &Path) -> String {
    format!("{}x{} → {}", width, height, file_label(output))
}

/// Human-readable byte count using binary units.
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

fn join_widths(widths: &[u32]) -> String {
    widths
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

// ============================================================================
// Plan
// ============================================================================

/// Encoder detail for one planned job: quality, preset, and for fixed-ratio
/// jobs the resize box and crop offset.
fn job_detail(job: &RenditionJob, source: (u32, u32)) -> String {
    let mut parts = vec![format!("q{}", job.quality().value())];
    if let Some(preset) = job.flags.preset {
        parts.push(preset.name().to_string());
    }
    if job.crop_to_fill {
        let target = (job.width, job.height);
        let filled = calculate_fill_dimensions(source, target);
        let (x, y) = center_crop_offset(filled, target);
        parts.push(format!("crop {}x{} at +{}+{}", filled.0, filled.1, x, y));
    }
    parts.join(", ")
}

/// Format a dry-run plan.
pub fn format_plan(prepared: &Prepared) -> Vec<String> {
    let source = &prepared.probe.image;
    let mut lines = vec![format!(
        "{} ({}x{})",
        file_label(&source.path),
        source.width,
        source.height
    )];

    if let Some(reason) = &prepared.probe.fallback_reason {
        lines.push(format!(
            "    warning: dimensions could not be read ({}); sizes assume {}x{}",
            reason, source.width, source.height
        ));
    }

    for job in &prepared.plan.jobs {
        lines.push(format!(
            "    {} ({})",
            job_line(job.width, job.height, &job.output_path),
            job_detail(job, source.dimensions())
        ));
    }
    for width in &prepared.plan.skipped {
        lines.push(format!("    skip: {}px", width));
    }

    let mut footer = format!("{} planned", plural(prepared.plan.jobs.len(), "rendition"));
    if !prepared.plan.skipped.is_empty() {
        footer.push_str(&format!(", {} skipped", prepared.plan.skipped.len()));
    }
    lines.push(footer);
    lines
}

pub fn print_plan(prepared: &Prepared) {
    for line in format_plan(prepared) {
        println!("{}", line);
    }
}

// ============================================================================
// Progress events
// ============================================================================

fn finished_line(result: &JobResult) -> String {
    let line = job_line(result.width, result.height, &result.output_path);
    match &result.outcome {
        JobOutcome::Succeeded { bytes } => format!("    done {} ({})", line, format_bytes(*bytes)),
        JobOutcome::Failed { error } => format!("    FAILED {}: {}", line, error),
    }
}

/// Format a single progress event as display lines.
pub fn format_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::ProbeFallback {
            path,
            assumed,
            reason,
        } => vec![format!(
            "warning: could not read dimensions of {} ({}); assuming {}x{}, rendition sizes may not match the source",
            file_label(path),
            reason,
            assumed.0,
            assumed.1
        )],
        ProcessEvent::WidthSkipped {
            width,
            source_width,
        } => vec![format!(
            "skip: {}px is wider than the source ({}px)",
            width, source_width
        )],
        ProcessEvent::JobStarted {
            width,
            height,
            output_path,
        } => vec![format!("encoding {}", job_line(*width, *height, output_path))],
        ProcessEvent::JobFinished(result) => vec![finished_line(result)],
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Format the end-of-run summary. Results keep their descending-width order.
pub fn format_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Produced {} of {} renditions ({})",
        summary.succeeded(),
        summary.attempted(),
        format_bytes(summary.total_bytes())
    )];

    for result in &summary.results {
        let status = match &result.outcome {
            JobOutcome::Succeeded { bytes } => format_bytes(*bytes),
            JobOutcome::Failed { .. } => "failed".to_string(),
        };
        lines.push(format!(
            "    {}: {}",
            job_line(result.width, result.height, &result.output_path),
            status
        ));
    }

    if !summary.skipped.is_empty() {
        lines.push(format!("Skipped widths: {}", join_widths(&summary.skipped)));
    }
    let failed = summary.failed_widths();
    if !failed.is_empty() {
        lines.push(format!("Failed widths: {}", join_widths(&failed)));
    }
    lines
}

pub fn print_summary(summary: &RunSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Tool check
// ============================================================================

/// Format the external tool report for `check`.
pub fn format_tools(
    statuses: &[ToolStatus],
    detection: &Result<ToolBackend, MissingDependency>,
) -> Vec<String> {
    let mut lines = vec!["Tools".to_string()];
    for status in statuses {
        let location = match &status.path {
            Some(path) => path.display().to_string(),
            None => "not found".to_string(),
        };
        lines.push(format!("    {}: {}", status.name, location));
    }
    match detection {
        Ok(backend) => lines.push(format!("Using {}", backend.describe())),
        Err(e) => lines.push(format!("error: {}", e)),
    }
    lines
}

pub fn print_tools(statuses: &[ToolStatus], detection: &Result<ToolBackend, MissingDependency>) {
    for line in format_tools(statuses, detection) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::tool_backend::Magick;
    use crate::imaging::{EncoderFlags, Method, Preset, Quality};
    use crate::plan::Plan;
    use crate::types::{Probe, SourceImage};
    use std::path::PathBuf;

    fn job(width: u32, height: u32, name: &str, quality: u32, crop: bool) -> RenditionJob {
        RenditionJob {
            width,
            height,
            output_path: PathBuf::from("webp").join(name),
            primary: false,
            crop_to_fill: crop,
            flags: EncoderFlags::for_preset(None, Quality::new(quality), Method::default()),
        }
    }

    fn result(width: u32, height: u32, name: &str, outcome: JobOutcome) -> JobResult {
        JobResult {
            width,
            height,
            output_path: PathBuf::from("webp").join(name),
            outcome,
        }
    }

    fn prepared(jobs: Vec<RenditionJob>, skipped: Vec<u32>) -> Prepared {
        Prepared {
            probe: Probe {
                image: SourceImage::new("in/photo.jpg", 3000, 2000),
                fallback_reason: None,
            },
            plan: Plan { jobs, skipped },
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(1536 * 1024), "1.5 MB");
    }

    #[test]
    fn job_line_uses_file_name() {
        assert_eq!(
            job_line(1280, 853, Path::new("out/dir/photo-1280x853.webp")),
            "1280x853 → photo-1280x853.webp"
        );
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "rendition"), "1 rendition");
        assert_eq!(plural(0, "rendition"), "0 renditions");
    }

    // =========================================================================
    // Plan tests
    // =========================================================================

    #[test]
    fn plan_lists_jobs_and_skips() {
        let p = prepared(
            vec![
                job(2560, 1707, "photo.webp", 82, false),
                job(640, 427, "photo-640x427.webp", 75, false),
            ],
            vec![4000],
        );
        let lines = format_plan(&p);
        assert_eq!(
            lines,
            vec![
                "photo.jpg (3000x2000)",
                "    2560x1707 → photo.webp (q82)",
                "    640x427 → photo-640x427.webp (q75)",
                "    skip: 4000px",
                "2 renditions planned, 1 skipped",
            ]
        );
    }

    #[test]
    fn plan_shows_crop_box_for_fixed_ratio() {
        // 3000x2000 (3:2) into 1280x720 (16:9): width matches, height overflows
        let p = prepared(vec![job(1280, 720, "photo.webp", 82, true)], vec![]);
        let lines = format_plan(&p);
        assert_eq!(
            lines[1],
            "    1280x720 → photo.webp (q82, crop 1280x853 at +0+66)"
        );
    }

    #[test]
    fn plan_shows_preset() {
        let mut j = job(960, 540, "photo.webp", 82, false);
        j.flags = EncoderFlags::for_preset(Some(Preset::Drawing), Quality::new(82), Method::new(6));
        let lines = format_plan(&prepared(vec![j], vec![]));
        assert_eq!(lines[1], "    960x540 → photo.webp (q82, drawing)");
    }

    #[test]
    fn plan_warns_on_fallback() {
        let mut p = prepared(vec![], vec![]);
        p.probe.image = SourceImage::new("in/photo.jpg", 2560, 1440);
        p.probe.fallback_reason = Some("identify failed".to_string());
        let lines = format_plan(&p);
        assert!(lines[1].starts_with("    warning:"));
        assert!(lines[1].contains("2560x1440"));
        assert_eq!(lines.last().unwrap(), "0 renditions planned");
    }

    #[test]
    fn plan_crop_detail_for_square() {
        let j = job(500, 500, "sq.webp", 82, true);
        // 3000x2000 into 500x500: height matches at 500, width 750, offset 125
        assert_eq!(job_detail(&j, (3000, 2000)), "q82, crop 750x500 at +125+0");
    }

    // =========================================================================
    // Event tests
    // =========================================================================

    #[test]
    fn event_probe_fallback() {
        let lines = format_event(&ProcessEvent::ProbeFallback {
            path: "in/photo.jpg".into(),
            assumed: (2560, 1440),
            reason: "no decoder".to_string(),
        });
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("warning: could not read dimensions of photo.jpg (no decoder)"));
        assert!(lines[0].contains("assuming 2560x1440"));
    }

    #[test]
    fn event_width_skipped() {
        let lines = format_event(&ProcessEvent::WidthSkipped {
            width: 4000,
            source_width: 3000,
        });
        assert_eq!(lines, vec!["skip: 4000px is wider than the source (3000px)"]);
    }

    #[test]
    fn event_job_started() {
        let lines = format_event(&ProcessEvent::JobStarted {
            width: 2560,
            height: 1707,
            output_path: "webp/photo.webp".into(),
        });
        assert_eq!(lines, vec!["encoding 2560x1707 → photo.webp"]);
    }

    #[test]
    fn event_job_finished() {
        let ok = format_event(&ProcessEvent::JobFinished(result(
            640,
            427,
            "photo-640x427.webp",
            JobOutcome::Succeeded { bytes: 2048 },
        )));
        assert_eq!(ok, vec!["    done 640x427 → photo-640x427.webp (2.0 KB)"]);

        let failed = format_event(&ProcessEvent::JobFinished(result(
            640,
            427,
            "photo-640x427.webp",
            JobOutcome::Failed {
                error: "cwebp exited 1".to_string(),
            },
        )));
        assert_eq!(
            failed,
            vec!["    FAILED 640x427 → photo-640x427.webp: cwebp exited 1"]
        );
    }

    // =========================================================================
    // Summary tests
    // =========================================================================

    #[test]
    fn summary_counts_and_enumerates() {
        let summary = RunSummary {
            results: vec![
                result(
                    1920,
                    1280,
                    "photo.webp",
                    JobOutcome::Succeeded { bytes: 1024 },
                ),
                result(
                    1280,
                    853,
                    "photo-1280x853.webp",
                    JobOutcome::Failed {
                        error: "boom".to_string(),
                    },
                ),
            ],
            skipped: vec![4000, 2560],
        };
        assert_eq!(
            format_summary(&summary),
            vec![
                "Produced 1 of 2 renditions (1.0 KB)",
                "    1920x1280 → photo.webp: 1.0 KB",
                "    1280x853 → photo-1280x853.webp: failed",
                "Skipped widths: 4000, 2560",
                "Failed widths: 1280",
            ]
        );
    }

    #[test]
    fn summary_of_empty_run() {
        let summary = RunSummary {
            results: vec![],
            skipped: vec![2560],
        };
        assert_eq!(
            format_summary(&summary),
            vec!["Produced 0 of 0 renditions (0 B)", "Skipped widths: 2560"]
        );
    }

    // =========================================================================
    // Tool check tests
    // =========================================================================

    #[test]
    fn tools_report_found_and_missing() {
        let statuses = vec![
            ToolStatus {
                name: "magick",
                path: Some("/usr/bin/magick".into()),
            },
            ToolStatus {
                name: "cwebp",
                path: None,
            },
        ];
        let detection = Err(MissingDependency {
            tool: "cwebp".to_string(),
            hint: "Install it.".to_string(),
        });
        let lines = format_tools(&statuses, &detection);
        assert_eq!(lines[0], "Tools");
        assert_eq!(lines[1], "    magick: /usr/bin/magick");
        assert_eq!(lines[2], "    cwebp: not found");
        assert!(lines[3].starts_with("error: required tool 'cwebp'"));
    }

    #[test]
    fn tools_report_backend_in_use() {
        let backend = ToolBackend::new(
            Magick::V6 {
                convert: "/usr/bin/convert".into(),
                identify: "/usr/bin/identify".into(),
            },
            "/usr/bin/cwebp".into(),
        );
        let lines = format_tools(&[], &Ok(backend));
        assert_eq!(
            lines,
            vec![
                "Tools",
                "Using ImageMagick 6 (/usr/bin/convert) + cwebp (/usr/bin/cwebp)",
            ]
        );
    }
}
