//! # webp-renditions
//!
//! Turns one source image into a set of responsive WebP renditions at fixed
//! pixel widths, named so that markup generators can build `srcset` entries
//! without looking at the files.
//!
//! # Pipeline
//!
//! ```text
//! 1. Probe    source  →  SourceImage     (dimensions, or a warned fallback)
//! 2. Plan     request →  Vec<RenditionJob> (pure: widths, heights, names, quality)
//! 3. Encode   jobs    →  webp/*.webp     (one backend call per job, failures isolated)
//! ```
//!
//! Planning is a pure function of the request and the probed dimensions, so
//! it can be shown as a dry run (`plan`) and unit tested without any encoder.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`plan`] | Width parsing, height derivation, quality tiers and the job list |
//! | [`process`] | Driver: probe, plan, run jobs (optionally in parallel), summarize |
//! | [`config`] | `webp-renditions.toml` loading, validation and merging over stock defaults |
//! | [`types`] | `SourceImage`, `Probe` and `RenditionJob`, shared by plan/process/output |
//! | [`naming`] | `{name}.webp` / `{name}-{w}x{h}.webp` file naming |
//! | [`imaging`] | Dimension math, encoder presets and the two backends |
//! | [`output`] | CLI output formatting for plan, progress and summary |
//!
//! # Design Decisions
//!
//! ## Two Backends Behind One Trait
//!
//! The default backend shells out to ImageMagick for resampling and `cwebp`
//! for encoding, because `cwebp`'s lossy encoder and presets are what the
//! quality and preset settings are tuned for. The pure-Rust backend needs no
//! system packages and writes lossless WebP. Both implement
//! [`imaging::ImageBackend`], which is also what tests mock.
//!
//! ## Positional Quality Tiers
//!
//! The smallest rendition that survives filtering gets the thumbnail quality.
//! When the source is small and large widths are skipped, the tier moves with
//! the list instead of disappearing.
//!
//! ## Aggregate Failure Reporting
//!
//! A failed encode is reported and counted, and the remaining jobs still run.
//! Only setup problems (bad arguments, missing source, missing tools) stop a
//! run, and they stop it before anything is written.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod plan;
pub mod process;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
