//! External-tool backend: ImageMagick for probing and resampling, `cwebp` for
//! encoding.
//!
//! ## Command mapping
//!
//! | Operation | Command |
//! |---|---|
//! | Identify | `magick identify -ping -format "%w %h %[orientation]" src[0]` (v6: `identify ...`) |
//! | Resize | `magick src[0] -auto-orient -resize WxH! -strip png:tmp` |
//! | Fill + crop | `magick src[0] -auto-orient -resize WxH^ -gravity center -extent WxH -strip png:tmp` |
//! | Encode | `cwebp [-preset P] -q Q -m M [tuning] -quiet tmp -o out.webp` |
//!
//! The resized intermediate is a lossless PNG in the output directory, created
//! through [`tempfile`] with a random per-job name so concurrent jobs never
//! collide. It is removed when the guard drops, on success and failure alike.
//!
//! The resize step runs `-auto-orient`, so identify reports the displayed
//! size: stored dimensions are swapped when the EXIF orientation is one of
//! the four transposing values (5-8).

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::EncodeParams;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// A required external program is not installed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("required tool '{tool}' not found on PATH. {hint}")]
pub struct MissingDependency {
    pub tool: String,
    pub hint: String,
}

const IMAGEMAGICK_HINT: &str = "Install ImageMagick (apt install imagemagick / brew install imagemagick).";
const CWEBP_HINT: &str = "Install the WebP tools (apt install webp / brew install webp).";

/// Which ImageMagick command layout is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Magick {
    /// ImageMagick 7: a single `magick` binary with subcommands.
    V7 { magick: PathBuf },
    /// ImageMagick 6: separate `convert` and `identify` binaries.
    V6 { convert: PathBuf, identify: PathBuf },
}

impl Magick {
    fn identify_command(&self) -> Command {
        match self {
            Magick::V7 { magick } => {
                let mut cmd = Command::new(magick);
                cmd.arg("identify");
                cmd
            }
            Magick::V6 { identify, .. } => Command::new(identify),
        }
    }

    fn convert_command(&self) -> Command {
        match self {
            Magick::V7 { magick } => Command::new(magick),
            Magick::V6 { convert, .. } => Command::new(convert),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Magick::V7 { magick } => format!("ImageMagick 7 ({})", magick.display()),
            Magick::V6 { convert, .. } => format!("ImageMagick 6 ({})", convert.display()),
        }
    }
}

/// Availability of one external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub name: &'static str,
    pub path: Option<PathBuf>,
}

/// Look up every program either backend flavor could use.
pub fn tool_statuses() -> Vec<ToolStatus> {
    ["magick", "convert", "identify", "cwebp"]
        .into_iter()
        .map(|name| ToolStatus {
            name,
            path: find_in_path(name),
        })
        .collect()
}

/// Find an executable on `PATH`.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    let file_name = format!("{}{}", name, std::env::consts::EXE_SUFFIX);
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}

/// Backend that shells out to ImageMagick and cwebp.
#[derive(Debug, Clone)]
pub struct ToolBackend {
    magick: Magick,
    cwebp: PathBuf,
}

impl ToolBackend {
    pub fn new(magick: Magick, cwebp: PathBuf) -> Self {
        Self { magick, cwebp }
    }

    /// Locate ImageMagick (7 preferred, then 6) and cwebp on `PATH`.
    pub fn detect() -> Result<Self, MissingDependency> {
        let magick = if let Some(magick) = find_in_path("magick") {
            Magick::V7 { magick }
        } else {
            match (find_in_path("convert"), find_in_path("identify")) {
                (Some(convert), Some(identify)) => Magick::V6 { convert, identify },
                _ => {
                    return Err(MissingDependency {
                        tool: "magick".to_string(),
                        hint: IMAGEMAGICK_HINT.to_string(),
                    });
                }
            }
        };
        let cwebp = find_in_path("cwebp").ok_or_else(|| MissingDependency {
            tool: "cwebp".to_string(),
            hint: CWEBP_HINT.to_string(),
        })?;
        Ok(Self::new(magick, cwebp))
    }

    pub fn describe(&self) -> String {
        format!(
            "{} + cwebp ({})",
            self.magick.describe(),
            self.cwebp.display()
        )
    }
}

/// Run a command to completion, mapping a non-zero exit to [`BackendError::ToolFailed`].
fn run_tool(tool: &str, mut cmd: Command) -> Result<Vec<u8>, BackendError> {
    let output = cmd.output()?;
    if !output.status.success() {
        return Err(BackendError::ToolFailed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output.stdout)
}

/// Select the first frame/page of multi-image inputs (GIF, TIFF, PDF).
fn first_frame(path: &Path) -> OsString {
    let mut arg = path.as_os_str().to_owned();
    arg.push("[0]");
    arg
}

/// Parse `identify -format "%w %h %[orientation]"` output.
///
/// The orientation token is optional; when it names a transposing
/// orientation the stored width and height are swapped.
fn parse_identify_output(stdout: &str) -> Option<Dimensions> {
    let mut parts = stdout.split_whitespace();
    let width = parts.next()?.parse().ok()?;
    let height = parts.next()?.parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    match parts.next() {
        Some(orientation) if is_transposed(orientation) => Some(Dimensions {
            width: height,
            height: width,
        }),
        _ => Some(Dimensions { width, height }),
    }
}

/// EXIF orientations 5-8, as ImageMagick names them.
fn is_transposed(orientation: &str) -> bool {
    matches!(
        orientation,
        "LeftTop" | "RightTop" | "RightBottom" | "LeftBottom"
    )
}

const IDENTIFY_FORMAT: &str = "%w %h %[orientation]";

/// ImageMagick arguments that resample `params.source` into `intermediate`.
fn resize_args(params: &EncodeParams, intermediate: &Path) -> Vec<OsString> {
    let size = format!("{}x{}", params.width, params.height);
    let mut args: Vec<OsString> = vec![first_frame(&params.source), "-auto-orient".into()];

    if params.crop_to_fill {
        args.extend([
            OsString::from("-resize"),
            OsString::from(format!("{size}^")),
            OsString::from("-gravity"),
            OsString::from("center"),
            OsString::from("-extent"),
            OsString::from(size),
        ]);
    } else {
        // Height is already computed, so force the exact box
        args.extend([OsString::from("-resize"), OsString::from(format!("{size}!"))]);
    }

    if let Some(sharpening) = params.flags.sharpening() {
        let threshold = sharpening.threshold as f32 / 255.0;
        args.extend([
            OsString::from("-unsharp"),
            OsString::from(format!("0x{}+1+{}", sharpening.sigma, threshold)),
        ]);
    }

    args.push("-strip".into());
    let mut target = OsString::from("png:");
    target.push(intermediate.as_os_str());
    args.push(target);
    args
}

/// cwebp arguments that encode `intermediate` into `params.output`.
fn cwebp_args(params: &EncodeParams, intermediate: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = params
        .flags
        .cwebp_args()
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push("-quiet".into());
    args.push(intermediate.as_os_str().to_owned());
    args.push("-o".into());
    args.push(params.output.as_os_str().to_owned());
    args
}

impl ImageBackend for ToolBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let mut cmd = self.magick.identify_command();
        cmd.args(["-ping", "-format", IDENTIFY_FORMAT])
            .arg(first_frame(path));
        let stdout = run_tool("identify", cmd)?;
        let text = String::from_utf8_lossy(&stdout);
        parse_identify_output(&text).ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "Unexpected identify output for {}: {:?}",
                path.display(),
                text.trim()
            ))
        })
    }

    fn encode(&self, params: &EncodeParams) -> Result<u64, BackendError> {
        let dir = params
            .output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let intermediate = tempfile::Builder::new()
            .prefix(".rendition-")
            .suffix(".png")
            .tempfile_in(dir)?;

        let mut resize = self.magick.convert_command();
        resize.args(resize_args(params, intermediate.path()));
        run_tool("magick", resize)?;

        let mut encode = Command::new(&self.cwebp);
        encode.args(cwebp_args(params, intermediate.path()));
        run_tool("cwebp", encode)?;

        let bytes = std::fs::metadata(&params.output)?.len();
        intermediate.close()?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{EncoderFlags, Method, Preset, Quality};

    fn params(crop_to_fill: bool, preset: Option<Preset>) -> EncodeParams {
        EncodeParams {
            source: "/in/photo.jpg".into(),
            output: "/out/photo-1280x720.webp".into(),
            width: 1280,
            height: 720,
            crop_to_fill,
            flags: EncoderFlags::for_preset(preset, Quality::new(82), Method::new(4)),
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn parse_identify_simple() {
        assert_eq!(
            parse_identify_output("2560 1440"),
            Some(Dimensions {
                width: 2560,
                height: 1440
            })
        );
    }

    #[test]
    fn parse_identify_trailing_newline() {
        assert_eq!(
            parse_identify_output("3000 2000\n"),
            Some(Dimensions {
                width: 3000,
                height: 2000
            })
        );
    }

    #[test]
    fn parse_identify_rotated_swaps_dimensions() {
        // Phone JPEG stored landscape with EXIF Orientation=6
        assert_eq!(
            parse_identify_output("4000 3000 RightTop"),
            Some(Dimensions {
                width: 3000,
                height: 4000
            })
        );
        assert_eq!(
            parse_identify_output("4000 3000 LeftBottom\n"),
            Some(Dimensions {
                width: 3000,
                height: 4000
            })
        );
    }

    #[test]
    fn parse_identify_upright_orientations_keep_dimensions() {
        let stored = Some(Dimensions {
            width: 4000,
            height: 3000,
        });
        assert_eq!(parse_identify_output("4000 3000 TopLeft"), stored);
        assert_eq!(parse_identify_output("4000 3000 BottomRight"), stored);
        assert_eq!(parse_identify_output("4000 3000 Undefined"), stored);
    }

    #[test]
    fn rotated_source_plans_upright_renditions() {
        let dims = parse_identify_output("4000 3000 RightTop").unwrap();
        let height = crate::imaging::proportional_height((dims.width, dims.height), 1920);
        assert_eq!((1920, height), (1920, 2560));
    }

    #[test]
    fn identify_format_requests_orientation() {
        assert!(IDENTIFY_FORMAT.contains("%[orientation]"));
    }

    #[test]
    fn parse_identify_garbage() {
        assert_eq!(parse_identify_output(""), None);
        assert_eq!(parse_identify_output("abc def"), None);
        assert_eq!(parse_identify_output("2560"), None);
        assert_eq!(parse_identify_output("0 100"), None);
    }

    #[test]
    fn resize_args_proportional_forces_exact_box() {
        let args = strings(resize_args(&params(false, None), Path::new("/out/tmp.png")));
        assert_eq!(
            args,
            vec![
                "/in/photo.jpg[0]",
                "-auto-orient",
                "-resize",
                "1280x720!",
                "-strip",
                "png:/out/tmp.png"
            ]
        );
    }

    #[test]
    fn resize_args_crop_to_fill_uses_extent() {
        let args = strings(resize_args(&params(true, None), Path::new("/out/tmp.png")));
        assert!(args.windows(2).any(|w| w == ["-resize", "1280x720^"]));
        assert!(args.windows(2).any(|w| w == ["-gravity", "center"]));
        assert!(args.windows(2).any(|w| w == ["-extent", "1280x720"]));
    }

    #[test]
    fn resize_args_photo_preset_sharpens_without_dither() {
        let args = strings(resize_args(
            &params(false, Some(Preset::Photo)),
            Path::new("/out/tmp.png"),
        ));
        assert!(args.windows(2).any(|w| w == ["-unsharp", "0x0.5+1+0"]));
        // The intermediate is truecolor PNG, so a dither would never apply
        assert!(!args.iter().any(|a| a == "-dither"));
    }

    #[test]
    fn resize_args_icon_preset_has_no_sharpening() {
        let args = strings(resize_args(
            &params(false, Some(Preset::Icon)),
            Path::new("/out/tmp.png"),
        ));
        assert!(!args.iter().any(|a| a == "-unsharp"));
        assert!(!args.iter().any(|a| a == "-dither"));
    }

    #[test]
    fn cwebp_args_end_with_io_paths() {
        let args = strings(cwebp_args(&params(false, None), Path::new("/out/tmp.png")));
        assert_eq!(
            args,
            vec![
                "-q",
                "82",
                "-m",
                "4",
                "-quiet",
                "/out/tmp.png",
                "-o",
                "/out/photo-1280x720.webp"
            ]
        );
    }

    #[test]
    fn find_in_path_missing_tool() {
        assert_eq!(find_in_path("definitely-not-a-real-tool-xyz"), None);
    }

    #[test]
    fn tool_statuses_lists_all_candidates() {
        let names: Vec<_> = tool_statuses().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["magick", "convert", "identify", "cwebp"]);
    }

    // =========================================================================
    // ImageMagick + cwebp integration tests (require the tools)
    // =========================================================================

    fn create_test_png(path: &Path, width: u32, height: u32) {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        img.save(path).unwrap();
    }

    #[test]
    #[ignore] // Requires ImageMagick
    fn identify_real_image() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        create_test_png(&source, 320, 200);

        let backend = ToolBackend::detect().unwrap();
        let dims = backend.identify(&source).unwrap();
        assert_eq!(
            dims,
            Dimensions {
                width: 320,
                height: 200
            }
        );
    }

    #[test]
    #[ignore] // Requires ImageMagick and cwebp
    fn encode_real_image_leaves_no_intermediate() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.png");
        create_test_png(&source, 320, 200);
        let out_dir = tmp.path().join("out");
        std::fs::create_dir_all(&out_dir).unwrap();

        let backend = ToolBackend::detect().unwrap();
        let bytes = backend
            .encode(&EncodeParams {
                source,
                output: out_dir.join("source-160x90.webp"),
                width: 160,
                height: 90,
                crop_to_fill: true,
                flags: EncoderFlags::for_preset(
                    Some(Preset::Photo),
                    Quality::new(80),
                    Method::new(4),
                ),
            })
            .unwrap();
        assert!(bytes > 0);

        let names: Vec<_> = std::fs::read_dir(&out_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["source-160x90.webp"]);

        let dims = backend.identify(&out_dir.join("source-160x90.webp")).unwrap();
        assert_eq!((dims.width, dims.height), (160, 90));
    }
}
