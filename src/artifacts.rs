//! Artifact naming and writing
//!
//! For an input `dir/name.ext` the pipeline writes `name_processed.ext` (the
//! mask), `name_processed.svg` and `name_processed.gcode`, either next to the
//! input or in an explicit output directory.

use anyhow::{Context, Result};
use penplot_camtools::{MotionProgram, PipelineOutput};
use penplot_settings::OutputSettings;
use std::path::{Path, PathBuf};
use tracing::info;

/// Suffix appended to the input file stem
pub const PROCESSED_SUFFIX: &str = "_processed";

/// Extension used for masks when the input has none
const DEFAULT_MASK_EXTENSION: &str = "png";

/// Output locations for one input image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub mask: PathBuf,
    pub svg: PathBuf,
    pub gcode: PathBuf,
}

impl ArtifactPaths {
    /// Paths for `input`, placed in `out_dir` when given
    pub fn for_input(input: &Path, out_dir: Option<&Path>) -> Result<Self> {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("input has no file name: '{}'", input.display()))?;
        let ext = input
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or(DEFAULT_MASK_EXTENSION);

        let dir = output_dir(input, out_dir);
        let base = format!("{}{}", stem, PROCESSED_SUFFIX);
        Ok(Self {
            mask: dir.join(format!("{}.{}", base, ext)),
            svg: dir.join(format!("{}.svg", base)),
            gcode: dir.join(format!("{}.gcode", base)),
        })
    }
}

/// `input` with its extension replaced, placed in `out_dir` when given
pub fn sibling_with_extension(
    input: &Path,
    extension: &str,
    out_dir: Option<&Path>,
) -> Result<PathBuf> {
    let name = input
        .file_name()
        .with_context(|| format!("input has no file name: '{}'", input.display()))?;
    let dir = output_dir(input, out_dir);
    Ok(dir.join(name).with_extension(extension))
}

fn output_dir(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Create the parent directory of `path` if needed
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

/// G-code text for `program`, annotated when requested
pub fn gcode_text(program: &MotionProgram, annotate: bool) -> String {
    if annotate {
        program.render_annotated()
    } else {
        program.render()
    }
}

/// Write a motion program to `path`
pub fn write_gcode(program: &MotionProgram, path: &Path, annotate: bool) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, gcode_text(program, annotate))
        .with_context(|| format!("write gcode '{}'", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Write every artifact of a pipeline run that `settings` enables
pub fn write_pipeline_output(
    output: &PipelineOutput,
    paths: &ArtifactPaths,
    settings: &OutputSettings,
) -> Result<()> {
    if settings.write_mask {
        ensure_parent(&paths.mask)?;
        output
            .mask
            .save(&paths.mask)
            .with_context(|| format!("write mask '{}'", paths.mask.display()))?;
        info!("Wrote {}", paths.mask.display());
    }
    if settings.write_svg {
        ensure_parent(&paths.svg)?;
        output
            .document
            .save(&paths.svg)
            .with_context(|| format!("write svg '{}'", paths.svg.display()))?;
        info!("Wrote {}", paths.svg.display());
    }
    write_gcode(&output.program, &paths.gcode, settings.annotate_gcode)
}
