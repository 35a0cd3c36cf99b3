//! Batch generation over a directory of raw files.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::image_pipeline::{
    common::{DatasetError, Result},
    conversions::{
        raw_to_pair::RawToPairPipeline,
        types::{GROUNDTRUTH_DIR_NAME, INPUT_DIR_NAME, OUTPUT_EXTENSION, PairPaths},
    },
    noise::NoiseModelEstimator,
    raw::RawDecoder,
    tiff::TiffWriter,
};

/// The two directories a dataset is written into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    pub input: PathBuf,
    pub groundtruth: PathBuf,
}

impl OutputDirs {
    pub fn under(base: &Path) -> Self {
        Self {
            input: base.join(INPUT_DIR_NAME),
            groundtruth: base.join(GROUNDTRUTH_DIR_NAME),
        }
    }

    /// Output paths for a raw file named `stem.<ext>`.
    pub fn pair_paths(&self, stem: &OsStr) -> PairPaths {
        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(OUTPUT_EXTENSION);
        PairPaths {
            input: self.input.join(&file_name),
            groundtruth: self.groundtruth.join(&file_name),
        }
    }
}

/// Outcome of a batch run. Failed files do not stop the batch.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<PairPaths>,
    pub failed: Vec<(PathBuf, DatasetError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Regular files directly inside `dir` whose extension matches one of `extensions`
/// (ASCII case-insensitive, leading dot optional), sorted by path.
pub fn find_raw_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let wanted: Vec<&str> = extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.'))
        .filter(|ext| !ext.is_empty())
        .collect();

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)
        .map_err(|e| DatasetError::InputReadError(format!("{}: {}", dir.display(), e)))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| wanted.iter().any(|w| w.eq_ignore_ascii_case(ext)));
        if matches {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Creates the input and groundtruth directories under `base`.
///
/// Existing directories are an error unless `force` is set, in which case they are
/// deleted with their contents first.
pub fn prepare_output_dirs(base: &Path, force: bool) -> Result<OutputDirs> {
    let dirs = OutputDirs::under(base);

    for dir in [&dirs.input, &dirs.groundtruth] {
        if dir.exists() {
            if !force {
                return Err(DatasetError::OutputDirectoryExists(dir.clone()));
            }
            warn!("Removing existing directory {}", dir.display());
            fs::remove_dir_all(dir)?;
        }
    }

    fs::create_dir(&dirs.input)?;
    fs::create_dir(&dirs.groundtruth)?;
    Ok(dirs)
}

/// Generates a pair for every matching raw file in `directory`.
///
/// Enumeration and directory preparation errors abort the run; errors on a single file
/// are logged, recorded in the report, and the next file is processed.
pub fn generate_dataset<R, W, E>(
    pipeline: &RawToPairPipeline<R, W, E>,
    directory: &Path,
    extensions: &[String],
    force: bool,
) -> Result<BatchReport>
where
    R: RawDecoder,
    W: TiffWriter,
    E: NoiseModelEstimator,
{
    let files = find_raw_files(directory, extensions)?;
    let dirs = prepare_output_dirs(directory, force)?;
    info!(
        "Found {} raw file(s) in {}",
        files.len(),
        directory.display()
    );

    let total = files.len();
    let mut report = BatchReport::default();
    for (index, path) in files.into_iter().enumerate() {
        info!("[{}/{}] Processing {}", index + 1, total, path.display());
        match pipeline.process_file(&path, &dirs) {
            Ok(paths) => report.succeeded.push(paths),
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                report.failed.push((path, e));
            }
        }
    }

    info!(
        "Dataset complete: {} succeeded, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );
    Ok(report)
}
