use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;

use crate::image_pipeline::common::{DatasetError, Raster, Result};
use crate::image_pipeline::conversions::{
    DatasetConfig, OutputDirs, RawToPairPipeline, crop_to_even, find_raw_files,
    generate_dataset, prepare_output_dirs,
};
use crate::image_pipeline::noise::{
    NoiseBounds, NoiseModel, NoiseModelEstimator, PoissonGaussianEstimator,
};
use crate::image_pipeline::raw::RawDecoder;
use crate::image_pipeline::tiff::{TiffOptions, TiffWriter};

struct MockReader {
    mock_data: Raster,
    failing_stem: Option<&'static str>,
}

impl MockReader {
    fn returning(raster: Raster) -> Self {
        Self {
            mock_data: raster,
            failing_stem: None,
        }
    }
}

impl RawDecoder for MockReader {
    fn decode(&self, path: &Path) -> Result<Raster> {
        let stem = path.file_stem().and_then(|s| s.to_str());
        if stem.is_some() && stem == self.failing_stem {
            return Err(DatasetError::DecodeError("Mock decode error".to_string()));
        }
        Ok(self.mock_data.clone())
    }
}

#[derive(Clone, Default)]
struct MockWriter {
    should_fail: bool,
    fail_on_channels: Option<usize>,
    written: Arc<Mutex<Vec<(usize, usize, usize)>>>,
}

impl TiffWriter for MockWriter {
    fn write_tiff(&self, image: &Raster, output: &mut dyn Write, _options: &TiffOptions) -> Result<()> {
        if self.should_fail || self.fail_on_channels == Some(image.channels()) {
            return Err(DatasetError::EncodeError("Mock encode error".to_string()));
        }
        self.written
            .lock()
            .unwrap()
            .push((image.width(), image.height(), image.channels()));
        output.write_all(b"tiff")?;
        Ok(())
    }
}

/// Returns preset models and records the model each apply call receives.
#[derive(Default)]
struct RecordingEstimator {
    models: Vec<NoiseModel>,
    applied: Arc<Mutex<Vec<NoiseModel>>>,
}

impl NoiseModelEstimator for RecordingEstimator {
    fn estimate(&self, _tile: &Raster) -> Result<Vec<NoiseModel>> {
        Ok(self.models.clone())
    }

    fn apply(&self, tile: &Raster, model: NoiseModel, _rng: &mut StdRng) -> Result<Raster> {
        self.applied.lock().unwrap().push(model);
        Ok(tile.clone())
    }
}

fn constant_rgb(width: usize, height: usize, value: u16) -> Raster {
    Raster::filled(width, height, 3, 16, value).unwrap()
}

fn textured_rgb(width: usize, height: usize) -> Raster {
    let data = (0..height)
        .flat_map(|y| {
            (0..width).flat_map(move |x| {
                let base = (x * 97 + y * 31 + (x * y) % 17) as u16;
                [base * 3, base * 5 + 7, base * 2 + 11]
            })
        })
        .collect();
    Raster::new(width, height, 3, 16, data).unwrap()
}

fn pipeline_with(config: DatasetConfig) -> RawToPairPipeline<MockReader, MockWriter, PoissonGaussianEstimator> {
    RawToPairPipeline::with_custom(
        MockReader::returning(constant_rgb(4, 4, 0)),
        MockWriter::default(),
        PoissonGaussianEstimator::default(),
        config,
    )
    .unwrap()
}

#[test]
fn constant_image_gives_constant_pair() {
    let pipeline = pipeline_with(DatasetConfig::builder().block_size(5).build());
    let pair = pipeline.generate_pair(constant_rgb(20, 20, 100)).unwrap();

    assert_eq!(pair.groundtruth.dimensions(), (4, 4));
    assert_eq!(pair.groundtruth.channels(), 3);
    assert!(pair.groundtruth.data().iter().all(|&v| v == 100));

    assert_eq!(pair.input.dimensions(), (4, 4));
    assert_eq!(pair.input.channels(), 1);
    assert!(pair.input.data().iter().all(|&v| v == 100));
}

#[test]
fn odd_output_is_cropped_to_even() {
    // 21x20 at block 3 subsamples to 7x6
    let pipeline = pipeline_with(DatasetConfig::builder().block_size(3).build());
    let pair = pipeline.generate_pair(textured_rgb(21, 20)).unwrap();
    assert_eq!(pair.groundtruth.dimensions(), (6, 6));
    assert_eq!(pair.input.dimensions(), (6, 6));

    let pipeline = pipeline_with(DatasetConfig::builder().block_size(5).build());
    let pair = pipeline.generate_pair(textured_rgb(21, 20)).unwrap();
    assert_eq!(pair.groundtruth.dimensions(), (4, 4));
    assert_eq!(pair.input.dimensions(), pair.groundtruth.dimensions());
}

#[test]
fn tiled_processing_matches_single_tile_processing() {
    let raster = textured_rgb(23, 17);

    let single = pipeline_with(DatasetConfig::builder().block_size(2).build())
        .generate_pair(raster.clone())
        .unwrap();

    // tile edge 8: a 3x3 grid whose last row is a single pixel tall
    let tiled_pipeline = pipeline_with(
        DatasetConfig::builder()
            .block_size(2)
            .chunk_multiplier(4)
            .build(),
    );
    assert_eq!(tiled_pipeline.geometry().tile_edge(), 8);
    let tiled = tiled_pipeline.generate_pair(raster.clone()).unwrap();

    let parallel = pipeline_with(
        DatasetConfig::builder()
            .block_size(2)
            .chunk_multiplier(4)
            .parallel_tiles(true)
            .build(),
    )
    .generate_pair(raster)
    .unwrap();

    assert_eq!(single.groundtruth.dimensions(), (10, 8));
    assert_eq!(tiled, single);
    assert_eq!(parallel, single);
}

#[test]
fn pair_dimensions_always_match_and_are_even() {
    for (width, height, block_size) in [(50, 31, 2), (37, 45, 3), (64, 64, 4), (99, 20, 5)] {
        let pipeline = pipeline_with(
            DatasetConfig::builder()
                .block_size(block_size)
                .chunk_multiplier(6)
                .build(),
        );
        let pair = pipeline.generate_pair(textured_rgb(width, height)).unwrap();
        assert_eq!(pair.input.dimensions(), pair.groundtruth.dimensions());
        assert_eq!(pair.input.width() % 2, 0);
        assert_eq!(pair.input.height() % 2, 0);
    }
}

#[test]
fn image_smaller_than_a_block_is_rejected() {
    let pipeline = pipeline_with(DatasetConfig::builder().block_size(5).build());
    let result = pipeline.generate_pair(constant_rgb(3, 30, 1));
    assert!(matches!(result, Err(DatasetError::InvalidDimensions(0, 6))));
}

#[test]
fn single_channel_raster_is_rejected() {
    let pipeline = pipeline_with(DatasetConfig::default());
    let result = pipeline.generate_pair(Raster::filled(10, 10, 1, 16, 0).unwrap());
    assert!(matches!(
        result,
        Err(DatasetError::InvalidChannels { expected: 3, got: 1 })
    ));
}

#[test]
fn invalid_block_size_fails_at_construction() {
    for block_size in [0, 1] {
        let result = RawToPairPipeline::with_custom(
            MockReader::returning(constant_rgb(4, 4, 0)),
            MockWriter::default(),
            PoissonGaussianEstimator::default(),
            DatasetConfig::builder().block_size(block_size).build(),
        );
        assert!(matches!(result, Err(DatasetError::InvalidBlockSize(b)) if b == block_size));
    }
}

#[test]
fn estimated_noise_is_clamped_before_apply() {
    let estimator = RecordingEstimator {
        models: vec![NoiseModel::new(5.0, 5.0)],
        ..Default::default()
    };
    let applied = Arc::clone(&estimator.applied);
    let pipeline = RawToPairPipeline::with_custom(
        MockReader::returning(constant_rgb(4, 4, 0)),
        MockWriter::default(),
        estimator,
        DatasetConfig::builder().block_size(2).add_noise(true).build(),
    )
    .unwrap();

    pipeline.generate_pair(textured_rgb(8, 8)).unwrap();
    let bounds = pipeline.config().noise_bounds;
    assert_eq!(
        *applied.lock().unwrap(),
        vec![NoiseModel::new(bounds.a_max, bounds.b_max)]
    );
}

#[test]
fn ambiguous_estimate_fails_the_image() {
    let estimator = RecordingEstimator {
        models: vec![NoiseModel::NONE, NoiseModel::NONE],
        ..Default::default()
    };
    let pipeline = RawToPairPipeline::with_custom(
        MockReader::returning(constant_rgb(4, 4, 0)),
        MockWriter::default(),
        estimator,
        DatasetConfig::builder().block_size(2).add_noise(true).build(),
    )
    .unwrap();

    let result = pipeline.generate_pair(textured_rgb(8, 8));
    assert!(matches!(result, Err(DatasetError::EstimationError(_))));
}

#[test]
fn noise_on_uniform_image_changes_nothing() {
    let raster = constant_rgb(20, 20, 100);
    let clean = pipeline_with(DatasetConfig::builder().block_size(5).build())
        .generate_pair(raster.clone())
        .unwrap();
    let noised = pipeline_with(
        DatasetConfig::builder()
            .block_size(5)
            .add_noise(true)
            .build(),
    )
    .generate_pair(raster)
    .unwrap();

    assert_eq!(clean, noised);
}

#[test]
fn seeded_noise_is_reproducible_and_leaves_groundtruth_clean() {
    let config = DatasetConfig::builder()
        .block_size(2)
        .chunk_multiplier(8)
        .add_noise(true)
        .noise_seed(Some(11))
        .build();
    let parallel_config = DatasetConfig {
        parallel_tiles: true,
        ..config.clone()
    };
    let raster = textured_rgb(40, 36);

    let first = pipeline_with(config.clone()).generate_pair(raster.clone()).unwrap();
    let second = pipeline_with(parallel_config).generate_pair(raster.clone()).unwrap();
    let clean = pipeline_with(DatasetConfig {
        add_noise: false,
        ..config
    })
    .generate_pair(raster)
    .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.groundtruth, clean.groundtruth);
}

#[test]
fn timings_cover_each_step() {
    let pipeline = pipeline_with(DatasetConfig::builder().block_size(2).build());
    let (_, timings) = pipeline
        .generate_pair_with_timings(textured_rgb(16, 16))
        .unwrap();
    for step in ["partition", "process_tiles", "join", "crop_to_even"] {
        assert!(timings.get_step(step).is_some(), "missing {step}");
    }
}

#[test]
fn crop_to_even_rejects_mismatched_pair() {
    let input = Raster::filled(4, 4, 1, 16, 0).unwrap();
    let groundtruth = Raster::filled(4, 5, 3, 16, 0).unwrap();
    assert!(matches!(
        crop_to_even(input, groundtruth),
        Err(DatasetError::DimensionMismatch(_))
    ));
}

#[test]
fn process_file_writes_both_images() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = prepare_output_dirs(dir.path(), false).unwrap();
    let writer = MockWriter::default();
    let pipeline = RawToPairPipeline::with_custom(
        MockReader::returning(constant_rgb(20, 20, 100)),
        writer.clone(),
        PoissonGaussianEstimator::default(),
        DatasetConfig::default(),
    )
    .unwrap();

    let paths = pipeline
        .process_file(&dir.path().join("capture.arw"), &dirs)
        .unwrap();

    assert_eq!(paths.input, dirs.input.join("capture.tiff"));
    assert_eq!(paths.groundtruth, dirs.groundtruth.join("capture.tiff"));
    assert!(paths.input.is_file());
    assert!(paths.groundtruth.is_file());
    assert_eq!(*writer.written.lock().unwrap(), vec![(4, 4, 1), (4, 4, 3)]);
}

#[test]
fn reader_failure_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = OutputDirs::under(dir.path());
    let pipeline = RawToPairPipeline::with_custom(
        MockReader {
            mock_data: constant_rgb(20, 20, 1),
            failing_stem: Some("broken"),
        },
        MockWriter::default(),
        PoissonGaussianEstimator::default(),
        DatasetConfig::default(),
    )
    .unwrap();

    let result = pipeline.process_file(&dir.path().join("broken.nef"), &dirs);
    assert!(matches!(result, Err(DatasetError::DecodeError(_))));
}

#[test]
fn writer_failure_is_an_encode_error() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = prepare_output_dirs(dir.path(), false).unwrap();
    let pipeline = RawToPairPipeline::with_custom(
        MockReader::returning(constant_rgb(20, 20, 1)),
        MockWriter {
            should_fail: true,
            ..Default::default()
        },
        PoissonGaussianEstimator::default(),
        DatasetConfig::default(),
    )
    .unwrap();

    let result = pipeline.process_file(&dir.path().join("capture.arw"), &dirs);
    assert!(matches!(result, Err(DatasetError::EncodeError(_))));
}

#[test]
fn find_raw_files_matches_extensions() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.ARW", "a.arw", "c.nef", "notes.txt", "noext"] {
        fs::write(dir.path().join(name), b"x").unwrap();
    }
    fs::create_dir(dir.path().join("folder.arw")).unwrap();

    let files = find_raw_files(dir.path(), &["arw".to_string(), ".nef".to_string()]).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["a.arw", "b.ARW", "c.nef"]);
}

#[test]
fn output_dirs_require_force_to_replace() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = prepare_output_dirs(dir.path(), false).unwrap();
    fs::write(dirs.input.join("stale.tiff"), b"old").unwrap();

    assert!(matches!(
        prepare_output_dirs(dir.path(), false),
        Err(DatasetError::OutputDirectoryExists(_))
    ));

    let dirs = prepare_output_dirs(dir.path(), true).unwrap();
    assert!(dirs.input.is_dir());
    assert!(dirs.groundtruth.is_dir());
    assert_eq!(fs::read_dir(&dirs.input).unwrap().count(), 0);
}

#[test]
fn batch_continues_past_failed_files() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["good.arw", "broken.arw", "other.arw", "skip.jpg"] {
        fs::write(dir.path().join(name), b"raw").unwrap();
    }
    let pipeline = RawToPairPipeline::with_custom(
        MockReader {
            mock_data: constant_rgb(20, 20, 100),
            failing_stem: Some("broken"),
        },
        MockWriter::default(),
        PoissonGaussianEstimator::default(),
        DatasetConfig::default(),
    )
    .unwrap();

    let report = generate_dataset(&pipeline, dir.path(), &["arw".to_string()], false).unwrap();

    assert!(!report.is_success());
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("broken.arw"));
    assert!(matches!(report.failed[0].1, DatasetError::DecodeError(_)));
    assert!(dir.path().join("output").join("good.tiff").is_file());
    assert!(dir.path().join("input").join("other.tiff").is_file());
}

#[test]
fn invalid_noise_bounds_fail_at_construction() {
    for bounds in [
        NoiseBounds { a_max: -0.01, b_max: 0.0004 },
        NoiseBounds { a_max: 0.01, b_max: f64::NAN },
    ] {
        let result = RawToPairPipeline::with_custom(
            MockReader::returning(constant_rgb(4, 4, 0)),
            MockWriter::default(),
            PoissonGaussianEstimator::default(),
            DatasetConfig::builder()
                .add_noise(true)
                .noise_bounds(bounds)
                .build(),
        );
        assert!(matches!(result, Err(DatasetError::InvalidConfig(_))));
    }
}

#[test]
fn groundtruth_encode_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = prepare_output_dirs(dir.path(), false).unwrap();
    let pipeline = RawToPairPipeline::with_custom(
        MockReader::returning(constant_rgb(20, 20, 100)),
        MockWriter {
            fail_on_channels: Some(3),
            ..Default::default()
        },
        PoissonGaussianEstimator::default(),
        DatasetConfig::default(),
    )
    .unwrap();

    let result = pipeline.process_file(&dir.path().join("capture.arw"), &dirs);

    assert!(matches!(result, Err(DatasetError::EncodeError(_))));
    assert_eq!(fs::read_dir(&dirs.input).unwrap().count(), 0);
    assert_eq!(fs::read_dir(&dirs.groundtruth).unwrap().count(), 0);
}

#[test]
fn groundtruth_write_failure_removes_input() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = prepare_output_dirs(dir.path(), false).unwrap();
    // a directory in the way makes the groundtruth write fail
    fs::create_dir(dirs.groundtruth.join("capture.tiff")).unwrap();
    let pipeline = RawToPairPipeline::with_custom(
        MockReader::returning(constant_rgb(20, 20, 100)),
        MockWriter::default(),
        PoissonGaussianEstimator::default(),
        DatasetConfig::default(),
    )
    .unwrap();

    let result = pipeline.process_file(&dir.path().join("capture.arw"), &dirs);

    assert!(matches!(result, Err(DatasetError::OutputWriteError(_))));
    assert!(!dirs.input.join("capture.tiff").exists());
    assert!(dirs.groundtruth.join("capture.tiff").is_dir());
}

#[test]
fn process_file_times_decode_and_encode() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = prepare_output_dirs(dir.path(), false).unwrap();
    let pipeline = RawToPairPipeline::with_custom(
        MockReader::returning(constant_rgb(20, 20, 100)),
        MockWriter::default(),
        PoissonGaussianEstimator::default(),
        DatasetConfig::default(),
    )
    .unwrap();

    let (_, timings) = pipeline
        .process_file_with_timings(&dir.path().join("capture.arw"), &dirs)
        .unwrap();
    for step in ["decode_raw", "partition", "process_tiles", "join", "encode_tiff"] {
        assert!(timings.get_step(step).is_some(), "missing {step}");
    }
}
