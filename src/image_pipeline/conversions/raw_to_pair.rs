use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::image_pipeline::{
    common::{DatasetError, Raster, Result},
    conversions::{
        dataset::OutputDirs,
        timing::PipelineTimings,
        types::{DatasetConfig, ImagePair, PairPaths},
    },
    mosaic::{mosaic, subsample},
    noise::{NoiseModelEstimator, NoiseSynthesizer, PoissonGaussianEstimator},
    raw::{RawDecoder, RawLoaderReader},
    tiff::{StandardTiffWriter, TiffOptions, TiffWriter},
    tiles::{TileGeometry, TilePosition, join, partition},
};

/// Turns raw captures into aligned (mosaiced input, groundtruth) pairs.
pub struct RawToPairPipeline<R: RawDecoder, W: TiffWriter, E: NoiseModelEstimator> {
    reader: R,
    writer: W,
    synthesizer: NoiseSynthesizer<E>,
    geometry: TileGeometry,
    config: DatasetConfig,
}

impl RawToPairPipeline<RawLoaderReader, StandardTiffWriter, PoissonGaussianEstimator> {
    pub fn new(config: DatasetConfig) -> Result<Self> {
        Self::with_custom(
            RawLoaderReader,
            StandardTiffWriter,
            PoissonGaussianEstimator::default(),
            config,
        )
    }
}

impl<R: RawDecoder, W: TiffWriter, E: NoiseModelEstimator> RawToPairPipeline<R, W, E> {
    /// Fails with `InvalidBlockSize`/`InvalidConfig` before any file is touched.
    pub fn with_custom(reader: R, writer: W, estimator: E, config: DatasetConfig) -> Result<Self> {
        let geometry = config.validate()?;
        let synthesizer = NoiseSynthesizer::new(estimator, config.noise_bounds, config.noise_seed);
        Ok(Self {
            reader,
            writer,
            synthesizer,
            geometry,
            config,
        })
    }

    pub fn generate_pair(&self, raster: Raster) -> Result<ImagePair> {
        let (pair, _) = self.generate_pair_with_timings(raster)?;
        Ok(pair)
    }

    pub fn generate_pair_with_timings(&self, raster: Raster) -> Result<(ImagePair, PipelineTimings)> {
        let mut timings = PipelineTimings::new();
        let pair = self.run(raster, &mut timings)?;
        timings.log_summary();
        Ok((pair, timings))
    }

    #[instrument(skip_all, fields(width = raster.width(), height = raster.height()))]
    fn run(&self, raster: Raster, timings: &mut PipelineTimings) -> Result<ImagePair> {
        if raster.channels() != 3 {
            return Err(DatasetError::InvalidChannels {
                expected: 3,
                got: raster.channels(),
            });
        }

        let grid = {
            let _span = tracing::info_span!("partition").entered();
            timings.time("partition", || partition(raster, self.geometry.tile_edge()))?
        };
        let columns = grid.columns() as u64;
        debug!("Processing {} tile(s)", grid.len());

        let processed = {
            let _span = tracing::info_span!("process_tiles", tiles = grid.len()).entered();
            timings.time("process_tiles", || {
                grid.try_map(self.config.parallel_tiles, |position, tile| {
                    let stream = position.row as u64 * columns + position.column as u64;
                    self.process_tile(position, stream, tile)
                })
            })?
        };
        let (input_tiles, groundtruth_tiles) = processed.unzip();

        let (input, groundtruth) = {
            let _span = tracing::info_span!("join").entered();
            timings.time("join", || -> Result<(Raster, Raster)> {
                let stride = self.geometry.output_stride();
                Ok((join(&input_tiles, stride)?, join(&groundtruth_tiles, stride)?))
            })?
        };
        drop(input_tiles);
        drop(groundtruth_tiles);

        let pair = {
            let _span = tracing::info_span!("crop_to_even").entered();
            timings.time("crop_to_even", || crop_to_even(input, groundtruth))?
        };

        if pair.groundtruth.is_empty() {
            return Err(DatasetError::InvalidDimensions(
                pair.groundtruth.width(),
                pair.groundtruth.height(),
            ));
        }

        info!(
            width = pair.groundtruth.width(),
            height = pair.groundtruth.height(),
            "Pair generated"
        );
        Ok(pair)
    }

    /// Sensor read-out, subsampling and mosaicing of one tile; returns (input, groundtruth).
    fn process_tile(&self, position: TilePosition, stream: u64, tile: Raster) -> Result<(Raster, Raster)> {
        let pattern = &self.config.pattern;

        let sensor = mosaic(&tile, pattern)?;
        let groundtruth = subsample(&sensor, self.geometry.block_size(), pattern)?;
        drop(sensor);

        // edge tiles thinner than a block produce nothing to noise
        let noise_model = if self.config.add_noise && !groundtruth.is_empty() {
            Some(self.synthesizer.estimate(&tile)?)
        } else {
            None
        };
        drop(tile);

        let mut input = mosaic(&groundtruth, pattern)?;
        if let Some(model) = noise_model {
            input = self.synthesizer.apply(&input, model, stream)?;
        }

        debug!(
            "Tile ({}, {}) -> {}x{}",
            position.row,
            position.column,
            groundtruth.width(),
            groundtruth.height()
        );
        Ok((input, groundtruth))
    }

    /// Decodes `input_path`, generates its pair and writes it into `dirs`.
    pub fn process_file(&self, input_path: &Path, dirs: &OutputDirs) -> Result<PairPaths> {
        let (paths, _) = self.process_file_with_timings(input_path, dirs)?;
        Ok(paths)
    }

    #[instrument(skip(self, dirs))]
    pub fn process_file_with_timings(
        &self,
        input_path: &Path,
        dirs: &OutputDirs,
    ) -> Result<(PairPaths, PipelineTimings)> {
        let stem = input_path.file_stem().ok_or_else(|| {
            DatasetError::InputReadError(format!("{}: no file name", input_path.display()))
        })?;
        let paths = dirs.pair_paths(stem);
        let mut timings = PipelineTimings::new();

        let raster = {
            let _span = tracing::info_span!("decode_raw").entered();
            timings.time("decode_raw", || self.reader.decode(input_path))?
        };
        debug!("Decoded {}x{} raster", raster.width(), raster.height());

        let pair = self.run(raster, &mut timings)?;
        timings.time("encode_tiff", || self.write_pair(&pair, &paths))?;
        timings.log_summary();
        Ok((paths, timings))
    }

    /// Encodes both images before touching the disk. If the second file cannot be
    /// written the first is removed, so a failed pair leaves nothing behind.
    pub fn write_pair(&self, pair: &ImagePair, paths: &PairPaths) -> Result<()> {
        let _span = tracing::info_span!("encode_tiff").entered();
        let input = self.encode(&pair.input, &self.config.input_tiff)?;
        let groundtruth = self.encode(&pair.groundtruth, &self.config.groundtruth_tiff)?;

        write_file(&paths.input, &input)?;
        if let Err(e) = write_file(&paths.groundtruth, &groundtruth) {
            remove_partial(&paths.input);
            return Err(e);
        }
        Ok(())
    }

    fn encode(&self, image: &Raster, options: &TiffOptions) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.writer.write_tiff(image, &mut buffer, options)?;
        Ok(buffer)
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn geometry(&self) -> &TileGeometry {
        &self.geometry
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| {
        remove_partial(path);
        DatasetError::OutputWriteError(format!("{}: {}", path.display(), e))
    })
}

fn remove_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}

/// Crops both images with the same box to the largest even width and height.
///
/// The two images must already agree in size; disagreement means tiles were joined
/// inconsistently.
pub fn crop_to_even(input: Raster, groundtruth: Raster) -> Result<ImagePair> {
    if input.dimensions() != groundtruth.dimensions() {
        return Err(DatasetError::DimensionMismatch(format!(
            "input is {}x{} but groundtruth is {}x{}",
            input.width(),
            input.height(),
            groundtruth.width(),
            groundtruth.height()
        )));
    }

    let (width, height) = groundtruth.dimensions();
    if width % 2 == 0 && height % 2 == 0 {
        return Ok(ImagePair { input, groundtruth });
    }

    let even_width = width - width % 2;
    let even_height = height - height % 2;
    debug!(
        "Cropping {}x{} to {}x{}",
        width, height, even_width, even_height
    );
    Ok(ImagePair {
        input: input.crop(0, 0, even_width, even_height)?,
        groundtruth: groundtruth.crop(0, 0, even_width, even_height)?,
    })
}
