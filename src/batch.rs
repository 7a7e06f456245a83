use std::fs;
use std::path::{Path, PathBuf};

use opencv::core::Mat;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::{FramePolicy, RunConfig};
use crate::error::{Error, Result};
use crate::markers::{Section, VideoMarkers};
use crate::row::{FrameRowCalculator, OutputRow};
use crate::table::{RowSink, RowWriter};
use crate::tank::TankSettings;
use crate::video::{FrameSource, VideoFile};

/// Frames read per worker before results are collected.
const FRAMES_PER_WORKER: usize = 4;

/// Computes the rows of whole sections, optionally spread over a worker pool.
pub struct BatchRunner<'a> {
    calculator: &'a FrameRowCalculator,
    policy: FramePolicy,
    pool: Option<ThreadPool>,
}

impl<'a> BatchRunner<'a> {
    /// `workers` of 1 keeps everything on the calling thread, 0 uses one worker per core.
    pub fn new(calculator: &'a FrameRowCalculator, policy: FramePolicy, workers: usize) -> Result<Self> {
        let pool = if workers == 1 {
            None
        } else {
            let pool = ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| Error::config(format!("failed to start worker pool: {e}")))?;
            Some(pool)
        };
        Ok(BatchRunner {
            calculator,
            policy,
            pool,
        })
    }

    fn chunk_size(&self) -> usize {
        self.pool
            .as_ref()
            .map_or(1, |pool| pool.current_num_threads() * FRAMES_PER_WORKER)
    }

    /// Feeds the row of every readable frame in `section` to `sink`, in frame order.
    /// The sink is flushed after each chunk. Returns the number of rows pushed.
    pub fn process_section(
        &self,
        source: &mut dyn FrameSource,
        section: Section,
        sink: &mut dyn RowSink,
    ) -> Result<usize> {
        let mut pushed = 0;
        let mut next = section.start;
        while next < section.end {
            let chunk_end = (next + self.chunk_size()).min(section.end);
            // The source is only touched from this thread.
            let frames: Vec<(usize, Result<Mat>)> =
                (next..chunk_end).map(|i| (i, source.read_frame(i))).collect();
            for (frame, result) in self.compute(frames, section.start) {
                match result {
                    Ok(row) => {
                        sink.push(row)?;
                        pushed += 1;
                    }
                    Err(e) => match self.policy {
                        FramePolicy::Skip => log::warn!("Skipping frame {frame}: {e}"),
                        FramePolicy::Abort => {
                            sink.flush()?;
                            return Err(e);
                        }
                    },
                }
            }
            sink.flush()?;
            log::debug!(
                "Section {}..{}: {:.2}% done",
                section.start,
                section.end,
                100.0 * (chunk_end - section.start) as f64 / section.len() as f64
            );
            next = chunk_end;
        }
        Ok(pushed)
    }

    /// Rows for a chunk of frames. Results keep the order of `frames`.
    fn compute(
        &self,
        frames: Vec<(usize, Result<Mat>)>,
        start_frame: usize,
    ) -> Vec<(usize, Result<OutputRow>)> {
        let calculator = self.calculator;
        let row = move |(frame, raw): (usize, Result<Mat>)| {
            (
                frame,
                raw.and_then(|raw| calculator.calculate(&raw, frame, start_frame)),
            )
        };
        match &self.pool {
            Some(pool) => pool.install(|| frames.into_par_iter().map(row).collect()),
            None => frames.into_iter().map(row).collect(),
        }
    }
}

/// File name of the raw table of a section.
pub fn raw_table_name(section: Section, slice_count: usize) -> String {
    format!("{}to{}_slice{}_raw.csv", section.start, section.end, slice_count)
}

/// Computes and writes one raw table per marker section of `source`, row by row.
/// Returns the written paths.
pub fn write_sections(
    runner: &BatchRunner,
    source: &mut dyn FrameSource,
    markers: &VideoMarkers,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let columns = runner.calculator.columns();
    let slice_count = runner.calculator.params().slice_count;
    let mut written = vec![];
    for section in markers.sections(source.frame_count()) {
        if section.is_empty() {
            log::warn!(
                "Section starting at {} has no frames, skipping",
                section.start
            );
            continue;
        }
        log::info!("Processing frames {} to {}", section.start, section.end);
        let path = out_dir.join(raw_table_name(section, slice_count));
        let mut writer = RowWriter::create(&path, &columns)?;
        runner.process_section(source, section, &mut writer)?;
        log::info!("Wrote {} rows to {}", writer.rows(), path.display());
        written.push(path);
    }
    Ok(written)
}

/// Loads everything named in `config` and writes the raw tables of every section.
pub fn run(config: &RunConfig) -> Result<Vec<PathBuf>> {
    let settings = TankSettings::load(&config.tank_settings)?;
    let markers = VideoMarkers::load(&config.markers)?;
    if markers.is_empty() {
        return Err(Error::config(format!(
            "{} holds no markers, nothing to process",
            config.markers.display()
        )));
    }
    let mut video = VideoFile::open(&config.video)?;
    let calculator = FrameRowCalculator::new(settings.tanks, config.row_params(video.fps()))?;
    let runner = BatchRunner::new(&calculator, config.on_frame_error, config.workers)?;

    fs::create_dir_all(&config.out_dir)?;
    write_sections(&runner, &mut video, &markers, &config.out_dir)
}
