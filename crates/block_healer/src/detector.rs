//! Gap Detector: reads the Shared Ordered Log, works out which heights are
//! missing between the known ones and overwrites the Missing Set.
use gap_scan::{GapError, GapReport, detect, missing_set};
use tracing::{error, info, warn};

use crate::config::{CoordConfig, CycleConfig};
use crate::coord::{CoordError, Coordinator, RedisCoordinator};
use crate::error::Error;
use crate::window::Window;

/// Default upper bound on the published Missing Set.
pub const DEFAULT_MAX_MISSING: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Fewer than two distinct heights logged; the Missing Set was left alone.
    Insufficient { distinct: usize },
    /// The logged heights are contiguous; an empty Missing Set was written.
    Contiguous(GapReport),
    /// Gaps were found and published. `missing` holds at most the detector's
    /// limit; `report` still describes every gap.
    Gaps { report: GapReport, missing: Vec<u64> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectSummary {
    pub scans: u32,
    pub failures: u32,
    /// Size of the last Missing Set published.
    pub last_missing: Option<usize>,
}

pub struct GapDetector<'a, C> {
    coord: &'a C,
    log_key: String,
    gaps_key: String,
    max_missing: usize,
}

impl<'a, C: Coordinator> GapDetector<'a, C> {
    pub fn new(coord: &'a C, log_key: impl Into<String>, gaps_key: impl Into<String>) -> Self {
        GapDetector {
            coord,
            log_key: log_key.into(),
            gaps_key: gaps_key.into(),
            max_missing: DEFAULT_MAX_MISSING,
        }
    }

    /// Caps how many heights one scan publishes. A stray entry far past the
    /// tip would otherwise turn into a list of hundreds of millions.
    pub fn with_max_missing(mut self, max_missing: usize) -> Self {
        self.max_missing = max_missing;
        self
    }

    /// Logged heights; entries that are not integers are skipped.
    async fn logged_heights(&self) -> Result<Vec<u64>, CoordError> {
        let entries = self.coord.read_all(&self.log_key).await?;
        let mut heights = Vec::with_capacity(entries.len());
        let mut skipped = 0usize;
        for entry in &entries {
            match entry.trim().parse::<u64>() {
                Ok(h) => heights.push(h),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("Skipped {skipped} malformed entries in {}", self.log_key);
        }
        Ok(heights)
    }

    /// One full scan. The Missing Set is replaced, never merged.
    pub async fn scan_once(&self) -> Result<ScanOutcome, CoordError> {
        let heights = self.logged_heights().await?;
        let report = match detect(heights) {
            Ok(report) => report,
            Err(GapError::InsufficientData { distinct }) => {
                return Ok(ScanOutcome::Insufficient { distinct });
            }
        };

        let missing = report.missing_up_to(self.max_missing);
        let total = report.missing_count();
        if (missing.len() as u64) < total {
            warn!(
                "{total} heights missing, publishing the lowest {}",
                missing.len()
            );
        }
        self.coord
            .set(&self.gaps_key, &missing_set::encode(&missing))
            .await?;

        if report.is_contiguous() {
            Ok(ScanOutcome::Contiguous(report))
        } else {
            Ok(ScanOutcome::Gaps { report, missing })
        }
    }

    /// Runs up to `config.scans` scans, `config.interval` apart, inside `window`.
    pub async fn run(&self, window: &Window, config: &CycleConfig) -> DetectSummary {
        let mut summary = DetectSummary::default();
        info!("Detecting gaps in downloaded blocks...");

        for cycle in 1..=config.scans {
            if !window.is_open() {
                break;
            }
            let Some(result) = window.run(self.scan_once()).await else {
                break;
            };
            summary.scans += 1;
            match result {
                Ok(ScanOutcome::Insufficient { distinct }) => {
                    info!("Not enough blocks to detect gaps ({distinct} distinct)");
                }
                Ok(ScanOutcome::Contiguous(report)) => {
                    summary.last_missing = Some(0);
                    info!("No gaps detected in {}..={}", report.low, report.high);
                }
                Ok(ScanOutcome::Gaps { report, missing }) => {
                    summary.last_missing = Some(missing.len());
                    info!(
                        missing = missing.len(),
                        "Gaps detected: {}",
                        report.describe_gaps()
                    );
                }
                Err(e) => {
                    summary.failures += 1;
                    error!("Error detecting gaps: {e}");
                }
            }

            if cycle < config.scans && !window.sleep(config.interval).await {
                break;
            }
        }

        info!(scans = summary.scans, failures = summary.failures, "Gap detector finished");
        summary
    }
}

/// Connect, scan for one window, release.
pub async fn launch(
    coord: &CoordConfig,
    config: &CycleConfig,
    max_missing: usize,
) -> Result<DetectSummary, Error> {
    let window = Window::new(config.window);
    let redis = match RedisCoordinator::connect_within(coord, &window).await {
        Ok(redis) => redis,
        Err(e) => {
            error!("Could not connect to Redis at {}: {e}", coord.url());
            return Ok(DetectSummary::default());
        }
    };

    let summary = GapDetector::new(&redis, coord.log_key.as_str(), coord.gaps_key.as_str())
        .with_max_missing(max_missing)
        .run(&window, config)
        .await;
    redis.close();
    Ok(summary)
}
