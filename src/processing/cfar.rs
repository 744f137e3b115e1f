// src/processing/cfar.rs
//! Two-dimensional cell-averaging CFAR detection
//!
//! Every cell at least `guard + training` away from each border is tested
//! against the mean linear power of the surrounding training ring (the
//! `(2·(guard+training)+1)²` square minus the `(2·guard+1)²` guard square).
//! Border cells are never tested.
//!
//! The threshold multiplier uses the nominal population `4·training_cells`
//! for `N` in `N·(pfa^(-1/N) − 1)`. That count is smaller than the real 2-D
//! ring, so the resulting false-alarm rate is only approximately `pfa`.

use crate::config::processing_config::CfarConfig;
use crate::error::{RadarErrorBuilder, RadarResult};
use crate::processing::spectral::RangeDopplerMap;
use crate::utils::conversion::{db_to_linear_power, linear_power_to_db};
use ndarray::{s, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// One cell that exceeded its local threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub range_bin: usize,
    pub doppler_bin: usize,
    /// Cell power above the local noise average (dB)
    pub snr_db: f64,
}

/// Horizontal strip sums of one range column, `(rows)` long.
///
/// `full[d]` covers the whole window width on Doppler row `d`; `sides[d]`
/// covers the same width minus the guard columns. A training ring is then
/// assembled from these strips by addition only. Linear power spans many
/// orders of magnitude (the ε floor sits at 1e-20), so differences of large
/// partial sums are never taken.
struct ColumnStrips {
    full: Vec<f64>,
    sides: Vec<f64>,
}

impl ColumnStrips {
    fn new(power: &Array2<f64>, range_bin: usize, guard: usize, margin: usize) -> Self {
        let (left, right) = (range_bin - margin, range_bin + margin);
        let (guard_left, guard_right) = (range_bin - guard, range_bin + guard);

        let mut full = Vec::with_capacity(power.nrows());
        let mut sides = Vec::with_capacity(power.nrows());
        for row in power.outer_iter() {
            let outer_left: f64 = row.slice(s![left..guard_left]).iter().sum();
            let outer_right: f64 = row.slice(s![guard_right + 1..=right]).iter().sum();
            let centre: f64 = row.slice(s![guard_left..=guard_right]).iter().sum();
            sides.push(outer_left + outer_right);
            full.push(outer_left + centre + outer_right);
        }

        Self { full, sides }
    }

    /// Training-ring sum around Doppler row `doppler_bin`
    fn ring_sum(&self, doppler_bin: usize, guard: usize, margin: usize) -> f64 {
        let above: f64 = self.full[doppler_bin - margin..doppler_bin - guard].iter().sum();
        let beside: f64 = self.sides[doppler_bin - guard..=doppler_bin + guard].iter().sum();
        let below: f64 = self.full[doppler_bin + guard + 1..=doppler_bin + margin].iter().sum();
        above + beside + below
    }
}

/// CA-CFAR detector with per-run constants precomputed
#[derive(Debug, Clone)]
pub struct CfarDetector {
    config: CfarConfig,
    training_population: usize,
    threshold_factor_db: f64,
}

impl CfarDetector {
    pub fn new(config: CfarConfig) -> RadarResult<Self> {
        config
            .validate()
            .map_err(|e| RadarErrorBuilder::new("cfar_detector", "new").configuration(&e.to_string()))?;

        let nominal = config.nominal_training_count() as f64;
        let threshold_factor = nominal * (config.pfa.powf(-1.0 / nominal) - 1.0);
        let threshold_factor_db = 10.0 * threshold_factor.log10();

        // Saturates for absurd windows; those never fit a map and are never scanned
        let outer = config.margin().saturating_mul(2).saturating_add(1);
        let inner = config.guard_cells.saturating_mul(2).saturating_add(1);
        let training_population = outer
            .saturating_mul(outer)
            .saturating_sub(inner.saturating_mul(inner));

        Ok(Self {
            config,
            training_population,
            threshold_factor_db,
        })
    }

    pub fn config(&self) -> &CfarConfig {
        &self.config
    }

    /// Untested border width on every side
    pub fn margin(&self) -> usize {
        self.config.margin()
    }

    /// `10·log10(N·(pfa^(-1/N) − 1))` with the nominal `N`
    pub fn threshold_factor_db(&self) -> f64 {
        self.threshold_factor_db
    }

    /// Cells in one full training ring
    pub fn training_population(&self) -> usize {
        self.training_population
    }

    /// Whether at least one cell of a `rows × cols` map can be tested
    pub fn window_fits(&self, rows: usize, cols: usize) -> bool {
        let span = self.margin().saturating_mul(2);
        rows > span && cols > span
    }

    /// Detections ordered by range bin, then Doppler bin
    pub fn detect(&self, map: &RangeDopplerMap) -> Vec<Detection> {
        let (rows, cols) = map.shape();
        if !self.window_fits(rows, cols) {
            debug!(
                rows,
                cols,
                margin = self.margin(),
                "CFAR window does not fit the map; no cells tested"
            );
            return Vec::new();
        }

        let power = map.data().mapv(|db| db_to_linear_power(db as f64));
        let margin = self.margin();
        let guard = self.config.guard_cells;
        let population = self.training_population as f64;
        let data = map.data();

        let per_range_bin: Vec<Vec<Detection>> = (margin..cols - margin)
            .into_par_iter()
            .map(|range_bin| {
                let strips = ColumnStrips::new(&power, range_bin, guard, margin);
                (margin..rows - margin)
                    .filter_map(|doppler_bin| {
                        let cut = data[[doppler_bin, range_bin]] as f64;
                        if !cut.is_finite() {
                            return None;
                        }

                        let training_sum = strips.ring_sum(doppler_bin, guard, margin);
                        if training_sum <= 0.0 {
                            return None;
                        }

                        let noise_avg_db = linear_power_to_db(training_sum / population);
                        (cut > noise_avg_db + self.threshold_factor_db).then(|| Detection {
                            range_bin,
                            doppler_bin,
                            snr_db: cut - noise_avg_db,
                        })
                    })
                    .collect()
            })
            .collect();

        let detections: Vec<Detection> = per_range_bin.into_iter().flatten().collect();
        trace!(count = detections.len(), "CFAR detections");
        detections
    }
}
