// src/processing/clustering.rs
//! Greedy grouping of CFAR detections into targets
//!
//! Detections are visited in input order. Each unassigned detection seeds a
//! cluster and absorbs every later unassigned detection closer than `eps` to
//! the seed (not to other members). There is no transitive merging, so the
//! result depends on input order. This is not DBSCAN.

use crate::config::processing_config::ClusterConfig;
use crate::config::RadarConfig;
use crate::error::{RadarErrorBuilder, RadarResult};
use crate::processing::cfar::Detection;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// A merged group of nearby detections in bin units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub avg_range_bin: f64,
    pub avg_doppler_bin: f64,
    pub max_snr_db: f64,
    pub member_count: usize,
}

/// A cluster converted to physical units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalTarget {
    pub distance_m: f64,
    pub velocity_mps: f64,
    pub snr_db: f64,
    pub member_count: usize,
}

impl Cluster {
    /// Cluster holding exactly one detection
    pub fn singleton(detection: &Detection) -> Self {
        Self {
            avg_range_bin: detection.range_bin as f64,
            avg_doppler_bin: detection.doppler_bin as f64,
            max_snr_db: detection.snr_db,
            member_count: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectionClusterer {
    eps: f64,
}

impl DetectionClusterer {
    pub fn new(config: ClusterConfig) -> RadarResult<Self> {
        config
            .validate()
            .map_err(|e| RadarErrorBuilder::new("detection_clusterer", "new").configuration(&e.to_string()))?;
        Ok(Self { eps: config.eps })
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn cluster(&self, detections: &[Detection]) -> Vec<Cluster> {
        let mut assigned = vec![false; detections.len()];
        let mut clusters = Vec::new();

        for (i, seed) in detections.iter().enumerate() {
            if assigned[i] {
                continue;
            }
            assigned[i] = true;

            let mut range_sum = seed.range_bin as f64;
            let mut doppler_sum = seed.doppler_bin as f64;
            let mut max_snr_db = seed.snr_db;
            let mut member_count = 1usize;

            for (j, candidate) in detections.iter().enumerate().skip(i + 1) {
                if assigned[j] || bin_distance(seed, candidate) >= self.eps {
                    continue;
                }
                assigned[j] = true;
                range_sum += candidate.range_bin as f64;
                doppler_sum += candidate.doppler_bin as f64;
                max_snr_db = max_snr_db.max(candidate.snr_db);
                member_count += 1;
            }

            clusters.push(Cluster {
                avg_range_bin: range_sum / member_count as f64,
                avg_doppler_bin: doppler_sum / member_count as f64,
                max_snr_db,
                member_count,
            });
        }

        trace!(detections = detections.len(), clusters = clusters.len(), "Detections clustered");
        clusters
    }

    /// Convert bin-space cluster coordinates to metres and m/s
    pub fn to_physical(cluster: &Cluster, radar: &RadarConfig) -> PhysicalTarget {
        let (distance_m, velocity_mps) =
            radar.bins_to_physical(cluster.avg_range_bin, cluster.avg_doppler_bin);
        PhysicalTarget {
            distance_m,
            velocity_mps,
            snr_db: cluster.max_snr_db,
            member_count: cluster.member_count,
        }
    }
}

fn bin_distance(a: &Detection, b: &Detection) -> f64 {
    let dr = a.range_bin as f64 - b.range_bin as f64;
    let dd = a.doppler_bin as f64 - b.doppler_bin as f64;
    dr.hypot(dd)
}
