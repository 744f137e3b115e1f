// src/tracking/manager.rs
//! Default association policy: one [`PositionTracker`] per target
//!
//! The radar measures range only, so a target at distance `d` is observed as
//! the boresight point `(d, 0)`. Each frame every track is predicted, then
//! (track, target) pairs inside the gate are assigned greedily by distance.
//! Unmatched targets open new tracks; tracks unmatched for more than
//! `max_missed_frames` consecutive frames are dropped.

use crate::config::processing_config::{AssociationConfig, TrackerConfig};
use crate::error::{RadarErrorBuilder, RadarResult};
use crate::processing::clustering::PhysicalTarget;
use crate::tracking::kalman::PositionTracker;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Published view of one track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackSnapshot {
    pub track_id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub age_frames: u64,
    pub missed_frames: u32,
}

#[derive(Debug, Clone)]
struct Track {
    id: u64,
    tracker: PositionTracker,
    age_frames: u64,
    missed_frames: u32,
}

impl Track {
    fn snapshot(&self) -> Option<TrackSnapshot> {
        let state = self.tracker.state()?;
        let (x, y) = state.position();
        let (vx, vy) = state.velocity();
        Some(TrackSnapshot {
            track_id: self.id,
            x,
            y,
            vx,
            vy,
            age_frames: self.age_frames,
            missed_frames: self.missed_frames,
        })
    }
}

/// Boresight measurement for a range-only target
pub fn target_measurement(target: &PhysicalTarget) -> (f64, f64) {
    (target.distance_m, 0.0)
}

#[derive(Debug, Clone)]
pub struct TrackManager {
    tracker_config: TrackerConfig,
    association: AssociationConfig,
    tracks: Vec<Track>,
    next_id: u64,
    degenerate_resets: u64,
}

impl TrackManager {
    pub fn new(tracker_config: TrackerConfig, association: AssociationConfig) -> RadarResult<Self> {
        tracker_config
            .validate()
            .and_then(|_| association.validate())
            .map_err(|e| RadarErrorBuilder::new("track_manager", "new").configuration(&e.to_string()))?;

        Ok(Self {
            tracker_config,
            association,
            tracks: Vec::new(),
            next_id: 1,
            degenerate_resets: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Tracks re-initialised after a degenerate update
    pub fn degenerate_resets(&self) -> u64 {
        self.degenerate_resets
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Current tracks ordered by id
    pub fn snapshots(&self) -> Vec<TrackSnapshot> {
        self.tracks.iter().filter_map(Track::snapshot).collect()
    }

    /// Advance every track by one frame using this frame's targets
    pub fn step(&mut self, targets: &[PhysicalTarget]) -> RadarResult<Vec<TrackSnapshot>> {
        let measurements: Vec<(f64, f64)> = targets
            .iter()
            .map(target_measurement)
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect();
        if measurements.len() != targets.len() {
            debug!(
                skipped = targets.len() - measurements.len(),
                "Ignoring targets with non-finite position"
            );
        }

        let mut predicted = Vec::with_capacity(self.tracks.len());
        for track in &mut self.tracks {
            predicted.push(track.tracker.predict()?);
        }

        // Greedy global nearest neighbour inside the gate
        let gate = self.association.gate_distance_m;
        let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
        for (t, &(px, py)) in predicted.iter().enumerate() {
            for (m, &(mx, my)) in measurements.iter().enumerate() {
                let distance = (mx - px).hypot(my - py);
                if distance <= gate {
                    pairs.push((distance, t, m));
                }
            }
        }
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut track_assignment: Vec<Option<usize>> = vec![None; self.tracks.len()];
        let mut measurement_used = vec![false; measurements.len()];
        for (_, t, m) in pairs {
            if track_assignment[t].is_none() && !measurement_used[m] {
                track_assignment[t] = Some(m);
                measurement_used[m] = true;
            }
        }

        for (track, assignment) in self.tracks.iter_mut().zip(&track_assignment) {
            track.age_frames += 1;
            let Some(m) = *assignment else {
                track.missed_frames += 1;
                continue;
            };

            track.missed_frames = 0;
            let (mx, my) = measurements[m];
            match track.tracker.update((mx, my)) {
                Ok(_) => {}
                Err(err) if err.is_track_local() => {
                    warn!(track_id = track.id, error = %err, "Track update degenerate; re-initialising at measurement");
                    track.tracker.init_state(mx, my)?;
                    self.degenerate_resets += 1;
                }
                Err(err) => return Err(err),
            }
        }

        let max_missed = self.association.max_missed_frames;
        self.tracks.retain(|track| {
            let keep = track.missed_frames <= max_missed;
            if !keep {
                debug!(track_id = track.id, "Track dropped after missed frames");
            }
            keep
        });

        for (m, &(mx, my)) in measurements.iter().enumerate() {
            if measurement_used[m] {
                continue;
            }
            if self.tracks.len() >= self.association.max_tracks {
                debug!(max_tracks = self.association.max_tracks, "Track limit reached; target not tracked");
                break;
            }
            let mut tracker = PositionTracker::new(self.tracker_config.clone())?;
            tracker.init_state(mx, my)?;
            trace!(track_id = self.next_id, x = mx, "Track created");
            self.tracks.push(Track {
                id: self.next_id,
                tracker,
                age_frames: 1,
                missed_frames: 0,
            });
            self.next_id += 1;
        }

        Ok(self.snapshots())
    }
}
