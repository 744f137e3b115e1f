// src/tracking/kalman.rs
//! Constant-velocity Kalman filter for a single target
//!
//! State `[x, y, vx, vy]`, position-only measurements. The tracker is
//! uninitialised until [`PositionTracker::init_state`]; every cycle is then
//! `predict()` followed by `update(measurement)`.

use crate::config::processing_config::TrackerConfig;
use crate::error::{ProcessingStage, RadarErrorBuilder, RadarResult};
use nalgebra::{Matrix2, Matrix2x4, Matrix4, Vector2, Vector4};

/// Filter state and its error covariance
#[derive(Debug, Clone, PartialEq)]
pub struct TrackState {
    state: Vector4<f64>,
    covariance: Matrix4<f64>,
}

impl TrackState {
    pub fn position(&self) -> (f64, f64) {
        (self.state[0], self.state[1])
    }

    pub fn velocity(&self) -> (f64, f64) {
        (self.state[2], self.state[3])
    }

    pub fn state_vector(&self) -> &Vector4<f64> {
        &self.state
    }

    pub fn covariance(&self) -> &Matrix4<f64> {
        &self.covariance
    }
}

#[derive(Debug, Clone)]
pub struct PositionTracker {
    config: TrackerConfig,
    transition: Matrix4<f64>,
    observation: Matrix2x4<f64>,
    process_noise: Matrix4<f64>,
    measurement_noise: Matrix2<f64>,
    state: Option<TrackState>,
}

impl PositionTracker {
    pub fn new(config: TrackerConfig) -> RadarResult<Self> {
        config
            .validate()
            .map_err(|e| RadarErrorBuilder::new("position_tracker", "new").configuration(&e.to_string()))?;

        let dt = config.dt;
        #[rustfmt::skip]
        let transition = Matrix4::new(
            1.0, 0.0, dt,  0.0,
            0.0, 1.0, 0.0, dt,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        #[rustfmt::skip]
        let observation = Matrix2x4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
        );

        Ok(Self {
            transition,
            observation,
            process_noise: Matrix4::identity() * config.process_noise,
            measurement_noise: Matrix2::identity() * config.measurement_noise,
            config,
            state: None,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&TrackState> {
        self.state.as_ref()
    }

    /// Start tracking at `(x, y)` with zero velocity and the configured prior covariance
    pub fn init_state(&mut self, x: f64, y: f64) -> RadarResult<()> {
        let covariance = Matrix4::identity() * self.config.initial_covariance;
        self.init_state_with_covariance(x, y, covariance)
    }

    pub fn init_state_with_covariance(
        &mut self,
        x: f64,
        y: f64,
        covariance: Matrix4<f64>,
    ) -> RadarResult<()> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(RadarErrorBuilder::new("position_tracker", "init_state")
                .invalid_data("position", &format!("non-finite initial position ({}, {})", x, y)));
        }
        if covariance.iter().any(|v| !v.is_finite()) {
            return Err(RadarErrorBuilder::new("position_tracker", "init_state")
                .invalid_data("covariance", "initial covariance contains non-finite entries"));
        }

        self.state = Some(TrackState {
            state: Vector4::new(x, y, 0.0, 0.0),
            covariance,
        });
        Ok(())
    }

    /// Return to the uninitialised state
    pub fn reset(&mut self) {
        self.state = None;
    }

    /// Propagate one time step; returns the predicted position
    pub fn predict(&mut self) -> RadarResult<(f64, f64)> {
        let track = self.state.as_mut().ok_or_else(|| {
            RadarErrorBuilder::new("position_tracker", "predict").invalid_state("predict called before init_state")
        })?;

        track.state = self.transition * track.state;
        track.covariance =
            self.transition * track.covariance * self.transition.transpose() + self.process_noise;

        Ok(track.position())
    }

    /// Correct with a position measurement; returns the corrected position.
    ///
    /// A singular innovation covariance leaves the filter uninitialised and
    /// returns `DegenerateNumerics`; the owner must call `init_state` again.
    pub fn update(&mut self, measurement: (f64, f64)) -> RadarResult<(f64, f64)> {
        let (mx, my) = measurement;
        if !(mx.is_finite() && my.is_finite()) {
            return Err(RadarErrorBuilder::new("position_tracker", "update")
                .invalid_data("measurement", &format!("non-finite measurement ({}, {})", mx, my)));
        }

        let (prior_state, prior_cov) = match &self.state {
            Some(track) => (track.state, track.covariance),
            None => {
                return Err(RadarErrorBuilder::new("position_tracker", "update")
                    .invalid_state("update called before init_state"))
            }
        };

        let z = Vector2::new(mx, my);
        let innovation = z - self.observation * prior_state;
        let innovation_cov =
            self.observation * prior_cov * self.observation.transpose() + self.measurement_noise;

        let innovation_cov_inv = match innovation_cov.try_inverse() {
            Some(inv) if inv.iter().all(|v| v.is_finite()) => inv,
            _ => {
                self.state = None;
                return Err(RadarErrorBuilder::new("position_tracker", "update").degenerate(
                    ProcessingStage::Tracking,
                    &format!("singular innovation covariance {:?}", innovation_cov.as_slice()),
                ));
            }
        };

        let gain = prior_cov * self.observation.transpose() * innovation_cov_inv;
        let state = prior_state + gain * innovation;
        let covariance = (Matrix4::identity() - gain * self.observation) * prior_cov;

        let track = TrackState { state, covariance };
        let position = track.position();
        self.state = Some(track);
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RadarError;

    fn tracker() -> PositionTracker {
        PositionTracker::new(TrackerConfig::default()).unwrap()
    }

    #[test]
    fn test_uninitialized_calls_fail() {
        let mut t = tracker();
        assert!(!t.is_initialized());
        assert!(matches!(t.predict(), Err(RadarError::InvalidState { .. })));
        assert!(matches!(t.update((1.0, 1.0)), Err(RadarError::InvalidState { .. })));
    }

    #[test]
    fn test_init_state() {
        let mut t = tracker();
        t.init_state(3.0, -1.0).unwrap();
        let state = t.state().unwrap();
        assert_eq!(state.position(), (3.0, -1.0));
        assert_eq!(state.velocity(), (0.0, 0.0));
        assert_eq!(*state.covariance(), Matrix4::identity());
    }

    #[test]
    fn test_predict_propagates_constant_velocity() {
        let mut t = tracker();
        t.init_state(0.0, 0.0).unwrap();
        t.state.as_mut().unwrap().state[2] = 2.0;
        let (x, y) = t.predict().unwrap();
        assert!((x - 0.2).abs() < 1e-12);
        assert_eq!(y, 0.0);

        // P' = F·I·Fᵀ + Q: position variance grows by dt² + q
        let p = t.state().unwrap().covariance();
        assert!((p[(0, 0)] - (1.0 + 0.01 + 0.1)).abs() < 1e-12);
        assert!((p[(0, 2)] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_update_moves_toward_measurement() {
        let mut t = tracker();
        t.init_state(0.0, 0.0).unwrap();
        t.predict().unwrap();
        let (x, y) = t.update((1.0, 2.0)).unwrap();
        assert!(x > 0.0 && x < 1.0);
        assert!(y > 0.0 && y < 2.0);
        // Posterior position variance shrinks below the prior
        let p = t.state().unwrap().covariance();
        assert!(p[(0, 0)] < 1.11);
    }

    #[test]
    fn test_singular_innovation_resets_tracker() {
        let config = TrackerConfig {
            process_noise: 0.0,
            measurement_noise: 0.0,
            ..TrackerConfig::default()
        };
        let mut t = PositionTracker::new(config).unwrap();
        t.init_state_with_covariance(1.0, 1.0, Matrix4::zeros()).unwrap();
        t.predict().unwrap();

        let err = t.update((1.5, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            RadarError::DegenerateNumerics {
                stage: ProcessingStage::Tracking,
                ..
            }
        ));
        assert!(err.is_track_local());
        assert!(!t.is_initialized());
        assert!(matches!(t.predict(), Err(RadarError::InvalidState { .. })));

        t.init_state(1.5, 1.0).unwrap();
        assert!(t.is_initialized());
    }

    #[test]
    fn test_non_finite_inputs_rejected() {
        let mut t = tracker();
        assert!(matches!(t.init_state(f64::NAN, 0.0), Err(RadarError::InvalidData { .. })));
        t.init_state(0.0, 0.0).unwrap();
        t.predict().unwrap();
        assert!(matches!(
            t.update((f64::INFINITY, 0.0)),
            Err(RadarError::InvalidData { .. })
        ));
        // A rejected measurement leaves the filter usable
        assert!(t.update((0.1, 0.0)).is_ok());
    }
}
