// src/processing/pipeline.rs
//! Per-frame composition of the four processing stages
//!
//! Spectral → CFAR → clustering → tracking, strictly in that order. The
//! caller owns the [`PipelineState`]; it is only written once a frame has
//! passed every stage, so a rejected frame leaves it untouched apart from
//! the rejection counter.

use crate::config::processing_config::PipelineConfig;
use crate::config::{RadarConfig, SystemConfig};
use crate::error::{RadarErrorBuilder, RadarResult};
use crate::processing::cfar::{CfarDetector, Detection};
use crate::processing::clustering::{Cluster, DetectionClusterer, PhysicalTarget};
use crate::processing::spectral::{RangeDopplerMap, RawFrame, SpectralProcessor};
use crate::tracking::manager::{TrackManager, TrackSnapshot};
use crate::utils::time::{current_timestamp_nanos, MonotonicTimeProvider, TimeProvider};
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Session counters carried inside [`PipelineState`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStatistics {
    pub frames_processed: u64,
    pub frames_rejected: u64,
    pub total_detections: u64,
    pub total_targets: u64,
    pub started_at_nanos: u64,
}

/// Latest processed view of the scene, owned by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    /// Sequence number of the latest accepted frame (0 before the first)
    pub frame_index: u64,
    pub timestamp_nanos: u64,
    /// CFAR detections in the latest frame
    pub detections: usize,
    pub targets: Vec<PhysicalTarget>,
    pub tracks: Vec<TrackSnapshot>,
    pub statistics: PipelineStatistics,
}

impl PipelineState {
    pub fn new(started_at_nanos: u64) -> Self {
        Self {
            statistics: PipelineStatistics {
                started_at_nanos,
                ..PipelineStatistics::default()
            },
            ..Self::default()
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Everything one frame produced
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub map: RangeDopplerMap,
    pub detections: Vec<Detection>,
    pub clusters: Vec<Cluster>,
    pub targets: Vec<PhysicalTarget>,
    pub tracks: Vec<TrackSnapshot>,
    pub processing_time_us: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceMetrics {
    pub total_frames_processed: u64,
    pub average_processing_time_us: f64,
    pub max_processing_time_us: f64,
    pub latency_violations: u64,
}

/// Real-time frame processing pipeline
pub struct FramePipeline {
    radar: RadarConfig,
    config: PipelineConfig,
    spectral: SpectralProcessor,
    cfar: CfarDetector,
    clusterer: DetectionClusterer,
    tracks: TrackManager,
    time_provider: Arc<dyn TimeProvider>,
    performance_metrics: PerformanceMetrics,
    subscribers: Vec<Sender<PipelineState>>,
}

impl FramePipeline {
    pub fn new(config: SystemConfig) -> RadarResult<Self> {
        Self::with_time_provider(config, Arc::new(MonotonicTimeProvider::new()))
    }

    /// Pipeline whose latency bookkeeping reads `time_provider`
    pub fn with_time_provider(config: SystemConfig, time_provider: Arc<dyn TimeProvider>) -> RadarResult<Self> {
        config.validate().map_err(|errors| {
            let reasons: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            RadarErrorBuilder::new("frame_pipeline", "new").configuration(&reasons.join("; "))
        })?;

        for warning in config.consistency_warnings() {
            warn!("{}", warning);
        }

        let radar = config.radar_config()?;
        let spectral = SpectralProcessor::with_config(&radar, &config.spectral);
        let cfar = CfarDetector::new(config.cfar.clone())?;
        let clusterer = DetectionClusterer::new(config.clustering.clone())?;
        let tracks = TrackManager::new(config.tracking.clone(), config.association.clone())?;

        info!(
            frame_shape = ?radar.frame_shape(),
            window = ?spectral.window_type(),
            cfar_margin = cfar.margin(),
            tracking = config.pipeline.enable_tracking,
            "Frame pipeline ready"
        );

        Ok(Self {
            radar,
            config: config.pipeline,
            spectral,
            cfar,
            clusterer,
            tracks,
            time_provider,
            performance_metrics: PerformanceMetrics::default(),
            subscribers: Vec::new(),
        })
    }

    /// Fresh state stamped with the current wall-clock time
    pub fn new_state(&self) -> PipelineState {
        PipelineState::new(current_timestamp_nanos())
    }

    pub fn radar_config(&self) -> &RadarConfig {
        &self.radar
    }

    pub fn track_manager(&self) -> &TrackManager {
        &self.tracks
    }

    /// Run one frame through every stage and fold the result into `state`
    pub fn process_frame(&mut self, frame: &RawFrame, state: &mut PipelineState) -> RadarResult<FrameOutput> {
        let start_time = self.time_provider.now_nanos();

        let (map, detections, clusters, targets, tracks) = match self.run_stages(frame) {
            Ok(stages) => stages,
            Err(err) => {
                state.statistics.frames_rejected += 1;
                debug!(error = %err, rejected = state.statistics.frames_rejected, "Frame rejected");
                return Err(err);
            }
        };

        let end_time = self.time_provider.now_nanos();
        let processing_time_us = end_time.saturating_sub(start_time) as f64 / 1000.0;
        self.update_performance_metrics(processing_time_us);

        let latency_target_us = self.config.latency_target_ms * 1000.0;
        if processing_time_us > latency_target_us {
            self.performance_metrics.latency_violations += 1;
            debug!(processing_time_us, latency_target_us, "Frame exceeded latency target");
        }

        let stats = &mut state.statistics;
        stats.frames_processed += 1;
        stats.total_detections += detections.len() as u64;
        stats.total_targets += targets.len() as u64;
        state.frame_index = stats.frames_processed;
        state.timestamp_nanos = current_timestamp_nanos();
        state.detections = detections.len();
        state.targets = targets.clone();
        state.tracks = tracks.clone();

        trace!(
            frame = state.frame_index,
            detections = detections.len(),
            targets = targets.len(),
            tracks = tracks.len(),
            processing_time_us,
            "Frame processed"
        );

        self.publish(state);

        Ok(FrameOutput {
            map,
            detections,
            clusters,
            targets,
            tracks,
            processing_time_us,
        })
    }

    #[allow(clippy::type_complexity)]
    fn run_stages(
        &mut self,
        frame: &RawFrame,
    ) -> RadarResult<(RangeDopplerMap, Vec<Detection>, Vec<Cluster>, Vec<PhysicalTarget>, Vec<TrackSnapshot>)> {
        let map = self.spectral.process_frame(frame)?;
        let detections = self.cfar.detect(&map);
        let clusters = self.clusterer.cluster(&detections);
        let targets: Vec<PhysicalTarget> = clusters
            .iter()
            .map(|cluster| DetectionClusterer::to_physical(cluster, &self.radar))
            .collect();

        let tracks = if self.config.enable_tracking {
            self.tracks.step(&targets)?
        } else {
            Vec::new()
        };

        Ok((map, detections, clusters, targets, tracks))
    }

    /// Receive a snapshot of [`PipelineState`] after every accepted frame.
    ///
    /// The channel is bounded; a subscriber that falls behind misses updates
    /// rather than stalling the pipeline.
    pub fn subscribe(&mut self) -> Receiver<PipelineState> {
        let (tx, rx) = channel::bounded(self.config.subscriber_capacity);
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn publish(&mut self, state: &PipelineState) {
        self.subscribers.retain(|tx| match tx.try_send(state.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                trace!(frame = state.frame_index, "Subscriber lagging; snapshot dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("Subscriber disconnected");
                false
            }
        });
    }

    /// Get current performance metrics
    pub fn performance_metrics(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    pub fn reset_metrics(&mut self) {
        self.performance_metrics = PerformanceMetrics::default();
    }

    /// Drop every track; counters and subscribers are kept
    pub fn reset_tracks(&mut self) {
        self.tracks.clear();
    }

    fn update_performance_metrics(&mut self, processing_time_us: f64) {
        let metrics = &mut self.performance_metrics;
        metrics.total_frames_processed += 1;

        let n = metrics.total_frames_processed as f64;
        metrics.average_processing_time_us =
            (metrics.average_processing_time_us * (n - 1.0) + processing_time_us) / n;

        if processing_time_us > metrics.max_processing_time_us {
            metrics.max_processing_time_us = processing_time_us;
        }
    }
}
