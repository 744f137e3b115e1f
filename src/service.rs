// src/service.rs
//! Async acquisition loop
//!
//! Pulls frames from a [`FrameSource`], runs them through a
//! [`FramePipeline`], keeps the latest [`PipelineState`] for polling and
//! broadcasts every accepted update. Frame processing runs on the blocking
//! pool so async workers stay free. Rejected frames are logged and
//! counted; a source failure ends the loop and is returned from
//! [`RadarService::join`].

use crate::error::{IntoRadarError, RadarResult};
use crate::hal::traits::FrameSource;
use crate::processing::pipeline::{FramePipeline, PipelineState, PipelineStatistics};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Handle to a running acquisition task
pub struct RadarService {
    running: Arc<AtomicBool>,
    latest: Arc<RwLock<PipelineState>>,
    updates: broadcast::Sender<PipelineState>,
    handle: JoinHandle<RadarResult<PipelineStatistics>>,
}

impl RadarService {
    /// Start acquisition on the current tokio runtime.
    ///
    /// `state_capacity` bounds the broadcast buffer; slow receivers observe
    /// `RecvError::Lagged` instead of holding the loop back.
    pub fn spawn<S>(source: S, pipeline: FramePipeline, state_capacity: usize) -> Self
    where
        S: FrameSource + 'static,
    {
        let (updates, _) = broadcast::channel(state_capacity.max(1));
        let running = Arc::new(AtomicBool::new(true));
        let latest = Arc::new(RwLock::new(pipeline.new_state()));

        let handle = tokio::spawn(acquisition_loop(
            source,
            pipeline,
            Arc::clone(&running),
            Arc::clone(&latest),
            updates.clone(),
        ));

        Self {
            running,
            latest,
            updates,
            handle,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineState> {
        self.updates.subscribe()
    }

    /// Snapshot of the most recent state
    pub fn latest(&self) -> PipelineState {
        self.latest.read().clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) && !self.handle.is_finished()
    }

    /// Ask the loop to finish its current frame and exit, then wait for it
    pub async fn stop(self) -> RadarResult<PipelineStatistics> {
        self.running.store(false, Ordering::Release);
        self.join().await
    }

    /// Wait for the loop to exit on its own (source failure or `stop`)
    pub async fn join(self) -> RadarResult<PipelineStatistics> {
        self.handle.await.radar_err("radar_service", "join")?
    }
}

async fn acquisition_loop<S>(
    mut source: S,
    mut pipeline: FramePipeline,
    running: Arc<AtomicBool>,
    latest: Arc<RwLock<PipelineState>>,
    updates: broadcast::Sender<PipelineState>,
) -> RadarResult<PipelineStatistics>
where
    S: FrameSource,
{
    source.start().await.radar_err("frame_source", "start")?;
    let mut state = latest.read().clone();
    info!(frame_shape = ?source.radar_config().frame_shape(), "Radar service started");

    let outcome: RadarResult<()> = loop {
        if !running.load(Ordering::Acquire) {
            break Ok(());
        }

        let frame = match source.next_frame().await {
            Ok(frame) => frame,
            Err(err) => {
                error!(error = %err, "Frame source failed; stopping acquisition");
                break Err(err).radar_err("frame_source", "next_frame");
            }
        };

        // FFTs and the CFAR scan are CPU bound; run them on the blocking pool
        let processed = tokio::task::spawn_blocking(move || {
            let result = pipeline.process_frame(&frame, &mut state).map(|_| ());
            (pipeline, state, result)
        })
        .await;
        let result = match processed {
            Ok((returned_pipeline, returned_state, result)) => {
                pipeline = returned_pipeline;
                state = returned_state;
                result
            }
            Err(err) => {
                error!(error = %err, "Frame processing task failed; stopping acquisition");
                break Err(err).radar_err("frame_pipeline", "process_frame");
            }
        };

        match result {
            Ok(()) => {
                *latest.write() = state.clone();
                // No receivers is fine; the latest snapshot is still kept
                let _ = updates.send(state.clone());
            }
            Err(err) if err.is_frame_rejection() => {
                warn!(error = %err, rejected = state.statistics.frames_rejected, "Frame rejected");
                *latest.write() = state.clone();
            }
            Err(err) => {
                error!(error = %err, "Pipeline failed; stopping acquisition");
                *latest.write() = state.clone();
                break Err(err);
            }
        }
    };

    running.store(false, Ordering::Release);
    let stopped = source.stop().await.radar_err("frame_source", "stop");
    let statistics = latest.read().statistics.clone();
    info!(
        frames_processed = statistics.frames_processed,
        frames_rejected = statistics.frames_rejected,
        "Radar service stopped"
    );

    outcome?;
    stopped?;
    Ok(statistics)
}
