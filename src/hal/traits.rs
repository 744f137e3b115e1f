// src/hal/traits.rs
//! Acquisition collaborator interface

use crate::config::RadarConfig;
use crate::processing::spectral::RawFrame;
use async_trait::async_trait;
use std::error::Error;

/// Anything that delivers raw FMCW frames: an SDR driver, a recording, a simulator
#[async_trait]
pub trait FrameSource: Send {
    type Error: Error + Send + Sync + 'static;

    /// Begin acquisition
    async fn start(&mut self) -> Result<(), Self::Error>;

    /// Stop acquisition; `next_frame` fails until `start` is called again
    async fn stop(&mut self) -> Result<(), Self::Error>;

    /// Next complete frame, shaped `(num_chirps, num_samples)` for [`radar_config`](Self::radar_config)
    async fn next_frame(&mut self) -> Result<RawFrame, Self::Error>;

    /// Session parameters the frames are acquired with
    fn radar_config(&self) -> &RadarConfig;

    fn is_running(&self) -> bool;
}
