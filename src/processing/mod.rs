// src/processing/mod.rs
//! Frame processing: Range-Doppler maps, CFAR detection, clustering, and
//! the pipeline that chains them

pub mod cfar;
pub mod clustering;
pub mod pipeline;
pub mod spectral;
pub mod windowing;

pub use cfar::{CfarDetector, Detection};
pub use clustering::{Cluster, DetectionClusterer, PhysicalTarget};
pub use pipeline::{FrameOutput, FramePipeline, PerformanceMetrics, PipelineState, PipelineStatistics};
pub use spectral::{fftshift_index, RangeDopplerMap, RawFrame, SpectralProcessor};
pub use windowing::{generate_window_function, Window};
