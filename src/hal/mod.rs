// src/hal/mod.rs
//! Frame sources: the acquisition interface and a synthetic scene simulator

pub mod simulator;
pub mod traits;

pub use simulator::{SceneSimulator, SimulatedTarget, SimulatorConfig, SimulatorError};
pub use traits::FrameSource;
