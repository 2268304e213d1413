//! Renderer-facing state: accumulation, per-frame constants, upload payloads

pub mod accumulation;
pub mod frame;
pub mod upload;

pub use accumulation::{AccumulationController, AccumulationParams, CameraPose};
pub use frame::{FrameSeed, TraceParams, wang_hash};
pub use upload::{GridUpload, OctreeUpload};
