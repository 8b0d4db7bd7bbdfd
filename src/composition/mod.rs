//! # Composition Service
//!
//! The composition service validates a request, fills in whatever timing and
//! motion the caller left out, and hands the prepared request to a
//! [`Composer`](crate::video::Composer) for rendering.

pub mod motion;
pub mod service;
pub mod timing;

// Re-exports for convenience
pub use motion::{MotionSource, RandomMotion};
pub use service::CompositionService;
pub use timing::{distribute_timing, estimate_total_duration};
