//! Wildfire situational-awareness overlay.
//!
//! Acquires a suppression plan for one incident, normalizes it into a
//! [`DecisionRecord`](fireline_shared::models::DecisionRecord), and keeps a host map
//! surface in sync with deployment markers and a terrain contour highlight.

pub mod acquisition;
pub mod config;
pub mod controller;
pub mod error;
pub mod geocode;
pub mod render;
pub mod store;
pub mod surface;
pub mod terrain;

pub use controller::OverlayController;
pub use error::{OverlayError, Result};
