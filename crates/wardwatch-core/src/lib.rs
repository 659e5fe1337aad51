//! # wardwatch-core
//!
//! Core types, traits, and abstractions for the wardwatch monitoring library.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the monitoring components depend on: the domain model (geofences,
//! location samples, notification records, reminder tasks), the capability
//! traits for external stores and platform providers, great-circle geometry,
//! and the monitor event bus.

pub mod defaults;
pub mod error;
pub mod events;
pub mod geo;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use events::{MonitorEvent, MonitorEventBus};
pub use geo::{great_circle_distance_m, is_outside_all};
pub use models::*;
pub use traits::*;
