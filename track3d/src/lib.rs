//! # `track3d`
//!
//! Batteries-included 3d track reconstruction from two video cameras
//!
//! This crate gathers the `track3d` crates in one place. It is useful to write a quick script
//! or a tutorial. A production application should depend on the individual crates instead.
//!
//! All of the basic types are included in the root of the crate. The algorithms live in modules
//! which come from optional crates.
//!
//! ## Modules
//! * [`geom`] - the camera projection model and ray triangulation
//! * [`optimize`] - calibration of the camera orientations
//! * [`associate`] - pairing the tracks of both cameras and reconstructing their paths
//!
//! ## Pipeline
//!
//! 1. Ingest the tracks of both cameras as [`Track`]s.
//! 2. Calibrate the [`CameraSystem`] on a reference pair known to be the same subject.
//! 3. Associate all tracks with the calibrated system, which yields one [`MatchResult`] per
//!    subject seen by both cameras.

pub use track3d_core::*;

/// Camera projection model and ray triangulation
pub mod geom {
    #[cfg(feature = "track3d-geom")]
    pub use track3d_geom::*;
}

/// Calibration of the camera orientations
pub mod optimize {
    #[cfg(feature = "track3d-optimize")]
    pub use track3d_optimize::*;
}

/// Track association and path triangulation
pub mod associate {
    #[cfg(feature = "track3d-associate")]
    pub use track3d_associate::*;
}
