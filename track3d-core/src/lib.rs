//! # Track3d Core
//!
//! This library provides the common types used to reconstruct the 3d path of a subject that was
//! observed by two unsynchronized video cameras. All the crates in the `track3d` workspace depend
//! on it. This includes screen coordinates, tracks, synchronized windows, camera parameters,
//! rays, match results, the shared error type and the records used to persist all of them.
//!
//! The crate deliberately contains no algorithms beyond bookkeeping. The projection model lives
//! in `track3d-geom`, calibration in `track3d-optimize` and track association in
//! `track3d-associate`.
//!
//! ## Reconstruction
//!
//! Each camera produces a [`Track`] per tracked subject: a dense array of [`ScreenCoordinate`]
//! indexed by absolute frame, together with the span of frames where the detections are valid.
//! Given orientation parameters for a camera ([`CameraParams`]) and its fixed configuration
//! ([`CameraConfig`]), every screen coordinate becomes a [`Ray`] leaving the camera position.
//! When both cameras see the same subject on the same frame, the two rays pass close to each
//! other, and the point of closest approach is the reconstructed position.
//!
//! - `S` the subject we are trying to reconstruct
//! - `C1` and `C2` the fixed camera positions
//! - `@` the reference plane at height `z0`
//!
//! ```text
//!     C1                                C2
//!       \                             /
//!        \                          /
//!         \                       /
//!          \                    /
//!           \                 /
//!            \      S       /
//!             \           /
//!   @@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@@
//! ```
//!
//! During calibration the rays are instead intersected with the reference plane, which is cheap
//! and well behaved far away from the solution.

mod camera;
mod coordinate;
mod error;
mod matches;
#[cfg(feature = "serde-serialize")]
mod record;
mod summary;
mod sync;
mod track;
mod triangulation;

pub use camera::*;
pub use coordinate::*;
pub use error::*;
pub use matches::*;
pub use nalgebra;
#[cfg(feature = "serde-serialize")]
pub use record::*;
pub use summary::*;
pub use sync::*;
pub use track::*;
pub use triangulation::*;
