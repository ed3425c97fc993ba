//! This crate contains the projection model and the ray triangulators used by `track3d`.
//!
//! ## Projection
//!
//! Each camera is described by its tilt `theta`, its pan `phi`, its zoom `k`, its aspect ratio
//! `r` and its position `C`. The tilt and pan define an orthonormal basis:
//!
//! - `n` the view direction
//! - `a` the horizontal screen axis
//! - `b` the vertical screen axis
//!
//! A detection at screen coordinate `(p, q)` was observed along the ray leaving `C` in the
//! direction `k * n + p * a + (q / r) * b`.
//!
//! ## Triangulation
//!
//! Two rays are reduced to a point either by intersecting both with a horizontal plane and
//! taking the midpoint ([`PlaneTriangulator`]), or by finding the points of closest approach of
//! the two rays and taking their midpoint ([`ClosestApproachTriangulator`]). The first one
//! assumes the height of the subject, the second one does not but breaks down for nearly
//! parallel rays.
//!
//! - `S` the point we are trying to triangulate
//! - `C1` and `C2` the optical centers
//! - `@` the plane `z = z0`
//!
//! ```text
//!   C1                          C2
//!     \                        /
//!      \                     /
//!       \     S            /
//!        \               /
//!   @@@@@@@x@@@@@@@@@@@x@@@@@@@
//! ```

mod projection;
mod triangulation;

pub use projection::*;
pub use triangulation::*;
