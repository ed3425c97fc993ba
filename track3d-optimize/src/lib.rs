//! Calibration of the orientation of both cameras of a rig.
//!
//! The cameras are calibrated from a single reference pair of tracks known to belong to the same
//! subject, which must be moving on the reference plane `z = z0`. The loss is the disagreement
//! between the plane projections of both cameras, summed over the synchronized window, and it is
//! minimized by a normalized gradient descent with an exponentially decaying learning rate.
//!
//! Only the tilts and the shared heading of the reference track are searched numerically. The
//! pans are derived from them by rotating each camera until the reference track it sees heads
//! in the shared direction, see [`PlaneConstraint::anchor`].

mod calibrate;
mod plane_constraint;

pub use calibrate::*;
pub use plane_constraint::*;
