use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A detection on the screen of a camera, expressed as the offset `(p, q)` from the center
/// of the frame.
///
/// `p` is the horizontal offset normalized by the frame width, so it lies roughly in
/// `[-0.5, 0.5]` with positive values to the right. `q` is the vertical offset normalized by
/// the frame height with positive values upwards. Because the height is the shorter side, `q`
/// is divided by the aspect ratio of the camera before it is turned into a direction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ScreenCoordinate(pub Point2<f64>);

impl ScreenCoordinate {
    pub fn new(p: f64, q: f64) -> Self {
        Self(Point2::new(p, q))
    }

    /// The center of the frame.
    pub fn center() -> Self {
        Self::new(0.0, 0.0)
    }

    /// Horizontal offset from the frame center.
    pub fn p(self) -> f64 {
        self.0.x
    }

    /// Vertical offset from the frame center.
    pub fn q(self) -> f64 {
        self.0.y
    }

    /// Both components are finite numbers.
    pub fn is_finite(self) -> bool {
        self.0.coords.iter().all(|n| n.is_finite())
    }
}
