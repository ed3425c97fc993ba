#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The settings used to pair the tracks of both cameras.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AssociationSettings {
    /// The largest mean triangulation residual, in world units, of an acceptable pair
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_max_loss"))]
    pub max_loss: f64,
    /// The smallest distance, in world units, between the first and the last point of the path
    /// of an acceptable pair. Anything moving less is considered static.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_min_dist"))]
    pub min_dist: f64,
    /// Tracks with a lower detection confidence are never paired
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_min_confidence"))]
    pub min_confidence: f64,
    /// The height of the plane used on frames seen by only one camera.
    ///
    /// When absent, the reference plane of the calibration is used.
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub plane_height: Option<f64>,
}

impl Default for AssociationSettings {
    fn default() -> Self {
        Self {
            max_loss: default_max_loss(),
            min_dist: default_min_dist(),
            min_confidence: default_min_confidence(),
            plane_height: None,
        }
    }
}

impl AssociationSettings {
    #[must_use]
    pub fn max_loss(self, max_loss: f64) -> Self {
        Self { max_loss, ..self }
    }

    #[must_use]
    pub fn min_dist(self, min_dist: f64) -> Self {
        Self { min_dist, ..self }
    }

    #[must_use]
    pub fn min_confidence(self, min_confidence: f64) -> Self {
        Self {
            min_confidence,
            ..self
        }
    }

    #[must_use]
    pub fn plane_height(self, plane_height: f64) -> Self {
        Self {
            plane_height: Some(plane_height),
            ..self
        }
    }
}

fn default_max_loss() -> f64 {
    30.0
}

fn default_min_dist() -> f64 {
    10.0
}

fn default_min_confidence() -> f64 {
    0.0
}
