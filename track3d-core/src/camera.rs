use core::f64::consts::FRAC_PI_2;
use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Identifies one of the two cameras of a rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraSlot {
    First,
    Second,
}

impl CameraSlot {
    pub const BOTH: [CameraSlot; 2] = [CameraSlot::First, CameraSlot::Second];
}

/// The direction a camera looks in.
///
/// `theta` is the tilt above the horizon (negative looks down) and `phi` the pan measured
/// counter-clockwise from the world X axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub theta: f64,
    pub phi: f64,
}

impl Orientation {
    pub fn new(theta: f64, phi: f64) -> Self {
        Self { theta, phi }
    }
}

/// The fixed, never optimized, configuration of one camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    /// Zoom or focal scale. Larger values narrow the field of view.
    pub k: f64,
    /// Aspect ratio (width over height) of the frame.
    pub r: f64,
    /// Position of the optical center in world space.
    pub position: Point3<f64>,
}

impl CameraConfig {
    pub fn new(k: f64, r: f64, position: Point3<f64>) -> Self {
        Self { k, r, position }
    }
}

/// The fixed configuration of both cameras.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigConfig {
    pub first: CameraConfig,
    pub second: CameraConfig,
}

impl RigConfig {
    pub fn new(first: CameraConfig, second: CameraConfig) -> Self {
        Self { first, second }
    }

    pub fn camera(&self, slot: CameraSlot) -> CameraConfig {
        match slot {
            CameraSlot::First => self.first,
            CameraSlot::Second => self.second,
        }
    }
}

/// The orientation parameters of both cameras.
///
/// Only three values are searched numerically: the tilts `theta1` and `theta2` and the shared
/// heading `phi` of the reference track in world space. The camera pans `phi1` and `phi2` are
/// derived from those analytically, by rotating each camera until the track it observed heads
/// in the direction `phi`.
///
/// This is a plain value. Calibration produces new values instead of mutating shared state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraParams {
    pub theta1: f64,
    pub theta2: f64,
    pub phi: f64,
    pub phi1: f64,
    pub phi2: f64,
}

impl CameraParams {
    /// The number of independently searched parameters.
    pub const SEARCHED: usize = 3;

    pub fn new(theta1: f64, theta2: f64, phi: f64, phi1: f64, phi2: f64) -> Self {
        Self {
            theta1,
            theta2,
            phi,
            phi1,
            phi2,
        }
    }

    /// The orientation used to cast rays for the camera in `slot`.
    pub fn orientation(&self, slot: CameraSlot) -> Orientation {
        match slot {
            CameraSlot::First => Orientation::new(self.theta1, self.phi1),
            CameraSlot::Second => Orientation::new(self.theta2, self.phi2),
        }
    }

    /// The searched parameters `(theta1, theta2, phi)`.
    pub fn searched(&self) -> Vector3<f64> {
        Vector3::new(self.theta1, self.theta2, self.phi)
    }

    /// Replaces the searched parameters `(theta1, theta2, phi)`.
    #[must_use]
    pub fn with_searched(self, searched: Vector3<f64>) -> Self {
        Self {
            theta1: searched.x,
            theta2: searched.y,
            phi: searched.z,
            ..self
        }
    }

    /// The pan of the camera in `slot`.
    pub fn pan(&self, slot: CameraSlot) -> f64 {
        match slot {
            CameraSlot::First => self.phi1,
            CameraSlot::Second => self.phi2,
        }
    }

    /// Replaces the pan of the camera in `slot`.
    #[must_use]
    pub fn with_pan(self, slot: CameraSlot, pan: f64) -> Self {
        match slot {
            CameraSlot::First => Self { phi1: pan, ..self },
            CameraSlot::Second => Self { phi2: pan, ..self },
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.theta1, self.theta2, self.phi, self.phi1, self.phi2]
            .iter()
            .all(|n| n.is_finite())
    }
}

impl Default for CameraParams {
    /// Both cameras looking straight down with no pan.
    fn default() -> Self {
        Self::new(-FRAC_PI_2, -FRAC_PI_2, -FRAC_PI_2, 0.0, 0.0)
    }
}

/// Orientation parameters together with the fixed configuration of both cameras.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSystem {
    pub params: CameraParams,
    pub config: RigConfig,
}

impl CameraSystem {
    /// Creates a system with default parameters.
    pub fn new(config: RigConfig) -> Self {
        Self {
            params: CameraParams::default(),
            config,
        }
    }

    #[must_use]
    pub fn with_params(self, params: CameraParams) -> Self {
        Self { params, ..self }
    }

    pub fn orientation(&self, slot: CameraSlot) -> Orientation {
        self.params.orientation(slot)
    }

    pub fn camera(&self, slot: CameraSlot) -> CameraConfig {
        self.config.camera(slot)
    }
}

/// The settings of the calibration loop.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CalibrationSettings {
    /// The step used for the symmetric finite differences
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_dp"))]
    pub dp: f64,
    /// The initial learning rate, which decays towards `mu * e^-4` over the run
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_mu"))]
    pub mu: f64,
    /// The height of the reference plane the subject moves on
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_z0"))]
    pub z0: f64,
    /// The number of iterations to run
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_ntrials"))]
    pub ntrials: usize,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            dp: default_dp(),
            mu: default_mu(),
            z0: default_z0(),
            ntrials: default_ntrials(),
        }
    }
}

impl CalibrationSettings {
    #[must_use]
    pub fn dp(self, dp: f64) -> Self {
        Self { dp, ..self }
    }

    #[must_use]
    pub fn mu(self, mu: f64) -> Self {
        Self { mu, ..self }
    }

    #[must_use]
    pub fn z0(self, z0: f64) -> Self {
        Self { z0, ..self }
    }

    #[must_use]
    pub fn ntrials(self, ntrials: usize) -> Self {
        Self { ntrials, ..self }
    }

    /// The learning rate on `iteration`: `mu * exp(-4 * iteration / ntrials)`.
    pub fn learning_rate(&self, iteration: usize) -> f64 {
        self.mu * (-4.0 * iteration as f64 / self.ntrials.max(1) as f64).exp()
    }
}

fn default_dp() -> f64 {
    1e-4
}

fn default_mu() -> f64 {
    0.01
}

fn default_z0() -> f64 {
    0.0
}

fn default_ntrials() -> usize {
    5000
}
