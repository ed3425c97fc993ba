use serde::{Deserialize, Serialize};
use track3d::{associate::AssociationSettings, CalibrationSettings};

/// The settings of a sandbox run.
#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize)]
pub struct SandboxSettings {
    /// The settings used to calibrate the cameras.
    #[serde(default)]
    pub calibration: CalibrationSettings,
    /// The settings used to pair the tracks.
    #[serde(default)]
    pub association: AssociationSettings,
}
