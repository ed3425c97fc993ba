//! Flat records used to persist tracks, camera systems and reconstructed paths.
//!
//! The domain types keep their invariants private, so they are never serialized directly.
//! Each record converts into its domain type with [`TryFrom`], which rejects wrong shapes and
//! unusable numbers with [`Error::MalformedRecord`] instead of defaulting them.

use crate::{
    CalibrationSettings, CameraConfig, CameraParams, CameraSystem, Error, FrameSpan, MatchResult,
    Result, RigConfig, ScreenCoordinate, Track,
};
use core::convert::TryFrom;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

fn malformed(message: impl Into<String>) -> Error {
    Error::MalformedRecord(message.into())
}

fn finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(malformed(format!("{} is not finite", name)))
    }
}

fn positive(name: &str, value: f64) -> Result<f64> {
    if finite(name, value)? > 0.0 {
        Ok(value)
    } else {
        Err(malformed(format!("{} must be positive, got {}", name, value)))
    }
}

fn position(name: &str, coords: &[f64]) -> Result<Point3<f64>> {
    match *coords {
        [x, y, z] => Ok(Point3::new(
            finite(name, x)?,
            finite(name, y)?,
            finite(name, z)?,
        )),
        _ => Err(malformed(format!(
            "{} must have 3 coordinates, got {}",
            name,
            coords.len()
        ))),
    }
}

fn span(start: usize, end: usize) -> Result<FrameSpan> {
    FrameSpan::new(start, end)
        .ok_or_else(|| malformed(format!("start {} is after end {}", start, end)))
}

/// A detection as `{ "p": .., "q": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenCoordinateRecord {
    pub p: f64,
    pub q: f64,
}

impl From<ScreenCoordinate> for ScreenCoordinateRecord {
    fn from(coordinate: ScreenCoordinate) -> Self {
        Self {
            p: coordinate.p(),
            q: coordinate.q(),
        }
    }
}

impl From<ScreenCoordinateRecord> for ScreenCoordinate {
    fn from(record: ScreenCoordinateRecord) -> Self {
        ScreenCoordinate::new(record.p, record.q)
    }
}

/// A track as produced by the ingestion: dense samples indexed by absolute frame and the span
/// on which they are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    #[serde(alias = "conf")]
    pub confidence: f64,
    pub start: usize,
    pub end: usize,
    pub plots: Vec<ScreenCoordinateRecord>,
}

impl From<&Track> for TrackRecord {
    fn from(track: &Track) -> Self {
        Self {
            confidence: track.confidence(),
            start: track.span().start,
            end: track.span().end,
            plots: track.dense().iter().copied().map(Into::into).collect(),
        }
    }
}

impl TryFrom<TrackRecord> for Track {
    type Error = Error;

    fn try_from(record: TrackRecord) -> Result<Self> {
        let confidence = finite("conf", record.confidence)?;
        let span = span(record.start, record.end)?;
        let plots: Vec<ScreenCoordinate> = record.plots.into_iter().map(Into::into).collect();
        // Padding outside the span is never read, so only valid samples must be usable.
        if let Some(frame) = span
            .frames()
            .find(|&frame| plots.get(frame).map_or(false, |c| !c.is_finite()))
        {
            return Err(malformed(format!("sample on frame {} is not finite", frame)));
        }
        Track::new(confidence, span, plots)
            .map_err(|e| malformed(format!("inconsistent track: {}", e)))
    }
}

/// The fixed configuration of both cameras, `{ k1, k2, r1, r2, c1, c2 }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigConfigRecord {
    pub k1: f64,
    pub k2: f64,
    pub r1: f64,
    pub r2: f64,
    pub c1: Vec<f64>,
    pub c2: Vec<f64>,
}

impl From<&RigConfig> for RigConfigRecord {
    fn from(config: &RigConfig) -> Self {
        Self {
            k1: config.first.k,
            k2: config.second.k,
            r1: config.first.r,
            r2: config.second.r,
            c1: config.first.position.coords.iter().copied().collect(),
            c2: config.second.position.coords.iter().copied().collect(),
        }
    }
}

impl TryFrom<RigConfigRecord> for RigConfig {
    type Error = Error;

    fn try_from(record: RigConfigRecord) -> Result<Self> {
        Ok(RigConfig::new(
            CameraConfig::new(
                positive("k1", record.k1)?,
                positive("r1", record.r1)?,
                position("c1", &record.c1)?,
            ),
            CameraConfig::new(
                positive("k2", record.k2)?,
                positive("r2", record.r2)?,
                position("c2", &record.c2)?,
            ),
        ))
    }
}

/// The calibration settings stored with a camera system.
///
/// Unlike [`CalibrationSettings`], which falls back to defaults for missing keys, every field
/// is required here: stored settings describe a run that already happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationSettingsRecord {
    pub dp: f64,
    pub mu: f64,
    pub z0: f64,
    pub ntrials: usize,
}

impl From<&CalibrationSettings> for CalibrationSettingsRecord {
    fn from(settings: &CalibrationSettings) -> Self {
        Self {
            dp: settings.dp,
            mu: settings.mu,
            z0: settings.z0,
            ntrials: settings.ntrials,
        }
    }
}

impl TryFrom<CalibrationSettingsRecord> for CalibrationSettings {
    type Error = Error;

    fn try_from(record: CalibrationSettingsRecord) -> Result<Self> {
        Ok(CalibrationSettings::default()
            .dp(positive("dp", record.dp)?)
            .mu(positive("mu", record.mu)?)
            .z0(finite("z0", record.z0)?)
            .ntrials(record.ntrials))
    }
}

/// A calibrated camera system together with the settings that produced it.
///
/// ```
/// use track3d_core::{CameraSystem, CameraSystemRecord, CameraConfig, RigConfig};
/// use track3d_core::nalgebra::Point3;
/// use std::convert::TryFrom;
///
/// let camera = CameraConfig::new(1.0, 16.0 / 9.0, Point3::new(0.0, 0.0, 6.0));
/// let system = CameraSystem::new(RigConfig::new(camera, camera));
/// let record = CameraSystemRecord::new(&system, None);
/// assert_eq!(CameraSystem::try_from(record).unwrap(), system);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraSystemRecord {
    pub theta1: f64,
    pub theta2: f64,
    pub phi: f64,
    pub phi1: f64,
    pub phi2: f64,
    pub k1: f64,
    pub k2: f64,
    pub r1: f64,
    pub r2: f64,
    pub c1: Vec<f64>,
    pub c2: Vec<f64>,
    #[serde(default, alias = "tconfig", skip_serializing_if = "Option::is_none")]
    pub settings: Option<CalibrationSettingsRecord>,
}

impl CameraSystemRecord {
    pub fn new(system: &CameraSystem, settings: Option<CalibrationSettings>) -> Self {
        let params = system.params;
        let config = RigConfigRecord::from(&system.config);
        Self {
            theta1: params.theta1,
            theta2: params.theta2,
            phi: params.phi,
            phi1: params.phi1,
            phi2: params.phi2,
            k1: config.k1,
            k2: config.k2,
            r1: config.r1,
            r2: config.r2,
            c1: config.c1,
            c2: config.c2,
            settings: settings.as_ref().map(CalibrationSettingsRecord::from),
        }
    }

    /// Validates the record and splits it into the system and the settings stored with it.
    pub fn into_parts(self) -> Result<(CameraSystem, Option<CalibrationSettings>)> {
        let params = CameraParams::new(
            finite("theta1", self.theta1)?,
            finite("theta2", self.theta2)?,
            finite("phi", self.phi)?,
            finite("phi1", self.phi1)?,
            finite("phi2", self.phi2)?,
        );
        let config = RigConfig::try_from(RigConfigRecord {
            k1: self.k1,
            k2: self.k2,
            r1: self.r1,
            r2: self.r2,
            c1: self.c1,
            c2: self.c2,
        })?;
        let settings = self
            .settings
            .map(CalibrationSettings::try_from)
            .transpose()?;
        Ok((CameraSystem::new(config).with_params(params), settings))
    }
}

impl From<&CameraSystem> for CameraSystemRecord {
    fn from(system: &CameraSystem) -> Self {
        Self::new(system, None)
    }
}

impl TryFrom<CameraSystemRecord> for CameraSystem {
    type Error = Error;

    fn try_from(record: CameraSystemRecord) -> Result<Self> {
        record.into_parts().map(|(system, _)| system)
    }
}

/// A reconstructed path, `{ i, j, loss, start, end, size, points }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub i: usize,
    pub j: usize,
    pub loss: f64,
    pub start: usize,
    pub end: usize,
    pub size: usize,
    #[serde(alias = "plots")]
    pub points: Vec<[f64; 3]>,
}

impl From<&MatchResult> for MatchRecord {
    fn from(result: &MatchResult) -> Self {
        Self {
            i: result.i,
            j: result.j,
            loss: result.loss,
            start: result.span.start,
            end: result.span.end,
            size: result.size(),
            points: result.points.iter().map(|p| [p.x, p.y, p.z]).collect(),
        }
    }
}

impl TryFrom<MatchRecord> for MatchResult {
    type Error = Error;

    fn try_from(record: MatchRecord) -> Result<Self> {
        let loss = finite("loss", record.loss)?;
        if loss < 0.0 {
            return Err(malformed(format!("loss must not be negative, got {}", loss)));
        }
        let span = span(record.start, record.end)?;
        if record.size != record.points.len() || record.size != span.len() {
            return Err(malformed(format!(
                "size {} does not match {} points over {}",
                record.size,
                record.points.len(),
                span
            )));
        }
        let points = record
            .points
            .iter()
            .map(|coords| position("point", coords))
            .collect::<Result<Vec<_>>>()?;
        Ok(MatchResult {
            i: record.i,
            j: record.j,
            loss,
            span,
            points,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn system() -> CameraSystem {
        let config = RigConfig::new(
            CameraConfig::new(1.0, 16.0 / 9.0, Point3::new(0.0, 0.0, 6.0)),
            CameraConfig::new(1.3, 4.0 / 3.0, Point3::new(25.0, 5.0, 8.0)),
        );
        let params = CameraParams::new(
            -0.243_360_732_116_512_3,
            -0.339_219_054_613_117_7,
            0.982_793_723_247_329_1,
            1.144_168_833_339_691_3,
            0.1 + 0.2,
        );
        CameraSystem::new(config).with_params(params)
    }

    #[test]
    fn camera_system_round_trips_exactly() {
        let system = system();
        let settings = CalibrationSettings::default().ntrials(400);
        let json = serde_json::to_string(&CameraSystemRecord::new(&system, Some(settings))).unwrap();
        let record: CameraSystemRecord = serde_json::from_str(&json).unwrap();
        let (restored, restored_settings) = record.into_parts().unwrap();
        assert_eq!(restored, system);
        assert_eq!(restored_settings, Some(settings));
    }

    #[test]
    fn camera_system_settings_are_optional() {
        let json = r#"{
            "theta1": -0.2, "theta2": -0.3, "phi": 1.0, "phi1": 1.1, "phi2": 2.3,
            "k1": 1.0, "k2": 1.0, "r1": 1.5, "r2": 1.5,
            "c1": [0.0, 0.0, 6.0], "c2": [25.0, 5.0, 8.0]
        }"#;
        let record: CameraSystemRecord = serde_json::from_str(json).unwrap();
        let (system, settings) = record.into_parts().unwrap();
        assert_eq!(settings, None);
        assert_eq!(system.params.phi2, 2.3);
        assert_eq!(system.config.second.position, Point3::new(25.0, 5.0, 8.0));
    }

    #[test]
    fn camera_system_rejects_missing_fields() {
        let json = r#"{ "theta1": -0.2, "theta2": -0.3, "phi": 1.0 }"#;
        assert!(serde_json::from_str::<CameraSystemRecord>(json).is_err());
    }

    #[test]
    fn camera_system_settings_never_default() {
        let system = r#""theta1": -0.2, "theta2": -0.3, "phi": 1.0, "phi1": 1.1, "phi2": 2.3,
            "k1": 1.0, "k2": 1.0, "r1": 1.5, "r2": 1.5,
            "c1": [0.0, 0.0, 6.0], "c2": [25.0, 5.0, 8.0]"#;
        let empty = format!(r#"{{ {}, "settings": {{}} }}"#, system);
        assert!(serde_json::from_str::<CameraSystemRecord>(&empty).is_err());
        let partial = format!(r#"{{ {}, "tconfig": {{ "ntrials": 10 }} }}"#, system);
        assert!(serde_json::from_str::<CameraSystemRecord>(&partial).is_err());

        let complete = format!(
            r#"{{ {}, "tconfig": {{ "dp": 0.001, "mu": 0.02, "z0": 0.5, "ntrials": 10 }} }}"#,
            system
        );
        let record: CameraSystemRecord = serde_json::from_str(&complete).unwrap();
        let (_, settings) = record.into_parts().unwrap();
        assert_eq!(
            settings,
            Some(CalibrationSettings::default().dp(0.001).mu(0.02).z0(0.5).ntrials(10))
        );

        let invalid = format!(
            r#"{{ {}, "settings": {{ "dp": 0.0, "mu": 0.02, "z0": 0.5, "ntrials": 10 }} }}"#,
            system
        );
        let record: CameraSystemRecord = serde_json::from_str(&invalid).unwrap();
        assert!(matches!(record.into_parts(), Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn camera_system_rejects_short_position() {
        let mut record = CameraSystemRecord::new(&system(), None);
        record.c2 = vec![25.0, 5.0];
        assert!(matches!(
            CameraSystem::try_from(record),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn rig_rejects_non_positive_zoom() {
        let mut record = RigConfigRecord::from(&system().config);
        record.k1 = 0.0;
        assert!(matches!(
            RigConfig::try_from(record),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn track_accepts_short_confidence_key() {
        let json = r#"{
            "conf": 0.8, "start": 1, "end": 2,
            "plots": [{"p": 0.0, "q": 0.0}, {"p": 0.1, "q": -0.2}, {"p": 0.2, "q": -0.1}]
        }"#;
        let record: TrackRecord = serde_json::from_str(json).unwrap();
        let track = Track::try_from(record).unwrap();
        assert_eq!(track.confidence(), 0.8);
        assert_eq!(track.span(), FrameSpan::new(1, 2).unwrap());
        assert_eq!(track.get(1), Some(ScreenCoordinate::new(0.1, -0.2)));
        assert_eq!(TrackRecord::from(&track).plots.len(), 3);
    }

    #[test]
    fn track_ignores_non_finite_padding() {
        let record = TrackRecord {
            confidence: 1.0,
            start: 1,
            end: 1,
            plots: vec![
                ScreenCoordinateRecord { p: f64::NAN, q: 0.0 },
                ScreenCoordinateRecord { p: 0.1, q: 0.1 },
            ],
        };
        assert!(Track::try_from(record.clone()).is_ok());

        let mut invalid = record;
        invalid.plots[1].q = f64::INFINITY;
        assert!(matches!(
            Track::try_from(invalid),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn track_rejects_span_past_samples() {
        let record = TrackRecord {
            confidence: 1.0,
            start: 0,
            end: 3,
            plots: vec![ScreenCoordinateRecord { p: 0.0, q: 0.0 }; 2],
        };
        assert!(matches!(
            Track::try_from(record),
            Err(Error::MalformedRecord(_))
        ));
    }

    #[test]
    fn match_record_checks_size() {
        let result = MatchResult {
            i: 2,
            j: 0,
            loss: 0.25,
            span: FrameSpan::new(4, 5).unwrap(),
            points: vec![Point3::new(1.0, 2.0, 0.0), Point3::new(1.5, 2.5, 0.1)],
        };
        let record = MatchRecord::from(&result);
        assert_eq!(record.size, 2);
        let json = serde_json::to_string(&record).unwrap();
        let parsed: MatchRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(MatchResult::try_from(parsed).unwrap(), result);

        let mut truncated = record;
        truncated.points.pop();
        assert!(matches!(
            MatchResult::try_from(truncated),
            Err(Error::MalformedRecord(_))
        ));
    }
}
