use crate::{Error, Result, ScreenCoordinate};
use core::fmt;
use core::ops::RangeInclusive;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// An inclusive range of absolute frame indices.
///
/// Frames have a resolution of 100ms and are counted from the start of the recording, so the
/// same index refers to the same instant in both cameras.
///
/// Deserialization goes through [`FrameSpan::new`], so a span with `start > end` is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde-serialize",
    derive(Serialize, Deserialize),
    serde(try_from = "RawFrameSpan")
)]
pub struct FrameSpan {
    pub start: usize,
    pub end: usize,
}

#[cfg(feature = "serde-serialize")]
#[derive(Deserialize)]
struct RawFrameSpan {
    start: usize,
    end: usize,
}

#[cfg(feature = "serde-serialize")]
impl core::convert::TryFrom<RawFrameSpan> for FrameSpan {
    type Error = Error;

    fn try_from(raw: RawFrameSpan) -> Result<Self> {
        FrameSpan::new(raw.start, raw.end).ok_or_else(|| {
            Error::MalformedRecord(format!("start {} is after end {}", raw.start, raw.end))
        })
    }
}

impl FrameSpan {
    /// Creates a span, or `None` if `start > end`.
    pub fn new(start: usize, end: usize) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Number of frames in the span. Never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(self, frame: usize) -> bool {
        self.start <= frame && frame <= self.end
    }

    /// `other` lies entirely inside this span.
    pub fn covers(self, other: FrameSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn frames(self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// The frames shared by both spans.
    pub fn intersection(self, other: FrameSpan) -> Option<FrameSpan> {
        FrameSpan::new(self.start.max(other.start), self.end.min(other.end))
    }

    /// The smallest span containing both spans.
    pub fn union(self, other: FrameSpan) -> FrameSpan {
        FrameSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for FrameSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// The detections of one tracked subject in one camera.
///
/// The samples are stored densely by absolute frame. Only the samples inside [`Track::span`]
/// are meaningful; everything outside of it is padding left by the ingestion and can not be
/// read through this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    confidence: f64,
    span: FrameSpan,
    plots: Vec<ScreenCoordinate>,
}

impl Track {
    /// Creates a track from the dense per-frame samples produced by the ingestion.
    ///
    /// Fails if the span does not fit inside `plots`.
    pub fn new(confidence: f64, span: FrameSpan, plots: Vec<ScreenCoordinate>) -> Result<Self> {
        if span.end >= plots.len() {
            return Err(Error::InvalidTrack {
                span,
                len: plots.len(),
            });
        }
        Ok(Self {
            confidence,
            span,
            plots,
        })
    }

    /// Creates a track whose first sample is on frame `start` and which is valid for exactly
    /// the provided samples. Frames before `start` are padded.
    pub fn starting_at(
        confidence: f64,
        start: usize,
        samples: impl IntoIterator<Item = ScreenCoordinate>,
    ) -> Result<Self> {
        let mut plots = vec![ScreenCoordinate::center(); start];
        plots.extend(samples);
        let span = FrameSpan::new(start, plots.len().saturating_sub(1)).ok_or(
            Error::InvalidTrack {
                span: FrameSpan { start, end: start },
                len: plots.len(),
            },
        )?;
        Self::new(confidence, span, plots)
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// The frames on which the track has valid detections.
    pub fn span(&self) -> FrameSpan {
        self.span
    }

    /// The number of frames covered by the dense sample array (valid or not).
    pub fn horizon(&self) -> usize {
        self.plots.len()
    }

    /// Retrieves the detection on `frame`, if the frame is inside the validity span.
    pub fn get(&self, frame: usize) -> Option<ScreenCoordinate> {
        if self.span.contains(frame) {
            Some(self.plots[frame])
        } else {
            None
        }
    }

    /// The dense sample array, including padding outside the span.
    #[cfg(feature = "serde-serialize")]
    pub(crate) fn dense(&self) -> &[ScreenCoordinate] {
        &self.plots
    }

    /// All valid detections, in frame order.
    pub fn samples(&self) -> &[ScreenCoordinate] {
        &self.plots[self.span.frames()]
    }

    /// The detections on the frames of `span`, if `span` lies inside the validity span.
    pub fn window(&self, span: FrameSpan) -> Option<&[ScreenCoordinate]> {
        if self.span.covers(span) {
            Some(&self.plots[span.frames()])
        } else {
            None
        }
    }

    /// The length of the path the detection travelled across the screen.
    ///
    /// Long tracks are the most useful ones, so the ingestion usually sorts by this.
    pub fn screen_length(&self) -> f64 {
        self.samples()
            .windows(2)
            .map(|pair| (pair[1].0 - pair[0].0).norm())
            .sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[cfg(feature = "serde-serialize")]
    #[test]
    fn reversed_span_is_refused() {
        assert!(serde_json::from_str::<FrameSpan>(r#"{"start": 5, "end": 3}"#).is_err());
        let span: FrameSpan = serde_json::from_str(r#"{"start": 3, "end": 5}"#).unwrap();
        assert_eq!(span.len(), 3);
        assert_eq!(serde_json::to_string(&span).unwrap(), r#"{"start":3,"end":5}"#);
    }

    #[test]
    fn span_set_operations() {
        let a = FrameSpan::new(3, 10).unwrap();
        let b = FrameSpan::new(8, 20).unwrap();
        assert_eq!(a.intersection(b), FrameSpan::new(8, 10));
        assert_eq!(a.union(b), FrameSpan::new(3, 20).unwrap());
        assert_eq!(a.len(), 8);
        assert!(FrameSpan::new(5, 4).is_none());
        assert!(a.intersection(FrameSpan::new(11, 12).unwrap()).is_none());
    }

    #[test]
    fn out_of_span_samples_are_hidden() {
        let track = Track::starting_at(
            0.9,
            2,
            [ScreenCoordinate::new(0.1, 0.0), ScreenCoordinate::new(0.2, 0.0)],
        )
        .unwrap();
        assert_eq!(track.span(), FrameSpan::new(2, 3).unwrap());
        assert_eq!(track.get(1), None);
        assert_eq!(track.get(3), Some(ScreenCoordinate::new(0.2, 0.0)));
        assert_eq!(track.get(4), None);
        assert_eq!(track.samples().len(), 2);
        assert!(track.window(FrameSpan::new(1, 3).unwrap()).is_none());
    }

    #[test]
    fn rejects_span_past_samples() {
        let plots = vec![ScreenCoordinate::center(); 4];
        let span = FrameSpan::new(1, 4).unwrap();
        assert_eq!(
            Track::new(1.0, span, plots),
            Err(Error::InvalidTrack { span, len: 4 })
        );
    }

    #[test]
    fn rejects_empty_samples() {
        assert!(Track::starting_at(1.0, 5, []).is_err());
    }

    #[test]
    fn screen_length_sums_steps() {
        let track = Track::starting_at(
            1.0,
            0,
            [
                ScreenCoordinate::new(0.0, 0.0),
                ScreenCoordinate::new(0.3, 0.4),
                ScreenCoordinate::new(0.3, 0.0),
            ],
        )
        .unwrap();
        assert!((track.screen_length() - 0.9).abs() < 1e-12);
    }
}
