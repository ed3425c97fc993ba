use crate::{Error, FrameSpan, Result, ScreenCoordinate, Track};

/// Two tracks viewed over the frames on which both of them have valid detections.
///
/// The window is never empty. Constructing it for two tracks that share no frames fails with
/// [`Error::NoOverlap`] rather than producing a clamped or empty window.
#[derive(Debug, Clone, Copy)]
pub struct SyncedWindow<'a> {
    first: &'a [ScreenCoordinate],
    second: &'a [ScreenCoordinate],
    span: FrameSpan,
}

impl<'a> SyncedWindow<'a> {
    pub fn new(first: &'a Track, second: &'a Track) -> Result<Self> {
        let span = first
            .span()
            .intersection(second.span())
            .ok_or(Error::NoOverlap {
                first: first.span(),
                second: second.span(),
            })?;
        // The intersection is inside both validity spans.
        match (first.window(span), second.window(span)) {
            (Some(first), Some(second)) => Ok(Self {
                first,
                second,
                span,
            }),
            _ => Err(Error::NoOverlap {
                first: first.span(),
                second: second.span(),
            }),
        }
    }

    /// The absolute frames covered by the window.
    pub fn span(&self) -> FrameSpan {
        self.span
    }

    /// Number of synchronized frames. Never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.span.len()
    }

    /// The detections of the first track inside the window.
    pub fn first(&self) -> &'a [ScreenCoordinate] {
        self.first
    }

    /// The detections of the second track inside the window.
    pub fn second(&self) -> &'a [ScreenCoordinate] {
        self.second
    }

    /// Iterates over the detection pairs of each synchronized frame.
    pub fn pairs(&self) -> impl Iterator<Item = (ScreenCoordinate, ScreenCoordinate)> + Clone + 'a {
        self.first.iter().copied().zip(self.second.iter().copied())
    }

    /// Iterates over the detection pairs along with their absolute frame.
    pub fn frames(
        &self,
    ) -> impl Iterator<Item = (usize, ScreenCoordinate, ScreenCoordinate)> + Clone + 'a {
        self.span
            .frames()
            .zip(self.pairs())
            .map(|(frame, (a, b))| (frame, a, b))
    }

    /// The detection pairs on the first and the last frame of the window.
    pub fn endpoints(&self) -> [(ScreenCoordinate, ScreenCoordinate); 2] {
        let last = self.len() - 1;
        [
            (self.first[0], self.second[0]),
            (self.first[last], self.second[last]),
        ]
    }
}

/// Aligns two tracks on their common frames.
///
/// This is symmetric: `sync(a, b)` and `sync(b, a)` cover the same span.
///
/// ```
/// use track3d_core::{sync, ScreenCoordinate, Track, FrameSpan};
///
/// let a = Track::starting_at(1.0, 2, vec![ScreenCoordinate::center(); 6]).unwrap();
/// let b = Track::starting_at(1.0, 5, vec![ScreenCoordinate::center(); 10]).unwrap();
/// let window = sync(&a, &b).unwrap();
/// assert_eq!(window.span(), FrameSpan::new(5, 7).unwrap());
/// assert_eq!(sync(&b, &a).unwrap().span(), window.span());
/// ```
pub fn sync<'a>(first: &'a Track, second: &'a Track) -> Result<SyncedWindow<'a>> {
    SyncedWindow::new(first, second)
}

/// The frames seen by at least one of the two tracks, `[min(start), max(end)]`.
///
/// A reconstructed path spans this range, even on frames where only one camera saw the subject.
pub fn union_span(first: &Track, second: &Track) -> FrameSpan {
    first.span().union(second.span())
}
