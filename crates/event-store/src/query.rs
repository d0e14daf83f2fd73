use std::ops::{RangeFrom, RangeFull, RangeInclusive, RangeToInclusive};

use crate::{EventStoreError, Result, Revision};

/// Inclusive range of envelope revisions to stream.
///
/// Defaults to the full history: `from` = [`Revision::MIN`], `to` =
/// [`Revision::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevisionRange {
    /// Lowest envelope revision to include.
    pub from: Revision,

    /// Highest envelope revision to include.
    pub to: Revision,
}

impl RevisionRange {
    /// Creates a range covering `[from, to]`.
    pub fn new(from: impl Into<Revision>, to: impl Into<Revision>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates a range covering the full history.
    pub fn all() -> Self {
        Self {
            from: Revision::MIN,
            to: Revision::MAX,
        }
    }

    /// Creates a range starting at `from` with no upper bound.
    pub fn starting_at(from: impl Into<Revision>) -> Self {
        Self {
            from: from.into(),
            ..Self::all()
        }
    }

    /// Creates a range ending at `to` (inclusive).
    pub fn up_to(to: impl Into<Revision>) -> Self {
        Self {
            to: to.into(),
            ..Self::all()
        }
    }

    /// Fails when `from > to`.
    pub fn validate(&self) -> Result<()> {
        if self.from > self.to {
            return Err(EventStoreError::InvalidRange {
                from: self.from,
                to: self.to,
            });
        }
        Ok(())
    }

    pub fn contains(&self, revision: Revision) -> bool {
        self.from <= revision && revision <= self.to
    }

    /// Returns true once `revision` is past the upper bound. Stores are
    /// revision-ascending, so nothing after it can match.
    pub fn is_exceeded_by(&self, revision: Revision) -> bool {
        revision > self.to
    }
}

impl Default for RevisionRange {
    fn default() -> Self {
        Self::all()
    }
}

impl From<RangeFull> for RevisionRange {
    fn from(_: RangeFull) -> Self {
        Self::all()
    }
}

impl From<RangeInclusive<u64>> for RevisionRange {
    fn from(range: RangeInclusive<u64>) -> Self {
        let (from, to) = range.into_inner();
        Self::new(from, to)
    }
}

impl From<RangeFrom<u64>> for RevisionRange {
    fn from(range: RangeFrom<u64>) -> Self {
        Self::starting_at(range.start)
    }
}

impl From<RangeToInclusive<u64>> for RevisionRange {
    fn from(range: RangeToInclusive<u64>) -> Self {
        Self::up_to(range.end)
    }
}
