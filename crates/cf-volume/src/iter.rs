//! Lazy sample enumeration over rectangular blocks of the lattice.

use crate::sample::Sample;

/// Iterator over every sample of a rectangular block, first axis fastest.
///
/// The block is described by its first sample and its extent on each axis, both
/// captured by value, so the iterator never borrows the grid that produced it.
/// Whole-grid iteration, single-slice iteration, neighbourhood windows and box
/// sub-ranges are all blocks of this kind.
///
/// Samples are produced as-is: a block may extend past the grid (neighbourhood
/// windows at the border do), and callers test containment themselves.
#[derive(Debug, Clone)]
pub struct SampleIter {
    origin: Sample,
    extent: [usize; 3],
    next: usize,
    len: usize,
}

impl SampleIter {
    /// Block starting at `origin` spanning `extent` samples per axis.
    ///
    /// Any zero extent yields an empty iterator.
    #[must_use]
    pub fn block(origin: Sample, extent: [usize; 3]) -> Self {
        let len = extent[0]
            .saturating_mul(extent[1])
            .saturating_mul(extent[2]);
        Self {
            origin,
            extent,
            next: 0,
            len,
        }
    }

    /// An iterator that yields nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::block(Sample::origin(), [0, 0, 0])
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn decode(&self, idx: usize) -> Sample {
        let di = idx % self.extent[0];
        let rest = idx / self.extent[0];
        let dj = rest % self.extent[1];
        let dk = rest / self.extent[1];
        self.origin.offset(di as i32, dj as i32, dk as i32)
    }
}

impl Iterator for SampleIter {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.next >= self.len {
            return None;
        }
        let out = self.decode(self.next);
        self.next += 1;
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }

    fn nth(&mut self, n: usize) -> Option<Sample> {
        self.next = self.next.saturating_add(n).min(self.len);
        self.next()
    }
}

impl ExactSizeIterator for SampleIter {}

impl std::iter::FusedIterator for SampleIter {}
