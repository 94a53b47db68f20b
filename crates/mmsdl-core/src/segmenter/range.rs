//! Segment type and range planning.

/// `end` value of a segment that runs until end-of-data.
pub const UNBOUNDED_END: u64 = u64::MAX;

/// A single segment: byte range [start, end) (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive), or [`UNBOUNDED_END`].
    pub end: u64,
}

impl Segment {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Segment that reads from `start` until the stream reports end-of-data.
    pub fn unbounded_from(start: u64) -> Self {
        Self {
            start,
            end: UNBOUNDED_END,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.end != UNBOUNDED_END
    }

    /// Length of this segment in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// A degenerate segment performs no work.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Number of connections actually usable: multi-segment download needs seeking.
pub fn effective_segment_count(requested: usize, seekable: bool) -> usize {
    if seekable {
        requested.max(1)
    } else {
        1
    }
}

/// Builds a segment plan for a given total size and segment count.
///
/// The first `segment_count - 1` segments are exactly `total_size / segment_count`
/// bytes; the last one absorbs the remainder. A zero-length stream (or a count
/// of 0 or 1) yields one segment covering `[0, total_size)`.
pub fn plan_segments(total_size: u64, segment_count: usize) -> Vec<Segment> {
    let count = segment_count.max(1) as u64;
    if count == 1 || total_size == 0 {
        return vec![Segment::new(0, total_size)];
    }

    let part_size = total_size / count;
    let mut out = Vec::with_capacity(count as usize);
    let mut start = 0u64;
    for _ in 0..count - 1 {
        out.push(Segment::new(start, start + part_size));
        start += part_size;
    }
    out.push(Segment::new(start, total_size));
    out
}
