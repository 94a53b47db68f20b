//! Turn a request and the probed stream properties into a concrete plan.

use crate::error::DownloadError;
use crate::segmenter::{effective_segment_count, plan_segments, Segment};
use crate::storage::WriteMode;

use super::probe::StreamInfo;
use super::DownloadRequest;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DownloadPlan {
    pub segments: Vec<Segment>,
    pub mode: WriteMode,
    /// Bytes already on disk (resume only).
    pub resume_from: u64,
    /// The existing file already holds the whole stream.
    pub already_complete: bool,
    /// Progress denominator; `None` when the stream's size is not trustworthy.
    pub total: Option<u64>,
}

/// `existing_len` is the current size of the destination file (0 if absent),
/// only consulted when resuming.
pub(crate) fn choose_plan(
    request: &DownloadRequest,
    info: &StreamInfo,
    existing_len: u64,
) -> Result<DownloadPlan, DownloadError> {
    let total = if info.duration_known && !info.length_unknown() {
        Some(info.length)
    } else {
        None
    };

    if request.resume {
        return choose_resume(request, info, existing_len, total);
    }

    let requested = request.segments.max(1);
    let count = effective_segment_count(requested, info.seekable);
    if count < requested {
        if request.strict_segments {
            return Err(DownloadError::NonSeekableMultiSegment { requested });
        }
        tracing::warn!(
            requested,
            "stream is not seekable, falling back to a single connection"
        );
    }

    let segments = if count == 1 {
        if info.length_unknown() {
            vec![Segment::unbounded_from(0)]
        } else {
            vec![Segment::new(0, info.length)]
        }
    } else {
        plan_segments(info.length, count)
    };

    Ok(DownloadPlan {
        segments,
        mode: WriteMode::Positional,
        resume_from: 0,
        already_complete: false,
        total,
    })
}

fn choose_resume(
    request: &DownloadRequest,
    info: &StreamInfo,
    existing_len: u64,
    total: Option<u64>,
) -> Result<DownloadPlan, DownloadError> {
    if request.segments > 1 {
        tracing::warn!(
            requested = request.segments,
            "resume uses a single connection"
        );
    }
    if !info.seekable {
        return Err(DownloadError::NotResumable);
    }

    let already_complete = existing_len >= info.length;
    if already_complete && existing_len > info.length {
        tracing::warn!(
            existing = existing_len,
            length = info.length,
            "existing file is larger than the stream"
        );
    }
    let segment = if already_complete {
        Segment::new(existing_len, existing_len)
    } else {
        Segment::new(existing_len, info.length)
    };

    Ok(DownloadPlan {
        segments: vec![segment],
        mode: WriteMode::Append,
        resume_from: existing_len,
        already_complete,
        total,
    })
}
