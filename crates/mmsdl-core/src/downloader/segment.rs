//! Segment worker: one connection fetching one byte range.
//!
//! The worker opens its own connection, seeks to the segment start, reads
//! sequentially and hands offset-tagged chunks to the sink. It never touches
//! the output file.

use crate::control::CancelToken;
use crate::error::DownloadError;
use crate::segmenter::Segment;
use crate::stream::{Connector, StreamGuard, StreamSource};

use super::sink::{Chunk, SinkSender};

/// Size of the buffer handed to each `read` call.
const READ_BUF_SIZE: usize = 64 * 1024;

/// Connection parameters shared by every worker of one download.
#[derive(Debug, Clone)]
pub(crate) struct WorkerParams {
    pub url: String,
    pub bandwidth: u32,
    pub chunk_size: usize,
}

/// How a worker stopped without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    Finished { bytes: u64 },
    Cancelled,
}

/// Seek to `offset`. The protocol may land short of the target on a block
/// boundary; one retry at `offset - 1` is allowed, nothing more.
pub(crate) fn seek_exact(stream: &mut dyn StreamSource, offset: u64) -> Result<(), DownloadError> {
    let mut landed = stream.seek(offset).map_err(DownloadError::Protocol)?;
    if landed != offset && offset > 0 {
        tracing::debug!(requested = offset, landed, "seek missed, retrying one byte earlier");
        landed = stream.seek(offset - 1).map_err(DownloadError::Protocol)?;
    }
    if landed != offset {
        return Err(DownloadError::SeekContractViolation {
            requested: offset,
            actual: landed,
        });
    }
    Ok(())
}

/// Fetch `segment` and send its bytes to `sink` in chunks of `chunk_size`
/// bytes (the last one may be shorter). Chunks are offset-monotonic, gap-free
/// and never extend past `segment.end`.
pub(crate) fn fetch_segment(
    connector: &dyn Connector,
    params: &WorkerParams,
    index: usize,
    segment: Segment,
    sink: &SinkSender,
    cancel: &CancelToken,
) -> Result<WorkerExit, DownloadError> {
    if segment.is_empty() {
        return Ok(WorkerExit::Finished { bytes: 0 });
    }
    if cancel.is_cancelled() {
        return Ok(WorkerExit::Cancelled);
    }

    let stream = connector
        .open(&params.url, params.bandwidth)
        .map_err(DownloadError::Connection)?;
    let mut stream = StreamGuard::new(stream);
    if segment.start > 0 {
        seek_exact(&mut *stream, segment.start)?;
    }
    tracing::debug!(segment = index, start = segment.start, end = segment.end, "segment started");

    let chunk_size = params.chunk_size.max(1);
    let mut block = vec![0u8; READ_BUF_SIZE];
    let mut pending: Vec<u8> = Vec::with_capacity(chunk_size);
    let mut chunk_offset = segment.start;
    let mut next = segment.start;

    while next < segment.end {
        if cancel.is_cancelled() {
            return Ok(WorkerExit::Cancelled);
        }
        let n = stream.read(&mut block).map_err(DownloadError::Protocol)?;
        if n == 0 {
            break;
        }
        let take = (n as u64).min(segment.end - next) as usize;
        pending.extend_from_slice(&block[..take]);
        next += take as u64;

        while pending.len() >= chunk_size {
            let rest = pending.split_off(chunk_size);
            let bytes = std::mem::replace(&mut pending, rest);
            let len = bytes.len() as u64;
            if sink.send_chunk(Chunk { offset: chunk_offset, bytes }).is_err() {
                return Ok(WorkerExit::Cancelled);
            }
            chunk_offset += len;
        }
    }

    if !pending.is_empty() {
        let bytes = std::mem::take(&mut pending);
        if sink.send_chunk(Chunk { offset: chunk_offset, bytes }).is_err() {
            return Ok(WorkerExit::Cancelled);
        }
    }
    stream.close();

    if segment.is_bounded() && next < segment.end {
        return Err(DownloadError::ShortRead {
            segment: index,
            expected_end: segment.end,
            reached: next,
        });
    }
    tracing::debug!(segment = index, bytes = next - segment.start, "segment finished");
    Ok(WorkerExit::Finished {
        bytes: next - segment.start,
    })
}
