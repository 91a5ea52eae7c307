//! Event-stream framing for streamed chat answers.
//!
//! Each segment becomes `data: {"content": ...}\n\n` and a clean end of stream
//! is marked with `data: [DONE]\n\n`. An upstream error ends the framed stream
//! with that error and nothing else.

use super::generator::TextStream;
use futures::stream::{self, StreamExt};

/// Marker sent after the last segment.
pub const END_OF_STREAM: &str = "data: [DONE]\n\n";

/// Wrap one segment in its envelope.
pub fn frame_segment(segment: &str) -> String {
    format!("data: {}\n\n", serde_json::json!({ "content": segment }))
}

/// Frame every segment of `segments` and append the end marker.
pub fn framed(segments: TextStream) -> TextStream {
    stream::unfold(Some(segments), |state| async move {
        let mut segments = state?;
        match segments.next().await {
            Some(Ok(segment)) => Some((Ok(frame_segment(&segment)), Some(segments))),
            Some(Err(e)) => Some((Err(e), None)),
            None => Some((Ok(END_OF_STREAM.to_string()), None)),
        }
    })
    .boxed()
}
