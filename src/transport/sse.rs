//! Server-sent event framing for streamed inference.
//!
//! Events are separated by blank lines. Lines starting with `:` are comments. Multiple
//! `data:` lines in one event are joined with `\n`. A `[DONE]` payload ends the stream.

use crate::BoxStream;
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::collections::VecDeque;

pub const DONE_SIGNAL: &str = "[DONE]";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    pub fn is_done(&self) -> bool {
        self.data.trim() == DONE_SIGNAL
    }
}

/// Incremental line parser. Feed raw bytes, collect complete events.
///
/// Bytes are buffered until a full line is available, so multi-byte characters split
/// across network reads decode correctly.
#[derive(Debug, Default)]
pub struct SseFramer {
    buf: Vec<u8>,
    data: Vec<String>,
    event: Option<String>,
    id: Option<String>,
}

impl SseFramer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.buf.is_empty() {
            let rest = std::mem::take(&mut self.buf);
            let line = String::from_utf8_lossy(&rest).into_owned();
            let line = line.trim_end_matches('\r').to_string();
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }
        let (field, value) = match line.find(':') {
            Some(idx) => {
                let value = &line[idx + 1..];
                (&line[..idx], value.strip_prefix(' ').unwrap_or(value))
            }
            None => ("data", line),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if self.data.is_empty() && self.event.is_none() {
            self.id = None;
            return None;
        }
        let event = SseEvent {
            event: self.event.take(),
            data: std::mem::take(&mut self.data).join("\n"),
            id: self.id.take(),
        };
        Some(event)
    }
}

/// Turn a body byte stream into the `data` payloads of its events.
///
/// Events with an empty payload are skipped; `[DONE]` ends the stream.
pub fn data_stream(input: BoxStream<'static, Bytes>) -> BoxStream<'static, String> {
    let state = (input, SseFramer::new(), VecDeque::<SseEvent>::new(), false);
    let stream = stream::unfold(state, |(mut input, mut framer, mut pending, mut eof)| async move {
        loop {
            if let Some(event) = pending.pop_front() {
                if event.is_done() {
                    return None;
                }
                if event.data.is_empty() {
                    continue;
                }
                return Some((Ok(event.data), (input, framer, pending, eof)));
            }
            if eof {
                return None;
            }
            match input.next().await {
                Some(Ok(bytes)) => pending.extend(framer.push(&bytes)),
                Some(Err(e)) => return Some((Err(e), (input, framer, pending, true))),
                None => {
                    eof = true;
                    pending.extend(framer.finish());
                }
            }
        }
    });
    Box::pin(stream)
}
