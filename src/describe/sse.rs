//! Incremental decoding of `text/event-stream` bodies.

use crate::error::BannrError;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;

/// Accumulates raw bytes and yields the `data` payload of each complete event.
///
/// Only `data:` fields matter here; `event:`, `id:`, `retry:` and comment
/// lines are skipped.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    data: Option<String>,
}

impl SseDecoder {
    /// Feeds a network chunk, returning every event completed by it.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            self.feed_line(line.trim_end_matches(['\n', '\r']), &mut events);
        }
        events
    }

    /// Flushes whatever is left once the body ends.
    pub(crate) fn finish(&mut self) -> Option<String> {
        let mut events = Vec::new();
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            self.feed_line(line.trim_end_matches('\r'), &mut events);
        }
        events.pop().or_else(|| self.data.take())
    }

    fn feed_line(&mut self, line: &str, events: &mut Vec<String>) {
        if line.is_empty() {
            if let Some(data) = self.data.take() {
                events.push(data);
            }
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        if field != "data" {
            return;
        }

        match self.data.as_mut() {
            Some(data) => {
                data.push('\n');
                data.push_str(value);
            }
            None => self.data = Some(value.to_string()),
        }
    }
}

struct EventState<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

/// Turns a byte stream into a stream of event payloads.
pub(crate) fn events<S, B, E>(body: S) -> impl Stream<Item = Result<String, BannrError>> + Send
where
    S: Stream<Item = Result<B, E>> + Unpin + Send,
    B: AsRef<[u8]> + Send,
    E: Into<BannrError> + Send,
{
    let state = EventState {
        body,
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        done: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                return Some((Ok(event), state));
            }
            if state.done {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => state.pending.extend(state.decoder.push(bytes.as_ref())),
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e.into()), state));
                }
                None => {
                    state.done = true;
                    state.pending.extend(state.decoder.finish());
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_event() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b"data: {\"a\":1}\n\n");
        assert_eq!(events, vec!["{\"a\":1}"]);
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut decoder = SseDecoder::default();
        assert!(decoder.push(b"da").is_empty());
        assert!(decoder.push(b"ta: hel").is_empty());
        assert!(decoder.push(b"lo\r\n").is_empty());
        assert_eq!(decoder.push(b"\r\ndata: next\r\n\r\n"), vec!["hello", "next"]);
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let payload = "data: Crème brûlée\n\n".as_bytes();
        let split = payload.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut decoder = SseDecoder::default();
        assert!(decoder.push(&payload[..split]).is_empty());
        assert_eq!(decoder.push(&payload[split..]), vec!["Crème brûlée"]);
    }

    #[test]
    fn test_multiline_data_and_ignored_fields() {
        let mut decoder = SseDecoder::default();
        let events = decoder.push(b": keep-alive\nevent: message\ndata: one\ndata: two\nid: 7\n\n");
        assert_eq!(events, vec!["one\ntwo"]);
    }

    #[test]
    fn test_trailing_event_without_blank_line() {
        let mut decoder = SseDecoder::default();
        assert_eq!(decoder.push(b"data: first\n\ndata: last"), vec!["first"]);
        assert_eq!(decoder.finish(), Some("last".to_string()));
    }

    #[tokio::test]
    async fn test_events_stream_flushes_and_propagates_errors() {
        let chunks: Vec<Result<Vec<u8>, BannrError>> = vec![
            Ok(b"data: a\n\nda".to_vec()),
            Ok(b"ta: b\n\n".to_vec()),
            Err(BannrError::Stream("connection reset".into())),
        ];
        let collected: Vec<_> = events(futures::stream::iter(chunks)).collect().await;

        assert_eq!(collected.len(), 3);
        assert_eq!(collected[0].as_deref().unwrap(), "a");
        assert_eq!(collected[1].as_deref().unwrap(), "b");
        assert!(matches!(collected[2], Err(BannrError::Stream(_))));
    }
}
