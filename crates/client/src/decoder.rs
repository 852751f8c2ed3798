//! Client-side stream decoder.
//!
//! Consumes a monotonically growing response buffer (previously delivered
//! text is never retracted or reordered) and extracts complete wire records.
//! A cursor tracks how much of the buffer has been scanned; the cursor only
//! advances past complete lines, so an incomplete trailing record stays
//! unscanned until more data arrives. That is what makes decoding immune to
//! how the transport re-chunks the stream.
//!
//! The decoder is a faithful relay, not a content filter: duplicate
//! consecutive fragments pass through, and concatenation order is exactly
//! arrival order. After a terminal record (`end`, `error`, or the sentinel)
//! it stops permanently and ignores any further buffer growth, which defends
//! against a stale connection lingering after logical completion.

use tracing::debug;
use zhiyuan_core::stream::StreamEvent;

/// Incremental decoder over a growing response buffer.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Byte offset of the scanned prefix. Always sits on a line boundary.
    scanned: usize,
    finished: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a terminal record has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Scan the unseen suffix of `buffer` and decode every complete record.
    ///
    /// `buffer` must be the same logical buffer on every call, grown at the
    /// end. Returns decoded events in arrival order.
    pub fn feed(&mut self, buffer: &str) -> Vec<StreamEvent> {
        if self.finished || buffer.len() <= self.scanned {
            return Vec::new();
        }

        let unscanned = &buffer[self.scanned..];
        // Only complete lines are eligible; the trailing partial line waits.
        let Some(last_newline) = unscanned.rfind('\n') else {
            return Vec::new();
        };
        let complete = &unscanned[..=last_newline];
        self.scanned += complete.len();

        let mut events = Vec::new();
        for line in complete.split('\n') {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match StreamEvent::decode_line(line) {
                Ok(Some(event)) => {
                    let terminal = event.is_terminal();
                    events.push(event);
                    if terminal {
                        self.finished = true;
                        break;
                    }
                }
                Ok(None) => {
                    // end-of-stream sentinel
                    self.finished = true;
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "Skipping undecodable stream line");
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(events: &[StreamEvent]) -> String {
        let mut out = String::new();
        for event in events {
            out.push_str(&event.encode());
        }
        out.push_str(&StreamEvent::encode_sentinel());
        out
    }

    fn chunk(s: &str) -> StreamEvent {
        StreamEvent::Chunk { content: s.into() }
    }

    #[test]
    fn decodes_full_buffer_in_one_feed() {
        let events = vec![chunk("北京"), chunk("的报名时间"), StreamEvent::End];
        let buffer = wire(&events);

        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&buffer), events);
        assert!(decoder.is_finished());
    }

    #[test]
    fn round_trip_at_every_split_offset() {
        let events = vec![chunk("第一"), chunk("second"), chunk("第三"), StreamEvent::End];
        let buffer = wire(&events);

        for offset in 0..=buffer.len() {
            if !buffer.is_char_boundary(offset) {
                continue;
            }
            let mut decoder = StreamDecoder::new();
            let mut got = decoder.feed(&buffer[..offset]);
            got.extend(decoder.feed(&buffer));
            assert_eq!(got, events, "split at byte {offset}");
            assert!(decoder.is_finished(), "split at byte {offset}");
        }
    }

    #[test]
    fn incomplete_trailing_record_waits_for_more_data() {
        let record = chunk("hello").encode();
        let mut decoder = StreamDecoder::new();
        // buffer ends mid-record, no newline yet
        assert!(decoder.feed(&record[..20]).is_empty());

        // the buffer grows to complete the record (and the stream)
        let mut buffer = record.clone();
        buffer.push_str(&StreamEvent::encode_sentinel());
        let events = decoder.feed(&buffer);
        assert_eq!(events, vec![chunk("hello")]);
        assert!(decoder.is_finished());
    }

    #[test]
    fn malformed_record_is_skipped_and_decoding_continues() {
        let buffer = format!(
            "{}data: {{\"type\":\"chunk\",\"trunc\n\n{}{}",
            chunk("before").encode(),
            chunk("after").encode(),
            StreamEvent::encode_sentinel(),
        );

        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(&buffer);
        assert_eq!(events, vec![chunk("before"), chunk("after")]);
    }

    #[test]
    fn blank_lines_are_tolerated() {
        let buffer = format!("\n\n{}\n\n\n{}", chunk("x").encode(), StreamEvent::encode_sentinel());
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&buffer), vec![chunk("x")]);
    }

    #[test]
    fn stops_permanently_after_end_record() {
        let mut buffer = wire(&[chunk("a"), StreamEvent::End]);
        let mut decoder = StreamDecoder::new();
        let events = decoder.feed(&buffer);
        assert_eq!(events, vec![chunk("a"), StreamEvent::End]);

        // growth after logical completion belongs to no event
        buffer.push_str(&chunk("stale").encode());
        assert!(decoder.feed(&buffer).is_empty());
        assert!(decoder.is_finished());
    }

    #[test]
    fn error_record_is_terminal_and_preserves_prior_fragments() {
        let events = vec![
            chunk("f1"),
            chunk("f2"),
            StreamEvent::Error {
                message: "upstream closed".into(),
            },
        ];
        let buffer = wire(&events);

        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&buffer), events);
        assert!(decoder.is_finished());
    }

    #[test]
    fn sentinel_alone_terminates() {
        let mut decoder = StreamDecoder::new();
        let buffer = format!("{}{}", chunk("a").encode(), StreamEvent::encode_sentinel());
        let events = decoder.feed(&buffer);
        assert_eq!(events, vec![chunk("a")]);
        assert!(decoder.is_finished());
    }

    #[test]
    fn duplicate_fragments_are_not_deduplicated() {
        let events = vec![chunk("再"), chunk("再"), StreamEvent::End];
        let buffer = wire(&events);

        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.feed(&buffer), events);
    }

    #[test]
    fn fragments_concatenate_in_arrival_order() {
        let events = vec![chunk("高"), chunk("考"), chunk("报"), chunk("名"), StreamEvent::End];
        let buffer = wire(&events);

        let mut decoder = StreamDecoder::new();
        let text: String = decoder
            .feed(&buffer)
            .into_iter()
            .filter_map(|e| match e {
                StreamEvent::Chunk { content } => Some(content),
                _ => None,
            })
            .collect();
        assert_eq!(text, "高考报名");
    }
}
