//! Line assembly for the upstream's chunked SSE byte stream.
//!
//! Transport buffering can legitimately split one record across two reads,
//! so raw bytes accumulate here and only complete lines come out; an
//! incomplete trailing line stays buffered until more data arrives. A record
//! is never parsed before it is known to be complete. Decoding happens per
//! complete line, so a read boundary inside a multi-byte character cannot
//! mangle the text.

/// Accumulates raw bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of bytes and drain every complete line.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let line = String::from_utf8_lossy(&raw[..line_end]);
            lines.push(line.trim_end_matches('\r').to_string());
        }
        lines
    }

    /// Bytes of trailing data that have not yet formed a complete line.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_lines_come_out_at_once() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"data: one\ndata: two\n");
        assert_eq!(lines, vec!["data: one", "data: two"]);
        assert_eq!(buf.pending(), 0);
    }

    #[test]
    fn partial_line_stays_buffered() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"data: {\"cho").is_empty());
        assert_eq!(buf.pending(), 11);

        let lines = buf.push(b"ices\":[]}\n");
        assert_eq!(lines, vec![r#"data: {"choices":[]}"#]);
        assert_eq!(buf.pending(), 0);
    }

    #[test]
    fn crlf_is_stripped() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"data: x\r\n\r\n");
        assert_eq!(lines, vec!["data: x", ""]);
    }

    #[test]
    fn split_inside_a_multibyte_char_is_harmless() {
        let wire = "data: 报名时间\n".as_bytes();
        // split in the middle of 报 (3 bytes)
        let mut buf = LineBuffer::new();
        assert!(buf.push(&wire[..7]).is_empty());
        let lines = buf.push(&wire[7..]);
        assert_eq!(lines, vec!["data: 报名时间"]);
    }

    #[test]
    fn split_at_any_offset_reassembles() {
        let wire = "data: 第一段\n\ndata: second\n\ndata: [DONE]\n\n".as_bytes();
        let whole: Vec<String> = {
            let mut buf = LineBuffer::new();
            buf.push(wire)
        };

        for offset in 0..=wire.len() {
            let mut buf = LineBuffer::new();
            let mut lines = buf.push(&wire[..offset]);
            lines.extend(buf.push(&wire[offset..]));
            assert_eq!(lines, whole, "split at byte {offset}");
        }
    }
}
