//! Newline framing over arbitrary read boundaries.
//!
//! A single `read()` may return half a line, several lines, or a line split
//! in the middle of a multi-byte character. [`LineFramer`] accumulates raw
//! reads and only hands out lines once their terminating `\n` has arrived.

use bytes::{Bytes, BytesMut};

use super::error::{RelayError, RelayResult};

/// Per-direction line assembler.
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    /// Bytes at the front of `buf` already known to contain no newline.
    scanned: usize,
    max_line_length: usize,
}

impl LineFramer {
    pub fn new(max_line_length: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
            scanned: 0,
            max_line_length,
        }
    }

    /// Append one raw read.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Take the next complete line, without its `\n`.
    ///
    /// Returns `Ok(None)` when only a partial line (or nothing) is buffered.
    pub fn next_line(&mut self) -> RelayResult<Option<Bytes>> {
        match self.buf[self.scanned..].iter().position(|&b| b == b'\n') {
            Some(offset) => {
                let end = self.scanned + offset;
                if end > self.max_line_length {
                    return Err(RelayError::LineTooLong {
                        limit: self.max_line_length,
                    });
                }
                let mut line = self.buf.split_to(end + 1);
                line.truncate(end);
                self.scanned = 0;
                Ok(Some(line.freeze()))
            }
            None => {
                self.scanned = self.buf.len();
                if self.buf.len() > self.max_line_length {
                    return Err(RelayError::LineTooLong {
                        limit: self.max_line_length,
                    });
                }
                Ok(None)
            }
        }
    }

    /// Take whatever unterminated data remains, once the peer has closed.
    pub fn finish(&mut self) -> Option<Bytes> {
        self.scanned = 0;
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf.split().freeze())
        }
    }

    /// Number of buffered bytes not yet handed out.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Whether a frame carries anything besides whitespace.
pub fn is_blank(line: &[u8]) -> bool {
    line.trim_ascii().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(framer: &mut LineFramer) -> Vec<Bytes> {
        let mut lines = Vec::new();
        while let Some(line) = framer.next_line().unwrap() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn line_split_across_reads_is_reassembled() {
        let mut framer = LineFramer::new(1024);

        framer.extend(b"{\"id\":1,\"result\":true}\n{\"id\":2");
        assert_eq!(drain(&mut framer), vec![Bytes::from_static(b"{\"id\":1,\"result\":true}")]);
        assert_eq!(framer.pending(), 7);

        framer.extend(b",\"result\":false}\n");
        assert_eq!(drain(&mut framer), vec![Bytes::from_static(b"{\"id\":2,\"result\":false}")]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn several_lines_in_one_read() {
        let mut framer = LineFramer::new(1024);
        framer.extend(b"a\n\nb\r\nc");

        let lines = drain(&mut framer);
        assert_eq!(lines.len(), 3);
        assert_eq!(&lines[0][..], b"a");
        assert!(is_blank(&lines[1]));
        assert_eq!(&lines[2][..], b"b\r");
        assert_eq!(framer.finish().as_deref(), Some(&b"c"[..]));
        assert_eq!(framer.finish(), None);
    }

    #[test]
    fn multibyte_character_split_between_reads() {
        let text = "{\"worker\":\"r\u{e9}ig\"}\n".as_bytes();
        let split = text.iter().position(|&b| b == 0xc3).unwrap() + 1;

        let mut framer = LineFramer::new(1024);
        framer.extend(&text[..split]);
        assert!(framer.next_line().unwrap().is_none());
        framer.extend(&text[split..]);

        let line = framer.next_line().unwrap().unwrap();
        assert_eq!(std::str::from_utf8(&line).unwrap(), "{\"worker\":\"r\u{e9}ig\"}");
    }

    #[test]
    fn overlong_partial_line_is_rejected() {
        let mut framer = LineFramer::new(8);
        framer.extend(b"0123");
        assert!(framer.next_line().unwrap().is_none());
        framer.extend(b"456789");
        assert!(matches!(
            framer.next_line(),
            Err(RelayError::LineTooLong { limit: 8 })
        ));
    }

    #[test]
    fn overlong_complete_line_is_rejected() {
        let mut framer = LineFramer::new(4);
        framer.extend(b"0123456\n");
        assert!(framer.next_line().is_err());
    }

    #[test]
    fn long_stream_of_short_lines_is_fine() {
        let mut framer = LineFramer::new(8);
        for _ in 0..100 {
            framer.extend(b"abc\n");
            assert_eq!(drain(&mut framer).len(), 1);
        }
    }

    #[test]
    fn blank_detection_trims_whitespace() {
        assert!(is_blank(b""));
        assert!(is_blank(b" \t\r"));
        assert!(!is_blank(b" {} "));
    }
}
