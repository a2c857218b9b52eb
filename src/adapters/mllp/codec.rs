//! MLLP block framing: `<VT> payload <FS><CR>`

use crate::domain::{Result, TriageError};

pub const START_BLOCK: u8 = 0x0B;
pub const END_BLOCK: u8 = 0x1C;
pub const CARRIAGE_RETURN: u8 = 0x0D;

/// Wraps a payload in an MLLP block
pub fn encode_frame(payload: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 3);
    frame.push(START_BLOCK);
    frame.extend_from_slice(payload.as_bytes());
    frame.push(END_BLOCK);
    frame.push(CARRIAGE_RETURN);
    frame
}

/// Incremental decoder for a byte stream of MLLP blocks
///
/// Bytes outside a block are discarded.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    max_frame_bytes: usize,
}

impl FrameDecoder {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_bytes,
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Next complete payload, if one is buffered
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Transport`] once a payload grows past the
    /// frame limit. The decoder is unusable afterwards.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(start) = self.buffer.iter().position(|&b| b == START_BLOCK) else {
            if !self.buffer.is_empty() {
                tracing::debug!(bytes = self.buffer.len(), "Discarding bytes outside MLLP block");
                self.buffer.clear();
            }
            return Ok(None);
        };
        if start > 0 {
            tracing::debug!(bytes = start, "Discarding bytes before MLLP start block");
            self.buffer.drain(..start);
        }

        let end = self
            .buffer
            .windows(2)
            .position(|pair| pair == [END_BLOCK, CARRIAGE_RETURN]);

        match end {
            Some(end) => {
                let payload_len = end - 1;
                if payload_len > self.max_frame_bytes {
                    return Err(self.oversized(payload_len));
                }
                let frame: Vec<u8> = self.buffer.drain(..end + 2).collect();
                Ok(Some(frame[1..=payload_len].to_vec()))
            }
            None => {
                let pending = self.buffer.len() - 1;
                if pending > self.max_frame_bytes + 1 {
                    return Err(self.oversized(pending));
                }
                Ok(None)
            }
        }
    }

    fn oversized(&self, len: usize) -> TriageError {
        TriageError::Transport(format!(
            "MLLP frame of {} bytes exceeds limit of {} bytes",
            len, self.max_frame_bytes
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_frame() {
        assert_eq!(encode_frame("MSH|x"), b"\x0bMSH|x\x1c\x0d".to_vec());
    }

    #[test]
    fn test_decode_split_across_reads() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"\x0bMSH|^~\\&|A");
        assert_eq!(decoder.next_frame().unwrap(), None);

        decoder.extend(b"|B\x1c");
        assert_eq!(decoder.next_frame().unwrap(), None);

        decoder.extend(b"\x0d");
        assert_eq!(
            decoder.next_frame().unwrap(),
            Some(b"MSH|^~\\&|A|B".to_vec())
        );
        assert_eq!(decoder.next_frame().unwrap(), None);
    }

    #[test]
    fn test_decode_back_to_back_frames() {
        let mut decoder = FrameDecoder::new(1024);
        let mut bytes = encode_frame("ONE");
        bytes.extend(encode_frame("TWO"));
        decoder.extend(&bytes);

        assert_eq!(decoder.next_frame().unwrap(), Some(b"ONE".to_vec()));
        assert_eq!(decoder.next_frame().unwrap(), Some(b"TWO".to_vec()));
        assert_eq!(decoder.next_frame().unwrap(), None);
    }

    #[test]
    fn test_leading_noise_is_discarded() {
        let mut decoder = FrameDecoder::new(1024);
        decoder.extend(b"\r\n\x0bMSH\x1c\x0d");
        assert_eq!(decoder.next_frame().unwrap(), Some(b"MSH".to_vec()));
    }

    #[test]
    fn test_oversized_frame_is_rejected() {
        let mut decoder = FrameDecoder::new(4);
        decoder.extend(b"\x0b0123456789");
        assert!(matches!(
            decoder.next_frame(),
            Err(TriageError::Transport(_))
        ));
    }

    #[test]
    fn test_frame_at_limit_is_accepted() {
        let mut decoder = FrameDecoder::new(4);
        decoder.extend(b"\x0b0123\x1c\x0d");
        assert_eq!(decoder.next_frame().unwrap(), Some(b"0123".to_vec()));
    }
}
