use shared::MouseEvent;
use thiserror::Error;

/// A single event line should be tens of bytes; anything growing past this
/// without a newline is not our protocol.
const MAX_FRAME: usize = 4 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("unterminated frame exceeded {0} bytes")]
    Oversized(usize),
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Reassembles newline-delimited JSON events from arbitrary stream chunks.
/// QUIC chunk boundaries carry no meaning, so a frame can arrive split
/// across any number of reads.
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Appends a chunk and drains every complete frame it finished. A
    /// malformed line yields an error entry but does not poison the
    /// decoder; later frames still come through.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<MouseEvent, FrameError>> {
        self.buf.extend_from_slice(bytes);

        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = &line[..line.len() - 1];
            if line.is_empty() {
                continue;
            }
            out.push(MouseEvent::from_wire_line(line).map_err(FrameError::from));
        }

        if self.buf.len() > MAX_FRAME {
            out.push(Err(FrameError::Oversized(self.buf.len())));
            self.buf.clear();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use shared::{HidPosition, MouseButton};

    use super::*;

    fn events(results: Vec<Result<MouseEvent, FrameError>>) -> Vec<MouseEvent> {
        results.into_iter().map(|r| r.expect("decode")).collect()
    }

    #[test]
    fn decodes_multiple_frames_from_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let mut chunk = Vec::new();
        chunk.extend(
            MouseEvent::move_to(HidPosition { x: -1, y: -1 })
                .to_wire_line()
                .expect("encode"),
        );
        chunk.extend(
            MouseEvent::button(MouseButton::Left, true)
                .to_wire_line()
                .expect("encode"),
        );
        assert_eq!(
            events(decoder.push(&chunk)),
            vec![
                MouseEvent::move_to(HidPosition { x: -1, y: -1 }),
                MouseEvent::button(MouseButton::Left, true),
            ]
        );
    }

    #[test]
    fn reassembles_frame_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        let line = MouseEvent::wheel(0.0, -1.5).to_wire_line().expect("encode");
        let (head, tail) = line.split_at(7);
        assert!(decoder.push(head).is_empty());
        assert_eq!(events(decoder.push(tail)), vec![MouseEvent::wheel(0.0, -1.5)]);
    }

    #[test]
    fn malformed_line_does_not_poison_the_stream() {
        let mut decoder = FrameDecoder::new();
        let mut chunk = b"{\"event_type\":\"mouse_jump\"}\n".to_vec();
        chunk.extend(
            MouseEvent::button(MouseButton::Right, false)
                .to_wire_line()
                .expect("encode"),
        );
        let results = decoder.push(&chunk);
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(FrameError::Malformed(_))));
        assert_eq!(
            results[1].as_ref().expect("decode"),
            &MouseEvent::button(MouseButton::Right, false)
        );
    }

    #[test]
    fn empty_lines_are_skipped() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"\n\n").is_empty());
    }

    #[test]
    fn runaway_unterminated_frame_is_dropped() {
        let mut decoder = FrameDecoder::new();
        let garbage = vec![b'x'; MAX_FRAME + 1];
        let results = decoder.push(&garbage);
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(FrameError::Oversized(_))));
        // The buffer was reset; a valid frame decodes afterwards.
        let line = MouseEvent::wheel(1.0, 0.0).to_wire_line().expect("encode");
        assert_eq!(events(decoder.push(&line)), vec![MouseEvent::wheel(1.0, 0.0)]);
    }
}
