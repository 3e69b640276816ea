// Decoder for the gesture stream.
// The producer sends bare UTF-8 text with no framing: whatever one read
// returns, trimmed, is the whole label.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

#[derive(Debug, Default, Clone, Copy)]
pub struct GestureCodec;

impl GestureCodec {
    pub fn new() -> Self {
        Self
    }
}

/// Decode one read's worth of bytes into a label.
///
/// Invalid UTF-8 is replaced rather than rejected, so a garbled or split
/// multi-byte sequence never tears the connection down.
pub fn decode_label(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

impl Decoder for GestureCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.is_empty() {
            return Ok(None);
        }

        // Take everything buffered; no delimiter search.
        let chunk = buf.split_to(buf.len());
        let label = decode_label(&chunk);
        drop(chunk);

        // FramedRead only reserves one byte before reading
        buf.reserve(self.read_size);
        Ok(Some(label))
    }
}
