use crate::core::errors::DecodeError;
use flate2::read::GzDecoder;
use std::borrow::Cow;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Reverses the gzip framing on inbound stream frames.
///
/// The venue interleaves plain-text control frames with compressed payload
/// frames, so anything that does not start with the gzip magic is passed
/// through untouched. A frame that does carry the magic but fails to inflate
/// is an error and must not be treated as data.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameDecoder;

impl FrameDecoder {
    pub fn is_gzip(frame: &[u8]) -> bool {
        frame.starts_with(&GZIP_MAGIC)
    }

    pub fn decode<'a>(&self, frame: &'a [u8]) -> Result<Cow<'a, [u8]>, DecodeError> {
        if !Self::is_gzip(frame) {
            return Ok(Cow::Borrowed(frame));
        }

        let mut decoder = GzDecoder::new(frame);
        let mut inflated = Vec::with_capacity(frame.len() * 4);
        decoder
            .read_to_end(&mut inflated)
            .map_err(DecodeError::CorruptGzip)?;
        Ok(Cow::Owned(inflated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_plain_frame_passes_through() {
        let frame = br#"{"event_rep":"sub","status":"ok"}"#;
        let decoded = FrameDecoder.decode(frame).unwrap();

        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded.as_ref(), frame.as_slice());
    }

    #[test]
    fn test_gzip_frame_is_inflated() {
        let payload = br#"{"ping":1700000000000}"#;
        let compressed = gzip(payload);
        let decoded = FrameDecoder.decode(&compressed).unwrap();

        assert!(matches!(decoded, Cow::Owned(_)));
        assert_eq!(decoded.as_ref(), payload.as_slice());
    }

    #[test]
    fn test_truncated_gzip_is_an_error() {
        let compressed = gzip(br#"{"channel":"market_btrusdt_depth_step0","ts":1}"#);
        let truncated = &compressed[..compressed.len() / 2];

        let err = FrameDecoder.decode(truncated).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptGzip(_)));
    }

    #[test]
    fn test_magic_with_garbage_is_an_error() {
        let frame = [0x1f, 0x8b, 0x00, 0x01, 0x02, 0x03];
        assert!(FrameDecoder.decode(&frame).is_err());
    }

    #[test]
    fn test_empty_frame_passes_through() {
        assert!(FrameDecoder.decode(&[]).unwrap().is_empty());
    }
}
