//! Content-coding (gzip/deflate) decode, applied right-to-left across a
//! comma-list of codings, in-memory for materialized responses and
//! incrementally for streaming ones.

use bytes::Bytes;

use crate::error::Error;
use crate::header::HeaderMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Gzip,
    Deflate,
}

impl ContentCoding {
    fn parse_one(s: &str) -> Result<Option<ContentCoding>, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identity" | "" => Ok(None),
            "gzip" | "x-gzip" => Ok(Some(ContentCoding::Gzip)),
            "deflate" => Ok(Some(ContentCoding::Deflate)),
            other => Err(Error::decode(format!("unknown content-coding: {other}"))),
        }
    }
}

/// Parse `Content-Encoding`, if present, into its codings in wire order
/// (left to right as written). Decoding applies them right-to-left, i.e.
/// the last-listed coding was applied first by the server and must be
/// undone first by us.
pub fn parse_content_encoding(headers: &HeaderMap) -> Result<Vec<ContentCoding>, Error> {
    match headers.get("content-encoding") {
        None => Ok(Vec::new()),
        Some(value) => value
            .split(',')
            .map(ContentCoding::parse_one)
            .collect::<Result<Vec<_>, _>>()
            .map(|v| v.into_iter().flatten().collect()),
    }
}

/// Decompress an entire in-memory body (materialized mode).
pub fn decode_all(mut data: Bytes, codings: &[ContentCoding]) -> Result<Bytes, Error> {
    for coding in codings.iter().rev() {
        data = decode_one_shot(*coding, &data)?;
    }
    Ok(data)
}

fn decode_one_shot(coding: ContentCoding, data: &[u8]) -> Result<Bytes, Error> {
    use std::io::Write;
    match coding {
        ContentCoding::Gzip => {
            let mut decoder = flate2::write::GzDecoder::new(Vec::new());
            decoder.write_all(data).map_err(|e| Error::decode(e.to_string()))?;
            let out = decoder.finish().map_err(|e| Error::decode(e.to_string()))?;
            Ok(Bytes::from(out))
        }
        ContentCoding::Deflate => {
            let mut decoder = flate2::write::ZlibDecoder::new(Vec::new());
            decoder.write_all(data).map_err(|e| Error::decode(e.to_string()))?;
            let out = decoder.finish().map_err(|e| Error::decode(e.to_string()))?;
            Ok(Bytes::from(out))
        }
    }
}

enum StageDecoder {
    Gzip(flate2::write::GzDecoder<Vec<u8>>),
    Deflate(flate2::write::ZlibDecoder<Vec<u8>>),
}

impl StageDecoder {
    fn new(coding: ContentCoding) -> Self {
        match coding {
            ContentCoding::Gzip => StageDecoder::Gzip(flate2::write::GzDecoder::new(Vec::new())),
            ContentCoding::Deflate => {
                StageDecoder::Deflate(flate2::write::ZlibDecoder::new(Vec::new()))
            }
        }
    }

    fn feed(&mut self, input: &[u8]) -> Result<Vec<u8>, Error> {
        use std::io::Write;
        match self {
            StageDecoder::Gzip(d) => {
                d.write_all(input).map_err(|e| Error::decode(e.to_string()))?;
                Ok(std::mem::take(d.get_mut()))
            }
            StageDecoder::Deflate(d) => {
                d.write_all(input).map_err(|e| Error::decode(e.to_string()))?;
                Ok(std::mem::take(d.get_mut()))
            }
        }
    }
}

/// Incrementally decompress a stream of chunks through a pipeline of
/// content-codings (applied right-to-left per the wire order), feeding
/// each arriving chunk straight through rather than buffering the whole
/// body.
pub struct StreamingDecoder {
    stages: Vec<StageDecoder>,
}

impl StreamingDecoder {
    pub fn new(codings: &[ContentCoding]) -> Self {
        StreamingDecoder {
            stages: codings.iter().rev().map(|c| StageDecoder::new(*c)).collect(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn feed(&mut self, chunk: Bytes) -> Result<Bytes, Error> {
        if self.stages.is_empty() {
            return Ok(chunk);
        }
        let mut data = chunk.to_vec();
        for stage in &mut self.stages {
            data = stage.feed(&data)?;
        }
        Ok(Bytes::from(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn decodes_gzip_one_shot() {
        let compressed = gzip(b"Hi");
        let out = decode_all(Bytes::from(compressed), &[ContentCoding::Gzip]).unwrap();
        assert_eq!(&out[..], b"Hi");
    }

    #[test]
    fn streaming_decoder_handles_arbitrary_chunk_boundaries() {
        let compressed = gzip(b"Hello, streaming world!");
        let mut decoder = StreamingDecoder::new(&[ContentCoding::Gzip]);
        let mut out = Vec::new();
        for byte in compressed {
            let decoded = decoder.feed(Bytes::from(vec![byte])).unwrap();
            out.extend_from_slice(&decoded);
        }
        assert_eq!(out, b"Hello, streaming world!");
    }

    #[test]
    fn unknown_coding_is_an_error() {
        let mut headers = HeaderMap::new();
        headers.add("Content-Encoding", "br").unwrap();
        assert!(parse_content_encoding(&headers).is_err());
    }
}
