//! Per-track content encodings (§4.8): zlib, bzlib, LZO1X
//! (compress-only) and header removal, applied in `order`.
//!
//! On read, payloads are transformed innermost-to-outermost (highest
//! `order` first); on write, outermost-to-innermost. Grounded in the
//! teacher's use of `thiserror` leaf errors composed at the boundary.

use std::io::{Read, Write};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentEncodingError {
    #[error("zlib error: {0}")]
    Zlib(#[from] std::io::Error),
    #[error("bzlib compression failed")]
    Bzip2Compress,
    #[error("bzlib decompression failed")]
    Bzip2Decompress,
    #[error("LZO1X compression failed")]
    Lzo,
    #[error("LZO1X decompression is not supported (compress-only per spec)")]
    LzoDecompressUnsupported,
    #[error("content encoding type {0} is not supported; track dropped")]
    UnknownType(u64),
    #[error("encryption (type 1) is recognized but not supported; track dropped")]
    EncryptionUnsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionAlgo {
    Zlib,
    Bzlib,
    Lzo1x,
    HeaderRemoval,
}

#[derive(Debug, Clone)]
pub struct ContentEncoding {
    pub order: u64,
    pub algo: CompressionAlgo,
    /// For `HeaderRemoval`, the constant prefix bytes stripped on write
    /// and re-prepended on read.
    pub settings: Vec<u8>,
}

impl ContentEncoding {
    /// Transforms a payload when extracting (reading): each encoding
    /// undoes its own transform.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<u8>, ContentEncodingError> {
        match self.algo {
            CompressionAlgo::Zlib => {
                use flate2::read::ZlibDecoder;
                let mut decoder = ZlibDecoder::new(data);
                let mut out = Vec::new();
                decoder.read_to_end(&mut out)?;
                Ok(out)
            }
            CompressionAlgo::Bzlib => {
                use bzip2::read::BzDecoder;
                let mut decoder = BzDecoder::new(data);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|_| ContentEncodingError::Bzip2Decompress)?;
                Ok(out)
            }
            CompressionAlgo::Lzo1x => Err(ContentEncodingError::LzoDecompressUnsupported),
            CompressionAlgo::HeaderRemoval => {
                let mut out = Vec::with_capacity(self.settings.len() + data.len());
                out.extend_from_slice(&self.settings);
                out.extend_from_slice(data);
                Ok(out)
            }
        }
    }

    /// Transforms a payload when muxing (writing).
    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>, ContentEncodingError> {
        match self.algo {
            CompressionAlgo::Zlib => {
                use flate2::write::ZlibEncoder;
                use flate2::Compression;

                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
            CompressionAlgo::Bzlib => {
                use bzip2::write::BzEncoder;
                use bzip2::Compression;

                let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
                encoder
                    .write_all(data)
                    .map_err(|_| ContentEncodingError::Bzip2Compress)?;
                encoder.finish().map_err(|_| ContentEncodingError::Bzip2Compress)
            }
            CompressionAlgo::Lzo1x => {
                lzokay::compress::compress(data, lzokay::compress::CompressLevel::L9)
                    .map_err(|_| ContentEncodingError::Lzo)
            }
            CompressionAlgo::HeaderRemoval => {
                if data.len() < self.settings.len() || data[..self.settings.len()] != self.settings[..] {
                    return Ok(data.to_vec());
                }
                Ok(data[self.settings.len()..].to_vec())
            }
        }
    }
}

/// A track's ordered encoding chain (§3 "Track entry": "ContentEncodings
/// chain, ordered by `order`").
#[derive(Debug, Clone, Default)]
pub struct ContentEncodingChain {
    encodings: Vec<ContentEncoding>,
}

impl ContentEncodingChain {
    pub fn new(mut encodings: Vec<ContentEncoding>) -> Self {
        encodings.sort_by_key(|e| e.order);
        ContentEncodingChain { encodings }
    }

    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }

    pub fn encodings(&self) -> &[ContentEncoding] {
        &self.encodings
    }

    /// Applies the chain innermost-to-outermost (highest order first),
    /// as when extracting a packet payload for reading.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<u8>, ContentEncodingError> {
        let mut data = data.to_vec();
        for encoding in self.encodings.iter().rev() {
            data = encoding.decode(&data)?;
        }
        Ok(data)
    }

    /// Applies the chain outermost-to-innermost, as when muxing a
    /// packet payload for writing.
    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>, ContentEncodingError> {
        let mut data = data.to_vec();
        for encoding in &self.encodings {
            data = encoding.encode(&data)?;
        }
        Ok(data)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zlib_round_trips() {
        let encoding = ContentEncoding {
            order: 0,
            algo: CompressionAlgo::Zlib,
            settings: Vec::new(),
        };

        let original = b"matroska cluster payload".repeat(4);
        let compressed = encoding.encode(&original).unwrap();
        let decompressed = encoding.decode(&compressed).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn bzlib_round_trips() {
        let encoding = ContentEncoding {
            order: 0,
            algo: CompressionAlgo::Bzlib,
            settings: Vec::new(),
        };

        let original = b"matroska cluster payload".repeat(4);
        let compressed = encoding.encode(&original).unwrap();
        let decompressed = encoding.decode(&compressed).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn header_removal_round_trips() {
        let encoding = ContentEncoding {
            order: 0,
            algo: CompressionAlgo::HeaderRemoval,
            settings: vec![0xDE, 0xAD, 0xBE, 0xEF],
        };

        let original = b"payload bytes".to_vec();
        let written = encoding.encode(&original).unwrap();
        assert_eq!(written, original[..]); // prefix was stripped.

        let read_back = encoding.decode(&written).unwrap();
        assert_eq!(read_back, [&[0xDE, 0xAD, 0xBE, 0xEF][..], &original[..]].concat());
    }

    #[test]
    fn chain_applies_outermost_to_innermost_on_encode() {
        let chain = ContentEncodingChain::new(vec![
            ContentEncoding {
                order: 1,
                algo: CompressionAlgo::HeaderRemoval,
                settings: vec![0xAA],
            },
            ContentEncoding {
                order: 0,
                algo: CompressionAlgo::Zlib,
                settings: Vec::new(),
            },
        ]);

        let original = b"hello world".to_vec();
        let encoded = chain.encode(&original).unwrap();
        let decoded = chain.decode(&encoded).unwrap();

        assert_eq!(decoded, original);
    }

    #[test]
    fn lzo_is_compress_only() {
        let encoding = ContentEncoding {
            order: 0,
            algo: CompressionAlgo::Lzo1x,
            settings: Vec::new(),
        };

        let compressed = encoding.encode(b"lzo payload").unwrap();
        assert!(!compressed.is_empty());
        assert!(matches!(
            encoding.decode(&compressed),
            Err(ContentEncodingError::LzoDecompressUnsupported)
        ));
    }
}
