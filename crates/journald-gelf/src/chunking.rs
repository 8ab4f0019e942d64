// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! GELF chunked UDP framing.
//!
//! A payload that fits in one datagram is sent as is. Larger payloads are split
//! into at most 128 chunks, each prefixed with a 12 byte header:
//!
//! ```text
//! | 0x1e 0x0f | message id (8 bytes) | sequence number (1) | sequence count (1) | data |
//! ```
//!
//! The collector reassembles chunks sharing a message id, in any order, and drops
//! the whole message if one chunk never arrives.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::errors::TransportError;

pub const GELF_MAX_TOTAL_CHUNKS: usize = 128;
pub const GELF_CHUNK_HEADERS_LENGTH: usize = 12;
pub const GELF_MAGIC_BYTES: [u8; 2] = [0x1e, 0x0f];

#[derive(Clone, Debug)]
pub struct GelfChunker {
    /// Max datagram size, headers included. Must be larger than
    /// [`GELF_CHUNK_HEADERS_LENGTH`]; the configuration layer enforces it.
    pub max_chunk_size: usize,
}

impl GelfChunker {
    #[must_use]
    pub fn new(max_chunk_size: usize) -> Self {
        Self { max_chunk_size }
    }

    /// Splits `payload` into datagrams, using a fresh random message id.
    pub fn chunk(&self, payload: Bytes) -> Result<Vec<Bytes>, TransportError> {
        self.chunk_with_id(payload, rand::random::<u64>())
    }

    /// Splits `payload` into datagrams tagged with `message_id`.
    pub fn chunk_with_id(
        &self,
        payload: Bytes,
        message_id: u64,
    ) -> Result<Vec<Bytes>, TransportError> {
        if payload.len() <= self.max_chunk_size {
            return Ok(vec![payload]);
        }

        let chunk_size = self.max_chunk_size - GELF_CHUNK_HEADERS_LENGTH;
        let chunk_count = payload.len().div_ceil(chunk_size);

        trace!(
            message_id = message_id,
            chunk_count = chunk_count,
            chunk_size = chunk_size,
            "Generating chunks for GELF."
        );

        if chunk_count > GELF_MAX_TOTAL_CHUNKS {
            return Err(TransportError::TooManyChunks {
                count: chunk_count,
                max: GELF_MAX_TOTAL_CHUNKS,
            });
        }

        // chunk_count <= 128, so both header bytes fit in a u8.
        let sequence_count = chunk_count as u8;
        let chunks = payload
            .chunks(chunk_size)
            .enumerate()
            .map(|(i, data)| {
                let mut datagram = BytesMut::with_capacity(GELF_CHUNK_HEADERS_LENGTH + data.len());
                datagram.put_slice(&GELF_MAGIC_BYTES);
                datagram.put_u64(message_id);
                datagram.put_u8(i as u8);
                datagram.put_u8(sequence_count);
                datagram.put_slice(data);
                datagram.freeze()
            })
            .collect();
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_gelf_chunker_noop() {
        let chunker = GelfChunker::new(8192);
        let input = Bytes::from("1234123412341234123");
        let chunks = chunker.chunk(input.clone()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], input);
    }

    #[test]
    fn test_gelf_chunker_exact_fit_is_not_chunked() {
        let chunker = GelfChunker::new(19);
        let input = Bytes::from("1234123412341234123");
        let chunks = chunker.chunk(input.clone()).unwrap();
        assert_eq!(chunks, vec![input]);
    }

    #[test]
    fn test_gelf_chunker_chunk() {
        let chunker = GelfChunker::new(GELF_CHUNK_HEADERS_LENGTH + 4);
        // Input for 5 chunks of 4 bytes: [1234] [1234] [1234] [1234] [123]
        let input = Bytes::from("1234123412341234123");
        let chunks = chunker.chunk_with_id(input, 0x0102_0304_0506_0708).unwrap();
        assert_eq!(chunks.len(), 5);

        for (i, chunk) in chunks.iter().enumerate() {
            if i < 4 {
                assert_eq!(chunk.len(), GELF_CHUNK_HEADERS_LENGTH + 4);
                assert_eq!(&chunk[GELF_CHUNK_HEADERS_LENGTH..], b"1234");
            } else {
                assert_eq!(chunk.len(), GELF_CHUNK_HEADERS_LENGTH + 3);
                assert_eq!(&chunk[GELF_CHUNK_HEADERS_LENGTH..], b"123");
            }
            // Bytes 0 and 1: Magic bytes
            assert_eq!(chunk[0..2], GELF_MAGIC_BYTES);
            // Bytes 2 to 9: Message id, big endian
            assert_eq!(chunk[2..10], [1, 2, 3, 4, 5, 6, 7, 8]);
            // Byte 10: Sequence number
            assert_eq!(chunk[10], i as u8);
            // Byte 11: Sequence count
            assert_eq!(chunk[11], 5);
        }
    }

    #[test]
    fn test_gelf_chunker_random_ids_differ() {
        let chunker = GelfChunker::new(GELF_CHUNK_HEADERS_LENGTH + 4);
        let first = chunker.chunk(Bytes::from("1234123412341234123")).unwrap();
        let second = chunker.chunk(Bytes::from("1234123412341234123")).unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 5);
        assert_eq!(first[0][2..10], first[4][2..10]);
        assert_ne!(first[0][2..10], second[0][2..10]);
    }

    #[test]
    fn test_gelf_chunker_max() {
        let chunker = GelfChunker::new(GELF_CHUNK_HEADERS_LENGTH + 100);
        let input = Bytes::from(vec![7u8; 100 * 128]);
        let chunks = chunker.chunk(input).unwrap();
        assert_eq!(chunks.len(), 128);
        assert_eq!(chunks[127][10], 127);
        assert_eq!(chunks[127][11], 128);
    }

    #[test]
    fn test_gelf_chunker_too_many_chunks() {
        let chunker = GelfChunker::new(GELF_CHUNK_HEADERS_LENGTH + 100);
        let input = Bytes::from(vec![7u8; 100 * 128 + 1]);
        let err = chunker.chunk(input).unwrap_err();
        assert!(matches!(
            err,
            TransportError::TooManyChunks {
                count: 129,
                max: 128
            }
        ));
    }

    proptest! {
        #[test]
        fn prop_chunk_count_and_reassembly(
            payload in proptest::collection::vec(any::<u8>(), 1..4096),
            max_chunk_size in (GELF_CHUNK_HEADERS_LENGTH + 1)..512,
        ) {
            let chunker = GelfChunker::new(max_chunk_size);
            let size = payload.len();
            let result = chunker.chunk(Bytes::from(payload.clone()));

            if size <= max_chunk_size {
                let chunks = result.unwrap();
                prop_assert_eq!(chunks.len(), 1);
                prop_assert_eq!(&chunks[0][..], &payload[..]);
            } else {
                let expected = size.div_ceil(max_chunk_size - GELF_CHUNK_HEADERS_LENGTH);
                if expected > GELF_MAX_TOTAL_CHUNKS {
                    prop_assert!(result.is_err());
                } else {
                    let chunks = result.unwrap();
                    prop_assert_eq!(chunks.len(), expected);
                    let id = &chunks[0][2..10];
                    let mut reassembled = Vec::with_capacity(size);
                    for (i, chunk) in chunks.iter().enumerate() {
                        prop_assert!(chunk.len() <= max_chunk_size);
                        prop_assert_eq!(&chunk[0..2], &GELF_MAGIC_BYTES[..]);
                        prop_assert_eq!(&chunk[2..10], id);
                        prop_assert_eq!(chunk[10] as usize, i);
                        prop_assert_eq!(chunk[11] as usize, expected);
                        reassembled.extend_from_slice(&chunk[GELF_CHUNK_HEADERS_LENGTH..]);
                    }
                    prop_assert_eq!(reassembled, payload);
                }
            }
        }
    }
}
