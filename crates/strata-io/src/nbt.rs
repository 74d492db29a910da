//! Chunk files as NBT: root compound → `"Level"` → byte array `"Blocks"`
//! of 16×128×16 bytes, Y fastest, then Z, then X.
//!
//! Structured reads go through `fastnbt`. When the tree does not
//! deserialize, the raw bytes are scanned for the `"Blocks"` tag header.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::Path;

use fastnbt::ByteArray;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use strata_blocks::BlockId;
use strata_chunk::{CHUNK_HEIGHT, CHUNK_LENGTH, CHUNK_VOLUME, CHUNK_WIDTH, LocalPos};

use crate::error::SaveError;
use crate::region::staging_path;

const BLOCKS_HEADER: [u8; 9] = [7, 0, 6, b'B', b'l', b'o', b'c', b'k', b's'];
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
/// Upper bound on an inflated chunk file.
pub const MAX_PAYLOAD: u64 = 512 * 1024;

#[derive(Serialize)]
struct ChunkFile {
    #[serde(rename = "Level")]
    level: LevelTag,
}

#[derive(Serialize)]
struct LevelTag {
    #[serde(rename = "Blocks")]
    blocks: ByteArray,
}

/// Read side: unknown tags are ignored, `Blocks` is accepted in `Level` or
/// directly under the root.
#[derive(Deserialize)]
struct ChunkFileIn {
    #[serde(rename = "Level")]
    level: Option<LevelTagIn>,
    #[serde(rename = "Blocks")]
    blocks: Option<ByteArray>,
}

#[derive(Deserialize)]
struct LevelTagIn {
    #[serde(rename = "Blocks")]
    blocks: Option<ByteArray>,
}

/// Index into the on-disk array for a chunk-local voxel.
#[inline]
fn file_index(x: usize, y: usize, z: usize) -> usize {
    y + z * CHUNK_HEIGHT + x * CHUNK_HEIGHT * CHUNK_LENGTH
}

/// Serializes blocks given in [`LocalPos::index`] order.
pub fn encode_blocks(blocks: &[BlockId]) -> Result<Vec<u8>, SaveError> {
    let mut raw = vec![0i8; CHUNK_VOLUME];
    for x in 0..CHUNK_WIDTH {
        for z in 0..CHUNK_LENGTH {
            for y in 0..CHUNK_HEIGHT {
                let src = LocalPos::new(x, y, z).index();
                raw[file_index(x, y, z)] = blocks.get(src).copied().unwrap_or(0) as i8;
            }
        }
    }
    let file = ChunkFile {
        level: LevelTag {
            blocks: ByteArray::new(raw),
        },
    };
    Ok(fastnbt::to_bytes(&file)?)
}

fn reorder_from_file(raw: &[u8]) -> Vec<BlockId> {
    let mut blocks = vec![0; CHUNK_VOLUME];
    for x in 0..CHUNK_WIDTH {
        for z in 0..CHUNK_LENGTH {
            for y in 0..CHUNK_HEIGHT {
                blocks[LocalPos::new(x, y, z).index()] = raw[file_index(x, y, z)];
            }
        }
    }
    blocks
}

fn parse_structured(data: &[u8]) -> Result<Vec<BlockId>, SaveError> {
    let file: ChunkFileIn = fastnbt::from_bytes(data)?;
    let array = file
        .level
        .and_then(|l| l.blocks)
        .or(file.blocks)
        .ok_or(SaveError::MissingBlocks)?;
    let raw: Vec<u8> = array.into_inner().into_iter().map(|b| b as u8).collect();
    if raw.len() != CHUNK_VOLUME {
        return Err(SaveError::BadLength(raw.len()));
    }
    Ok(reorder_from_file(&raw))
}

/// Finds the first `"Blocks"` header followed by a full-size array.
fn scan_for_blocks(data: &[u8]) -> Option<Vec<BlockId>> {
    let header = BLOCKS_HEADER.len();
    data.windows(header)
        .enumerate()
        .filter(|(_, w)| *w == BLOCKS_HEADER)
        .find_map(|(i, _)| {
            let len_at = i + header;
            let len = data.get(len_at..len_at + 4)?;
            if i32::from_be_bytes([len[0], len[1], len[2], len[3]]) != CHUNK_VOLUME as i32 {
                return None;
            }
            let raw = data.get(len_at + 4..len_at + 4 + CHUNK_VOLUME)?;
            Some(reorder_from_file(raw))
        })
}

/// Decodes an uncompressed payload, trying the tree first and the header
/// scan second.
pub fn decode_blocks(data: &[u8]) -> Result<Vec<BlockId>, SaveError> {
    match parse_structured(data) {
        Ok(blocks) => Ok(blocks),
        Err(err) => {
            log::debug!("structured parse failed ({err}); scanning for Blocks header");
            scan_for_blocks(data).ok_or(err)
        }
    }
}

/// Reads a chunk file, inflating it when it is gzip-framed. A damaged gzip
/// stream yields whatever inflated before the damage.
pub fn read_payload(path: &Path) -> Result<Vec<u8>, SaveError> {
    let bytes = fs::read(path)?;
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }
    let mut out = Vec::with_capacity(CHUNK_VOLUME + 32);
    let mut decoder = GzDecoder::new(bytes.as_slice()).take(MAX_PAYLOAD);
    if let Err(err) = decoder.read_to_end(&mut out) {
        if out.is_empty() {
            return Err(err.into());
        }
        log::warn!(
            "{}: gzip stream damaged after {} bytes ({err}), decoding what was recovered",
            path.display(),
            out.len()
        );
    }
    Ok(out)
}

fn write_gzip(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut enc = GzEncoder::new(File::create(path)?, Compression::default());
    enc.write_all(data)?;
    enc.finish()?.sync_all()
}

/// Encodes and gzip-writes a chunk file, creating parent folders. The data
/// goes to a staging file first and replaces `path` only once complete.
pub fn write_chunk_file(path: &Path, blocks: &[BlockId]) -> Result<(), SaveError> {
    let data = encode_blocks(blocks)?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let staging = staging_path(path);
    let written = write_gzip(&staging, &data).and_then(|()| fs::rename(&staging, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&staging);
        return Err(err.into());
    }
    Ok(())
}

/// Legacy dumps: raw bytes ordered X, then Y, then Z (Z fastest).
pub fn decode_legacy(raw: &[u8]) -> Vec<BlockId> {
    let mut blocks = vec![0; CHUNK_VOLUME];
    for (i, &b) in raw.iter().take(CHUNK_VOLUME).enumerate() {
        let z = i % CHUNK_LENGTH;
        let y = (i / CHUNK_LENGTH) % CHUNK_HEIGHT;
        let x = i / (CHUNK_LENGTH * CHUNK_HEIGHT);
        blocks[LocalPos::new(x, y, z).index()] = b;
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG_END: u8 = 0;
    const TAG_SHORT: u8 = 2;
    const TAG_INT: u8 = 3;
    const TAG_LONG: u8 = 4;
    const TAG_STRING: u8 = 8;
    const TAG_LIST: u8 = 9;
    const TAG_COMPOUND: u8 = 10;

    fn sample() -> Vec<BlockId> {
        (0..CHUNK_VOLUME).map(|i| (i * 7 % 256) as u8).collect()
    }

    fn encoded(blocks: &[BlockId]) -> Vec<u8> {
        encode_blocks(blocks).unwrap()
    }

    #[test]
    fn header_and_trailer_layout() {
        let bytes = encoded(&sample());
        assert_eq!(&bytes[..3], &[TAG_COMPOUND, 0, 0]);
        assert_eq!(&bytes[3..11], &[TAG_COMPOUND, 0, 5, b'L', b'e', b'v', b'e', b'l']);
        assert_eq!(&bytes[11..20], &BLOCKS_HEADER);
        assert_eq!(&bytes[20..24], &32768i32.to_be_bytes());
        assert_eq!(bytes.len(), 24 + CHUNK_VOLUME + 2);
        assert_eq!(&bytes[bytes.len() - 2..], &[TAG_END, TAG_END]);
    }

    #[test]
    fn y_varies_fastest_on_disk() {
        let mut blocks = vec![0; CHUNK_VOLUME];
        blocks[LocalPos::new(0, 1, 0).index()] = 9;
        blocks[LocalPos::new(0, 0, 1).index()] = 8;
        blocks[LocalPos::new(1, 0, 0).index()] = 7;
        blocks[LocalPos::new(15, 127, 15).index()] = 255;
        let bytes = encoded(&blocks);
        assert_eq!(bytes[24 + 1], 9);
        assert_eq!(bytes[24 + 128], 8);
        assert_eq!(bytes[24 + 2048], 7);
        assert_eq!(bytes[24 + CHUNK_VOLUME - 1], 255);
        assert_eq!(decode_blocks(&bytes).unwrap(), blocks);
    }

    #[test]
    fn skips_unrelated_tags_before_blocks() {
        let blocks = sample();
        let mut data = vec![TAG_COMPOUND, 0, 0];
        data.extend_from_slice(&[TAG_INT, 0, 1, b'v', 0, 0, 0, 19]);
        data.extend_from_slice(&[TAG_STRING, 0, 1, b'n', 0, 3, b'a', b'b', b'c']);
        data.extend_from_slice(&[TAG_LIST, 0, 1, b'l', TAG_SHORT, 0, 0, 0, 2, 0, 1, 0, 2]);
        data.extend_from_slice(&[TAG_COMPOUND, 0, 4, b'M', b'e', b't', b'a']);
        data.extend_from_slice(&[TAG_LONG, 0, 1, b't', 0, 0, 0, 0, 0, 0, 0, 1, TAG_END]);
        // Level compound plus both closing tags
        data.extend_from_slice(&encoded(&blocks)[3..]);
        assert_eq!(parse_structured(&data).unwrap(), blocks);
    }

    #[test]
    fn unknown_tag_falls_back_to_scanning() {
        let blocks = sample();
        let mut data = vec![TAG_COMPOUND, 0, 0, 99, 0, 0];
        data.extend_from_slice(&encoded(&blocks)[3..]);
        assert!(parse_structured(&data).is_err());
        assert_eq!(decode_blocks(&data).unwrap(), blocks);
    }

    #[test]
    fn wrong_size_and_short_data_are_errors() {
        let mut data = vec![TAG_COMPOUND, 0, 0];
        data.extend_from_slice(&BLOCKS_HEADER);
        data.extend_from_slice(&16i32.to_be_bytes());
        data.extend_from_slice(&[1; 16]);
        data.push(TAG_END);
        assert!(matches!(decode_blocks(&data), Err(SaveError::BadLength(16))));

        let full = encoded(&sample());
        assert!(matches!(decode_blocks(&full[..1000]), Err(SaveError::Nbt(_))));
        assert!(decode_blocks(&[]).is_err());
    }

    #[test]
    fn missing_blocks_is_reported() {
        let data = [TAG_COMPOUND, 0, 0, TAG_INT, 0, 1, b'v', 0, 0, 0, 1, TAG_END];
        assert!(matches!(parse_structured(&data), Err(SaveError::MissingBlocks)));
    }

    #[test]
    fn legacy_order_is_z_fastest() {
        let mut raw = vec![0u8; CHUNK_VOLUME];
        raw[1] = 5; // z = 1
        raw[16] = 6; // y = 1
        raw[16 * 128] = 7; // x = 1
        let blocks = decode_legacy(&raw);
        assert_eq!(blocks[LocalPos::new(0, 0, 1).index()], 5);
        assert_eq!(blocks[LocalPos::new(0, 1, 0).index()], 6);
        assert_eq!(blocks[LocalPos::new(1, 0, 0).index()], 7);
    }
}
