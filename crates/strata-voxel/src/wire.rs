//! Wire codec for the chunk-data section array.
//!
//! The payload is the concatenation of `section_count` sections in ascending
//! section-Y order. Each section carries a big-endian `i16` solid-block count
//! followed by two paletted containers (block states, then biomes):
//!
//! | Field | Encoding |
//! |---|---|
//! | bits per entry | `u8`; 0 = single value, ≤ max indirect = palette, else direct |
//! | single value | varint (only when bits per entry is 0) |
//! | palette | varint length + that many varints (indirect only) |
//! | data length | varint word count |
//! | data | big-endian `u64` words, entries packed low-bits-first |
//!
//! Varints are unsigned LEB128, at most 5 bytes. Every error carries the byte
//! offset it was detected at.

use crate::packed::PackedArray;
use crate::paletted::{PaletteLayout, PalettedContainer};
use crate::profile::VersionProfile;
use crate::section::Section;

/// Errors produced while decoding a chunk payload.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The buffer ended before the field at `offset` was complete.
    #[error("unexpected end of buffer at byte {offset} ({needed} more bytes needed)")]
    UnexpectedEof {
        /// Offset of the truncated field.
        offset: usize,
        /// Bytes missing to complete it.
        needed: usize,
    },
    /// A varint ran past the 5-byte limit.
    #[error("varint at byte {offset} exceeds 5 bytes")]
    VarIntTooLong {
        /// Offset of the first varint byte.
        offset: usize,
    },
    /// The bits-per-entry byte is above the wire maximum of 32.
    #[error("bits per entry {bits} at byte {offset} is unsupported")]
    InvalidBitsPerEntry {
        /// The rejected width.
        bits: u8,
        /// Offset of the width byte.
        offset: usize,
    },
    /// An indirect palette length is zero or exceeds the container capacity.
    #[error("palette length {len} at byte {offset} is invalid")]
    InvalidPaletteLength {
        /// The rejected length.
        len: usize,
        /// Offset of the length varint.
        offset: usize,
    },
    /// A single-value container declared a non-zero data length.
    #[error("single-value container at byte {offset} carries {words} data words")]
    SingleValueWithData {
        /// Declared word count.
        words: usize,
        /// Offset of the word-count varint.
        offset: usize,
    },
    /// The declared word count does not match the container geometry.
    #[error("data length {actual} at byte {offset}, expected {expected} words")]
    WordCountMismatch {
        /// Declared word count.
        actual: usize,
        /// Count required by the width and capacity.
        expected: usize,
        /// Offset of the word-count varint.
        offset: usize,
    },
    /// A packed entry indexes past the end of the palette.
    #[error("palette index {index} out of range for palette of {len} (container at byte {offset})")]
    PaletteIndexOutOfRange {
        /// The offending index value.
        index: usize,
        /// Palette length.
        len: usize,
        /// Offset of the container's width byte.
        offset: usize,
    },
}

/// A bounds-checked cursor over a wire buffer.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Wraps a buffer with the cursor at byte 0.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Bytes left in the buffer.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < count {
            return Err(WireError::UnexpectedEof {
                offset: self.pos,
                needed: count - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    /// Reads a big-endian `i16`.
    pub fn read_i16_be(&mut self) -> Result<i16, WireError> {
        let bytes = self.take(2)?;
        Ok(i16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a big-endian `u64`.
    pub fn read_u64_be(&mut self) -> Result<u64, WireError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads an unsigned LEB128 varint of at most 5 bytes.
    pub fn read_varint(&mut self) -> Result<u32, WireError> {
        let start = self.pos;
        let mut value: u32 = 0;
        for group in 0..5 {
            let byte = self.read_u8()?;
            value |= u32::from(byte & 0x7F).wrapping_shl(group * 7);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(WireError::VarIntTooLong { offset: start })
    }
}

/// Parses a full section array into column section slots.
///
/// Sections whose containers are both single-value zero are returned as
/// `None`: reads on an absent section are defined to produce the same values,
/// so nothing is lost by not materializing them. Trailing bytes beyond the
/// final section are ignored.
pub fn parse_column(
    buf: &[u8],
    profile: &VersionProfile,
) -> Result<Vec<Option<Section>>, WireError> {
    let block_layout = PaletteLayout::blocks(profile);
    let biome_layout = PaletteLayout::biomes(profile);
    let mut reader = Reader::new(buf);
    let mut sections = Vec::with_capacity(profile.section_count);

    for _ in 0..profile.section_count {
        // The wire solid count is consumed but not trusted; the count is
        // recomputed from the decoded blocks.
        let _solid = reader.read_i16_be()?;
        let blocks = parse_container(&mut reader, block_layout)?;
        let biomes = parse_container(&mut reader, biome_layout)?;

        let all_air = blocks.is_single() && blocks.get(0) == 0;
        let uniform_biome_zero = biomes.is_single() && biomes.get(0) == 0;
        if all_air && uniform_biome_zero {
            sections.push(None);
        } else {
            sections.push(Some(Section::from_parsed(blocks, biomes)));
        }
    }

    if reader.remaining() > 0 {
        tracing::trace!(
            trailing = reader.remaining(),
            "ignoring trailing bytes after section array"
        );
    }
    Ok(sections)
}

/// Parses one paletted container.
pub fn parse_container(
    reader: &mut Reader<'_>,
    layout: PaletteLayout,
) -> Result<PalettedContainer, WireError> {
    let container_offset = reader.offset();
    let bits = reader.read_u8()?;

    if bits == 0 {
        let value = reader.read_varint()?;
        let words_offset = reader.offset();
        let words = reader.read_varint()? as usize;
        if words != 0 {
            return Err(WireError::SingleValueWithData {
                words,
                offset: words_offset,
            });
        }
        return Ok(PalettedContainer::single(layout, value));
    }

    if bits <= layout.max_indirect_bits {
        let len_offset = reader.offset();
        let len = reader.read_varint()? as usize;
        // A palette longer than the width can index is as malformed as an
        // empty one.
        if len == 0 || len > layout.capacity || len > 1 << bits {
            return Err(WireError::InvalidPaletteLength {
                len,
                offset: len_offset,
            });
        }
        let mut palette = Vec::with_capacity(len);
        for _ in 0..len {
            palette.push(reader.read_varint()?);
        }
        let data = read_packed(reader, bits, layout.capacity)?;
        for index in data.iter() {
            if index as usize >= len {
                return Err(WireError::PaletteIndexOutOfRange {
                    index: index as usize,
                    len,
                    offset: container_offset,
                });
            }
        }
        return Ok(PalettedContainer::from_parsed_indirect(
            layout, palette, data,
        ));
    }

    if bits <= 32 {
        let data = read_packed(reader, bits, layout.capacity)?;
        return Ok(PalettedContainer::from_parsed_direct(layout, data));
    }

    Err(WireError::InvalidBitsPerEntry {
        bits,
        offset: container_offset,
    })
}

fn read_packed(reader: &mut Reader<'_>, bits: u8, len: usize) -> Result<PackedArray, WireError> {
    let count_offset = reader.offset();
    let actual = reader.read_varint()? as usize;
    let expected = PackedArray::word_count(bits, len);
    if actual != expected {
        return Err(WireError::WordCountMismatch {
            actual,
            expected,
            offset: count_offset,
        });
    }
    let mut words = Vec::with_capacity(actual);
    for _ in 0..actual {
        words.push(reader.read_u64_be()?);
    }
    Ok(PackedArray::from_words(bits, len, words))
}

/// Appends an unsigned LEB128 varint.
pub fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Encodes one paletted container in wire layout.
pub fn encode_container(container: &PalettedContainer, out: &mut Vec<u8>) {
    match (container.palette(), container.packed()) {
        (Some(palette), None) => {
            // Single value.
            out.push(0);
            write_varint(out, palette[0]);
            write_varint(out, 0);
        }
        (Some(palette), Some(data)) => {
            out.push(data.bits());
            write_varint(out, palette.len() as u32);
            for &id in palette {
                write_varint(out, id);
            }
            write_varint(out, data.words().len() as u32);
            for &word in data.words() {
                out.extend_from_slice(&word.to_be_bytes());
            }
        }
        (None, Some(data)) => {
            out.push(data.bits());
            write_varint(out, data.words().len() as u32);
            for &word in data.words() {
                out.extend_from_slice(&word.to_be_bytes());
            }
        }
        (None, None) => unreachable!("container is single, indirect, or direct"),
    }
}

/// Encodes one section slot; an absent section encodes as all-air.
pub fn encode_section(
    section: Option<&Section>,
    block_layout: PaletteLayout,
    biome_layout: PaletteLayout,
    out: &mut Vec<u8>,
) {
    match section {
        Some(section) => {
            out.extend_from_slice(&(section.solid_count() as i16).to_be_bytes());
            encode_container(section.blocks(), out);
            encode_container(section.biomes(), out);
        }
        None => {
            out.extend_from_slice(&0i16.to_be_bytes());
            encode_container(&PalettedContainer::single(block_layout, 0), out);
            encode_container(&PalettedContainer::single(biome_layout, 0), out);
        }
    }
}

/// Encodes a full section array, the inverse of [`parse_column`].
pub fn encode_column(sections: &[Option<Section>], profile: &VersionProfile) -> Vec<u8> {
    let block_layout = PaletteLayout::blocks(profile);
    let biome_layout = PaletteLayout::biomes(profile);
    let mut out = Vec::new();
    for slot in sections {
        encode_section(slot.as_ref(), block_layout, biome_layout, &mut out);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
