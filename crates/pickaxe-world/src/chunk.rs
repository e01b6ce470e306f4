use crate::packed_array::PackedArray;
use bytes::{BufMut, BytesMut};
use pickaxe_protocol_core::{write_varint, Protocol};

/// Number of 16x16x16 sections in a chunk column (Y = 0..15, world height 0..255).
pub const SECTION_COUNT: usize = 16;
pub const MIN_Y: i32 = 0;

const AIR: &str = "minecraft:air";
const DIRECT_BITS: u8 = 14;
const DIRECT_THRESHOLD_BITS: u8 = 8;

/// An ordered, deduplicated list of block names plus the packed indices into
/// it for all 4096 positions in a section.
pub struct ChunkSection {
    palette: Vec<String>,
    data: PackedArray,
}

impl ChunkSection {
    pub fn empty() -> Self {
        Self {
            palette: vec![AIR.to_string()],
            data: PackedArray::new(4, 4096),
        }
    }

    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    pub fn bits_per_value(&self) -> u8 {
        self.data.bits_per_value()
    }

    pub fn is_empty(&self) -> bool {
        self.palette.len() == 1 && self.palette[0] == AIR
    }

    /// Section-local linear index, per §4.7: `((y & 15) << 8) | (z << 4) | x`.
    pub fn index_of(x: usize, y: usize, z: usize) -> usize {
        ((y & 15) << 8) | (z << 4) | x
    }

    /// Append `name` to the palette if not already present, raising the
    /// backing packed array's width if the new palette size demands it.
    fn get_or_add(&mut self, name: &str) -> usize {
        if let Some(idx) = self.palette.iter().position(|p| p == name) {
            return idx;
        }
        self.palette.push(name.to_string());
        let needed = bits_for_palette(self.palette.len());
        if needed > self.data.bits_per_value() {
            self.data = self.data.resized(needed);
        }
        self.palette.len() - 1
    }

    pub fn get_block(&self, x: usize, y: usize, z: usize) -> &str {
        let idx = self.data.get(Self::index_of(x, y, z)) as usize;
        self.palette
            .get(idx)
            .map(String::as_str)
            .unwrap_or(AIR)
    }

    pub fn set_block(&mut self, x: usize, y: usize, z: usize, name: &str) {
        let palette_idx = self.get_or_add(name);
        self.data.set(Self::index_of(x, y, z), palette_idx as u64);
    }

    /// Serialize this section's paletted container for the chunk-data wire
    /// format, resolving block names to global ids for `proto` when the
    /// palette has overflowed into direct encoding.
    fn write_to(&self, proto: Protocol, buf: &mut BytesMut) {
        buf.put_i16(4096);
        let bits = self.data.bits_per_value();
        buf.put_u8(bits);

        if bits < DIRECT_BITS {
            write_varint(buf, self.palette.len() as i32);
            for name in &self.palette {
                write_varint(buf, pickaxe_data::global_id(name, proto));
            }
            write_varint(buf, self.data.words().len() as i32);
            for &word in self.data.words() {
                buf.put_i64(word as i64);
            }
        } else {
            let mut direct = PackedArray::new(DIRECT_BITS, 4096);
            for i in 0..4096 {
                let local_idx = self.data.get(i) as usize;
                let name = self.palette.get(local_idx).map(String::as_str).unwrap_or(AIR);
                direct.set(i, pickaxe_data::global_id(name, proto) as u64);
            }
            write_varint(buf, direct.words().len() as i32);
            for &word in direct.words() {
                buf.put_i64(word as i64);
            }
        }
    }
}

/// `ceil(log2(palette_size))`, clamped to `[4, 8]`; anything past 8 jumps
/// straight to the 14-bit direct global-id encoding.
fn bits_for_palette(palette_size: usize) -> u8 {
    if palette_size <= 1 {
        return 4;
    }
    let bits = (usize::BITS - (palette_size - 1).leading_zeros()) as u8;
    let bits = bits.max(4);
    if bits > DIRECT_THRESHOLD_BITS {
        DIRECT_BITS
    } else {
        bits
    }
}

/// A chunk column: 16 lazily-populated sections.
pub struct Chunk {
    sections: Vec<Option<ChunkSection>>,
}

impl Chunk {
    pub fn new() -> Self {
        Self {
            sections: (0..SECTION_COUNT).map(|_| None).collect(),
        }
    }

    pub fn section(&self, index: usize) -> Option<&ChunkSection> {
        self.sections[index].as_ref()
    }

    pub fn set_block(&mut self, x: usize, y: usize, z: usize, name: &str) {
        let section_idx = y / 16;
        let section = self.sections[section_idx].get_or_insert_with(ChunkSection::empty);
        section.set_block(x, y % 16, z, name);
    }

    pub fn get_block(&self, x: usize, y: usize, z: usize) -> &str {
        let section_idx = y / 16;
        match &self.sections[section_idx] {
            Some(section) => section.get_block(x, y % 16, z),
            None => AIR,
        }
    }

    /// The bitmask of non-empty (not all-air) sections, bit i set for
    /// section i, per §4.7's `SendChunks`.
    pub fn section_mask(&self) -> u32 {
        let mut mask = 0u32;
        for (i, section) in self.sections.iter().enumerate() {
            let non_empty = section.as_ref().is_some_and(|s| !s.is_empty());
            if non_empty {
                mask |= 1 << i;
            }
        }
        mask
    }

    /// Serialize every non-empty section's paletted container, in section
    /// order, for `proto`.
    pub fn serialize_sections(&self, proto: Protocol) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for section in self.sections.iter().flatten() {
            if !section.is_empty() {
                section.write_to(proto, &mut buf);
            }
        }
        buf.to_vec()
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickaxe_protocol_core::{V1_16_4, V1_8};

    #[test]
    fn empty_chunk_has_no_non_empty_sections() {
        let chunk = Chunk::new();
        assert_eq!(chunk.section_mask(), 0);
        assert!(chunk.serialize_sections(V1_8).is_empty());
    }

    #[test]
    fn set_and_get_block_round_trips() {
        let mut chunk = Chunk::new();
        chunk.set_block(3, 70, 9, "minecraft:stone");
        assert_eq!(chunk.get_block(3, 70, 9), "minecraft:stone");
        assert_eq!(chunk.get_block(0, 0, 0), "minecraft:air");
    }

    #[test]
    fn section_mask_reflects_touched_sections() {
        let mut chunk = Chunk::new();
        chunk.set_block(0, 20, 0, "minecraft:dirt"); // section 1
        chunk.set_block(0, 200, 0, "minecraft:dirt"); // section 12
        assert_eq!(chunk.section_mask(), (1 << 1) | (1 << 12));
    }

    #[test]
    fn palette_growth_raises_bits_per_value() {
        let mut section = ChunkSection::empty();
        assert_eq!(section.bits_per_value(), 4);
        for i in 0..20 {
            section.set_block(i % 16, 0, i / 16, &format!("minecraft:test_block_{i}"));
        }
        assert!(section.bits_per_value() >= 5);
    }

    #[test]
    fn overflowing_the_indirect_palette_switches_to_direct_encoding() {
        let mut section = ChunkSection::empty();
        for i in 0..300 {
            let x = i % 16;
            let z = (i / 16) % 16;
            let y = i / 256;
            section.set_block(x, y, z, &format!("minecraft:test_block_{i}"));
        }
        assert_eq!(section.bits_per_value(), DIRECT_BITS);
    }

    #[test]
    fn section_serializes_with_global_ids_for_the_requested_protocol() {
        let mut section = ChunkSection::empty();
        section.set_block(0, 0, 0, "minecraft:dirt");
        let old = section.write_to_vec(V1_8);
        let new = section.write_to_vec(V1_16_4);
        assert_ne!(old, new);
    }

    impl ChunkSection {
        fn write_to_vec(&self, proto: Protocol) -> Vec<u8> {
            let mut buf = BytesMut::new();
            self.write_to(proto, &mut buf);
            buf.to_vec()
        }
    }
}
