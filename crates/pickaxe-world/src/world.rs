use crate::chunk::Chunk;
use pickaxe_types::ChunkPos;
use std::collections::HashMap;

/// A named world: a sparse collection of chunk columns, lazily allocated on
/// first touch.
pub struct World {
    pub name: String,
    chunks: HashMap<(i32, i32), Chunk>,
}

impl World {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chunks: HashMap::new(),
        }
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<&Chunk> {
        self.chunks.get(&(pos.x, pos.z))
    }

    pub fn chunk_mut(&mut self, pos: ChunkPos) -> &mut Chunk {
        self.chunks.entry((pos.x, pos.z)).or_insert_with(Chunk::new)
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Route `(x, y, z)` to its chunk, section, and local coordinates and set
    /// the block there, per §4.7.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, name: &str) {
        let chunk_pos = ChunkPos { x: x >> 4, z: z >> 4 };
        let local_x = (x & 15) as usize;
        let local_z = (z & 15) as usize;
        let local_y = y.clamp(0, crate::chunk::SECTION_COUNT as i32 * 16 - 1) as usize;
        self.chunk_mut(chunk_pos).set_block(local_x, local_y, local_z, name);
    }

    pub fn get_block(&self, x: i32, y: i32, z: i32) -> &str {
        let chunk_pos = (x >> 4, z >> 4);
        let Some(chunk) = self.chunks.get(&chunk_pos) else {
            return "minecraft:air";
        };
        let local_x = (x & 15) as usize;
        let local_z = (z & 15) as usize;
        let local_y = y.clamp(0, crate::chunk::SECTION_COUNT as i32 * 16 - 1) as usize;
        chunk.get_block(local_x, local_y, local_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_block_allocates_its_chunk_lazily() {
        let mut world = World::new("world");
        assert_eq!(world.chunk_count(), 0);
        world.set_block(20, 64, -5, "minecraft:stone");
        assert_eq!(world.chunk_count(), 1);
        assert_eq!(world.get_block(20, 64, -5), "minecraft:stone");
    }

    #[test]
    fn blocks_in_different_chunks_do_not_collide() {
        let mut world = World::new("world");
        world.set_block(0, 70, 0, "minecraft:dirt");
        world.set_block(16, 70, 0, "minecraft:stone");
        assert_eq!(world.get_block(0, 70, 0), "minecraft:dirt");
        assert_eq!(world.get_block(16, 70, 0), "minecraft:stone");
    }

    #[test]
    fn unloaded_chunk_reads_as_air() {
        let world = World::new("world");
        assert_eq!(world.get_block(500, 64, 500), "minecraft:air");
    }
}
