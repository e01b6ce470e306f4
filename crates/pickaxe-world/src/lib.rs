pub mod chunk;
pub mod packed_array;
pub mod schematic;
pub mod world;

pub use chunk::{Chunk, ChunkSection};
pub use packed_array::PackedArray;
pub use world::World;
