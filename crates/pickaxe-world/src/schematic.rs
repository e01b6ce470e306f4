use crate::world::World;
use anyhow::{bail, Context, Result};
use pickaxe_nbt::NbtValue;
use pickaxe_protocol_core::read_varint;
use std::collections::HashMap;

/// Load a gzipped NBT schematic (Width/Height/Length, a `Palette` compound of
/// `name -> local id`, and a `BlockData` byte array of VarInt-encoded palette
/// indices in Y/Z/X order) and stamp every voxel into `world` at `(x, y, z)`.
pub fn load_into(world: &mut World, data: &[u8]) -> Result<()> {
    let (_name, root) = pickaxe_nbt::read_compressed(data).context("reading schematic NBT")?;
    let NbtValue::Compound(entries) = root else {
        bail!("schematic root is not a compound");
    };
    let fields: HashMap<&str, &NbtValue> =
        entries.iter().map(|(k, v)| (k.as_str(), v)).collect();

    let width = short(&fields, "Width")?;
    let height = short(&fields, "Height")?;
    let length = short(&fields, "Length")?;

    let palette = match fields.get("Palette") {
        Some(NbtValue::Compound(entries)) => entries
            .iter()
            .map(|(name, value)| {
                let NbtValue::Int(id) = value else {
                    bail!("palette entry {name} is not an int");
                };
                Ok((*id, name.clone()))
            })
            .collect::<Result<HashMap<i32, String>>>()?,
        _ => bail!("schematic is missing its Palette compound"),
    };

    let block_data = match fields.get("BlockData") {
        Some(NbtValue::ByteArray(bytes)) => bytes,
        _ => bail!("schematic is missing its BlockData byte array"),
    };

    let mut buf = bytes::BytesMut::from(
        block_data
            .iter()
            .map(|&b| b as u8)
            .collect::<Vec<u8>>()
            .as_slice(),
    );

    let volume = width as usize * height as usize * length as usize;
    for i in 0..volume {
        let local_id = read_varint(&mut buf).context("reading schematic block data")?;
        let name = palette
            .get(&local_id)
            .with_context(|| format!("block data references unknown palette id {local_id}"))?;
        let x = (i % width as usize) as i32;
        let z = ((i / width as usize) % length as usize) as i32;
        let y = (i / (width as usize * length as usize)) as i32;
        world.set_block(x, y, z, name);
    }

    Ok(())
}

fn short(fields: &HashMap<&str, &NbtValue>, key: &str) -> Result<i16> {
    match fields.get(key) {
        Some(NbtValue::Short(v)) => Ok(*v),
        _ => bail!("schematic is missing its {key} field"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use pickaxe_nbt::write_compressed;

    fn sample_schematic() -> Vec<u8> {
        let mut data = BytesMut::new();
        pickaxe_protocol_core::write_varint(&mut data, 0); // air
        pickaxe_protocol_core::write_varint(&mut data, 1); // stone
        pickaxe_protocol_core::write_varint(&mut data, 0);
        pickaxe_protocol_core::write_varint(&mut data, 1);

        let root = NbtValue::Compound(vec![
            ("Width".to_string(), NbtValue::Short(2)),
            ("Height".to_string(), NbtValue::Short(1)),
            ("Length".to_string(), NbtValue::Short(2)),
            (
                "Palette".to_string(),
                NbtValue::Compound(vec![
                    ("minecraft:air".to_string(), NbtValue::Int(0)),
                    ("minecraft:stone".to_string(), NbtValue::Int(1)),
                ]),
            ),
            (
                "BlockData".to_string(),
                NbtValue::ByteArray(data.iter().map(|&b| b as i8).collect()),
            ),
        ]);
        write_compressed("Schematic", &root).unwrap()
    }

    #[test]
    fn loads_a_small_schematic_into_the_world() {
        let mut world = World::new("world");
        load_into(&mut world, &sample_schematic()).unwrap();
        assert_eq!(world.get_block(0, 0, 0), "minecraft:air");
        assert_eq!(world.get_block(1, 0, 0), "minecraft:stone");
        assert_eq!(world.get_block(0, 0, 1), "minecraft:air");
        assert_eq!(world.get_block(1, 0, 1), "minecraft:stone");
    }

    #[test]
    fn rejects_a_schematic_missing_its_palette() {
        let root = NbtValue::Compound(vec![
            ("Width".to_string(), NbtValue::Short(1)),
            ("Height".to_string(), NbtValue::Short(1)),
            ("Length".to_string(), NbtValue::Short(1)),
        ]);
        let data = write_compressed("Schematic", &root).unwrap();
        let mut world = World::new("world");
        assert!(load_into(&mut world, &data).is_err());
    }
}
