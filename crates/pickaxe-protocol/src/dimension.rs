use pickaxe_nbt::{nbt_compound, NbtValue};

/// The overworld dimension-type compound used to fill `JoinGame`'s
/// dimension-codec/dimension NBT fields on protocols that carry one
/// (>= V1_16). Field set matches the 1.16-era dimension type shape: no
/// world-height fields, those arrived with the 1.18 world-height change.
pub fn overworld_dimension_type() -> NbtValue {
    nbt_compound! {
        "piglin_safe" => NbtValue::Byte(0),
        "natural" => NbtValue::Byte(1),
        "ambient_light" => NbtValue::Float(0.0),
        "infiniburn" => NbtValue::String("minecraft:infiniburn_overworld".into()),
        "respawn_anchor_works" => NbtValue::Byte(0),
        "has_skylight" => NbtValue::Byte(1),
        "bed_works" => NbtValue::Byte(1),
        "effects" => NbtValue::String("minecraft:overworld".into()),
        "has_raids" => NbtValue::Byte(1),
        "logical_height" => NbtValue::Int(256),
        "coordinate_scale" => NbtValue::Double(1.0),
        "ultrawarm" => NbtValue::Byte(0),
        "has_ceiling" => NbtValue::Byte(0),
        "shrunk" => NbtValue::Byte(0),
    }
}

/// The wrapped `{name, id, element}` form of the overworld dimension type,
/// used both as the dimension-codec registry entry and, standalone, as
/// `JoinGame`'s own `dimension` field on protocols >= V1_16_2.
pub fn overworld_dimension_wrapped() -> NbtValue {
    nbt_compound! {
        "name" => NbtValue::String("minecraft:overworld".into()),
        "id" => NbtValue::Int(0),
        "element" => overworld_dimension_type(),
    }
}

/// The full `dimension_codec` compound sent once at JoinGame time, wrapping
/// the dimension-type and biome registries the client needs before it can
/// render anything.
pub fn overworld_dimension_codec() -> NbtValue {
    nbt_compound! {
        "minecraft:dimension_type" => nbt_compound! {
            "type" => NbtValue::String("minecraft:dimension_type".into()),
            "value" => NbtValue::List(vec![overworld_dimension_wrapped()]),
        },
        "minecraft:worldgen/biome" => nbt_compound! {
            "type" => NbtValue::String("minecraft:worldgen/biome".into()),
            "value" => NbtValue::List(vec![nbt_compound! {
                "name" => NbtValue::String("minecraft:plains".into()),
                "id" => NbtValue::Int(1),
                "element" => nbt_compound! {
                    "precipitation" => NbtValue::String("rain".into()),
                    "depth" => NbtValue::Float(0.125),
                    "temperature" => NbtValue::Float(0.8),
                    "scale" => NbtValue::Float(0.05),
                    "downfall" => NbtValue::Float(0.4),
                    "category" => NbtValue::String("plains".into()),
                    "effects" => nbt_compound! {
                        "sky_color" => NbtValue::Int(7907327),
                        "water_color" => NbtValue::Int(4159204),
                        "fog_color" => NbtValue::Int(12638463),
                        "water_fog_color" => NbtValue::Int(329011),
                    },
                },
            }]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_codec_contains_both_registries() {
        let NbtValue::Compound(entries) = overworld_dimension_codec() else {
            panic!("expected compound");
        };
        let names: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert!(names.contains(&"minecraft:dimension_type"));
        assert!(names.contains(&"minecraft:worldgen/biome"));
    }

    #[test]
    fn dimension_type_always_carries_shrunk() {
        let NbtValue::Compound(entries) = overworld_dimension_type() else {
            panic!("expected compound");
        };
        assert!(entries.iter().any(|(k, _)| k == "shrunk"));
    }

    #[test]
    fn wrapped_dimension_carries_name_id_and_element() {
        let NbtValue::Compound(entries) = overworld_dimension_wrapped() else {
            panic!("expected compound");
        };
        let names: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert!(names.contains(&"name"));
        assert!(names.contains(&"id"));
        assert!(names.contains(&"element"));
    }
}
