include!(concat!(env!("OUT_DIR"), "/generated.rs"));

/// Resolve `name`'s global block-state id for `proto`.
///
/// Returns the id for the largest registered version `<= proto`; if every
/// registered version is newer than `proto`, returns the oldest entry's id.
/// An unrecognized name resolves to 0 (`minecraft:air`).
pub fn global_id(name: &str, proto: i32) -> i32 {
    let Some(versions) = block_versions(name) else {
        return 0;
    };
    let mut best = versions[0].1;
    for &(version_proto, id) in versions {
        if version_proto <= proto {
            best = id;
        } else {
            break;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_pre_and_post_flattening_ids() {
        assert_eq!(global_id("minecraft:dirt", 47), 3);
        assert_eq!(global_id("minecraft:dirt", 393), 10);
        assert_eq!(global_id("minecraft:dirt", 754), 10);
    }

    #[test]
    fn falls_back_to_oldest_entry_below_every_registered_version() {
        assert_eq!(global_id("minecraft:grass_path", 10), 198);
    }

    #[test]
    fn unknown_name_resolves_to_air() {
        assert_eq!(global_id("minecraft:made_up_block", 754), 0);
    }

    #[test]
    fn air_is_stable_across_the_whole_range() {
        assert_eq!(global_id("minecraft:air", 47), 0);
        assert_eq!(global_id("minecraft:air", 754), 0);
    }
}
