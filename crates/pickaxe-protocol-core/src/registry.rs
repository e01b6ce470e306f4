//! Three-way mapping `(protocol, state, direction) <-> (packet kind, numeric id)`.
//!
//! A base table ("Unknown") covers Handshaking/Status/Login, whose ids are
//! stable across every supported protocol version. Play-state ids (and any
//! Login/Status deltas) are registered per-version as overlays: the first
//! time a protocol is looked up, its table is built by deep-copying the base
//! table and merging the era overlay with override semantics, building the
//! inverse id->kind index in the same pass. Adjacent protocol versions that
//! share an identical wire layout resolve to the same era and therefore the
//! same table, built once. The whole structure is immutable after the first
//! build, behind a `OnceLock`, so lookups never take a lock.

use crate::protocol::{Direction, PacketKind, Protocol};
use crate::state::ConnectionState;
use std::collections::HashMap;
use std::sync::OnceLock;

use Direction::{ClientBound, ServerBound};
use PacketKind::*;

#[derive(Default)]
struct StateTable {
    by_kind: HashMap<PacketKind, i32>,
    by_id: HashMap<i32, PacketKind>,
}

impl StateTable {
    fn insert(&mut self, kind: PacketKind, id: i32) {
        self.by_kind.insert(kind, id);
        self.by_id.insert(id, kind);
    }
}

#[derive(Default)]
struct ProtocolTable {
    tables: HashMap<(ConnectionState, Direction), StateTable>,
}

impl ProtocolTable {
    fn insert_all(&mut self, state: ConnectionState, direction: Direction, entries: &[(PacketKind, i32)]) {
        let table = self.tables.entry((state, direction)).or_default();
        for (kind, id) in entries {
            table.insert(*kind, *id);
        }
    }
}

/// Ids stable across the entire 47..754 supported range.
fn base_table() -> ProtocolTable {
    let mut table = ProtocolTable::default();
    table.insert_all(
        ConnectionState::Handshaking,
        ServerBound,
        &[(Handshake, 0x00)],
    );
    table.insert_all(
        ConnectionState::Status,
        ServerBound,
        &[(StatusRequest, 0x00), (StatusPing, 0x01)],
    );
    table.insert_all(
        ConnectionState::Status,
        ClientBound,
        &[(StatusResponse, 0x00), (StatusPong, 0x01)],
    );
    table.insert_all(
        ConnectionState::Login,
        ServerBound,
        &[(LoginStart, 0x00)],
    );
    table.insert_all(
        ConnectionState::Login,
        ClientBound,
        &[
            (LoginDisconnect, 0x00),
            (LoginSuccess, 0x02),
            (LoginCompression, 0x03),
        ],
    );
    table
}

/// Play-state ids for one "era" of protocol history. Several adjacent
/// protocol versions share the same era because their wire layout did not
/// change between them.
struct Era {
    cb: &'static [(PacketKind, i32)],
    sb: &'static [(PacketKind, i32)],
}

const ERA_1_8: Era = Era {
    cb: &[
        (KeepAliveOut, 0x00),
        (JoinGame, 0x01),
        (ChatOut, 0x02),
        (PositionAndLook, 0x08),
        (ServerDifficulty, 0x41),
        (Disconnect, 0x40),
        (ChunkData, 0x21),
    ],
    sb: &[(KeepAliveIn, 0x00), (ChatIn, 0x01)],
};

const ERA_1_9: Era = Era {
    cb: &[
        (KeepAliveOut, 0x1F),
        (JoinGame, 0x23),
        (ChatOut, 0x0F),
        (PositionAndLook, 0x2E),
        (ServerDifficulty, 0x0D),
        (Disconnect, 0x1A),
        (ChunkData, 0x20),
    ],
    sb: &[(KeepAliveIn, 0x0B), (ChatIn, 0x02)],
};

const ERA_1_11: Era = Era {
    cb: &[
        (KeepAliveOut, 0x1F),
        (JoinGame, 0x23),
        (ChatOut, 0x0F),
        (PositionAndLook, 0x2F),
        (ServerDifficulty, 0x0D),
        (Disconnect, 0x1A),
        (ChunkData, 0x20),
    ],
    sb: &[(KeepAliveIn, 0x0B), (ChatIn, 0x02)],
};

const ERA_1_13: Era = Era {
    cb: &[
        (KeepAliveOut, 0x21),
        (JoinGame, 0x25),
        (ChatOut, 0x0E),
        (PositionAndLook, 0x32),
        (ServerDifficulty, 0x0D),
        (Disconnect, 0x1B),
        (ChunkData, 0x22),
    ],
    sb: &[(KeepAliveIn, 0x0E), (ChatIn, 0x02)],
};

const ERA_1_14: Era = Era {
    cb: &[
        (KeepAliveOut, 0x20),
        (JoinGame, 0x25),
        (ChatOut, 0x0E),
        (PositionAndLook, 0x34),
        (ServerDifficulty, 0x0D),
        (Disconnect, 0x1B),
        (ChunkData, 0x21),
    ],
    sb: &[(KeepAliveIn, 0x0E), (ChatIn, 0x03)],
};

const ERA_1_16: Era = Era {
    cb: &[
        (KeepAliveOut, 0x1F),
        (JoinGame, 0x24),
        (ChatOut, 0x0E),
        (PositionAndLook, 0x34),
        (ServerDifficulty, 0x0D),
        (Disconnect, 0x19),
        (ChunkData, 0x20),
    ],
    sb: &[(KeepAliveIn, 0x10), (ChatIn, 0x03)],
};

fn era_for(proto: Protocol) -> &'static Era {
    use crate::protocol::*;
    match proto {
        p if p == V1_8 => &ERA_1_8,
        p if p >= V1_9 && p < V1_11 => &ERA_1_9,
        p if p >= V1_11 && p < V1_13 => &ERA_1_11,
        p if p >= V1_13 && p < V1_14 => &ERA_1_13,
        p if p >= V1_14 && p < V1_16 => &ERA_1_14,
        _ => &ERA_1_16,
    }
}

fn build_protocol_table(proto: Protocol) -> ProtocolTable {
    let mut table = base_table();
    let era = era_for(proto);
    table.insert_all(ConnectionState::Play, ClientBound, era.cb);
    table.insert_all(ConnectionState::Play, ServerBound, era.sb);
    table
}

struct Registry {
    per_protocol: HashMap<Protocol, ProtocolTable>,
    unknown: ProtocolTable,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut per_protocol = HashMap::new();
        for &proto in crate::protocol::SUPPORTED_PROTOCOLS {
            per_protocol.insert(proto, build_protocol_table(proto));
        }
        Registry {
            per_protocol,
            unknown: base_table(),
        }
    })
}

/// Resolve the numeric wire id for `kind` under `(proto, state, direction)`.
pub fn id_of(proto: Protocol, state: ConnectionState, direction: Direction, kind: PacketKind) -> Option<i32> {
    let reg = registry();
    if let Some(table) = reg.per_protocol.get(&proto) {
        if let Some(st) = table.tables.get(&(state, direction)) {
            if let Some(id) = st.by_kind.get(&kind) {
                return Some(*id);
            }
        }
    }
    reg.unknown
        .tables
        .get(&(state, direction))
        .and_then(|st| st.by_kind.get(&kind))
        .copied()
}

/// Resolve the packet kind for a numeric wire id under `(proto, state, direction)`.
pub fn kind_of(proto: Protocol, state: ConnectionState, direction: Direction, id: i32) -> Option<PacketKind> {
    let reg = registry();
    if let Some(table) = reg.per_protocol.get(&proto) {
        if let Some(st) = table.tables.get(&(state, direction)) {
            if let Some(kind) = st.by_id.get(&id) {
                return Some(*kind);
            }
        }
    }
    reg.unknown
        .tables
        .get(&(state, direction))
        .and_then(|st| st.by_id.get(&id))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::*;

    #[test]
    fn base_table_ids_are_stable_across_versions() {
        for &proto in SUPPORTED_PROTOCOLS {
            assert_eq!(
                id_of(proto, ConnectionState::Handshaking, ServerBound, Handshake),
                Some(0x00)
            );
            assert_eq!(
                id_of(proto, ConnectionState::Login, ClientBound, LoginSuccess),
                Some(0x02)
            );
        }
    }

    #[test]
    fn registry_is_bijective_for_every_registered_protocol() {
        for &proto in SUPPORTED_PROTOCOLS {
            for state in [
                ConnectionState::Handshaking,
                ConnectionState::Status,
                ConnectionState::Login,
                ConnectionState::Play,
            ] {
                for direction in [ClientBound, ServerBound] {
                    let reg = registry();
                    let Some(table) = reg.per_protocol.get(&proto) else {
                        continue;
                    };
                    let Some(st) = table.tables.get(&(state, direction)) else {
                        continue;
                    };
                    for (&kind, &id) in &st.by_kind {
                        assert_eq!(st.by_id.get(&id), Some(&kind));
                        assert_eq!(kind_of(proto, state, direction, id), Some(kind));
                        assert_eq!(id_of(proto, state, direction, kind), Some(id));
                    }
                }
            }
        }
    }

    #[test]
    fn unknown_id_misses_in_every_state() {
        assert_eq!(
            kind_of(V1_16_4, ConnectionState::Play, ClientBound, 0x7F),
            None
        );
    }

    #[test]
    fn adjacent_versions_in_the_same_era_share_ids() {
        assert_eq!(
            id_of(V1_9, ConnectionState::Play, ClientBound, JoinGame),
            id_of(V1_10, ConnectionState::Play, ClientBound, JoinGame)
        );
    }
}
