use pickaxe_nbt::NbtValue;
use uuid::Uuid;

/// A decoded or to-be-encoded packet, independent of its wire id.
///
/// The registry (see `pickaxe_protocol::registry`) maps a `(protocol, state,
/// direction)` triple to the numeric wire id for a given variant's tag, and
/// the codec (see `pickaxe_protocol::codec`) maps a variant to/from bytes for
/// a given protocol version. Chat content throughout is carried as an opaque
/// JSON string, never a typed component tree — building or reading the JSON
/// itself is outside this crate's scope.
#[derive(Debug, Clone, PartialEq)]
pub enum InternalPacket {
    // Handshaking
    Handshake {
        protocol_version: i32,
        server_address: String,
        server_port: u16,
        next_state: i32,
    },

    // Status
    StatusRequest,
    StatusResponse {
        json: String,
    },
    StatusPing {
        payload: i64,
    },
    StatusPong {
        payload: i64,
    },

    // Login
    LoginStart {
        username: String,
    },
    LoginDisconnect {
        reason_json: String,
    },
    LoginSuccess {
        uuid: Uuid,
        username: String,
    },
    LoginCompression {
        threshold: i32,
    },

    // Play
    ChatIn {
        message: String,
    },
    KeepAliveIn {
        id: i64,
    },
    KeepAliveOut {
        id: i64,
    },
    ChatOut {
        json: String,
        position: i8,
        sender: Option<Uuid>,
    },
    JoinGame(Box<JoinGame>),
    ServerDifficulty {
        difficulty: u8,
        locked: bool,
    },
    PositionAndLook {
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        flags: u8,
        teleport_id: i32,
    },
    Disconnect {
        reason_json: String,
    },
    ChunkData {
        chunk_x: i32,
        chunk_z: i32,
        primary_bit_mask: u32,
        data: Vec<u8>,
    },

    /// A packet with a recognized id but no decoder, or a decode/encode
    /// target for which the caller only needs the raw payload.
    Unknown {
        packet_id: i32,
        data: Vec<u8>,
    },
}

/// Fields for the `Play/JoinGame` packet across the whole supported protocol
/// range. Not every field is meaningful for every protocol version — see
/// the vbranches in SPEC_FULL.md §4.5 for which fields apply where.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinGame {
    pub entity_id: i32,
    pub hardcore: bool,
    pub gamemode: u8,
    pub previous_gamemode: i8,
    pub world_names: Vec<String>,
    pub dimension_codec: NbtValue,
    /// The player's current dimension, as the wrapped `{id,name,element}`
    /// NBT form used on protocols >= V1_16_2.
    pub dimension: NbtValue,
    /// The player's current dimension name, used as a flat identifier on
    /// V1_16/V1_16_1 instead of an inline NBT compound.
    pub dimension_name: String,
    pub world_name: String,
    /// Numeric dimension id, used on protocols < V1_16 (i8-width on < V1_9_1,
    /// widened here to i32 for a uniform field).
    pub dimension_id: i32,
    /// Used on protocols < V1_14 only.
    pub difficulty: u8,
    /// Used on protocols >= V1_15 only.
    pub hashed_seed: i64,
    pub max_players: i32,
    /// Used on protocols < V1_16 only.
    pub level_type: String,
    /// Used on protocols >= V1_14 only.
    pub view_distance: i32,
    pub reduced_debug_info: bool,
    /// Used on protocols >= V1_15 only.
    pub enable_respawn_screen: bool,
    /// Used on protocols >= V1_16 only.
    pub is_debug: bool,
    pub is_flat: bool,
}
