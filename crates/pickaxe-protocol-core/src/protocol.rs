/// A Minecraft Java Edition protocol version number.
pub type Protocol = i32;

/// Sentinel used before a connection's Handshake packet has been read.
pub const UNKNOWN: Protocol = -1;

pub const V1_8: Protocol = 47;
pub const V1_9: Protocol = 107;
pub const V1_9_1: Protocol = 108;
pub const V1_9_2: Protocol = 109;
pub const V1_9_3: Protocol = 110;
pub const V1_10: Protocol = 210;
pub const V1_11: Protocol = 315;
pub const V1_11_1: Protocol = 316;
pub const V1_12: Protocol = 335;
pub const V1_12_1: Protocol = 338;
pub const V1_12_2: Protocol = 340;
pub const V1_13: Protocol = 393;
pub const V1_13_1: Protocol = 401;
pub const V1_13_2: Protocol = 404;
pub const V1_14: Protocol = 477;
pub const V1_14_1: Protocol = 480;
pub const V1_14_2: Protocol = 485;
pub const V1_14_3: Protocol = 490;
pub const V1_14_4: Protocol = 498;
pub const V1_15: Protocol = 573;
pub const V1_15_1: Protocol = 575;
pub const V1_15_2: Protocol = 578;
pub const V1_16: Protocol = 735;
pub const V1_16_1: Protocol = 736;
pub const V1_16_2: Protocol = 751;
pub const V1_16_3: Protocol = 753;
pub const V1_16_4: Protocol = 754;

pub const SUPPORTED_PROTOCOLS: &[Protocol] = &[
    V1_8, V1_9, V1_9_1, V1_9_2, V1_9_3, V1_10, V1_11, V1_11_1, V1_12, V1_12_1, V1_12_2, V1_13,
    V1_13_1, V1_13_2, V1_14, V1_14_1, V1_14_2, V1_14_3, V1_14_4, V1_15, V1_15_1, V1_15_2, V1_16,
    V1_16_1, V1_16_2, V1_16_3, V1_16_4,
];

pub fn is_supported(proto: Protocol) -> bool {
    SUPPORTED_PROTOCOLS.contains(&proto)
}

pub fn lowest_protocol() -> Protocol {
    SUPPORTED_PROTOCOLS[0]
}

pub fn highest_protocol() -> Protocol {
    SUPPORTED_PROTOCOLS[SUPPORTED_PROTOCOLS.len() - 1]
}

/// Who sent a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    ClientBound,
    ServerBound,
}

/// The abstract identity of a packet — stable across protocol versions even
/// where the wire id and field layout are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    Handshake,
    StatusRequest,
    StatusResponse,
    StatusPing,
    StatusPong,
    LoginStart,
    LoginDisconnect,
    LoginSuccess,
    LoginCompression,
    ChatIn,
    KeepAliveIn,
    KeepAliveOut,
    ChatOut,
    JoinGame,
    ServerDifficulty,
    PositionAndLook,
    Disconnect,
    ChunkData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_protocols_are_sorted_ascending() {
        let mut sorted = SUPPORTED_PROTOCOLS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, SUPPORTED_PROTOCOLS.to_vec());
    }

    #[test]
    fn lowest_and_highest_match_fixed_range() {
        assert_eq!(lowest_protocol(), V1_8);
        assert_eq!(highest_protocol(), V1_16_4);
    }

    #[test]
    fn unknown_protocol_is_not_supported() {
        assert!(!is_supported(UNKNOWN));
        assert!(!is_supported(999_999));
        assert!(is_supported(V1_12_2));
    }
}
