use anyhow::{anyhow, bail, Result};
use bytes::{BufMut, BytesMut};
use pickaxe_nbt::NbtValue;
use pickaxe_protocol_core::*;

/// Map a packet variant to its abstract kind, for registry lookups.
fn kind_of_packet(packet: &InternalPacket) -> PacketKind {
    match packet {
        InternalPacket::Handshake { .. } => PacketKind::Handshake,
        InternalPacket::StatusRequest => PacketKind::StatusRequest,
        InternalPacket::StatusResponse { .. } => PacketKind::StatusResponse,
        InternalPacket::StatusPing { .. } => PacketKind::StatusPing,
        InternalPacket::StatusPong { .. } => PacketKind::StatusPong,
        InternalPacket::LoginStart { .. } => PacketKind::LoginStart,
        InternalPacket::LoginDisconnect { .. } => PacketKind::LoginDisconnect,
        InternalPacket::LoginSuccess { .. } => PacketKind::LoginSuccess,
        InternalPacket::LoginCompression { .. } => PacketKind::LoginCompression,
        InternalPacket::ChatIn { .. } => PacketKind::ChatIn,
        InternalPacket::KeepAliveIn { .. } => PacketKind::KeepAliveIn,
        InternalPacket::KeepAliveOut { .. } => PacketKind::KeepAliveOut,
        InternalPacket::ChatOut { .. } => PacketKind::ChatOut,
        InternalPacket::JoinGame(_) => PacketKind::JoinGame,
        InternalPacket::ServerDifficulty { .. } => PacketKind::ServerDifficulty,
        InternalPacket::PositionAndLook { .. } => PacketKind::PositionAndLook,
        InternalPacket::Disconnect { .. } => PacketKind::Disconnect,
        InternalPacket::ChunkData { .. } => PacketKind::ChunkData,
        InternalPacket::Unknown { .. } => {
            unreachable!("Unknown packets are never encoded through the codec")
        }
    }
}

/// Encode `packet` for `proto` under `state`, returning the full packet body
/// (wire id followed by payload). The caller is responsible for framing.
///
/// The returned buffer is on loan from the process-wide pool (§4.1) rather
/// than freshly allocated; it goes back to the pool once the caller drops it.
pub fn encode(
    proto: Protocol,
    state: ConnectionState,
    packet: &InternalPacket,
) -> Result<PooledBuffer<'static>> {
    let kind = kind_of_packet(packet);
    let id = id_of(proto, state, Direction::ClientBound, kind)
        .ok_or_else(|| anyhow!("no registry id for {:?} on protocol {}", kind, proto))?;

    let mut buf = global_pool().acquire();
    write_varint(&mut buf, id);
    match packet {
        InternalPacket::StatusResponse { json } => write_string(&mut buf, json, 32767)?,
        InternalPacket::StatusPong { payload } => buf.put_i64(*payload),
        InternalPacket::LoginDisconnect { reason_json } => write_string(&mut buf, reason_json, 32767)?,
        InternalPacket::LoginSuccess { uuid, username } => {
            if proto >= V1_16 {
                write_uuid(&mut buf, uuid);
            } else {
                write_string(&mut buf, &uuid.hyphenated().to_string(), 36)?;
            }
            write_string(&mut buf, username, 16)?;
        }
        InternalPacket::LoginCompression { threshold } => write_varint(&mut buf, *threshold),
        InternalPacket::KeepAliveOut { id } => {
            if proto >= V1_12_2 {
                buf.put_i64(*id);
            } else {
                write_varint(&mut buf, *id as i32);
            }
        }
        InternalPacket::ChatOut {
            json,
            position,
            sender,
        } => {
            write_string(&mut buf, json, 32767)?;
            buf.put_i8(*position);
            if proto >= V1_16 {
                write_uuid(&mut buf, &sender.unwrap_or_default());
            }
        }
        InternalPacket::JoinGame(join) => encode_join_game(&mut buf, proto, join),
        InternalPacket::ServerDifficulty { difficulty, locked } => {
            buf.put_u8(*difficulty);
            if proto >= V1_14 {
                buf.put_u8(*locked as u8);
            }
        }
        InternalPacket::PositionAndLook {
            x,
            y,
            z,
            yaw,
            pitch,
            flags,
            teleport_id,
        } => {
            buf.put_f64(*x);
            buf.put_f64(*y);
            buf.put_f64(*z);
            buf.put_f32(*yaw);
            buf.put_f32(*pitch);
            buf.put_u8(*flags);
            if proto >= V1_9 {
                write_varint(&mut buf, *teleport_id);
            }
        }
        InternalPacket::Disconnect { reason_json } => write_string(&mut buf, reason_json, 32767)?,
        InternalPacket::ChunkData {
            chunk_x,
            chunk_z,
            primary_bit_mask,
            data,
        } => {
            buf.put_i32(*chunk_x);
            buf.put_i32(*chunk_z);
            buf.put_u8(1); // full_chunk = true
            write_varint(&mut buf, *primary_bit_mask as i32);
            NbtValue::Compound(vec![]).write_root_named("", &mut buf); // empty heightmaps compound
            write_varint(&mut buf, 1024);
            for _ in 0..1024 {
                write_varint(&mut buf, 127); // uniform plains biome id
            }
            write_varint(&mut buf, data.len() as i32);
            buf.put_slice(data);
            write_varint(&mut buf, 0); // block entity count
        }
        other => bail!("{:?} cannot be encoded clientbound", kind_of_packet(other)),
    }
    Ok(buf)
}

fn encode_join_game(buf: &mut BytesMut, proto: Protocol, join: &JoinGame) {
    buf.put_i32(join.entity_id);
    if proto >= V1_16_2 {
        buf.put_u8(join.hardcore as u8);
    }
    buf.put_u8(join.gamemode);
    if proto >= V1_16 {
        buf.put_i8(join.previous_gamemode);
        write_varint(buf, join.world_names.len() as i32);
        for name in &join.world_names {
            let _ = write_string(buf, name, 32767);
        }
        join.dimension_codec.write_root_named("", buf);
        if proto >= V1_16_2 {
            join.dimension.write_root_named("", buf);
        } else {
            let _ = write_string(buf, &join.dimension_name, 32767);
        }
        let _ = write_string(buf, &join.world_name, 32767);
    } else if proto >= V1_9_1 {
        buf.put_i32(join.dimension_id);
    } else {
        buf.put_i8(join.dimension_id as i8);
    }
    if proto < V1_14 {
        buf.put_u8(join.difficulty);
    }
    if proto >= V1_15 {
        buf.put_i64(join.hashed_seed);
    }
    if proto >= V1_16 {
        write_varint(buf, join.max_players);
    } else {
        buf.put_u8(join.max_players as u8);
        let _ = write_string(buf, &join.level_type, 16);
    }
    if proto >= V1_14 {
        write_varint(buf, join.view_distance);
    }
    buf.put_u8(join.reduced_debug_info as u8);
    if proto >= V1_15 {
        buf.put_u8(join.enable_respawn_screen as u8);
    }
    if proto >= V1_16 {
        buf.put_u8(join.is_debug as u8);
        buf.put_u8(join.is_flat as u8);
    }
}

/// Decode a packet of wire `id` as sent by the client under `(proto, state)`.
pub fn decode(
    proto: Protocol,
    state: ConnectionState,
    id: i32,
    data: &mut BytesMut,
) -> Result<InternalPacket> {
    let Some(kind) = kind_of(proto, state, Direction::ServerBound, id) else {
        tracing::debug!(id, ?state, proto, "unknown serverbound packet, skipping");
        return Ok(InternalPacket::Unknown {
            packet_id: id,
            data: data.to_vec(),
        });
    };

    Ok(match kind {
        PacketKind::Handshake => {
            let protocol_version = read_varint(data)?;
            let server_address = read_string(data, 255)?;
            let server_port = read_u16(data)?;
            let next_state = read_varint(data)?;
            InternalPacket::Handshake {
                protocol_version,
                server_address,
                server_port,
                next_state,
            }
        }
        PacketKind::StatusRequest => InternalPacket::StatusRequest,
        PacketKind::StatusPing => InternalPacket::StatusPing {
            payload: read_i64(data)?,
        },
        PacketKind::LoginStart => InternalPacket::LoginStart {
            username: read_string(data, 16)?,
        },
        PacketKind::ChatIn => InternalPacket::ChatIn {
            message: read_string(data, 256)?,
        },
        PacketKind::KeepAliveIn => InternalPacket::KeepAliveIn {
            id: if proto >= V1_12_2 {
                read_i64(data)?
            } else {
                read_varint(data)? as i64
            },
        },
        _ => InternalPacket::Unknown {
            packet_id: id,
            data: data.to_vec(),
        },
    })
}

/// Decode a packet of wire `id` as sent by the server, for tests that need to
/// read back what `encode` produced.
pub fn decode_clientbound(
    proto: Protocol,
    state: ConnectionState,
    id: i32,
    data: &mut BytesMut,
) -> Result<InternalPacket> {
    let Some(kind) = kind_of(proto, state, Direction::ClientBound, id) else {
        return Ok(InternalPacket::Unknown {
            packet_id: id,
            data: data.to_vec(),
        });
    };

    Ok(match kind {
        PacketKind::StatusResponse => InternalPacket::StatusResponse {
            json: read_string(data, 32767)?,
        },
        PacketKind::StatusPong => InternalPacket::StatusPong {
            payload: read_i64(data)?,
        },
        PacketKind::LoginDisconnect => InternalPacket::LoginDisconnect {
            reason_json: read_string(data, 32767)?,
        },
        PacketKind::LoginSuccess => {
            let uuid = if proto >= V1_16 {
                read_uuid(data)?
            } else {
                let s = read_string(data, 36)?;
                uuid::Uuid::parse_str(&s).map_err(|e| anyhow!("invalid uuid string: {e}"))?
            };
            let username = read_string(data, 16)?;
            InternalPacket::LoginSuccess { uuid, username }
        }
        PacketKind::LoginCompression => InternalPacket::LoginCompression {
            threshold: read_varint(data)?,
        },
        PacketKind::KeepAliveOut => InternalPacket::KeepAliveOut {
            id: if proto >= V1_12_2 {
                read_i64(data)?
            } else {
                read_varint(data)? as i64
            },
        },
        PacketKind::ChatOut => {
            let json = read_string(data, 32767)?;
            let position = read_i8(data)?;
            let sender = if proto >= V1_16 {
                Some(read_uuid(data)?)
            } else {
                None
            };
            InternalPacket::ChatOut {
                json,
                position,
                sender,
            }
        }
        PacketKind::ServerDifficulty => {
            let difficulty = read_u8(data)?;
            let locked = proto >= V1_14 && read_u8(data)? != 0;
            InternalPacket::ServerDifficulty { difficulty, locked }
        }
        PacketKind::PositionAndLook => {
            let x = read_f64(data)?;
            let y = read_f64(data)?;
            let z = read_f64(data)?;
            let yaw = read_f32(data)?;
            let pitch = read_f32(data)?;
            let flags = read_u8(data)?;
            let teleport_id = if proto >= V1_9 { read_varint(data)? } else { 0 };
            InternalPacket::PositionAndLook {
                x,
                y,
                z,
                yaw,
                pitch,
                flags,
                teleport_id,
            }
        }
        PacketKind::Disconnect => InternalPacket::Disconnect {
            reason_json: read_string(data, 32767)?,
        },
        _ => InternalPacket::Unknown {
            packet_id: id,
            data: data.to_vec(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn join_game_fixture() -> JoinGame {
        JoinGame {
            entity_id: 1,
            hardcore: false,
            gamemode: 0,
            previous_gamemode: -1,
            world_names: vec!["minecraft:overworld".into()],
            dimension_codec: NbtValue::Compound(vec![]),
            dimension: NbtValue::Compound(vec![]),
            dimension_name: "minecraft:overworld".into(),
            world_name: "minecraft:overworld".into(),
            dimension_id: 0,
            difficulty: 0,
            hashed_seed: 42,
            max_players: 20,
            level_type: "default".into(),
            view_distance: 10,
            reduced_debug_info: false,
            enable_respawn_screen: true,
            is_debug: false,
            is_flat: false,
        }
    }

    #[test]
    fn login_success_round_trips_on_old_and_new_protocols() {
        let uuid = Uuid::new_v4();
        let packet = InternalPacket::LoginSuccess {
            uuid,
            username: "Notch".into(),
        };

        for proto in [V1_8, V1_16_4] {
            let mut encoded = encode(proto, ConnectionState::Login, &packet).unwrap();
            let id = read_varint(&mut encoded).unwrap();
            let decoded = decode_clientbound(proto, ConnectionState::Login, id, &mut encoded).unwrap();
            assert_eq!(decoded, packet);
        }
    }

    #[test]
    fn keep_alive_switches_width_at_v1_12_2() {
        let packet = InternalPacket::KeepAliveOut { id: 12345 };

        let mut old = encode(V1_9, ConnectionState::Play, &packet).unwrap();
        let _ = read_varint(&mut old).unwrap();
        assert!(old.len() < 8);

        let mut new = encode(V1_16_4, ConnectionState::Play, &packet).unwrap();
        let _ = read_varint(&mut new).unwrap();
        assert_eq!(new.len(), 8);
    }

    #[test]
    fn position_and_look_round_trips_with_and_without_teleport_id() {
        let packet = InternalPacket::PositionAndLook {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            yaw: 4.0,
            pitch: 5.0,
            flags: 0,
            teleport_id: 7,
        };
        let mut encoded = encode(V1_16_4, ConnectionState::Play, &packet).unwrap();
        let id = read_varint(&mut encoded).unwrap();
        let decoded = decode_clientbound(V1_16_4, ConnectionState::Play, id, &mut encoded).unwrap();
        assert_eq!(decoded, packet);

        let packet_old = InternalPacket::PositionAndLook {
            teleport_id: 0,
            ..packet
        };
        let mut encoded = encode(V1_8, ConnectionState::Play, &packet_old).unwrap();
        let id = read_varint(&mut encoded).unwrap();
        let decoded = decode_clientbound(V1_8, ConnectionState::Play, id, &mut encoded).unwrap();
        assert_eq!(decoded, packet_old);
    }

    #[test]
    fn join_game_round_trips_across_eras() {
        let join = join_game_fixture();
        for proto in [V1_8, V1_13_2, V1_15_2, V1_16_4] {
            let encoded = encode(proto, ConnectionState::Play, &InternalPacket::JoinGame(Box::new(join.clone())));
            assert!(encoded.is_ok(), "encode failed for protocol {proto}");
        }
    }

    #[test]
    fn unknown_serverbound_id_decodes_to_unknown_variant() {
        let mut data = BytesMut::from(&b"abc"[..]);
        let decoded = decode(V1_16_4, ConnectionState::Play, 0x7F, &mut data).unwrap();
        assert!(matches!(decoded, InternalPacket::Unknown { .. }));
    }

    #[test]
    fn truncated_position_and_look_is_a_decode_error_not_a_panic() {
        let packet = InternalPacket::PositionAndLook {
            x: 1.0,
            y: 2.0,
            z: 3.0,
            yaw: 4.0,
            pitch: 5.0,
            flags: 0,
            teleport_id: 7,
        };
        let mut encoded = encode(V1_16_4, ConnectionState::Play, &packet).unwrap();
        let id = read_varint(&mut encoded).unwrap();
        let mut truncated = BytesMut::from(&encoded[..encoded.len() - 1]);
        assert!(decode_clientbound(V1_16_4, ConnectionState::Play, id, &mut truncated).is_err());
    }
}
