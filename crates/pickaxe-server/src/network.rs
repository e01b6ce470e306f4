use crate::player::Player;
use crate::state::ServerState;
use anyhow::{anyhow, Result};
use pickaxe_events::{EventBus, PacketEvent};
use pickaxe_protocol::dimension::{overworld_dimension_codec, overworld_dimension_wrapped};
use pickaxe_protocol_core::{
    read_varint, Connection, ConnectionState, InternalPacket, JoinGame, Protocol, UNKNOWN,
};
use pickaxe_types::GameProfile;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Derive an offline-mode player UUID: a v3 UUID from the MD5 digest of
/// ASCII `"OfflinePlayer:" + username`, per §6.
pub fn offline_uuid(username: &str) -> Uuid {
    let digest = md5::compute(format!("OfflinePlayer:{username}"));
    let mut bytes = *digest;
    bytes[6] = (bytes[6] & 0x0f) | 0x30;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes)
}

/// Drive a single accepted socket through Handshaking -> {Status | Login,Play}.
pub async fn handle_connection(stream: TcpStream, server: Arc<ServerState>) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".into());
    let mut conn = Connection::new(stream);

    if let Err(e) = handle_connection_inner(&mut conn, &server, &peer).await {
        debug!("connection {} ended: {}", peer, e);
    }
}

async fn handle_connection_inner(
    conn: &mut Connection,
    server: &Arc<ServerState>,
    peer: &str,
) -> Result<()> {
    let (id, mut data) = conn.read_packet().await?;
    let packet = pickaxe_protocol::decode(UNKNOWN, ConnectionState::Handshaking, id, &mut data)?;

    let (proto, next_state) = match packet {
        InternalPacket::Handshake {
            protocol_version,
            next_state,
            ..
        } => {
            debug!(
                "handshake from {}: protocol={}, next_state={}",
                peer, protocol_version, next_state
            );
            (protocol_version, next_state)
        }
        _ => return Err(anyhow!("expected a handshake packet")),
    };

    match ConnectionState::from_handshake_next(next_state) {
        Some(ConnectionState::Status) => handle_status(conn, proto, server).await,
        Some(ConnectionState::Login) => handle_login_and_play(conn, proto, server, peer).await,
        _ => Err(anyhow!("invalid next-state in handshake: {next_state}")),
    }
}

async fn handle_status(conn: &mut Connection, proto: Protocol, server: &Arc<ServerState>) -> Result<()> {
    loop {
        let (id, mut data) = conn.read_packet().await?;
        let packet = pickaxe_protocol::decode(proto, ConnectionState::Status, id, &mut data)?;

        match packet {
            InternalPacket::StatusRequest => {
                let player_count = server.player_count().await;
                let json = format!(
                    r#"{{"version":{{"name":"1.16.4","protocol":{proto}}},"players":{{"max":20,"online":{player_count}}},"description":{{"text":"A Pickaxe Server"}}}}"#,
                );
                send_packet(
                    conn,
                    proto,
                    ConnectionState::Status,
                    &InternalPacket::StatusResponse { json },
                )
                .await?;
            }
            InternalPacket::StatusPing { payload } => {
                send_packet(
                    conn,
                    proto,
                    ConnectionState::Status,
                    &InternalPacket::StatusPong { payload },
                )
                .await?;
                return Ok(());
            }
            _ => {}
        }
    }
}

async fn handle_login_and_play(
    conn: &mut Connection,
    proto: Protocol,
    server: &Arc<ServerState>,
    peer: &str,
) -> Result<()> {
    let (id, mut data) = conn.read_packet().await?;
    let packet = pickaxe_protocol::decode(proto, ConnectionState::Login, id, &mut data)?;
    let username = match packet {
        InternalPacket::LoginStart { username } => username,
        _ => return Err(anyhow!("expected Login Start")),
    };

    let uuid = offline_uuid(&username);
    if server.players.contains(&uuid).await {
        send_packet(
            conn,
            proto,
            ConnectionState::Login,
            &InternalPacket::LoginDisconnect {
                reason_json: r#"{"text":"You are already connected to this server"}"#.into(),
            },
        )
        .await?;
        // Give the client a chance to read the disconnect packet off the
        // wire before this task returns and the socket is dropped.
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        return Ok(());
    }

    let threshold = server.config.server.compression.threshold;
    if threshold >= 0 {
        send_packet(
            conn,
            proto,
            ConnectionState::Login,
            &InternalPacket::LoginCompression { threshold },
        )
        .await?;
        conn.enable_compression(threshold);
    }

    let profile = GameProfile {
        uuid,
        name: username.clone(),
        properties: Vec::new(),
    };
    send_packet(
        conn,
        proto,
        ConnectionState::Login,
        &InternalPacket::LoginSuccess {
            uuid,
            username: username.clone(),
        },
    )
    .await?;
    info!("{} ({}) logged in from {}", username, uuid, peer);

    let result = handle_play(conn, proto, server, profile).await;
    server.players.remove(&uuid).await;
    info!("{} disconnected", username);
    result
}

async fn handle_play(
    conn: &mut Connection,
    proto: Protocol,
    server: &Arc<ServerState>,
    profile: GameProfile,
) -> Result<()> {
    let entity_id = server.next_entity_id();
    let render_distance = server.config.server.world.render_distance;

    send_packet(
        conn,
        proto,
        ConnectionState::Play,
        &InternalPacket::JoinGame(Box::new(join_game_packet(entity_id))),
    )
    .await?;
    send_packet(
        conn,
        proto,
        ConnectionState::Play,
        &InternalPacket::ServerDifficulty {
            difficulty: 2,
            locked: true,
        },
    )
    .await?;
    send_packet(
        conn,
        proto,
        ConnectionState::Play,
        &InternalPacket::PositionAndLook {
            x: 0.5,
            y: 64.0,
            z: 0.5,
            yaw: 0.0,
            pitch: 0.0,
            flags: 0,
            teleport_id: 1,
        },
    )
    .await?;

    send_chunks(conn, proto, server, render_distance).await?;

    // Re-split only now: every packet above must land on the same
    // (possibly now-compressed) framing state the split halves inherit.
    let (mut reader, writer) = std::mem::replace(conn, Connection::new_dummy()).into_split();
    let writer = Arc::new(Mutex::new(writer));
    let player = Arc::new(Player::new(profile.clone(), proto, writer));
    if !server.players.insert(player.clone()).await {
        return Err(anyhow!("duplicate login raced past the pre-check"));
    }

    loop {
        tokio::select! {
            result = reader.read_packet() => {
                let (id, mut data) = result?;
                let packet = pickaxe_protocol::decode(proto, ConnectionState::Play, id, &mut data)?;
                if dispatch_packet_event(&server.events, player.profile.uuid, &packet) {
                    continue;
                }
                match packet {
                    InternalPacket::ChatIn { message } => {
                        debug!("{}: {}", profile.name, message);
                    }
                    InternalPacket::KeepAliveIn { id } => {
                        player.keep_alive.acknowledge(id).await;
                    }
                    InternalPacket::Unknown { packet_id, .. } => {
                        debug!("ignoring unknown play packet id=0x{:02X}", packet_id);
                    }
                    _ => {}
                }
            }
            _ = player.close.notified() => {
                return Ok(());
            }
        }
    }
}

/// Run `event`, a decoded packet, through the synchronous event bus before
/// the built-in handler acts on it. Returns true if a subscriber cancelled
/// dispatch.
fn dispatch_packet_event(bus: &EventBus, player: Uuid, packet: &InternalPacket) -> bool {
    let mut event = PacketEvent {
        connection_id: 0,
        player: Some(player),
        packet: packet.clone(),
        cancelled: false,
    };
    bus.publish_cancellable(&mut event);
    event.cancelled
}

fn join_game_packet(entity_id: i32) -> JoinGame {
    JoinGame {
        entity_id,
        hardcore: false,
        gamemode: 1,
        previous_gamemode: -1,
        world_names: vec!["minecraft:overworld".into()],
        dimension_codec: overworld_dimension_codec(),
        dimension: overworld_dimension_wrapped(),
        dimension_name: "minecraft:overworld".into(),
        world_name: "minecraft:overworld".into(),
        dimension_id: 0,
        difficulty: 2,
        hashed_seed: 0,
        max_players: 20,
        level_type: "default".into(),
        view_distance: 8,
        reduced_debug_info: false,
        enable_respawn_screen: true,
        is_debug: false,
        is_flat: false,
    }
}

async fn send_chunks(
    conn: &mut Connection,
    proto: Protocol,
    server: &Arc<ServerState>,
    render_distance: i32,
) -> Result<()> {
    let world = server.world.read().await;
    for cx in -render_distance..=render_distance {
        for cz in -render_distance..=render_distance {
            let (mask, data) = match world.chunk(pickaxe_types::ChunkPos { x: cx, z: cz }) {
                Some(chunk) => (chunk.section_mask(), chunk.serialize_sections(proto)),
                None => (0, Vec::new()),
            };
            send_packet(
                conn,
                proto,
                ConnectionState::Play,
                &InternalPacket::ChunkData {
                    chunk_x: cx,
                    chunk_z: cz,
                    primary_bit_mask: mask,
                    data,
                },
            )
            .await?;
        }
    }
    Ok(())
}

async fn send_packet(
    conn: &mut Connection,
    proto: Protocol,
    state: ConnectionState,
    packet: &InternalPacket,
) -> Result<()> {
    let mut encoded = pickaxe_protocol::encode(proto, state, packet)?;
    let packet_id = read_varint(&mut encoded)?;
    conn.write_packet(packet_id, &encoded).await?;
    Ok(())
}

/// Send a packet on a player's shared writer half, for use from outside the
/// connection's own read-loop task (the keep-alive ticker, event handlers).
pub async fn send_to_player(player: &Player, packet: &InternalPacket) -> Result<()> {
    let mut encoded = pickaxe_protocol::encode(player.protocol, ConnectionState::Play, packet)?;
    let packet_id = read_varint(&mut encoded)?;
    player.writer.lock().await.write_packet(packet_id, &encoded).await?;
    Ok(())
}
