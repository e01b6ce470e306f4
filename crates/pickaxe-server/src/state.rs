use crate::config::ServerConfig;
use crate::player::PlayerRegistry;
use pickaxe_events::EventBus;
use pickaxe_world::World;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared server state reachable from every connection task, the keep-alive
/// ticker, and the accept loop.
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    pub world: RwLock<World>,
    pub players: PlayerRegistry,
    pub events: EventBus,
    next_entity_id: AtomicI32,
}

impl ServerState {
    pub fn new(config: Arc<ServerConfig>, world: World) -> Self {
        Self {
            config,
            world: RwLock::new(world),
            players: PlayerRegistry::new(),
            events: EventBus::new(),
            next_entity_id: AtomicI32::new(1),
        }
    }

    pub fn next_entity_id(&self) -> i32 {
        self.next_entity_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn player_count(&self) -> usize {
        self.players.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn entity_ids_are_assigned_without_repeats() {
        let state = ServerState::new(Arc::new(ServerConfig::default()), World::new("world"));
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert_ne!(a, b);
    }
}
