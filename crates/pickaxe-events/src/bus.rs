use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Subscriber priority: synchronous subscribers run in this order, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Lowest = 0,
    Low = 1,
    Normal = 2,
    High = 3,
    Highest = 4,
    Monitor = 5,
}

/// A topic is a Rust type naming its own payload shape. Marker trait, no
/// methods: the payload type itself carries the event's contract.
pub trait Topic: Any + Send + Sync + 'static {}

type SyncHandler<T> = Box<dyn Fn(&mut T) + Send + Sync>;
type AsyncHandler<T> =
    Arc<dyn Fn(&T) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

struct SyncEntry<T> {
    priority: Priority,
    handler: SyncHandler<T>,
}

/// Per-topic subscriber lists, keyed by `TypeId` and downcast at dispatch.
/// Synchronous subscribers run in priority order on the publisher's task;
/// asynchronous subscribers are spawned independently and must not block
/// `publish`.
#[derive(Default)]
pub struct EventBus {
    sync_subscribers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    async_subscribers: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            sync_subscribers: HashMap::new(),
            async_subscribers: HashMap::new(),
        }
    }

    /// Subscribe a synchronous handler to `T`, run in priority order
    /// (lowest first) on the publisher's task during `publish`.
    pub fn subscribe<T, F>(&mut self, priority: Priority, handler: F)
    where
        T: Topic,
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        let entries = self
            .sync_subscribers
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Vec::<SyncEntry<T>>::new()))
            .downcast_mut::<Vec<SyncEntry<T>>>()
            .expect("subscriber list type mismatch");
        entries.push(SyncEntry {
            priority,
            handler: Box::new(handler),
        });
        entries.sort_by_key(|e| e.priority);
    }

    /// Subscribe an asynchronous handler to `T`. Async handlers never block
    /// `publish`: the caller is expected to spawn the returned future.
    pub fn subscribe_async<T, F, Fut>(&mut self, handler: F)
    where
        T: Topic,
        F: Fn(&T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let entries = self
            .async_subscribers
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Vec::<AsyncHandler<T>>::new()))
            .downcast_mut::<Vec<AsyncHandler<T>>>()
            .expect("subscriber list type mismatch");
        entries.push(Arc::new(move |event: &T| Box::pin(handler(event))));
    }

    /// Run every synchronous subscriber of `T` in priority order, mutating
    /// `event` in place so earlier subscribers can set flags later ones
    /// observe. Does not stop early — use `publish_cancellable` for topics
    /// that need dispatch to halt on cancellation.
    pub fn publish<T: Topic>(&self, event: &mut T) {
        if let Some(entries) = self.sync_subscribers.get(&TypeId::of::<T>()) {
            let entries = entries
                .downcast_ref::<Vec<SyncEntry<T>>>()
                .expect("subscriber list type mismatch");
            for entry in entries {
                (entry.handler)(event);
            }
        }
    }

    /// Like `publish`, but stops running subscribers as soon as one of them
    /// cancels the event — later, lower-priority subscribers never see it.
    pub fn publish_cancellable<T: Topic + Cancellable>(&self, event: &mut T) {
        if let Some(entries) = self.sync_subscribers.get(&TypeId::of::<T>()) {
            let entries = entries
                .downcast_ref::<Vec<SyncEntry<T>>>()
                .expect("subscriber list type mismatch");
            for entry in entries {
                (entry.handler)(event);
                if event.is_cancelled() {
                    break;
                }
            }
        }
    }

    /// Futures for every asynchronous subscriber of `T`; the caller spawns
    /// each one so publish never blocks on them.
    pub fn async_futures<T: Topic>(
        &self,
        event: &T,
    ) -> Vec<Pin<Box<dyn Future<Output = ()> + Send>>> {
        let Some(entries) = self.async_subscribers.get(&TypeId::of::<T>()) else {
            return Vec::new();
        };
        let entries = entries
            .downcast_ref::<Vec<AsyncHandler<T>>>()
            .expect("subscriber list type mismatch");
        entries.iter().map(|handler| handler(event)).collect()
    }
}

/// Implemented by events that carry a cancellation flag. `publish_cancellable`
/// uses this to stop dispatch as soon as a subscriber cancels.
pub trait Cancellable {
    fn is_cancelled(&self) -> bool;
}

/// A packet event: fired for every decoded inbound packet before the
/// built-in handler acts on it. Setting `cancelled` halts further
/// synchronous dispatch and suppresses the built-in handler.
pub struct PacketEvent<P> {
    pub connection_id: u64,
    pub player: Option<uuid::Uuid>,
    pub packet: P,
    pub cancelled: bool,
}

impl<P: Send + Sync + 'static> Topic for PacketEvent<P> {}

impl<P> Cancellable for PacketEvent<P> {
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
