pub mod bus;

pub use bus::{Cancellable, EventBus, PacketEvent, Priority, Topic};
