pub mod codec;
pub mod connection;
pub mod packets;
pub mod pool;
pub mod protocol;
pub mod registry;
pub mod state;

pub use codec::*;
pub use connection::{Connection, ConnectionError, ConnectionReader, ConnectionWriter};
pub use packets::*;
pub use pool::{global_pool, BufferPool, PooledBuffer};
pub use protocol::*;
pub use registry::{id_of, kind_of};
pub use state::*;
