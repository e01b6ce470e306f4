pub mod codec;
pub mod dimension;

pub use codec::{decode, decode_clientbound, encode};
