pub mod receiver;
pub mod sender;
pub mod wire;
