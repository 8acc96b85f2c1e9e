pub mod config;
pub mod control;
pub mod engine;
pub mod model;
pub mod monitoring;
pub mod network;
pub mod sync;
