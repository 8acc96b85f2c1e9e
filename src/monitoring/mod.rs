pub mod aggregator;
pub mod event_log;
pub mod hub;
