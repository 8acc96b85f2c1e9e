pub mod event;
pub mod topology;
pub mod vehicle;
