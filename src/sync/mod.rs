pub mod arbiter;
pub mod clock;
pub mod queue;
