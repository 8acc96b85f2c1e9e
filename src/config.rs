// Shared constants for every node process and the monitor.

/// All listeners bind and all senders connect on the loopback interface.
pub const HOST: &str = "127.0.0.1";

/// Port the event monitor listens on for node event streams.
pub const MONITOR_PORT: u16 = 9400;

/// Base time in milliseconds for a speed-factor-1 vehicle to clear a crossing.
/// Every road's green window must stay longer than the slowest vehicle type's
/// crossing time (factor 3), otherwise that vehicle is deferred forever.
pub const CROSSING_BASE_MS: u64 = 300;

/// Minimum spacing in milliseconds between two consecutive vehicles finishing
/// the same road segment. Prevents a fast vehicle from overtaking a slow one.
pub const MIN_SPACING_MS: u64 = 200;

/// Poll interval for queue-driven workers.
pub const TICK_MS: u64 = 20;

/// Mean vehicle generation rate per entrance, in vehicles per second.
pub const SPAWN_LAMBDA: f64 = 0.5;
