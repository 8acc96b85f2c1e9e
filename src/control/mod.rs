pub mod pass_road;
pub mod sorter;
pub mod spawner;
pub mod traffic_light;
