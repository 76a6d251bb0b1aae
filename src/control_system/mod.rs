pub mod config;
pub mod traffic_light_controller;
