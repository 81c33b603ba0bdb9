pub mod config;
pub mod sandbox;
pub mod stats;
pub mod types;
