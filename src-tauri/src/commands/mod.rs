pub mod analysis;
pub mod config;
pub mod service;
