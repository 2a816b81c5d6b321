pub mod analysis;
pub mod service_status;
pub mod settings;
