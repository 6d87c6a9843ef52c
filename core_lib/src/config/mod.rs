pub mod settings;

pub use settings::{split_addresses, AppConfig, ProbeConfig};
