pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::storage::LocalStorage;
pub use core::{etl::EtlEngine, pipeline::BannerPipeline};
pub use utils::error::{EtlError, Result};
