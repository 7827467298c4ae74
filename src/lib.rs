pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::remote::RemoteAdvisor;
pub use app::service::DiagnosisService;
pub use config::cli::LocalReportSource;
pub use config::toml_config::{AdvisorConfig, AdvisorMode};
pub use core::diagnosis::DiagnosisPipeline;
pub use domain::model::{DiagnosisResult, HardwareProfile};
pub use utils::error::{AdvisorError, Result};
