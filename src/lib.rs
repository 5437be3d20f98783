pub mod cli;
pub mod core;
pub mod llm;
pub mod pipeline;
pub mod profile;
pub mod prompts;
pub mod registry;
pub mod schema;
pub mod scrapers;
pub mod store;
pub mod utils;

pub use crate::core::ConfigManager;
pub use pipeline::{ApplicantPipeline, CompanyPipeline, ComparePipeline, PipelineError};
pub use store::ProfileStore;
