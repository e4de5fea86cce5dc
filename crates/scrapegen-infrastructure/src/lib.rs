//! Storage, configuration and process adapters for the scrapegen domain.

pub mod config_service;
pub mod dto;
pub mod in_memory_session_repository;
pub mod json_dir_session_repository;
pub mod paths;
pub mod process_runner;
mod repository;
pub mod script_publisher;
pub mod storage;
pub mod template_loader;

pub use crate::config_service::ConfigService;
pub use crate::in_memory_session_repository::InMemorySessionRepository;
pub use crate::json_dir_session_repository::JsonDirSessionRepository;
pub use crate::paths::{PathError, ScrapegenPaths};
pub use crate::process_runner::TokioProcessRunner;
pub use crate::script_publisher::DirScriptPublisher;
pub use crate::template_loader::load_base_template;
