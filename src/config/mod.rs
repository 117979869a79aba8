//! Configuration module for Subvault
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every setting has a default, so running without a configuration file works.
//!
//! # Example
//!
//! ```no_run
//! use subvault::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will pace at {} requests/min", config.crawler.requests_per_minute);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, CrawlerConfig, ListingsConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::load_config;
