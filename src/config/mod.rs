//! Configuration module for Resolution-Harvest
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then command-line overrides applied by the binary before [`validate`].
//!
//! # Example
//!
//! ```no_run
//! use resolution_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvesting into: {}", config.output.directory.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, HeuristicsConfig, OutputConfig, UserAgentConfig, DEFAULT_START_URL,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
