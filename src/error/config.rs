use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    #[error("Template set is empty; at least one query template is required")]
    EmptyTemplates,
    #[error("Template {name} has an empty query body")]
    EmptyTemplateQuery { name: String },
    #[error("No input file given (set --input or provide one in the config file)")]
    MissingInput,
}
