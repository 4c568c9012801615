//! Optional TOML configuration merged with the CLI.
//!
//! Precedence: a flag given on the command line always wins; otherwise a
//! value from the config file applies; otherwise the built-in default.
//! `resolve` collapses all three layers into the final [`RunSettings`].

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::ArgMatches;
use clap::parser::ValueSource;
use serde::Deserialize;

use crate::args::{LoadArgs, parse_delimiter, parse_duration_arg};
use crate::backend::{BackendConfig, QueryTemplate, default_templates};
use crate::error::{AppError, AppResult, ConfigError};

/// Default config filename checked when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "qload.toml";
/// Control endpoint address used when neither CLI nor config supply one.
pub const DEFAULT_CONTROL_LISTEN: &str = "127.0.0.1:8090";
const DEFAULT_BACKEND_URL: &str = "http://localhost:8123";
const DEFAULT_BACKEND_DATABASE: &str = "default";
const DEFAULT_BACKEND_USER: &str = "default";

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub input: Option<String>,
    pub queries: Option<u64>,
    pub connections: Option<usize>,
    pub workers: Option<usize>,
    pub qps: Option<u64>,
    pub duration: Option<String>,
    pub delimiter: Option<String>,
    pub min_fields: Option<usize>,
    pub progress: Option<bool>,
    pub backend: Option<BackendSection>,
    pub control: Option<ControlSection>,
    #[serde(default)]
    pub templates: Vec<QueryTemplate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BackendSection {
    pub url: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub max_threads: Option<u32>,
    pub request_timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ControlSection {
    pub listen: Option<String>,
    pub disabled: Option<bool>,
}

/// Everything the runner needs, fully resolved.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub input: PathBuf,
    pub queries: u64,
    pub connections: usize,
    pub workers_per_connection: usize,
    pub initial_qps: u64,
    pub duration: Option<Duration>,
    pub delimiter: char,
    pub min_fields: usize,
    /// `None` disables the rate-control endpoint.
    pub control_listen: Option<String>,
    pub progress: bool,
    pub backend: BackendConfig,
    pub templates: Vec<QueryTemplate>,
}

impl RunSettings {
    #[must_use]
    pub const fn total_workers(&self) -> usize {
        self.connections.saturating_mul(self.workers_per_connection)
    }
}

/// Load the config file named by `--config`, or the default file if present.
///
/// # Errors
///
/// Returns an error when an explicitly named file cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> AppResult<Option<ConfigFile>> {
    if let Some(path) = path {
        return Ok(Some(load_config_file(Path::new(path))?));
    }
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        return Ok(Some(load_config_file(default_path)?));
    }
    Ok(None)
}

pub(crate) fn load_config_file(path: &Path) -> AppResult<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|err| {
        AppError::config(ConfigError::ReadConfig {
            path: path.to_path_buf(),
            source: err,
        })
    })?;
    toml::from_str(&content).map_err(|err| {
        AppError::config(ConfigError::ParseToml {
            path: path.to_path_buf(),
            source: Box::new(err),
        })
    })
}

/// Collapse CLI, config file and defaults into [`RunSettings`].
///
/// # Errors
///
/// Returns an error when no input file is named anywhere, when a
/// config-supplied value fails validation (zero geometry, bad duration or
/// delimiter), or when the template set is unusable.
pub fn resolve(
    args: &LoadArgs,
    matches: &ArgMatches,
    file: Option<ConfigFile>,
) -> AppResult<RunSettings> {
    let file = file.unwrap_or_default();

    let input = args
        .input
        .clone()
        .or(file.input)
        .ok_or_else(|| AppError::config(ConfigError::MissingInput))?;

    let queries = pick_positive_u64(matches, "queries", args.queries, file.queries)?;
    let connections = pick_positive_usize(matches, "connections", args.connections, file.connections)?;
    let workers = pick_positive_usize(matches, "workers", args.workers, file.workers)?;
    let initial_qps = pick_positive_u64(matches, "qps", args.qps, file.qps)?;

    let duration = match args.duration {
        Some(duration) => Some(duration),
        None => file.duration.as_deref().map(parse_duration_arg).transpose()?,
    };

    let delimiter = if cli_set(matches, "delimiter") {
        args.delimiter
    } else {
        file.delimiter
            .as_deref()
            .map(parse_delimiter)
            .transpose()?
            .unwrap_or(args.delimiter)
    };

    let templates = resolve_templates(file.templates)?;
    let needed_fields = templates
        .iter()
        .map(QueryTemplate::placeholder_count)
        .max()
        .unwrap_or(1)
        .max(1);
    let min_fields = args.min_fields.or(file.min_fields).unwrap_or(needed_fields);

    let backend_section = file.backend.unwrap_or_default();
    let request_timeout = if cli_set(matches, "request_timeout") {
        args.request_timeout
    } else {
        backend_section
            .request_timeout
            .as_deref()
            .map(parse_duration_arg)
            .transpose()?
            .unwrap_or(args.request_timeout)
    };
    let backend = BackendConfig {
        url: args
            .url
            .clone()
            .or(backend_section.url)
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned()),
        database: args
            .database
            .clone()
            .or(backend_section.database)
            .unwrap_or_else(|| DEFAULT_BACKEND_DATABASE.to_owned()),
        user: args
            .user
            .clone()
            .or(backend_section.user)
            .unwrap_or_else(|| DEFAULT_BACKEND_USER.to_owned()),
        password: args
            .password
            .clone()
            .or(backend_section.password)
            .unwrap_or_default(),
        max_threads: args.max_threads.or(backend_section.max_threads),
        request_timeout,
    };

    let control_section = file.control.unwrap_or_default();
    let control_listen = resolve_control(args, control_section);

    Ok(RunSettings {
        input: PathBuf::from(input),
        queries,
        connections,
        workers_per_connection: workers,
        initial_qps,
        duration,
        delimiter,
        min_fields,
        control_listen,
        progress: args.progress || file.progress.unwrap_or(false),
        backend,
        templates,
    })
}

fn resolve_control(args: &LoadArgs, section: ControlSection) -> Option<String> {
    if args.no_control {
        return None;
    }
    if let Some(addr) = args.control_listen.clone() {
        return Some(addr);
    }
    if section.disabled.unwrap_or(false) {
        return None;
    }
    Some(
        section
            .listen
            .unwrap_or_else(|| DEFAULT_CONTROL_LISTEN.to_owned()),
    )
}

fn resolve_templates(from_file: Vec<QueryTemplate>) -> AppResult<Vec<QueryTemplate>> {
    if from_file.is_empty() {
        return Ok(default_templates());
    }
    for template in &from_file {
        if template.query.trim().is_empty() {
            return Err(AppError::config(ConfigError::EmptyTemplateQuery {
                name: template.name.clone(),
            }));
        }
    }
    Ok(from_file)
}

fn cli_set(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

fn pick_positive_u64(
    matches: &ArgMatches,
    id: &str,
    cli_value: u64,
    file_value: Option<u64>,
) -> AppResult<u64> {
    if cli_set(matches, id) {
        return Ok(cli_value);
    }
    match file_value {
        Some(0) => Err(AppError::validation(
            crate::error::ValidationError::NotPositive {
                value: format!("{id}=0"),
            },
        )),
        Some(value) => Ok(value),
        None => Ok(cli_value),
    }
}

fn pick_positive_usize(
    matches: &ArgMatches,
    id: &str,
    cli_value: usize,
    file_value: Option<usize>,
) -> AppResult<usize> {
    if cli_set(matches, id) {
        return Ok(cli_value);
    }
    match file_value {
        Some(0) => Err(AppError::validation(
            crate::error::ValidationError::NotPositive {
                value: format!("{id}=0"),
            },
        )),
        Some(value) => Ok(value),
        None => Ok(cli_value),
    }
}
