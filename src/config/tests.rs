use std::io::Write as _;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};

use super::{ConfigFile, DEFAULT_CONTROL_LISTEN, load_config_file, resolve};
use crate::args::LoadArgs;
use crate::error::{AppError, AppResult};

fn parse_cli(argv: &[&str]) -> AppResult<(LoadArgs, clap::ArgMatches)> {
    let matches = LoadArgs::command().try_get_matches_from(argv.iter().copied())?;
    let args = LoadArgs::from_arg_matches(&matches)?;
    Ok((args, matches))
}

fn parse_config(content: &str) -> AppResult<ConfigFile> {
    let mut file = tempfile::NamedTempFile::new().map_err(|err| AppError::Io { source: err })?;
    file.write_all(content.as_bytes())
        .map_err(|err| AppError::Io { source: err })?;
    load_config_file(file.path())
}

#[test]
fn cli_only_resolves_with_defaults() -> AppResult<()> {
    let (args, matches) = parse_cli(&["qload", "-f", "params.tsv"])?;
    let settings = resolve(&args, &matches, None)?;
    assert_eq!(settings.input.to_string_lossy(), "params.tsv");
    assert_eq!(settings.queries, 10_000);
    assert_eq!(settings.connections, 1);
    assert_eq!(settings.workers_per_connection, 5);
    assert_eq!(settings.total_workers(), 5);
    assert_eq!(settings.initial_qps, 50);
    assert_eq!(settings.delimiter, '\t');
    assert_eq!(settings.min_fields, 2);
    assert_eq!(settings.control_listen.as_deref(), Some(DEFAULT_CONTROL_LISTEN));
    assert_eq!(settings.backend.url, "http://localhost:8123");
    assert_eq!(settings.templates.len(), 3);
    Ok(())
}

#[test]
fn missing_input_everywhere_is_an_error() -> AppResult<()> {
    let (args, matches) = parse_cli(&["qload"])?;
    assert!(resolve(&args, &matches, None).is_err());
    Ok(())
}

#[test]
fn config_fills_what_cli_left_default() -> AppResult<()> {
    let file = parse_config(
        r#"
input = "from_config.tsv"
queries = 500
connections = 3
qps = 200
duration = "2m"
delimiter = ","

[backend]
url = "http://ch.internal:8123"
database = "analytics"
max_threads = 4
request_timeout = "5s"
"#,
    )?;
    let (args, matches) = parse_cli(&["qload"])?;
    let settings = resolve(&args, &matches, Some(file))?;
    assert_eq!(settings.input.to_string_lossy(), "from_config.tsv");
    assert_eq!(settings.queries, 500);
    assert_eq!(settings.connections, 3);
    assert_eq!(settings.initial_qps, 200);
    assert_eq!(settings.duration, Some(Duration::from_secs(120)));
    assert_eq!(settings.delimiter, ',');
    assert_eq!(settings.backend.url, "http://ch.internal:8123");
    assert_eq!(settings.backend.database, "analytics");
    assert_eq!(settings.backend.max_threads, Some(4));
    assert_eq!(settings.backend.request_timeout, Duration::from_secs(5));
    Ok(())
}

#[test]
fn cli_beats_config_when_both_given() -> AppResult<()> {
    let file = parse_config("input = \"ignored.tsv\"\nqueries = 9\nqps = 9\n")?;
    let (args, matches) = parse_cli(&["qload", "-f", "cli.tsv", "-n", "42", "--qps", "7"])?;
    let settings = resolve(&args, &matches, Some(file))?;
    assert_eq!(settings.input.to_string_lossy(), "cli.tsv");
    assert_eq!(settings.queries, 42);
    assert_eq!(settings.initial_qps, 7);
    Ok(())
}

#[test]
fn zero_geometry_in_config_is_rejected() -> AppResult<()> {
    let file = parse_config("input = \"x.tsv\"\nworkers = 0\n")?;
    let (args, matches) = parse_cli(&["qload"])?;
    assert!(resolve(&args, &matches, Some(file)).is_err());
    Ok(())
}

#[test]
fn config_templates_replace_builtins() -> AppResult<()> {
    let file = parse_config(
        r#"
input = "x.tsv"

[[templates]]
name = "lookup"
query = "SELECT * FROM t WHERE id = ?"
"#,
    )?;
    let (args, matches) = parse_cli(&["qload"])?;
    let settings = resolve(&args, &matches, Some(file))?;
    assert_eq!(settings.templates.len(), 1);
    assert_eq!(settings.min_fields, 1);
    Ok(())
}

#[test]
fn empty_template_query_is_rejected() -> AppResult<()> {
    let file = parse_config(
        r#"
input = "x.tsv"

[[templates]]
name = "broken"
query = "   "
"#,
    )?;
    let (args, matches) = parse_cli(&["qload"])?;
    assert!(resolve(&args, &matches, Some(file)).is_err());
    Ok(())
}

#[test]
fn control_endpoint_resolution() -> AppResult<()> {
    let (args, matches) = parse_cli(&["qload", "-f", "x", "--no-control"])?;
    assert!(resolve(&args, &matches, None)?.control_listen.is_none());

    let (args, matches) = parse_cli(&["qload", "-f", "x", "--control-listen", "0.0.0.0:9001"])?;
    assert_eq!(
        resolve(&args, &matches, None)?.control_listen.as_deref(),
        Some("0.0.0.0:9001")
    );

    let file = parse_config("input = \"x\"\n[control]\ndisabled = true\n")?;
    let (args, matches) = parse_cli(&["qload"])?;
    assert!(resolve(&args, &matches, Some(file))?.control_listen.is_none());
    Ok(())
}

#[test]
fn unparsable_toml_is_a_config_error() {
    assert!(parse_config("input = [broken").is_err());
}
