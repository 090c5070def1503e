// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod render;
mod runtime;

use addressfinder_app::{Session, WidgetOptions};
use addressfinder_client::Client;
use anyhow::{Context, Result};
use config::Config;
use runtime::{HELP, Runtime, SharedService};
use std::env;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ADDRESSFINDER_LOG";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    init_logging();

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `addressfinder --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let widget = config
        .widget_config(options.widget_options())
        .with_context(|| {
            format!(
                "invalid [widget] config in {}",
                options.config_path.display()
            )
        })?;

    let client = Client::from_config(config.base_url(), &widget, config.timeout()?)
        .with_context(|| {
            format!(
                "invalid [service] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?;
    debug!(
        find = client.find_url().as_str(),
        retrieve = client.retrieve_url().as_str(),
        "address service configured"
    );
    if options.check_only {
        return Ok(());
    }

    let service: SharedService = Arc::new(client);
    let mut runtime = Runtime::new(Session::new(widget), service);
    print!("{HELP}");
    runtime.spawn_stdin_reader();
    runtime.run(&mut io::stdout().lock())
}

// Logs go to stderr; stdout carries the rendered list.
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    api_key: Option<String>,
    country: Option<String>,
    label_mode: Option<String>,
    full_counts: bool,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

impl CliOptions {
    /// Flags given on the command line form the explicit options layer.
    fn widget_options(&self) -> WidgetOptions {
        WidgetOptions {
            api_key: self.api_key.clone(),
            country: self.country.clone(),
            label_mode: self.label_mode.clone(),
            show_full_counts: self.full_counts.then_some(true),
            ..WidgetOptions::default()
        }
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        api_key: None,
        country: None,
        label_mode: None,
        full_counts: false,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--api-key" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--api-key requires a key"))?;
                options.api_key = Some(value.as_ref().to_owned());
            }
            "--country" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--country requires a country code"))?;
                options.country = Some(value.as_ref().to_owned());
            }
            "--label-mode" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--label-mode requires both, left, or right"))?;
                options.label_mode = Some(value.as_ref().to_owned());
            }
            "--full-counts" => {
                options.full_counts = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("addressfinder");
    println!("  --config <path>          Use a specific config path");
    println!("  --api-key <key>          Service API key (overrides [widget] apikey)");
    println!("  --country <code>         Country to search (overrides [widget] country)");
    println!("  --label-mode <mode>      Filter label shortening: both, left, right");
    println!("  --full-counts            Show exact address counts on collections");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and service settings");
    println!("  --help                   Show this help");
    println!();
    println!("Set {LOG_ENV} (for example {LOG_ENV}=debug) to change log verbosity.");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/addressfinder-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                api_key: None,
                country: None,
                label_mode: None,
                full_counts: false,
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--country"], default_options_path())
            .expect_err("missing country should fail");
        assert!(error.to_string().contains("--country requires"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn widget_flags_become_explicit_options() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--api-key",
                "KEY-1",
                "--country",
                "IE",
                "--label-mode",
                "right",
                "--full-counts",
            ],
            default_options_path(),
        )?;
        let widget = options.widget_options();
        assert_eq!(widget.api_key.as_deref(), Some("KEY-1"));
        assert_eq!(widget.country.as_deref(), Some("IE"));
        assert_eq!(widget.label_mode.as_deref(), Some("right"));
        assert_eq!(widget.show_full_counts, Some(true));
        assert_eq!(widget.max_items, None);
        Ok(())
    }

    #[test]
    fn absent_full_counts_flag_leaves_layer_unset() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(options.widget_options().show_full_counts, None);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
