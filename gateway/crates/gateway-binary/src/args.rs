use std::{fs, path::PathBuf};

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use engine::Variables;
use gateway_config::Config;
use tracing::Subscriber;
use tracing_subscriber::{registry::LookupSpan, Layer};

mod log;

pub(crate) use log::LogLevel;

use self::log::LogStyle;

pub(crate) type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

#[derive(Debug, Parser)]
#[command(name = "garage", version)]
#[command(arg_required_else_help = true)]
/// Runs operations against the car and dealership services
pub(crate) struct Args {
    /// Path to the TOML configuration file. Without one, the built-in defaults apply.
    #[arg(long, short, env = "GARAGE_CONFIG_PATH")]
    pub config: Option<PathBuf>,
    /// Set the logging level
    #[arg(long = "log", env = "GARAGE_LOG")]
    pub log_level: Option<LogLevel>,
    /// Set the style of log output
    #[arg(long, env = "GARAGE_LOG_STYLE", default_value_t = LogStyle::Text)]
    log_style: LogStyle,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Print the served schema as SDL
    Schema,
    /// Execute operation files in order against one store. Subscriptions stay live until the
    /// last operation has run.
    Run {
        /// Files holding one operation each
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Variables for every operation, as a JSON object
        #[arg(long, value_parser = parse_variables)]
        variables: Option<Variables>,
    },
}

fn parse_variables(input: &str) -> Result<Variables, String> {
    serde_json::from_str(input).map_err(|e| format!("variables must be a JSON object: {e}"))
}

pub(crate) fn parse() -> Args {
    Args::parse()
}

impl Args {
    pub fn config(&self) -> anyhow::Result<Config> {
        let Some(path) = &self.config else {
            return Ok(Config::default());
        };

        let config = fs::read_to_string(path).map_err(|e| anyhow!("error loading config file:\n{e}"))?;
        let config = toml::from_str(&config).map_err(|e| anyhow!("error parsing config:\n{e}"))?;

        Ok(config)
    }

    pub fn log_format<S>(&self) -> BoxedLayer<S>
    where
        S: Subscriber + for<'span> LookupSpan<'span> + Send + Sync,
    {
        // stdout carries responses only
        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

        match self.log_style {
            // for interactive terminals we provide colored output
            LogStyle::Text if atty::is(atty::Stream::Stderr) => layer.with_ansi(true).boxed(),
            LogStyle::Text => layer.with_ansi(false).boxed(),
            LogStyle::Json => layer.json().boxed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn run_arguments() {
        let args = Args::try_parse_from([
            "garage",
            "--log",
            "debug",
            "run",
            "insert.graphql",
            "query.graphql",
            "--variables",
            r#"{"type": "SUV"}"#,
        ])
        .unwrap();

        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(args.log_style, LogStyle::Text);

        let Command::Run { files, variables } = args.command else {
            unreachable!("expected the run command");
        };
        assert_eq!(files, [PathBuf::from("insert.graphql"), PathBuf::from("query.graphql")]);
        assert_eq!(variables.unwrap()["type"], "SUV");
    }

    #[test]
    fn variables_must_be_an_object() {
        let error = Args::try_parse_from(["garage", "run", "query.graphql", "--variables", "[1]"]).unwrap_err();

        assert!(error.to_string().contains("variables must be a JSON object"), "{error}");
    }

    #[test]
    fn run_requires_files() {
        assert!(Args::try_parse_from(["garage", "run"]).is_err());
    }

    #[test]
    fn without_config_the_defaults_apply() {
        let args = Args::try_parse_from(["garage", "schema"]).unwrap();

        assert!(matches!(args.command, Command::Schema));
        assert_eq!(args.config().unwrap(), Config::default());
    }
}
