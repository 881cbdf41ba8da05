use anyhow::Result;
use clap::{builder::PossibleValuesParser, value_parser};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Clone)]
pub struct AppArgs {
    pub config_file: String,
    pub config_test: bool,
    pub log_level: String,
}

pub fn parse_args() -> Result<AppArgs> {
    let args = clap::Command::new("socksd-rs")
        .version(crate::VERSION)
        .arg(
            clap::Arg::new("config")
                .short('c')
                .long("config")
                .help("Config filename")
                .default_value("config.yaml")
                .value_parser(value_parser!(String))
                .num_args(1),
        )
        .arg(
            clap::Arg::new("log-level")
                .short('l')
                .long("log")
                .help("Set log level")
                .value_parser(PossibleValuesParser::new([
                    "error", "warn", "info", "debug", "trace",
                ]))
                .num_args(1),
        )
        .arg(
            clap::Arg::new("config-check")
                .short('t')
                .long("test")
                .help("Load and check config file then exits")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();
    let config_file = args
        .get_one("config")
        .map(String::as_str)
        .unwrap_or("config.yaml")
        .to_string();
    let config_test = args.get_flag("config-check");
    let log_level = args
        .get_one("log-level")
        .map(String::as_str)
        .unwrap_or("info")
        .to_string();
    init_logging(&log_level)?;
    Ok(AppArgs {
        config_file,
        config_test,
        log_level,
    })
}

pub fn init_logging(log_level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.parse()?)
                .from_env()?,
        )
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_log_levels_parse() {
        // init_logging can only run once per process, so only the level
        // parsing is checked here
        for level in ["error", "warn", "info", "debug", "trace"] {
            assert!(level.parse::<tracing::Level>().is_ok());
        }
    }

    #[test]
    fn app_args_clone() {
        let args = AppArgs {
            config_file: "test.yaml".to_string(),
            config_test: true,
            log_level: "debug".to_string(),
        };
        let cloned = args.clone();
        assert_eq!(cloned.config_file, args.config_file);
        assert!(cloned.config_test);
    }
}
