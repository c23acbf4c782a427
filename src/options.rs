use crate::config::{self, Config, ConfigError};
use crate::logger::Logger;

use clap::{
    crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches, Command,
};

use std::path::PathBuf;
use std::time::Duration;

pub struct Options {
    pub max_attempts: u32,
    pub disable_duration: Duration,
    pub pin: String,
    pub setup: bool,
    /// `None` keeps the PIN record in memory only.
    pub store: Option<PathBuf>,
    pub store_limit: Option<usize>,
}

fn valid_pin(s: &str) -> Result<String, String> {
    if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
        Ok(s.to_owned())
    } else {
        Err("a PIN must be one or more digits".to_owned())
    }
}

// No clap defaults: an unset flag must fall through to the config file, so the built-in values
// only appear in the help text.
fn command() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(
            Arg::new("max-attempts")
                .long("max-attempts")
                .help("Number of wrong PINs before the device is disabled. [default: 3]")
                .next_line_help(true)
                .value_name("N")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("disable-duration")
                .long("disable-duration")
                .help("How long the device stays disabled, e.g. \"90s\" or \"5m\". [default: 2m]")
                .next_line_help(true)
                .value_name("DURATION")
                .value_parser(humantime::parse_duration),
        )
        .arg(
            Arg::new("pin")
                .long("pin")
                .help("The PIN used until one is configured on the device. [default: 1234]")
                .next_line_help(true)
                .value_name("PIN")
                .value_parser(valid_pin),
        )
        .arg(
            Arg::new("no-setup")
                .long("no-setup")
                .action(ArgAction::SetTrue)
                .help("Don't let the PIN be changed from the device, always use --pin.")
                .next_line_help(true),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .help("Where to keep the configured PIN. [default: $XDG_CONFIG_HOME/pinlock/pin-record]")
                .next_line_help(true)
                .value_name("FILE"),
        )
        .arg(
            Arg::new("store-limit")
                .long("store-limit")
                .help("Refuse to write PIN records larger than this many bytes.")
                .next_line_help(true)
                .value_name("BYTES")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("volatile")
                .long("volatile")
                .action(ArgAction::SetTrue)
                .conflicts_with("store")
                .help("Keep the configured PIN in memory only, it is lost on restart.")
                .next_line_help(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Use an alternative config file. [default: $XDG_CONFIG_HOME/pinlock/pinlock.toml]")
                .next_line_help(true)
                .value_name("FILE"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .action(ArgAction::Count)
                .help("Enable verbose logging, repeat for greater effect (e.g. -vvv)."),
        )
}

impl Options {
    pub fn new() -> Self {
        let matches = command().get_matches();

        // Only fails if a logger is already installed, and options are parsed once per process.
        Logger::init(match matches.get_count("verbosity") {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .unwrap();

        let config = Config::new(matches.get_one::<String>("config").map(|s| s.as_str()));
        Self::resolve(&matches, config)
    }

    /// Command line values win over the config file, which wins over the built-in defaults.
    fn resolve(matches: &ArgMatches, config: Result<Config, ConfigError>) -> Self {
        let mut max_attempts = matches.get_one::<u32>("max-attempts").copied();
        let mut disable_duration = matches.get_one::<Duration>("disable-duration").copied();
        let mut pin = matches.get_one::<String>("pin").cloned();
        let mut setup = if matches.get_flag("no-setup") { Some(false) } else { None };
        let mut store = matches.get_one::<String>("store").map(PathBuf::from);
        let mut store_limit = matches.get_one::<usize>("store-limit").copied();
        let mut volatile = if matches.get_flag("volatile") { Some(true) } else { None };

        // Running without a pinlock.toml is normal. A broken one is reported and skipped.
        match config {
            Ok(config) => {
                max_attempts = max_attempts.or(config.max_attempts.filter(|&n| n > 0));
                disable_duration = disable_duration.or(config.disable_duration);
                pin = pin.or(config.pin.filter(|p| valid_pin(p).is_ok()));
                setup = setup.or(config.setup);
                // An explicit store on the command line wins over a volatile config.
                if store.is_none() {
                    volatile = volatile.or(config.volatile);
                }
                store = store.or(config.store);
                store_limit = store_limit.or(config.store_limit);
            }
            Err(ConfigError::NotFound) => {}
            Err(err) => log::error!("{}", err),
        };

        let store = if volatile.unwrap_or(false) {
            None
        } else {
            store.or_else(|| match config::config_dir() {
                Ok(dir) => Some(dir.join("pin-record")),
                Err(err) => {
                    log::warn!("{}, the PIN record will not be persisted", err);
                    None
                }
            })
        };

        // Three attempts, a two minute lockout, and PIN 1234 until one is set on the device.
        Self {
            max_attempts: max_attempts.unwrap_or(3),
            disable_duration: disable_duration.unwrap_or(Duration::from_secs(2 * 60)),
            pin: pin.unwrap_or_else(|| "1234".to_owned()),
            setup: setup.unwrap_or(true),
            store,
            store_limit,
        }
    }
}
