use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

pub struct CliOptions {
    pub log_level: Option<String>,
    pub version: bool,
    pub port: Option<u16>,
    pub host: Option<String>,
}

pub fn build_cli() -> Command {
    Command::new("huntress-mcp")
        .about("Huntress MCP server (stdio or HTTP JSON-RPC)")
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .num_args(1)
                .value_parser(value_parser!(u16))
                .help("Serve MCP over HTTP on this port instead of stdio (env: PORT)"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .num_args(1)
                .help("Bind address for HTTP mode (env: HOST, default 0.0.0.0)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
}

impl CliOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            log_level: matches.get_one::<String>("log-level").cloned(),
            version: matches.get_flag("version"),
            port: matches.get_one::<u16>("port").copied(),
            host: matches.get_one::<String>("host").cloned(),
        }
    }
}

/// Logs go to stderr; stdout carries the protocol in stdio mode.
pub fn init_logging(level: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(lvl) = level {
        builder.parse_filters(lvl);
    }
    builder.target(env_logger::Target::Stderr).init();
}
