use clap::Parser;

/// Haven: talk to the Haven assistant from the terminal.
#[derive(Parser, Debug)]
#[command(name = "haven", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Service base URL override.
    #[arg(long)]
    pub base_url: Option<String>,

    /// Print the effective config as JSON and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
