use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "concord",
    about = "Concord - game server and Discord state sync",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, env = "CONCORD_CONFIG", help = "Config file (default: <data dir>/concord.json)")]
    pub config: Option<PathBuf>,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the daemon (default if no command specified)")]
    Serve {
        #[arg(short, long, env = "CONCORD_PORT", help = "Override server.port")]
        port: Option<u16>,
    },

    #[command(about = "Resync linked accounts once and print a summary")]
    Resync {
        #[arg(
            help = "Identity: a game UUID, a Discord id, or game:<uuid> / discord:<id> (default: every linked account)"
        )]
        identity: Option<String>,

        #[arg(short, long, value_delimiter = ',', help = "Only these kinds (ban,mute,group,nickname,online_role)")]
        kind: Vec<String>,

        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(subcommand, about = "View and check configuration")]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show current configuration")]
    Show {
        #[arg(short, long, help = "Output as JSON")]
        json: bool,
    },

    #[command(about = "Validate the configuration file")]
    Validate,
}
