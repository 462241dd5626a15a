mod cmd;
mod hardware;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "vend",
    about = "Vending machine controller: dispense slots when Square reports a completed payment",
    version,
    propagate_version = true
)]
struct Cli {
    /// Settings file (YAML). A missing file means stock settings.
    #[arg(long, global = true, env = "VEND_CONFIG", default_value = "vend.yaml")]
    config: PathBuf,

    /// Drive an in-memory relay bank instead of the GPIO header
    #[arg(long, global = true, env = "VEND_SIMULATE")]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve {
        /// Port to listen on (overrides the settings file)
        #[arg(long)]
        port: Option<u16>,

        /// Talk to the Square sandbox instead of production
        #[arg(long)]
        sandbox: bool,

        /// Square API access token
        #[arg(long, env = "SQUARE_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,

        /// Webhook subscription signature key; enables signature checks
        #[arg(long, env = "SQUARE_SIGNATURE_KEY", hide_env_values = true)]
        signature_key: Option<String>,

        /// Public URL Square posts notifications to
        #[arg(long, env = "SQUARE_NOTIFICATION_URL")]
        notification_url: Option<String>,
    },

    /// List every slot and the relay channels it drives
    Slots {
        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Run one dispense cycle for a slot
    Slot {
        /// Slot label, e.g. B3
        label: String,

        /// How long to hold the relays
        #[arg(long, default_value = "2000")]
        dwell_ms: u64,
    },

    /// Energize raw relay channels, hold, then release them
    Relay {
        /// Channels 1-16
        #[arg(required = true)]
        channels: Vec<u8>,

        /// How long to hold the relays
        #[arg(long, default_value = "5000")]
        hold_ms: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Slots { .. } => tracing::Level::WARN,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Serve {
            port,
            sandbox,
            access_token,
            signature_key,
            notification_url,
        } => cmd::serve::run(
            &cli.config,
            cli.simulate,
            cmd::serve::ServeOptions {
                port,
                sandbox,
                access_token,
                signature_key,
                notification_url,
            },
        ),
        Commands::Slots { json } => cmd::slots::run(json),
        Commands::Slot { label, dwell_ms } => cmd::slot::run(cli.simulate, &label, dwell_ms),
        Commands::Relay { channels, hold_ms } => cmd::relay::run(cli.simulate, &channels, hold_ms),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
