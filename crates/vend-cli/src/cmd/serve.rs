use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use square_client::{SquareClient, SquareConfig};
use vend_core::config::Config;
use vend_core::dispense::Dispenser;
use vend_core::inflight::InFlight;
use vend_core::ledger::OrderLedger;
use vend_core::relay::{ChannelTable, RelayDriver};
use vend_core::slot::ActuatorMap;
use vend_server::signature::SignatureVerifier;
use vend_server::{AppState, Pipeline};

use crate::hardware;

pub struct ServeOptions {
    pub port: Option<u16>,
    pub sandbox: bool,
    pub access_token: Option<String>,
    pub signature_key: Option<String>,
    pub notification_url: Option<String>,
}

pub fn run(config_path: &Path, simulate: bool, opts: ServeOptions) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let port = opts.port.unwrap_or(config.port);

    // Relays first: a controller that cannot actuate must not take payments.
    let map = ActuatorMap::standard();
    let table = ChannelTable::standard();
    map.validate(&table)?;
    let bank = hardware::open_bank(simulate)?;
    let driver = Arc::new(RelayDriver::configure(bank.as_ref(), &table)?);

    let square = SquareClient::new(square_config(&config, &opts))?;

    let ledger = match config.ledger_retention() {
        Some(retention) => OrderLedger::with_retention(retention),
        None => OrderLedger::new(),
    };
    let dispenser = Dispenser::new(map, Arc::clone(&driver), config.dwell(), InFlight::new());
    let pipeline = Pipeline::new(
        Arc::new(square),
        dispenser,
        ledger,
        config.resolve_timeout(),
    );

    let mut state = AppState::new(pipeline);
    let notification_url = opts
        .notification_url
        .or_else(|| config.square.notification_url.clone());
    match (opts.signature_key, notification_url) {
        (Some(key), Some(url)) => {
            tracing::info!(%url, "verifying webhook signatures");
            state = state.with_signature(SignatureVerifier::new(key, url));
        }
        (Some(_), None) => {
            bail!("a signature key is set but no notification URL; set SQUARE_NOTIFICATION_URL")
        }
        (None, _) => tracing::warn!("webhook signature verification is disabled"),
    }

    tracing::info!(
        port,
        dwell_ms = config.dwell_ms,
        simulate,
        "starting vending controller"
    );

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;
        vend_server::serve_on(state, listener, vend_server::shutdown_signal()).await
    });

    driver.release_all();
    result
}

fn square_config(config: &Config, opts: &ServeOptions) -> SquareConfig {
    let mut square = SquareConfig::new(opts.access_token.clone().unwrap_or_default())
        .with_timeout(config.resolve_timeout());
    if opts.sandbox {
        square = square.sandbox();
    }
    // An explicit base URL in the settings file wins over --sandbox.
    if let Some(base_url) = &config.square.base_url {
        square = square.with_base_url(base_url);
    }
    if let Some(version) = &config.square.version {
        square = square.with_version(version);
    }
    square
}

#[cfg(test)]
mod tests {
    use super::*;
    use square_client::client::{PRODUCTION_BASE_URL, SANDBOX_BASE_URL};

    fn options(sandbox: bool) -> ServeOptions {
        ServeOptions {
            port: None,
            sandbox,
            access_token: Some("tok".into()),
            signature_key: None,
            notification_url: None,
        }
    }

    #[test]
    fn defaults_to_production() {
        let square = square_config(&Config::default(), &options(false));
        assert_eq!(square.base_url, PRODUCTION_BASE_URL);
        assert_eq!(square.access_token, "tok");
    }

    #[test]
    fn sandbox_flag_switches_origin() {
        let square = square_config(&Config::default(), &options(true));
        assert_eq!(square.base_url, SANDBOX_BASE_URL);
    }

    #[test]
    fn configured_base_url_wins_over_sandbox_flag() {
        let mut config = Config::default();
        config.square.base_url = Some("http://127.0.0.1:9000".into());
        config.square.version = Some("2024-01-18".into());

        let square = square_config(&config, &options(true));
        assert_eq!(square.base_url, "http://127.0.0.1:9000");
        assert_eq!(square.version, "2024-01-18");
    }
}
