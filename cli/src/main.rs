//! tCurrency CLI
//!
//! Loads rates, replays keypad input against the home currency and prints the
//! resulting amounts for every selected currency.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tcurrency_common::CurrencyCode;
use tcurrency_converter::{
    Converter, ConverterConfig, JsonFileSettingsStore, KeyEvent, MemorySettingsStore, SettingsStore,
};
use tcurrency_fx::{FileRateSource, HttpRateSource, RateSource};
use tcurrency_ledger::SelectedCurrencySet;

mod render;

/// tCurrency CLI
#[derive(Parser, Debug)]
#[command(name = "tcurrency")]
#[command(about = "Multi-currency converter with a calculator keypad")]
struct Args {
    /// Base currency rate tables are requested in
    #[arg(long)]
    base: Option<String>,

    /// Comma-separated currencies to show, home currency first
    #[arg(short, long)]
    currencies: Option<String>,

    /// Amount typed into the home currency
    #[arg(short, long)]
    amount: Option<String>,

    /// Currency to edit before replaying keys
    #[arg(long)]
    focus: Option<String>,

    /// Space-separated keypad presses, e.g. "1 2 + 3 ="
    #[arg(short, long)]
    keys: Option<String>,

    /// Read rates from a JSON file instead of the network
    #[arg(long)]
    rates_file: Option<PathBuf>,

    /// JSON file holding settings and the currency selection
    #[arg(long)]
    settings: Option<PathBuf>,

    /// List catalog currencies matching QUERY (all when omitted) and exit
    #[arg(long, value_name = "QUERY", num_args = 0..=1, default_missing_value = "")]
    list: Option<String>,

    /// Print the snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(default_level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string()),
    );

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

fn parse_selection(list: &str) -> anyhow::Result<SelectedCurrencySet> {
    let codes = list
        .split(',')
        .filter(|c| !c.trim().is_empty())
        .map(CurrencyCode::parse)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SelectedCurrencySet::new(codes)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = ConverterConfig::from_env();
    init_tracing(&config.log_level, args.log_json);

    if let Some(query) = &args.list {
        for line in render::render_catalog(query) {
            println!("{line}");
        }
        return Ok(());
    }

    if let Some(base) = &args.base {
        config.base_currency = base.clone();
    }
    if let Some(path) = &args.settings {
        config.settings_path = Some(path.clone());
    }
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let source: Arc<dyn RateSource> = match &args.rates_file {
        Some(path) => Arc::new(FileRateSource::new(path)),
        None => Arc::new(HttpRateSource::new(
            config.rate_endpoint.clone(),
            config.request_timeout,
        )?),
    };

    let store: Arc<dyn SettingsStore> = match &config.settings_path {
        Some(path) => Arc::new(JsonFileSettingsStore::open(path)),
        None => Arc::new(MemorySettingsStore::new()),
    };

    if let Some(list) = &args.currencies {
        store.save_selected_currencies(&parse_selection(list)?)?;
    }

    info!(source = source.name(), base = %config.base_currency, "Starting tCurrency");

    let converter = Converter::with_source(config, source, store)?;

    if let Err(e) = converter.load().await {
        warn!(error = %e, "Continuing without rates");
    }

    if let Some(amount) = &args.amount {
        let home = converter.selection().home().clone();
        converter.on_amount_edited(&home, amount);
    }

    if let Some(code) = &args.focus {
        let code = CurrencyCode::parse(code)?;
        if !converter.focus(&code) {
            warn!(currency = %code, "Currency is not selected; focus unchanged");
        }
    }

    if let Some(keys) = &args.keys {
        for token in keys.split_whitespace() {
            let key: KeyEvent = token.parse()?;
            converter.on_key_press(key);
        }
    }

    let snapshot = converter.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        for line in render::render(&snapshot, &converter.settings(), &chrono::Local::now()) {
            println!("{line}");
        }
    }

    Ok(())
}
