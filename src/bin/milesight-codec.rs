use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};

use milesight_codec::config::{value_mode_from_env, ConfigFile};
use milesight_codec::{Product, Record, ValueMode};

#[derive(Parser)]
struct Opts {
    /// device family, e.g. uc51x
    #[clap(long, value_enum)]
    product: Product,
    /// optional codec config TOML (`value_mode`, `custom_message_fallback`)
    #[clap(long)]
    config: Option<String>,
    /// raw or named enum values (overrides MILESIGHT_CODEC_VALUE_MODE and the config file)
    #[clap(long)]
    value_mode: Option<ValueMode>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode an uplink payload given as hex, e.g. `0175640367f600`
    Decode { hex: String },
    /// Encode a downlink command given as a JSON object
    Encode { json: String },
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();
    tracing_subscriber::fmt::init();

    let file = match opts.config.as_deref() {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let mut config = file.resolve(opts.product);
    if let Some(mode) = value_mode_from_env() {
        config.value_mode = mode;
    }
    if let Some(mode) = opts.value_mode {
        config.value_mode = mode;
    }
    tracing::debug!(product = %opts.product, value_mode = ?config.value_mode, "codec configured");

    match opts.command {
        Command::Decode { hex } => {
            let decoder = opts
                .product
                .decoder(config)
                .ok_or_else(|| anyhow!("{} has no uplink decoder", opts.product))?;
            let compact: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = hex::decode(&compact).context("payload is not valid hex")?;
            let record = decoder.decode(&bytes)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Encode { json } => {
            let encoder = opts
                .product
                .encoder(config)
                .ok_or_else(|| anyhow!("{} has no downlink encoder", opts.product))?;
            let command: Record = serde_json::from_str(&json).context("command is not a JSON object")?;
            let bytes = encoder.encode(&command)?;
            println!("{}", hex::encode(bytes));
        }
    }
    Ok(())
}
