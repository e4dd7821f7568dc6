//! micropay CLI
//!
//! Thin command-line front end over the library. Recovery phrases are read
//! from stdin, never from arguments. Output is JSON on stdout.

use std::fs;
use std::io::{self, Read};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Serialize;
use serde_json::json;
use zeroize::Zeroize;

use micropay_core::assets::parse_unit;
use micropay_core::authorization::{authorize_spend, SpendRequest};
use micropay_core::balances::{reconcile_funds, StaticAssetRegistry, StaticPriceFeed};
use micropay_core::codec::{encode, EncodedValue, Shape, Value};
use micropay_core::config::CoreConfig;
use micropay_core::types::{FundsSnapshot, Network};
use micropay_core::wallet::{DerivationPath, SigningService};

#[derive(Parser)]
#[command(name = "micropay")]
#[command(about = "Fund authorization tools: datum encoding, key derivation, spend signing, balances", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Network (mainnet, preprod, preview); defaults to MICROPAY_NETWORK or mainnet
    #[arg(short, long, global = true)]
    network: Option<Network>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Split an asset unit into policy id and asset name
    ParseUnit {
        unit: String,
    },

    /// Encode a JSON value against a CIP-57 schema
    Encode {
        /// Schema file (JSON, may contain `definitions`)
        #[arg(short, long)]
        schema: String,

        /// Value as JSON
        value: String,

        /// Use indefinite-length lists instead of canonical encoding
        #[arg(long)]
        non_canonical: bool,
    },

    /// Decode CBOR hex into JSON
    Decode {
        cbor: String,
    },

    /// Derive keys and address for a path (phrase on stdin)
    Derive {
        /// Derivation path; defaults to the first external key of the account
        #[arg(short, long)]
        path: Option<DerivationPath>,

        /// Account used when no path is given
        #[arg(short, long)]
        account: Option<u32>,
    },

    /// Sign a spend authorization request (phrase on stdin)
    Authorize {
        /// Request file: fund, amount and address or merchant_address
        #[arg(short, long)]
        request: String,

        #[arg(short, long)]
        path: Option<DerivationPath>,
    },

    /// Reconcile a funds response into a priced balance snapshot
    Reconcile {
        /// Funds response file from the funds query service
        #[arg(short, long)]
        funds: String,

        /// Decimals override, `unit=decimals`
        #[arg(long = "decimals", value_parser = parse_decimals)]
        decimals: Vec<(String, u32)>,

        /// USD rate, `unit=rate`
        #[arg(long = "price", value_parser = parse_price)]
        prices: Vec<(String, Decimal)>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CoreConfig::from_env()?;
    if let Some(network) = cli.network {
        config.network = network;
    }
    config.debug_logging |= cli.verbose;
    config.apply_logging();

    match cli.command {
        Commands::ParseUnit { unit } => {
            let parsed = parse_unit(&unit);
            print_json(&json!({
                "group_id": parsed.group_id,
                "sub_name": parsed.sub_name,
                "label": parsed.label(),
                "name": parsed.name(),
            }))
        }
        Commands::Encode {
            schema,
            value,
            non_canonical,
        } => {
            let schema = fs::read_to_string(&schema).with_context(|| format!("reading {}", schema))?;
            let shape = Shape::from_blueprint_json(&schema)?;
            let value: serde_json::Value = serde_json::from_str(&value).context("value is not JSON")?;
            let encoded = encode(&Value::from_json(&value)?, &shape, !non_canonical)?;
            print_json(&json!({ "cbor": encoded.to_hex() }))
        }
        Commands::Decode { cbor } => {
            let data = EncodedValue::from_hex(cbor.trim())?.to_data()?;
            print_json(&data.to_json())
        }
        Commands::Derive { path, account } => {
            let path = match path {
                Some(path) => path,
                None => DerivationPath::payment(account.unwrap_or(config.default_account))?,
            };
            let phrase = read_phrase()?;
            let service = SigningService::from_config(&config);
            let keypair = service.derive_keypair(&phrase, &path)?;
            print_json(&json!({
                "network": service.network(),
                "path": keypair.path,
                "public_key": keypair.public_key,
                "stake_public_key": keypair.stake_public_key,
                "address": keypair.address,
            }))
        }
        Commands::Authorize { request, path } => {
            let body = fs::read_to_string(&request).with_context(|| format!("reading {}", request))?;
            let request: SpendRequest = serde_json::from_str(&body).context("invalid request JSON")?;
            let path = match path {
                Some(path) => path,
                None => DerivationPath::payment(config.default_account)?,
            };
            let phrase = read_phrase()?;
            let service = SigningService::from_config(&config);
            let envelope = authorize_spend(&service, &phrase, &path, &request)?;
            print_json(&envelope)
        }
        Commands::Reconcile {
            funds,
            decimals,
            prices,
        } => {
            let body = fs::read_to_string(&funds).with_context(|| format!("reading {}", funds))?;
            let funds: FundsSnapshot = serde_json::from_str(&body).context("invalid funds JSON")?;

            let mut registry = StaticAssetRegistry::new();
            for (unit, places) in decimals {
                registry.set_decimals(unit, places);
            }
            let mut feed = StaticPriceFeed::new();
            for (unit, rate) in prices {
                feed.insert(unit, rate);
            }
            print_json(&reconcile_funds(&funds, &registry, &feed))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_phrase() -> Result<SecretString> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("reading recovery phrase from stdin")?;
    let phrase = SecretString::from(buffer.trim().to_string());
    buffer.zeroize();
    Ok(phrase)
}

fn split_pair(raw: &str) -> Result<(String, &str)> {
    let (unit, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected unit=value, got '{}'", raw))?;
    Ok((unit.trim().to_string(), value.trim()))
}

fn parse_decimals(raw: &str) -> Result<(String, u32)> {
    let (unit, value) = split_pair(raw)?;
    Ok((unit, value.parse().context("decimals must be an integer")?))
}

fn parse_price(raw: &str) -> Result<(String, Decimal)> {
    let (unit, value) = split_pair(raw)?;
    Ok((unit, value.parse().context("price must be a decimal")?))
}
