use std::path::PathBuf;
use std::process::ExitCode;

use alloy_primitives::U256;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use abi_codec::config::{self, Config};
use abi_codec::infrastructure::abi::format::{event_json, format_event, format_function, function_json};
use abi_codec::{logging, to_hex, AbiCodec, DecodeResult, ExportableResult, TransactionEnvelope};

#[derive(Debug, Parser)]
#[command(
    name = "abi-codec",
    version,
    about = "Decode and encode Ethereum call data and event logs against a JSON ABI"
)]
struct Args {
    /// ABI JSON file (bare fragment array or compiler artifact)
    #[arg(long, global = true)]
    abi: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Log filter (e.g. "debug", "abi_codec=trace"); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify and decode call data
    Decode {
        /// Hex call data (selector followed by arguments)
        data: String,

        /// Wei sent with the call (decimal or 0x hex)
        #[arg(long)]
        value: Option<String>,

        #[arg(long)]
        gas_limit: Option<u64>,
    },
    /// Decode the input of a signed raw transaction
    DecodeTx {
        /// EIP-2718 encoded transaction hex
        raw: String,
    },
    /// Decode an event log
    Event {
        /// Log data blob
        #[arg(long, default_value = "0x")]
        data: String,

        /// Topic, repeated in log order (signature hash first)
        #[arg(long = "topic", required = true)]
        topics: Vec<String>,
    },
    /// Encode a function call
    Encode {
        /// Function name, or full signature to pick an overload
        function: String,

        /// Arguments in declaration order
        args: Vec<String>,
    },
    /// List functions in declaration order
    Functions,
    /// List events in declaration order
    Events,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let (config, config_error) = match config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err)),
    };
    logging::init_tracing(args.log_level.as_deref(), &config.log);
    if let Some(err) = config_error {
        warn!(path = %err.path.display(), reason = %err.reason, "ignoring unreadable config file");
    }

    match run(&args, &config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &Config) -> Result<ExitCode> {
    let json = args.json || config.json;
    let config_dir = config::config_path().and_then(|path| path.parent().map(PathBuf::from));
    let Some(abi_path) = config.abi_path(args.abi.as_deref(), config_dir.as_deref()) else {
        bail!("no ABI given: pass --abi or set `abi` in the config file");
    };
    let codec = AbiCodec::from_file(&abi_path)
        .with_context(|| format!("failed to load ABI from {}", abi_path.display()))?;

    match &args.command {
        Command::Decode {
            data,
            value,
            gas_limit,
        } => {
            let value = value
                .as_deref()
                .map(parse_wei)
                .transpose()?;
            let tx = TransactionEnvelope {
                data: data.clone(),
                value,
                gas_limit: *gas_limit,
            };
            let result = codec.decode_transaction(&tx)?;
            Ok(print_result(&result, json)?)
        }
        Command::DecodeTx { raw } => {
            let result = codec.decode_raw_transaction(raw)?;
            Ok(print_result(&result, json)?)
        }
        Command::Event { data, topics } => {
            let event = codec.decode_event(topics.as_slice(), data).context("failed to decode event log")?;
            Ok(print_result(&DecodeResult::EventLog(event), json)?)
        }
        Command::Encode { function, args } => {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            let encoded = codec
                .encode_call_strs(function, &args)
                .with_context(|| format!("failed to encode call to {function}"))?;
            if json {
                print_json(&serde_json::json!({ "data": to_hex(&encoded) }))?;
            } else {
                println!("{}", to_hex(&encoded));
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Functions => {
            let functions = codec.list_functions()?;
            if json {
                print_json(&functions.iter().map(function_json).collect::<Vec<Value>>())?;
            } else {
                for function in functions {
                    println!("{}", format_function(function));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Events => {
            let events = codec.list_events()?;
            if json {
                print_json(&events.iter().map(event_json).collect::<Vec<Value>>())?;
            } else {
                for event in events {
                    println!("{}", format_event(event));
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Print a decode result; error and unknown results exit non-zero
fn print_result(result: &DecodeResult, json: bool) -> Result<ExitCode> {
    if json {
        print_json(&ExportableResult::from(result))?;
    } else {
        println!("{}", AbiCodec::format_result(result));
    }
    Ok(match result {
        DecodeResult::FunctionCall(_) | DecodeResult::EventLog(_) => ExitCode::SUCCESS,
        DecodeResult::Error { error, .. } => {
            warn!(code = error.code(), "input could not be decoded");
            ExitCode::from(2)
        }
        DecodeResult::Unknown { selector, .. } => {
            warn!(%selector, "selector not found in ABI");
            ExitCode::from(2)
        }
    })
}

fn parse_wei(value: &str) -> Result<U256> {
    let value = value.trim();
    let parsed = match value.strip_prefix("0x") {
        Some(hex) => U256::from_str_radix(hex, 16),
        None => U256::from_str_radix(value, 10),
    };
    parsed.with_context(|| format!("invalid wei amount: {value}"))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}
