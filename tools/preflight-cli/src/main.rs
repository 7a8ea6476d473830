use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use alloy_primitives::{Address, B256, U256};
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
};
use preflight::{
    constants::{CLAIM_GAS_LIMIT, DEFAULT_IPFS_GATEWAY, DEFAULT_TOKEN_COUNT, DEPOSIT_GAS_LIMIT},
    decoder::{decode_call, DecodedCall},
    reads::RpcReader,
    submit::{SignerSubmitter, TransactionSubmitter},
    ClaimRequest, ClaimValidator, DepositRequest, DepositValidator, TransactionDescriptor,
};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pre-flight ERC-4626 deposits and ERC-1155 claims, printing unsigned transactions as JSON.
///
/// Nothing is sent unless `--broadcast` is given.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// JSON-RPC endpoint used for reads (and broadcasts).
    #[arg(long, env = "RPC_URL", default_value = "http://127.0.0.1:8545", global = true)]
    rpc_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a vault deposit and print the deposit transaction.
    Deposit {
        #[arg(long)]
        vault: Address,
        /// Depositor (and share receiver).
        #[arg(long)]
        wallet: Address,
        /// Amount in the asset's smallest unit (decimal or 0x-hex).
        #[arg(long)]
        amount: U256,
        #[arg(long, env = "GAS_LIMIT", default_value_t = DEPOSIT_GAS_LIMIT)]
        gas_limit: u64,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the asset, max deposit, balance and allowance a deposit is checked against.
    Constraints {
        #[arg(long)]
        vault: Address,
        #[arg(long)]
        wallet: Address,
    },
    /// Validate an ERC-1155 claim and print the claim transaction.
    Claim {
        #[arg(long)]
        collection: Address,
        #[arg(long)]
        wallet: Address,
        #[arg(long)]
        token_id: U256,
        #[arg(long, default_value = "1")]
        amount: U256,
        /// Claimable ids are `0..token_count`.
        #[arg(long, default_value_t = DEFAULT_TOKEN_COUNT)]
        token_count: u64,
        #[arg(long, default_value_t = CLAIM_GAS_LIMIT)]
        gas_limit: u64,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Resolve a collection token's metadata URI through an IPFS gateway.
    Metadata {
        #[arg(long)]
        collection: Address,
        #[arg(long)]
        token_id: U256,
        /// Also report how many of the token this account holds.
        #[arg(long)]
        holder: Option<Address>,
        #[arg(long, env = "IPFS_GATEWAY", default_value = DEFAULT_IPFS_GATEWAY)]
        gateway: String,
    },
    /// Decode deposit or claim call data.
    Decode {
        /// Hex call data (0x-prefixed or bare).
        #[arg(long)]
        data: String,
    },
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Also write `{ prepared_at, transaction }` to this file.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Sign and send the transaction after a successful pre-flight.
    #[arg(long)]
    broadcast: bool,

    /// Path to a file containing the signer private key.
    #[arg(long, env = "PRIV_KEY_PATH", conflicts_with = "private_key")]
    private_key_path: Option<PathBuf>,

    /// Private key (hex string, 0x...).
    #[arg(long, env = "PKEY", conflicts_with = "private_key_path")]
    private_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("preflight=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Deposit {
            vault,
            wallet,
            amount,
            gas_limit,
            ref output,
        } => {
            let provider = provider(&cli.rpc_url)?;
            let validator =
                DepositValidator::new(RpcReader::new(Arc::new(provider.clone()))).with_gas_limit(gas_limit);
            let request = DepositRequest {
                depositor: wallet,
                vault,
                amount,
            };
            let tx = validator.validate_and_build(&request).await?;
            emit(&provider, &tx, output).await?;
        }
        Command::Constraints { vault, wallet } => {
            let provider = provider(&cli.rpc_url)?;
            let validator = DepositValidator::new(RpcReader::new(Arc::new(provider)));
            let constraints = validator
                .read_constraints(&DepositRequest {
                    depositor: wallet,
                    vault,
                    amount: U256::ZERO,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&constraints)?);
        }
        Command::Claim {
            collection,
            wallet,
            token_id,
            amount,
            token_count,
            gas_limit,
            ref output,
        } => {
            let provider = provider(&cli.rpc_url)?;
            let validator = ClaimValidator::new(RpcReader::new(Arc::new(provider.clone())))
                .with_token_count(token_count)
                .with_gas_limit(gas_limit);
            let request = ClaimRequest {
                claimer: wallet,
                collection,
                token_id,
                amount,
            };
            let tx = validator.validate_and_build(&request).await?;
            emit(&provider, &tx, output).await?;
        }
        Command::Metadata {
            collection,
            token_id,
            holder,
            ref gateway,
        } => {
            let provider = provider(&cli.rpc_url)?;
            let validator =
                ClaimValidator::new(RpcReader::new(Arc::new(provider))).with_gateway(gateway.as_str());
            let url = validator.metadata_url(collection, token_id).await?;
            let mut out = json!({
                "collection": collection,
                "token_id": token_id,
                "url": url,
            });
            if let Some(holder) = holder {
                let balance = validator.holder_balance(collection, holder, token_id).await?;
                out["holder"] = json!(holder);
                out["balance"] = json!(balance);
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Decode { ref data } => {
            let bytes = hex::decode(data.trim().trim_start_matches("0x"))
                .context("call data is not valid hex")?;
            let decoded = match decode_call(&bytes)? {
                DecodedCall::Deposit { assets, receiver } => json!({
                    "function": "deposit(uint256,address)",
                    "assets": assets,
                    "receiver": receiver,
                }),
                DecodedCall::Claim { token_id, amount } => json!({
                    "function": "claim(uint256,uint256)",
                    "token_id": token_id,
                    "amount": amount,
                }),
            };
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
    }

    Ok(())
}

fn provider(rpc_url: &str) -> Result<Provider<Http>> {
    Provider::<Http>::try_from(rpc_url).with_context(|| format!("invalid RPC URL {rpc_url}"))
}

/// Optionally persist and broadcast the descriptor, then print a single JSON document.
async fn emit(provider: &Provider<Http>, tx: &TransactionDescriptor, output: &OutputArgs) -> Result<()> {
    if let Some(ref path) = output.out {
        write_prepared_json(path, tx)?;
        info!(path = %path.display(), "wrote prepared transaction");
    }

    let hash = if output.broadcast {
        Some(broadcast(provider, tx, output).await?)
    } else {
        None
    };
    println!("{}", serde_json::to_string_pretty(&report(tx, hash)?)?);
    Ok(())
}

/// The bare descriptor, or `{ transaction, hash }` once it has been mined.
fn report(tx: &TransactionDescriptor, hash: Option<B256>) -> Result<Value> {
    Ok(match hash {
        Some(hash) => json!({
            "transaction": tx,
            "hash": hash,
        }),
        None => serde_json::to_value(tx)?,
    })
}

async fn broadcast(
    provider: &Provider<Http>,
    tx: &TransactionDescriptor,
    output: &OutputArgs,
) -> Result<B256> {
    let key = signer_key(output)?;
    let chain_id = provider
        .get_chainid()
        .await
        .context("failed reading chain id")?
        .as_u64();
    let wallet = key
        .parse::<LocalWallet>()
        .context("invalid private key")?
        .with_chain_id(chain_id);
    let client = Arc::new(SignerMiddleware::new(provider.clone(), wallet));
    let hash = SignerSubmitter::new(client).submit(tx).await?;
    info!(%hash, "confirmed transaction");
    Ok(hash)
}

fn signer_key(output: &OutputArgs) -> Result<String> {
    if let Some(ref path) = output.private_key_path {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        Ok(raw.trim().to_string())
    } else if let Some(ref pk) = output.private_key {
        Ok(pk.trim().to_string())
    } else {
        Err(anyhow!(
            "missing signer key: provide --private-key-path or --private-key (or set PRIV_KEY_PATH/PKEY)"
        ))
    }
}

fn write_prepared_json(path: &Path, tx: &TransactionDescriptor) -> Result<()> {
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    let root: Value = json!({
        "prepared_at": now,
        "transaction": tx,
    });
    write_json_atomic(path, &root)
}

fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }

    let serialised = serde_json::to_string_pretty(value).context("failed serialising JSON")?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_deposit_command() {
        let cli = Cli::try_parse_from([
            "preflight",
            "deposit",
            "--vault",
            "0x00000000000000000000000000000000000000aa",
            "--wallet",
            "0x00000000000000000000000000000000000000bb",
            "--amount",
            "10",
        ])
        .unwrap();

        match cli.command {
            Command::Deposit {
                amount, gas_limit, output, ..
            } => {
                assert_eq!(amount, U256::from(10u64));
                assert_eq!(gas_limit, DEPOSIT_GAS_LIMIT);
                assert!(!output.broadcast);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn key_sources_conflict() {
        let res = Cli::try_parse_from([
            "preflight",
            "claim",
            "--collection",
            "0x00000000000000000000000000000000000000aa",
            "--wallet",
            "0x00000000000000000000000000000000000000bb",
            "--token-id",
            "0",
            "--private-key",
            "0x01",
            "--private-key-path",
            "key.txt",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn prepared_json_is_written_atomically() {
        let dir = std::env::temp_dir().join(format!("preflight-cli-{}", std::process::id()));
        let path = dir.join("deposit.json");
        let tx = TransactionDescriptor::call(Address::ZERO, Address::ZERO, vec![0x6e, 0x55, 0x3f, 0x65], 200_000);

        write_prepared_json(&path, &tx).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["transaction"]["data"], "0x6e553f65");
        assert!(written["prepared_at"].is_string());
        assert!(!tmp_path_for(&path).exists());
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn broadcast_report_is_one_json_document() {
        let tx = TransactionDescriptor::call(Address::ZERO, Address::ZERO, vec![0x6e, 0x55, 0x3f, 0x65], 200_000);
        let hash = B256::repeat_byte(0x11);

        let printed = serde_json::to_string_pretty(&report(&tx, Some(hash)).unwrap()).unwrap();
        let parsed: Value = serde_json::from_str(&printed).unwrap();
        assert_eq!(parsed["hash"], json!(hash));
        assert_eq!(parsed["transaction"]["gas"], 200_000);

        let bare = report(&tx, None).unwrap();
        assert_eq!(bare["data"], "0x6e553f65");
        assert!(bare.get("hash").is_none());
    }

    #[test]
    fn metadata_holder_is_optional() {
        let cli = Cli::try_parse_from([
            "preflight",
            "metadata",
            "--collection",
            "0x00000000000000000000000000000000000000aa",
            "--token-id",
            "2",
            "--holder",
            "0x00000000000000000000000000000000000000bb",
        ])
        .unwrap();

        match cli.command {
            Command::Metadata { holder, token_id, .. } => {
                let expected: Address = "0x00000000000000000000000000000000000000bb".parse().unwrap();
                assert_eq!(holder, Some(expected));
                assert_eq!(token_id, U256::from(2u64));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
