//! Live deposit flow against a local anvil node.
//!
//! Needs `RPC_URL` (default `http://127.0.0.1:8545`) and `VAULT_ARTIFACTS_DIR` pointing at a
//! Foundry `out/` directory containing `USDK.sol/USDK.json` and
//! `SimpleERC4626.sol/SimpleERC4626.json`. Run with `cargo test -- --ignored`.

use std::{path::Path, sync::Arc};

use alloy_primitives::U256;
use ethers::{
    abi::{Abi, Tokenize},
    contract::{Contract, ContractFactory},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Bytes, U256 as EthersU256},
    utils::parse_ether,
};
use eyre::eyre;
use preflight::{
    compat::{from_h160, to_ethers_u256},
    reads::RpcReader,
    submit::{SignerSubmitter, TransactionSubmitter},
    DepositError, DepositRequest, DepositValidator,
};

// Anvil default keys [0] and [1].
const DEPLOYER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const SECOND_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

async fn client(provider: &Provider<Http>, key: &str) -> eyre::Result<Arc<Client>> {
    let chain_id = provider.get_chainid().await?.as_u64();
    let wallet = key.parse::<LocalWallet>()?.with_chain_id(chain_id);
    Ok(Arc::new(SignerMiddleware::new(provider.clone(), wallet)))
}

async fn deploy<T: Tokenize>(
    client: Arc<Client>,
    artifacts: &Path,
    name: &str,
    args: T,
) -> eyre::Result<Contract<Client>> {
    let path = artifacts.join(format!("{name}.sol/{name}.json"));
    let artifact: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
    let abi: Abi = serde_json::from_value(artifact["abi"].clone())?;
    let bytecode: Bytes = artifact["bytecode"]["object"]
        .as_str()
        .ok_or_else(|| eyre!("{} has no bytecode", path.display()))?
        .parse()?;

    let factory = ContractFactory::new(abi, bytecode, client);
    Ok(factory.deploy(args)?.send().await?)
}

#[tokio::test]
#[ignore = "requires anvil and Foundry vault artifacts"]
async fn deposit_flow_against_anvil() -> eyre::Result<()> {
    dotenv::dotenv().ok();
    let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".into());
    let artifacts = std::env::var("VAULT_ARTIFACTS_DIR")?;
    let artifacts = Path::new(&artifacts);

    let provider = Provider::<Http>::try_from(rpc_url.as_str())?;
    let deployer = client(&provider, DEPLOYER_KEY).await?;
    let second = client(&provider, SECOND_KEY).await?;
    let deployer_addr = deployer.address();
    let second_addr = second.address();

    let token = deploy(deployer.clone(), artifacts, "USDK", parse_ether(1000u64)?).await?;
    let vault = deploy(deployer.clone(), artifacts, "SimpleERC4626", token.address()).await?;
    token
        .method::<_, bool>("transfer", (second_addr, parse_ether(100u64)?))?
        .send()
        .await?
        .await?;

    let reader = RpcReader::new(Arc::new(provider.clone()));
    let validator = DepositValidator::new(reader);
    // 10 tokens at 18 decimals
    let amount = U256::from(10_000_000_000_000_000_000u128);
    let vault_addr = from_h160(vault.address());

    // Both accounts approve and deposit the same amount into the fresh vault.
    let mut received = Vec::new();
    for (signer, addr) in [(&deployer, deployer_addr), (&second, second_addr)] {
        let token_as = token.connect(Arc::clone(signer));
        token_as
            .method::<_, bool>("approve", (vault.address(), to_ethers_u256(amount)))?
            .send()
            .await?
            .await?;

        let before: EthersU256 = vault.method::<_, EthersU256>("balanceOf", addr)?.call().await?;
        let vault_assets_before: EthersU256 =
            token.method::<_, EthersU256>("balanceOf", vault.address())?.call().await?;

        let tx = validator
            .validate_and_build(&DepositRequest {
                depositor: from_h160(addr),
                vault: vault_addr,
                amount,
            })
            .await?;
        assert_eq!(tx.to, vault_addr);
        SignerSubmitter::new(Arc::clone(signer)).submit(&tx).await?;

        let after: EthersU256 = vault.method::<_, EthersU256>("balanceOf", addr)?.call().await?;
        let vault_assets_after: EthersU256 =
            token.method::<_, EthersU256>("balanceOf", vault.address())?.call().await?;
        assert_eq!(vault_assets_after - vault_assets_before, to_ethers_u256(amount));
        received.push(after - before);
    }
    assert_eq!(received[0], received[1]);
    assert!(received[0] > EthersU256::zero());

    // Allowance was consumed by the deposit above.
    let err = validator
        .validate_and_build(&DepositRequest {
            depositor: from_h160(deployer_addr),
            vault: vault_addr,
            amount,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DepositError::MissingAllowance { .. }));

    let err = validator
        .validate_and_build(&DepositRequest {
            depositor: from_h160(deployer_addr),
            vault: vault_addr,
            amount: amount * U256::from(999_999u64),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DepositError::NotEnoughBalance { .. }));

    Ok(())
}
