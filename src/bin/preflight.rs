use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use ethers::utils::format_ether;
use hospital_ledger_gateway::{AppConfig, ContentStore, IpfsStore};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight\n\
         \n\
         Requires env vars:\n\
           HOSPITAL_CONTRACT_ADDRESS, UID_SECRET,\n\
           SIGNER_PRIVATE_KEY (or SIGNER_KEY_FILE)\n\
         Optional:\n\
           ETH_RPC_URL, IPFS_API_URL, PATIENT_CONTRACT_ADDRESS, DOCTOR_CONTRACT_ADDRESS\n"
    );
    std::process::exit(2);
}

async fn check_contract(provider: &Provider<Http>, name: &str, address: Address) -> anyhow::Result<()> {
    let code = provider.get_code(address, None).await?;
    if code.as_ref().is_empty() {
        return Err(anyhow::anyhow!("{} contract has no code at {:?}", name, address));
    }
    println!("  {} contract deployed at {:?} ({} bytes).", name, address, code.len());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }

    // Force-read config (nice error messages if missing)
    let config = AppConfig::from_env()?;

    println!("> Preflight:");
    println!("  ETH_RPC_URL={}", config.rpc_url);
    println!("  IPFS_API_URL={}", config.ipfs_api_url);

    let provider = Provider::<Http>::try_from(config.rpc_url.as_str())?;

    // Basic RPC connectivity
    let chain_id = provider.get_chainid().await?;
    let block = provider.get_block_number().await?;
    println!("  Chain id: {} (head block {})", chain_id, block);

    // Signer balance
    let wallet = config.signer_key.parse::<LocalWallet>()?;
    let balance = provider.get_balance(wallet.address(), None).await?;
    println!("  Signer: {:?}", wallet.address());
    println!("  Signer balance: {} ETH", format_ether(balance));
    if balance.is_zero() {
        eprintln!("  Warning: signer has no funds; ledger writes will fail.");
    }

    // Contract code
    check_contract(&provider, "Hospital", config.contracts.hospital).await?;
    if let Some(address) = config.contracts.patient {
        check_contract(&provider, "Patient", address).await?;
    }
    if let Some(address) = config.contracts.doctor {
        check_contract(&provider, "Doctor", address).await?;
    }

    // Content store
    let store = IpfsStore::new(&config.ipfs_api_url, config.ipfs_timeout)?;
    let version = store.ping().await?;
    println!("  IPFS node version: {}", version);

    println!("> Preflight OK.");
    Ok(())
}
