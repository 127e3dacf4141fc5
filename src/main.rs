use anyhow::Context;
use log::info;

use signed_ledger::{Address, Blockchain, ChainConfig, Transaction, Wallet};

// Load the config from the path given as first argument, or fall back to defaults
fn load_config() -> anyhow::Result<ChainConfig> {
    match std::env::args().nth(1) {
        Some(path) => ChainConfig::from_file(&path)
            .with_context(|| format!("failed to load config from {}", path)),
        None => Ok(ChainConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = load_config()?;
    let mut ledger = Blockchain::with_config(&config)?;

    let wallet = Wallet::new();
    info!("Created wallet with address: {}", wallet.address());

    let recipient = Address::from("recipient-address");

    ledger.mine_pending_transactions(wallet.address());
    println!("Balance after first block: {}", ledger.get_balance(wallet.address()));

    let mut transaction = Transaction::new(wallet.address().clone(), recipient.clone(), 10.0);
    transaction.sign(&wallet)?;
    ledger.add_transaction(transaction)?;

    ledger.mine_pending_transactions(wallet.address());
    println!("Balance of miner: {}", ledger.get_balance(wallet.address()));
    println!("Balance of recipient: {}", ledger.get_balance(&recipient));

    for transaction in ledger.get_transaction_history(wallet.address()) {
        println!(
            "  {} -> {}: {}",
            transaction.sender().map(Address::as_str).unwrap_or("<reward>"),
            transaction.recipient(),
            transaction.amount()
        );
    }

    println!("Blocks: {}", ledger.get_chain().len());
    println!("Chain valid: {}", ledger.is_valid());

    Ok(())
}
