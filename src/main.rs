// Civic contracts command line
// Builds program descriptors and runs contracts on the local harness

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use civic_contracts::smart_contracts::lending_escrow::{BORROW_TIME_KEY, COLLATERAL_KEY, ITEM_KEY};
use civic_contracts::smart_contracts::{LendingEscrow, TrustScore};
use civic_contracts::{
    find_contract, registry, Address, AppId, ContractCompiler, ContractEngine, ContractsConfig, Transaction,
    TransactionGroup,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "civic-contracts")]
struct Cli {
    /// JSON file overriding the default contract parameters
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available contracts
    List,
    /// Write approval and clear-state descriptors
    Build {
        /// Output directory
        #[arg(short, long, default_value = "./build")]
        out_dir: PathBuf,
        /// Only build this contract
        #[arg(long)]
        contract: Option<String>,
    },
    /// Print one contract's approval descriptor
    Describe {
        name: String,
    },
    /// Run the collateralized lending scenario on the local harness
    Simulate,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ContractsConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ContractsConfig::default(),
    };

    match cli.command {
        Commands::List => list_contracts(&config),
        Commands::Build { out_dir, contract } => build(&config, out_dir, contract),
        Commands::Describe { name } => describe(&config, &name),
        Commands::Simulate => simulate(&config),
    }
}

fn list_contracts(config: &ContractsConfig) -> Result<()> {
    for contract in registry(config) {
        let methods: Vec<_> = contract.methods().iter().map(|m| m.name).collect();
        println!(
            "{:<16} avm {}  {}",
            contract.name(),
            contract.avm_version(),
            methods.join(", ")
        );
    }
    Ok(())
}

fn build(config: &ContractsConfig, out_dir: PathBuf, only: Option<String>) -> Result<()> {
    let contracts = match only {
        Some(name) => match find_contract(&name, config) {
            Some(contract) => vec![contract],
            None => bail!("unknown contract: {}", name),
        },
        None => registry(config),
    };

    let written = ContractCompiler::build_all(&contracts, &out_dir)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

fn describe(config: &ContractsConfig, name: &str) -> Result<()> {
    let contract = find_contract(name, config).with_context(|| format!("unknown contract: {}", name))?;
    let program = ContractCompiler::approval(contract.as_ref())?;
    println!("{}", serde_json::to_string_pretty(&program)?);
    Ok(())
}

fn simulate(config: &ContractsConfig) -> Result<()> {
    info!("🚲 Simulating collateralized lending");

    let mut engine = ContractEngine::new().with_min_fee(config.min_fee);
    let lender = Address::from_seed(b"lender");
    let borrower = Address::from_seed(b"borrower");
    engine.fund(lender, 10_000_000)?;
    engine.fund(borrower, 5_000_000)?;

    let trust_app = engine.deploy(lender, Arc::new(TrustScore::new(config)))?;
    let lending_config = ContractsConfig {
        trust_app_id: Some(trust_app.0),
        ..config.clone()
    };
    let escrow = engine.deploy(lender, Arc::new(LendingEscrow::new(&lending_config)))?;

    engine.submit_one(Transaction::opt_in(borrower, trust_app))?;
    engine.submit_one(Transaction::opt_in(borrower, escrow))?;

    let borrow = TransactionGroup::new(vec![
        Transaction::payment(borrower, engine.application_address(escrow), config.min_collateral),
        Transaction::call(borrower, escrow, "borrow", vec![b"bike-1".to_vec()]),
    ])?;
    let receipt = engine.submit(&borrow)?;
    info!("✅ Borrowed bike-1 in round {}", receipt.round);
    log_lending_state(&engine, escrow, &borrower);

    engine.submit_one(Transaction::call(
        lender,
        escrow,
        "return",
        vec![borrower.as_bytes().to_vec()],
    ))?;
    info!("✅ Return confirmed");
    log_lending_state(&engine, escrow, &borrower);

    info!(
        "💰 Borrower balance {}, escrow balance {}",
        engine.balance(&borrower),
        engine.balance(&engine.application_address(escrow))
    );
    Ok(())
}

fn log_lending_state(engine: &ContractEngine, escrow: AppId, borrower: &Address) {
    let item = engine
        .local(escrow, borrower, ITEM_KEY)
        .and_then(|v| v.as_bytes().map(|b| String::from_utf8_lossy(b).into_owned()))
        .unwrap_or_default();
    let collateral = engine.local(escrow, borrower, COLLATERAL_KEY).and_then(|v| v.as_uint());
    let since = engine.local(escrow, borrower, BORROW_TIME_KEY).and_then(|v| v.as_uint());
    info!(
        "   item_id={} collateral={:?} borrow_time={:?}",
        item, collateral, since
    );
}
