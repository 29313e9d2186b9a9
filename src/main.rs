use clap::{Parser, Subcommand};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error};

use pricelens::agent::{AnalysisPipeline, ClaudeClient, LlmProvider};
use pricelens::config::Config;
use pricelens::db::Db;
use pricelens::elasticity::{self, PriceType};
use pricelens::{seed, server};

/// Price elasticity analysis over order history
#[derive(Parser)]
#[command(name = "pricelens")]
#[command(about = "Compute price elasticities and ask questions about them", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (default: ./pricelens.toml)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate demo products and orders
    Seed {
        /// Number of orders to generate
        #[arg(long)]
        orders: Option<usize>,

        /// Number of products in the catalog
        #[arg(long)]
        products: Option<usize>,

        /// Number of distinct customers
        #[arg(long)]
        customers: Option<usize>,

        /// RNG seed for reproducible data
        #[arg(long)]
        rng_seed: Option<u64>,
    },
    /// Compute and store elasticities at all three granularities
    Compute {
        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },
    /// Fit a single elasticity on demand without persisting it
    Elasticity {
        /// Product to fit; may be combined with --customer
        #[arg(long)]
        product: Option<i64>,

        /// Customer to fit; may be combined with --product
        #[arg(long)]
        customer: Option<i64>,

        /// 'regular' or 'sale'
        #[arg(long, default_value = "regular")]
        price_type: PriceType,
    },
    /// Ask a natural-language question about the dataset
    Ask {
        /// The question; omit it together with --repl for a loop
        question: Option<String>,

        /// Keep asking questions interactively
        #[arg(long)]
        repl: bool,
    },
    /// Run the HTTP API
    Serve {
        /// Bind host (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    debug!("Pricelens started with verbosity level: {}", cli.verbose);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Seed {
            orders,
            products,
            customers,
            rng_seed,
        } => run_seed(config, orders, products, customers, rng_seed).await,
        Commands::Compute { no_progress } => run_compute(config, !no_progress).await,
        Commands::Elasticity {
            product,
            customer,
            price_type,
        } => run_elasticity(config, product, customer, price_type).await,
        Commands::Ask { question, repl } => run_ask(config, question, repl).await,
        Commands::Serve { host, port } => run_serve(config, host, port).await,
    };

    if let Err(e) = result {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_seed(
    config: Config,
    orders: Option<usize>,
    products: Option<usize>,
    customers: Option<usize>,
    rng_seed: Option<u64>,
) -> anyhow::Result<()> {
    let mut seed_config = config.seed.clone();
    if let Some(n) = orders {
        seed_config.orders = n;
    }
    if let Some(n) = products {
        seed_config.products = n;
    }
    if let Some(n) = customers {
        seed_config.customers = n;
    }
    if let Some(s) = rng_seed {
        seed_config.rng_seed = s;
    }

    let db = Db::connect(&config.database.path).await?;
    let report = seed::run(&db, &seed_config).await?;

    println!(
        "Seeded {} products and {} orders into {}",
        report.products,
        report.orders,
        config.database.path.display()
    );
    Ok(())
}

async fn run_compute(config: Config, show_progress: bool) -> anyhow::Result<()> {
    let db = Db::connect(&config.database.path).await?;
    let report = elasticity::run_batch(&db, show_progress).await?;

    println!("Processed {} orders", report.orders);
    println!(
        "  products:  {} fitted, {} skipped",
        report.products.fitted, report.products.skipped
    );
    println!(
        "  customers: {} fitted, {} skipped",
        report.customers.fitted, report.customers.skipped
    );
    println!(
        "  pairs:     {} fitted, {} skipped",
        report.pairs.fitted, report.pairs.skipped
    );
    Ok(())
}

async fn run_elasticity(
    config: Config,
    product: Option<i64>,
    customer: Option<i64>,
    price_type: PriceType,
) -> anyhow::Result<()> {
    if product.is_none() && customer.is_none() {
        anyhow::bail!("specify --product, --customer, or both");
    }

    let db = Db::connect(&config.database.path).await?;
    let rows = db.fetch_observations_filtered(product, customer).await?;
    if rows.is_empty() {
        anyhow::bail!("no matching orders");
    }

    let points: Vec<_> = rows.iter().map(|r| r.price_point(price_type)).collect();
    let fit = elasticity::fit_price_elasticity(&points)?;

    let mut scope = Vec::new();
    if let Some(pid) = product {
        scope.push(format!("product {pid}"));
    }
    if let Some(cid) = customer {
        scope.push(format!("customer {cid}"));
    }
    println!(
        "Elasticity for {} ({} price):",
        scope.join(", "),
        price_type
    );
    println!("  elasticity:   {:.4}", fit.elasticity);
    println!("  slope:        {:.4}", fit.slope);
    println!("  intercept:    {:.4}", fit.intercept);
    println!("  r-squared:    {:.4}", fit.r_squared);
    println!("  observations: {}", fit.observations);
    Ok(())
}

async fn run_ask(config: Config, question: Option<String>, repl: bool) -> anyhow::Result<()> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "no API key found; set the {} environment variable",
            config.llm.api_key_env
        )
    })?;

    let db = Db::connect(&config.database.path).await?;
    let provider: Arc<dyn LlmProvider> = Arc::new(ClaudeClient::new(api_key, &config.llm)?);
    let pipeline = AnalysisPipeline::new(provider, db);

    match question {
        Some(question) => {
            let report = pipeline.run(&question).await?;
            print_report(&report);
        }
        None if repl => loop {
            print!("question> ");
            std::io::stdout().flush()?;

            let mut line = String::new();
            if std::io::stdin().read_line(&mut line)? == 0 {
                break;
            }
            let question = line.trim();
            if question.is_empty() {
                break;
            }

            match pipeline.run(question).await {
                Ok(report) => print_report(&report),
                Err(e) => eprintln!("Error: {e}"),
            }
        },
        None => anyhow::bail!("provide a question or pass --repl"),
    }

    Ok(())
}

fn print_report(report: &pricelens::agent::AnalysisReport) {
    println!("SQL: {}", report.sql);
    println!("Rows: {}", report.row_count);
    println!();
    println!("{}", report.answer);
    println!("----");
}

async fn run_serve(
    config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let db = Db::connect(&config.database.path).await?;

    let pipeline = match config.api_key() {
        Some(api_key) => {
            let provider: Arc<dyn LlmProvider> =
                Arc::new(ClaudeClient::new(api_key, &config.llm)?);
            Some(AnalysisPipeline::new(provider, db.clone()))
        }
        None => {
            tracing::warn!(
                "{} is not set; /ask will return 503",
                config.llm.api_key_env
            );
            None
        }
    };

    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    server::serve(server::AppState { db, pipeline }, addr).await?;
    Ok(())
}
