//! Order Parse CLI
//!
//! Parses utterances against a JSON menu file and prints each
//! `ParseResult` as JSON.
//!
//! Usage:
//!   cargo run --features cli --bin order_parse -- \
//!     --menu menu.json "I want 2 chicken pizzas and a coke"
//!
//!   # One utterance per stdin line
//!   cat utterances.txt | cargo run --features cli --bin order_parse -- --menu menu.json
//!
//!   # Place orders in the in-memory sink and print receipts
//!   cargo run --features cli --bin order_parse -- \
//!     --menu menu.json --place --customer "Sam" "two cokes"

use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use order_nlp::{
    InMemoryOrderSink, JsonFileMenuProvider, OrderMetadata, OrderParser, OrderParsingService,
    ParserRules,
};

/// Parse restaurant orders from free text
#[derive(Parser, Debug)]
#[command(name = "order_parse")]
#[command(about = "Parse free-text orders against a JSON menu")]
struct Args {
    /// JSON file holding an array of menu items
    #[arg(long, short = 'm')]
    menu: PathBuf,

    /// Rules YAML replacing the built-in rule set
    #[arg(long, short = 'r', env = "ORDER_NLP_RULES")]
    rules: Option<PathBuf>,

    /// Utterance to parse; reads stdin line by line when omitted
    utterance: Option<String>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Submit order_food results to an in-memory sink
    #[arg(long)]
    place: bool,

    /// Customer name attached to placed orders
    #[arg(long)]
    customer: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let args = Args::parse();

    let rules = match &args.rules {
        Some(path) => ParserRules::load(path)
            .with_context(|| format!("Failed to load rules from {}", path.display()))?,
        None => ParserRules::builtin(),
    };
    let parser = OrderParser::new(rules)?;

    let provider = JsonFileMenuProvider::new(&args.menu);
    let service = OrderParsingService::with_provider(parser, &provider)
        .with_context(|| format!("Failed to load menu from {}", args.menu.display()))?;

    let sink = InMemoryOrderSink::new();
    let metadata = OrderMetadata {
        customer_name: args.customer.clone(),
        ..Default::default()
    };

    match &args.utterance {
        Some(utterance) => run_one(&service, &sink, &metadata, &args, utterance)?,
        None => {
            for line in io::stdin().lock().lines() {
                let line = line.context("Failed to read stdin")?;
                if line.trim().is_empty() {
                    continue;
                }
                run_one(&service, &sink, &metadata, &args, &line)?;
            }
        }
    }

    Ok(())
}

fn run_one(
    service: &OrderParsingService,
    sink: &InMemoryOrderSink,
    metadata: &OrderMetadata,
    args: &Args,
    utterance: &str,
) -> Result<()> {
    let json = if args.place {
        let outcome = service.parse_and_submit(utterance, metadata, sink)?;
        to_json(&outcome, args.pretty)?
    } else {
        to_json(&service.parse(utterance), args.pretty)?
    };
    println!("{}", json);
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
