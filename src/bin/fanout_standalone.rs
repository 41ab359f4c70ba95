//! fanout-standalone: run one group operation against in-process agents
//!
//! Loads the consumer catalog from configuration, dispatches the operation
//! to every consumer in the group through the loopback channel, waits for
//! the aggregate report and prints it with the recorded history.
//!
//! ## Usage
//! ```text
//! fanout-standalone <group> <package>...
//! fanout-standalone <group> --errata [<erratum>...] [--type <type>...]
//! ```
//!
//! ## Configuration
//! - FANOUT_CONFIG: Path to a YAML config file (optional)
//! - FANOUT_LOG: Log filter (default: info)

use std::sync::Arc;

use tracing::info;

use agent_fanout::channel::LoopbackChannel;
use agent_fanout::config::Config;
use agent_fanout::fanout::{Coordinator, GroupOperations, HistoryFinalizer};
use agent_fanout::history::InMemoryHistory;
use agent_fanout::resolver::CatalogResolver;
use agent_fanout::utils::bootstrap::init_tracing;

const USAGE: &str = "usage: fanout-standalone <group> <package>... | <group> --errata [<id>...] [--type <type>...]";

enum Request {
    Packages(Vec<String>),
    Errata { ids: Vec<String>, types: Vec<String> },
}

fn parse_args(args: &[String]) -> Option<(String, Request)> {
    let (group, rest) = args.split_first()?;

    if rest.first().map(String::as_str) != Some("--errata") {
        if rest.is_empty() {
            return None;
        }
        return Some((group.clone(), Request::Packages(rest.to_vec())));
    }

    let mut ids = Vec::new();
    let mut types = Vec::new();
    let mut iter = rest[1..].iter();
    while let Some(arg) = iter.next() {
        if arg == "--type" {
            types.push(iter.next()?.clone());
        } else {
            ids.push(arg.clone());
        }
    }
    Some((group.clone(), Request::Errata { ids, types }))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((group, request)) = parse_args(&args) else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let config = Config::load(None)?;

    let history = Arc::new(InMemoryHistory::new());
    let coordinator = Arc::new(Coordinator::from_config(
        &config.coordinator,
        Arc::new(LoopbackChannel::from_config(&config.loopback)),
        Arc::new(HistoryFinalizer::new(history.clone())),
    ));
    let operations = GroupOperations::new(
        Arc::new(CatalogResolver::from_config(&config.catalog)),
        coordinator,
    );

    let handle = match request {
        Request::Packages(packages) => operations.install_packages(&group, packages).await?,
        Request::Errata { ids, types } => operations.install_errata(&group, ids, types).await?,
    };
    info!(task_id = %handle.id(), kind = %handle.kind(), "fanout-standalone submitted");

    let report = handle.wait().await;

    println!("task {} ({})", handle.id(), handle.kind());
    for success in report.succeeded() {
        println!("  ok     {}  {}", success.target, success.result);
    }
    for failure in report.failed() {
        println!("  failed {}  {}", failure.target, failure.failure);
    }
    for entry in history.entries().await {
        println!(
            "  history {} at {} errata={:?}",
            entry.target,
            entry.recorded_at.to_rfc3339(),
            entry.errata_titles
        );
    }

    Ok(())
}
