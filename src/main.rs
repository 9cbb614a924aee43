// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, to stderr)
// 3. Build a retriever and a Crawler for the chosen subcommand
// 4. Run the crawl, printing pages as they are found
// 5. Print a table or JSON report
// 6. Exit with proper code (0 = all pages fetched, 1 = some fetches failed
//    or the deadline cut the crawl short, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use fanout_crawler::fetch::page_title;
use fanout_crawler::{
    Crawler, HttpConfig, HttpRetriever, NodeId, Outcome, ReplicatedRetriever, StaticRetriever,
    TraversalConfig, TraversalEvent, TraversalSummary,
};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Root of the built-in sample graph used by `demo`
const DEMO_ROOT: &str = "https://golang.org/";

/// Maximum random delay each demo replica adds to a fetch
const DEMO_JITTER: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Crawl {
            url,
            max_depth,
            concurrency,
            timeout_secs,
            deadline_secs,
            any_domain,
            json,
        } => {
            let options = CrawlOptions {
                max_depth,
                concurrency,
                timeout: Duration::from_secs(timeout_secs),
                deadline: deadline_secs.map(Duration::from_secs),
                any_domain,
            };
            handle_crawl(&url, options, json).await
        }
        Commands::Demo {
            max_depth,
            replica_timeout_ms,
            json,
        } => handle_demo(max_depth, Duration::from_millis(replica_timeout_ms), json).await,
    }
}

fn setup_logging(verbose: bool) {
    let default_filter = if verbose {
        "fanout_crawler=debug,warn"
    } else {
        "fanout_crawler=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // stderr, so `--json` output on stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

struct CrawlOptions {
    max_depth: usize,
    concurrency: Option<usize>,
    timeout: Duration,
    deadline: Option<Duration>,
    any_domain: bool,
}

// Handles the 'crawl' subcommand
async fn handle_crawl(url: &str, options: CrawlOptions, json: bool) -> Result<i32> {
    let root = Url::parse(url).with_context(|| format!("Invalid URL '{}'", url))?;
    let host = root
        .host_str()
        .with_context(|| format!("URL has no host: {}", url))?
        .to_string();

    let mut http = HttpConfig::default().with_timeout(options.timeout);
    if !options.any_domain {
        http = http.restrict_to_host(host);
    }
    let retriever = HttpRetriever::new(http).context("Failed to set up HTTP retriever")?;

    let mut config = TraversalConfig::new(options.max_depth);
    if let Some(limit) = options.concurrency {
        config = config.with_concurrency_limit(limit);
    }
    let crawler = Crawler::new(retriever, config)?;

    if !json {
        println!("🔍 Crawling: {}", root);
        println!("📊 Max depth: {}\n", options.max_depth);
    }

    crawl_and_report(crawler, NodeId::from(root), options.deadline, json).await
}

// Handles the 'demo' subcommand
//
// Every page is requested from two replicas of the same sample graph; each
// replica sleeps a random 0-100ms first. The faster one wins, and if neither
// answers within the replica timeout the page counts as failed.
async fn handle_demo(max_depth: usize, replica_timeout: Duration, json: bool) -> Result<i32> {
    let retriever = ReplicatedRetriever::new()
        .with_replica(StaticRetriever::golang_sample().with_jitter(DEMO_JITTER))
        .with_replica(StaticRetriever::golang_sample().with_jitter(DEMO_JITTER))
        .with_timeout(replica_timeout);

    let crawler = Crawler::new(retriever, TraversalConfig::new(max_depth))?;

    if !json {
        println!("🔍 Crawling sample graph from {}", DEMO_ROOT);
        println!("📊 Max depth: {}\n", max_depth);
    }

    crawl_and_report(crawler, NodeId::from(DEMO_ROOT), None, json).await
}

// Runs the crawl while draining its event stream, then prints the report
async fn crawl_and_report(
    crawler: Crawler,
    root: NodeId,
    deadline: Option<Duration>,
    json: bool,
) -> Result<i32> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let crawler = crawler.with_events(tx);
    let mut pages = Vec::new();

    let crawl_root = root.clone();
    let crawl = async move {
        match deadline {
            Some(deadline) => crawler.run_within(crawl_root, deadline).await,
            None => Outcome::Completed(crawler.run(crawl_root).await),
        }
    };
    tokio::pin!(crawl);

    let outcome = loop {
        tokio::select! {
            outcome = &mut crawl => break outcome,
            Some(event) = rx.recv() => record_event(event, &mut pages, json),
        }
    };

    // Finished tasks report before they complete, so anything they sent is
    // already queued
    while let Ok(event) = rx.try_recv() {
        record_event(event, &mut pages, json);
    }

    pages.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.url.cmp(&b.url)));
    let report = Report {
        root,
        completed: outcome.is_completed(),
        summary: outcome.summary(),
        pages,
    };

    print_results(&report, json)?;

    Ok(exit_code(&report))
}

// Exit code 1 = some pages could not be fetched, or the deadline abandoned
// pages that were still in flight
fn exit_code(report: &Report) -> i32 {
    if report.summary.failed > 0 || !report.completed {
        1
    } else {
        0
    }
}

#[derive(Debug, Serialize)]
struct Report {
    root: NodeId,
    completed: bool,
    summary: TraversalSummary,
    pages: Vec<PageEntry>,
}

#[derive(Debug, Serialize)]
struct PageEntry {
    url: NodeId,
    depth: usize,
    status: PageStatus,
    edges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum PageStatus {
    Retrieved,
    Failed,
    DepthLimit,
}

fn record_event(event: TraversalEvent, pages: &mut Vec<PageEntry>, json: bool) {
    match event {
        TraversalEvent::Retrieved {
            id,
            depth,
            content,
            edges,
        } => {
            if !json {
                println!("found: {} {:?}", id, preview(&content));
            }
            pages.push(PageEntry {
                url: id,
                depth,
                status: PageStatus::Retrieved,
                edges: edges.len(),
                message: None,
            });
        }
        TraversalEvent::Failed { depth, error } => {
            let message = Some(error.cause());
            pages.push(PageEntry {
                url: error.id,
                depth,
                status: PageStatus::Failed,
                edges: 0,
                message,
            });
        }
        TraversalEvent::DepthExhausted { id, depth } => pages.push(PageEntry {
            url: id,
            depth,
            status: PageStatus::DepthLimit,
            edges: 0,
            message: None,
        }),
        // Duplicates of pages already in the report
        TraversalEvent::Rejected { .. } => {}
    }
}

// Short human label for a page: its <title>, or the first line of the body
fn preview(content: &str) -> String {
    let text = page_title(content).unwrap_or_else(|| {
        content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
            .to_string()
    });
    truncate(&text, 60)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let kept: String = text.chars().take(max_chars - 3).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

// Prints the results either as a table or JSON
fn print_results(report: &Report, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else {
        print_table(report);
    }
    Ok(())
}

fn print_table(report: &Report) {
    println!();
    println!("{:<60} {:<6} {:<14} {:<6} {:<30}", "URL", "DEPTH", "STATUS", "EDGES", "MESSAGE");
    println!("{}", "=".repeat(120));

    for page in &report.pages {
        println!(
            "{:<60} {:<6} {:<14} {:<6} {:<30}",
            truncate(page.url.as_str(), 60),
            page.depth,
            format_status(page.status),
            page.edges,
            page.message.as_deref().unwrap_or("")
        );
    }

    println!();

    let summary = &report.summary;
    println!("📊 Summary:");
    println!("   ✅ Fetched: {}", summary.retrieved);
    println!("   ❌ Failed: {}", summary.failed);
    println!("   🛑 At depth limit: {}", summary.depth_exhausted);
    println!("   🔁 Duplicates skipped: {}", summary.rejected);
    println!("   📋 Distinct pages: {}", summary.claimed);

    if !report.completed {
        println!("   ⏱️  Deadline reached: pages still in flight were abandoned");
    }
}

fn format_status(status: PageStatus) -> &'static str {
    match status {
        PageStatus::Retrieved => "✅ FETCHED",
        PageStatus::Failed => "❌ FAILED",
        PageStatus::DepthLimit => "🛑 DEPTH LIMIT",
    }
}
