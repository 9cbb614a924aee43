// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - crawl: crawl a real website over HTTP
// - demo:  crawl a built-in sample graph through racing replicas, no network
// =============================================================================

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "fanout-crawler",
    version,
    about = "A concurrent, depth-bounded web crawler that visits every page at most once",
    long_about = "fanout-crawler starts one task per discovered link, fetches every page at most once \
                  even when it is reachable through many paths, stops at a maximum depth, and only \
                  reports completion once every branch has finished."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a website starting from a URL
    ///
    /// Example: fanout-crawler crawl https://example.com --max-depth 2
    Crawl {
        /// URL to start from (e.g., https://example.com)
        url: String,

        /// Maximum crawl depth
        ///
        /// Depth 1 = just the starting page
        /// Depth 2 = starting page + all pages it links to
        /// Pages at the limit are recorded but not fetched.
        #[arg(long, default_value_t = 2)]
        max_depth: usize,

        /// Maximum number of pages fetched at the same time (default: unlimited)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,

        /// Stop waiting for the crawl after this many seconds
        ///
        /// Pages still in flight at the deadline are abandoned and the
        /// command exits with code 1.
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Follow links to other hosts too (default: stay on the starting host)
        #[arg(long)]
        any_domain: bool,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Crawl a built-in sample of golang.org, asking two jittery replicas per page
    Demo {
        /// Maximum crawl depth
        #[arg(long, default_value_t = 4)]
        max_depth: usize,

        /// Give up on a page if no replica answered within this many milliseconds
        #[arg(long, default_value_t = 80)]
        replica_timeout_ms: u64,

        /// Output results in JSON format instead of a table
        #[arg(long)]
        json: bool,
    },
}
