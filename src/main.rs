// src/main.rs
// =============================================================================
// CLI entry point.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Build the reqwest-backed fetcher and a crawler around it
// 3. Install a page observer that records each visited page's <title>
// 4. Crawl, then print the report (table or JSON) and exit
//
// Exit codes: 0 = crawl completed, 2 = error (bad URL/selector, transport
// failure).
// =============================================================================

mod cli;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use sitewalker::{Crawler, HttpFetcher, MaxDepth, ParsedPage};

use cli::Cli;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

/// One visited or too-deep page in the report.
#[derive(Debug, Serialize)]
struct PageReport {
    url: String,
    depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

#[derive(Debug, Serialize)]
struct CrawlReport {
    visited: Vec<PageReport>,
    too_deep: Vec<PageReport>,
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    let fetcher = HttpFetcher::new()?;
    let mut crawler = Crawler::new(&cli.url, fetcher)?;
    crawler.set_link_selector(&cli.selector)?;

    // Collect page titles as we go; the observer runs once per visited page
    let titles: Rc<RefCell<HashMap<String, String>>> = Rc::new(RefCell::new(HashMap::new()));
    let sink = Rc::clone(&titles);
    crawler.set_page_observer(move |page: &ParsedPage| {
        if let Ok(mut found) = page.texts("title") {
            if let Some(title) = found.pop() {
                sink.borrow_mut().insert(page.url().to_string(), title);
            }
        }
    });

    let max_depth = if cli.unbounded {
        MaxDepth::Unbounded
    } else {
        MaxDepth::Bounded(cli.max_depth)
    };

    crawler.crawl(max_depth).await?;

    let titles = titles.borrow();
    let report = CrawlReport {
        visited: collect_reports(crawler.visited().to_entries(), Some(&titles)),
        too_deep: collect_reports(crawler.too_deep().to_entries(), None),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_table(&report);
    }

    Ok(0)
}

fn collect_reports(
    entries: Vec<(String, usize)>,
    titles: Option<&HashMap<String, String>>,
) -> Vec<PageReport> {
    entries
        .into_iter()
        .map(|(url, depth)| {
            let title = titles.and_then(|titles| titles.get(&url).cloned());
            PageReport { url, depth, title }
        })
        .collect()
}

fn print_table(report: &CrawlReport) {
    println!("{:<60} {:<7} {:<30}", "URL", "DEPTH", "TITLE");
    println!("{}", "=".repeat(98));

    for page in &report.visited {
        println!(
            "{:<60} {:<7} {:<30}",
            truncate(&page.url, 57),
            page.depth,
            page.title.as_deref().unwrap_or("")
        );
    }

    if !report.too_deep.is_empty() {
        println!("\nFound but too deep to visit:");
        for page in &report.too_deep {
            println!("{:<60} {:<7}", truncate(&page.url, 57), page.depth);
        }
    }

    println!();
    println!("Summary:");
    println!("   Visited:  {}", report.visited.len());
    println!("   Too deep: {}", report.too_deep.len());
}

fn truncate(url: &str, max_len: usize) -> String {
    if url.len() > max_len {
        format!("{}...", &url[..max_len])
    } else {
        url.to_string()
    }
}
