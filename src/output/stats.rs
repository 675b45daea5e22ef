//! Crawl report printing
//!
//! This module prints the counts a finished crawl reports.

use crate::crawler::{CrawlOutcome, ProviderSet};

/// Share of matched links that produced a record, as a percentage
pub fn success_rate(outcome: &CrawlOutcome) -> f64 {
    if outcome.matched_links == 0 {
        return 0.0;
    }
    (outcome.records.len() as f64 / outcome.matched_links as f64) * 100.0
}

/// Prints a crawl report to stdout in a formatted manner
///
/// # Arguments
///
/// * `outcome` - The finished crawl
pub fn print_crawl_summary(outcome: &CrawlOutcome) {
    println!("=== Crawl Summary ===\n");

    println!("Selection:");
    println!("  Provider: {}", outcome.provider);
    if outcome.selection.is_empty() {
        println!("  Exam: (all discussions)");
    } else {
        println!("  Exam: {}", outcome.selection);
    }
    if let Some(summary) = &outcome.variant_summary {
        println!("  {}", summary);
    }
    println!();

    println!("Listing:");
    println!("  Pages crawled: {}", outcome.pages);
    println!("  Pages failed: {}", outcome.failed_pages);
    println!("  Matching questions: {}", outcome.matched_links);
    println!();

    println!("Questions:");
    println!("  Records extracted: {}", outcome.records.len());
    println!("  Records failed: {}", outcome.failed_records);
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} questions) in {:.1}s",
        success_rate(outcome),
        outcome.records.len(),
        outcome.matched_links,
        outcome.elapsed.as_secs_f64()
    );
}

/// Prints discovered providers, one per line
pub fn print_providers(set: &ProviderSet) {
    for provider in &set.providers {
        println!("{:<32} {}", provider, super::provider_display_name(provider));
    }
    println!();
    println!("{} providers", set.providers.len());
    if set.partial {
        println!("(listing may be incomplete)");
    }
}
