//! Console rendering of crawl progress and final reports

use crate::output::traits::CrawlReport;
use crate::state::PlanProgress;

/// Prints a final report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Plan: {}", report.plan_id);
    println!("Status: {} ({})", report.status, report.verdict());
    println!(
        "Duration: {}s",
        (report.finished_at - report.started_at).num_seconds().max(0)
    );
    println!();

    println!("Totals:");
    println!("  Locations: {}", report.total_locations);
    println!("  Attempted: {}", report.attempted());
    println!("  Succeeded: {}", report.succeeded());
    println!("  Failed: {}", report.failed());
    if report.unvisited() > 0 {
        println!("  Not visited: {}", report.unvisited());
    }
    println!();

    if !report.failed_locations.is_empty() {
        println!("Failed Locations ({}):", report.failed_locations.len());
        for location in &report.failed_locations {
            println!("  - {}", location);
        }
        println!();
    }

    let success_rate = if report.attempted() > 0 {
        (report.succeeded() as f64 / report.attempted() as f64) * 100.0
    } else {
        0.0
    };
    println!(
        "Success Rate: {:.1}% ({} / {} locations)",
        success_rate,
        report.succeeded(),
        report.attempted()
    );
}

/// Prints the state of an in-progress crawl
pub fn print_progress(progress: &PlanProgress) {
    println!("=== Crawl In Progress ===\n");
    println!("Plan: {}", progress.plan_id);
    println!("Started: {}", progress.created_at.to_rfc3339());
    println!(
        "Progress: {}% ({} / {} locations)",
        progress.percent, progress.cursor, progress.total
    );
    println!("  Succeeded: {}", progress.succeeded);
    println!("  Failed: {}", progress.failed);
    match &progress.current_location {
        Some(location) => println!("Next location: {}", location),
        None if progress.cancelled => println!("Cancelled; finishes on next resume"),
        None => println!("All locations processed; finishes on next resume"),
    }
}
