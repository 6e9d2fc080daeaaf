//! Direct batch run: scan a folder of sites and write the report next to
//! them, without going through the HTTP front-end.

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use siteverif::fs_access::LocalFs;
use siteverif::report::generate_report;
use siteverif::scan::check_sites;
use siteverif::server::REPORT_FILE;

fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let base_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    if !base_path.is_dir() {
        return Err(format!("Not a directory: {}", base_path.display()));
    }

    let results = check_sites(&LocalFs, &base_path);
    let (report, stats) = generate_report(&results, &base_path, false);

    let report_path = base_path.join(REPORT_FILE);
    std::fs::write(&report_path, report)
        .map_err(|e| format!("Failed to write {}: {}", report_path.display(), e))?;

    println!("\n{}", stats.output);
    println!("\nReport saved: {}", report_path.display());
    Ok(())
}
