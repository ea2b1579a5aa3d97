use rusqlite_wfs::{WfsConfig, WfsRequest, WfsService};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("wfs_insert failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .ok_or("Usage: wfs_insert <transaction.xml> [owner-id]")?;
    let owner_id = args.next().map(|id| id.parse::<i64>()).transpose()?;

    let body = std::fs::read_to_string(&path)?;
    let service = WfsService::open(WfsConfig::from_env())?;
    let request = WfsRequest::from_params("POST", [("service", "WFS")], Some(&body))?;
    let response = service.handle(&request, owner_id)?;

    println!("{}", response.body);
    Ok(())
}
