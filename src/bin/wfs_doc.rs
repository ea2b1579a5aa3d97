use rusqlite_wfs::{WfsConfig, WfsRequest, WfsResponse, WfsService};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("wfs_doc failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        return Err("Usage: wfs_doc <key=value>... (e.g. service=WFS request=GetCapabilities)".into());
    }

    let mut params = Vec::with_capacity(args.len());
    for arg in &args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got {arg:?}"))?;
        params.push((key, value));
    }

    let service = WfsService::open(WfsConfig::from_env())?;
    let response = match WfsRequest::from_params("GET", params, None)
        .and_then(|request| service.handle(&request, None))
    {
        Ok(response) => response,
        Err(err) => {
            let response = WfsResponse::from_error(&err)?;
            eprintln!("{} ({:?})", response.body, err.kind());
            std::process::exit(2);
        }
    };

    println!("{}", response.body);
    Ok(())
}
