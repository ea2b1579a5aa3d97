use rusqlite_wfs::{
    ColumnSpec, LayerDefinition, SqlDialect, WfsConfig, WfsStore, build_create,
};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage:
  wfs_layer create <name> <title> [column:TYPE]... [--owner <id>]
  wfs_layer ddl <name> [column:TYPE]...
  wfs_layer delete <name>
  wfs_layer list";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("wfs_layer failed: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = WfsConfig::from_env();

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["create", name, title, rest @ ..] => {
            let (columns, owner_id) = parse_columns(rest)?;
            let def = LayerDefinition {
                name: name.to_string(),
                title: title.to_string(),
                columns,
            };
            let store = WfsStore::open(&config.store_path)?;
            let layer_name = store.create_layer(&def, owner_id)?;
            println!("created {layer_name}");
        }
        ["ddl", name, rest @ ..] => {
            let (columns, _) = parse_columns(rest)?;
            let def = LayerDefinition {
                name: name.to_string(),
                title: String::new(),
                columns,
            };
            println!("{}", build_create(&def, SqlDialect::PostGis)?);
        }
        ["delete", name] => {
            let store = WfsStore::open(&config.store_path)?;
            store.delete_layer(name)?;
            println!("deleted {name}");
        }
        ["list"] => {
            let store = WfsStore::open(&config.store_path)?;
            for meta in store.get_metadata()? {
                let owner = meta.owner_id.map(|id| id.to_string()).unwrap_or_default();
                println!("{}\t{}\t{}\t{owner}", meta.id, meta.name, meta.title);
            }
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}

fn parse_columns(args: &[&str]) -> Result<(Vec<ColumnSpec>, Option<i64>), Box<dyn std::error::Error>> {
    let mut columns = Vec::with_capacity(args.len());
    let mut owner_id = None;
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        if *arg == "--owner" {
            let id = args.next().ok_or("--owner needs a value")?;
            owner_id = Some(id.parse::<i64>()?);
            continue;
        }
        let (name, declared_type) = arg
            .split_once(':')
            .ok_or_else(|| format!("expected column:TYPE, got {arg:?}"))?;
        columns.push(ColumnSpec::new(name, declared_type));
    }
    Ok((columns, owner_id))
}
