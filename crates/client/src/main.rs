use dfe_client::repl::{ReplOptions, SourceFormat, TableSource, register_sources, run_repl};
use dfe_client::Engine;
use dfe_common::EngineConfig;
use tracing_subscriber::EnvFilter;

const DEFAULT_SQL: &str = "SELECT 100;";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args
        .first()
        .map(|a| a == "--help" || a == "-h")
        .unwrap_or(false)
    {
        print_usage();
        return Ok(());
    }

    let config = EngineConfig::from_env()?;

    if args.first().map(|a| a.as_str()) == Some("repl") {
        let sources = parse_repl_opts(&args)?;
        run_repl(ReplOptions { config, sources })?;
        return Ok(());
    }

    let opts = parse_query_opts(&args)?;
    let engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("error: cannot create session: {e}");
            return Ok(());
        }
    };
    if let Err(e) = register_sources(&engine, &opts.sources) {
        eprintln!("error: {e}");
        return Ok(());
    }

    let df = match engine.sql(&opts.sql) {
        Ok(df) => df,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(());
        }
    };

    if opts.plan_only {
        println!("{}", df.logical_plan_display());
    } else if let Err(e) = df.show() {
        eprintln!("error: {e}");
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct QueryOpts {
    sql: String,
    plan_only: bool,
    sources: Vec<TableSource>,
}

fn parse_query_opts(args: &[String]) -> Result<QueryOpts, Box<dyn std::error::Error>> {
    // Short forms:
    //   dfe "SELECT 1"
    //   dfe --plan "SELECT 1"
    // Subcommand form:
    //   dfe query --sql "SELECT ..." [--csv NAME=PATH]... [--parquet NAME=PATH]... [--plan]
    if args.first().map(|a| a.as_str()) != Some("query") {
        let mut tail = args.to_vec();
        let plan_only = tail.first().map(|s| s == "--plan").unwrap_or(false);
        if plan_only {
            tail.remove(0);
        }
        let sql = tail
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_SQL.to_string());
        return Ok(QueryOpts {
            sql,
            plan_only,
            sources: vec![],
        });
    }

    let mut sql = DEFAULT_SQL.to_string();
    let mut plan_only = false;
    let mut sources = Vec::new();

    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--sql" => {
                i += 1;
                sql = args.get(i).cloned().ok_or("missing value for --sql")?;
            }
            "--csv" | "--parquet" => {
                let format = if args[i] == "--csv" {
                    SourceFormat::Csv
                } else {
                    SourceFormat::Parquet
                };
                let flag = args[i].clone();
                i += 1;
                let spec = args
                    .get(i)
                    .ok_or_else(|| format!("missing value for {flag}"))?;
                sources.push(TableSource::parse(format, spec)?);
            }
            "--plan" => {
                plan_only = true;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                return Err(format!("unknown argument: {other}").into());
            }
        }
        i += 1;
    }

    Ok(QueryOpts {
        sql,
        plan_only,
        sources,
    })
}

fn parse_repl_opts(args: &[String]) -> Result<Vec<TableSource>, Box<dyn std::error::Error>> {
    let mut sources = Vec::new();
    let mut i = 1usize;
    while i < args.len() {
        match args[i].as_str() {
            "--csv" | "--parquet" => {
                let format = if args[i] == "--csv" {
                    SourceFormat::Csv
                } else {
                    SourceFormat::Parquet
                };
                let flag = args[i].clone();
                i += 1;
                let spec = args
                    .get(i)
                    .ok_or_else(|| format!("missing value for {flag}"))?;
                sources.push(TableSource::parse(format, spec)?);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument for repl: {other}").into()),
        }
        i += 1;
    }
    Ok(sources)
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  dfe [\"<SQL>\"]                 (default: {DEFAULT_SQL})");
    eprintln!("  dfe --plan \"<SQL>\"");
    eprintln!("  dfe query --sql \"<SQL>\" [--csv NAME=PATH]... [--parquet NAME=PATH]... [--plan]");
    eprintln!("  dfe repl [--csv NAME=PATH]... [--parquet NAME=PATH]...");
    eprintln!();
    eprintln!("Session config overrides are read from DFE_CONFIG (key=value,key=value).");
}
