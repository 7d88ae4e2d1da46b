use std::io::{BufRead, Write};

use dfe_common::EngineConfig;
use tracing::debug;

use crate::{CsvOptions, Engine, ParquetOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Parquet,
}

/// A file-backed table given on the command line as `NAME=PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    pub name: String,
    pub path: String,
    pub format: SourceFormat,
}

impl TableSource {
    pub fn parse(format: SourceFormat, spec: &str) -> Result<Self, String> {
        let Some((name, path)) = spec.split_once('=') else {
            return Err(format!("invalid table source '{spec}', expected NAME=PATH"));
        };
        let (name, path) = (name.trim(), path.trim());
        if name.is_empty() || path.is_empty() {
            return Err(format!("invalid table source '{spec}', expected NAME=PATH"));
        }
        Ok(Self {
            name: name.to_string(),
            path: path.to_string(),
            format,
        })
    }
}

pub fn register_sources(engine: &Engine, sources: &[TableSource]) -> dfe_common::Result<()> {
    for source in sources {
        match source.format {
            SourceFormat::Csv => {
                engine.register_csv(&source.name, &source.path, &CsvOptions::default())?
            }
            SourceFormat::Parquet => {
                engine.register_parquet(&source.name, &source.path, &ParquetOptions::default())?
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ReplOptions {
    pub config: EngineConfig,
    pub sources: Vec<TableSource>,
}

/// Outcome counters of one REPL run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplStats {
    pub succeeded: usize,
    pub failed: usize,
}

pub fn run_repl(opts: ReplOptions) -> Result<ReplStats, Box<dyn std::error::Error>> {
    let engine = Engine::new(opts.config)?;
    register_sources(&engine, &opts.sources)?;

    eprintln!("DFE REPL (type \\q to quit)");
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let stats = repl_loop(&engine, stdin.lock(), &mut stdout.lock())?;
    engine.close();
    Ok(stats)
}

/// Reads statements terminated by `;` (possibly spanning lines) and shows each
/// result. Failures are printed and the loop continues on the same session.
/// `\q`, `quit`, `exit` or end of input stop it; a trailing statement without
/// `;` is still run at end of input.
pub fn repl_loop<R: BufRead, W: Write>(
    engine: &Engine,
    mut input: R,
    out: &mut W,
) -> std::io::Result<ReplStats> {
    let mut stats = ReplStats::default();
    let mut pending = String::new();
    let mut line = String::new();
    loop {
        write!(out, "{}", if pending.is_empty() { "dfe> " } else { "...> " })?;
        out.flush()?;
        line.clear();
        // Ctrl+D => EOF => exit
        if input.read_line(&mut line)? == 0 {
            break;
        }
        let raw = line.trim();
        if raw.is_empty() {
            continue;
        }
        if pending.is_empty()
            && (raw == "\\q" || raw.eq_ignore_ascii_case("quit") || raw.eq_ignore_ascii_case("exit"))
        {
            break;
        }
        if !pending.is_empty() {
            pending.push('\n');
        }
        pending.push_str(raw);
        if raw.ends_with(';') {
            run_statement(engine, &pending, out, &mut stats)?;
            pending.clear();
        }
    }
    if !pending.trim().is_empty() {
        run_statement(engine, &pending, out, &mut stats)?;
    }
    Ok(stats)
}

fn run_statement<W: Write>(
    engine: &Engine,
    sql: &str,
    out: &mut W,
    stats: &mut ReplStats,
) -> std::io::Result<()> {
    debug!(session = %engine.id(), sql, "repl statement");
    let outcome = engine.sql(sql).and_then(|df| df.render());
    match outcome {
        Ok(rendered) => {
            stats.succeeded += 1;
            writeln!(out, "{rendered}")
        }
        Err(e) => {
            stats.failed += 1;
            writeln!(out, "error: {e}")
        }
    }
}
