//! symsql CLI entry point.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use symsql_datafusion::cli::{Args, OutputFormatter, Repl, ReplCommand, ReplInput};
use symsql_datafusion::query::{EngineConfig, QueryEngine};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_level().into()),
        )
        .with_writer(io::stderr)
        .init();

    let engine = QueryEngine::with_config(EngineConfig {
        batch_size: args.batch_size,
        target_partitions: args.target_partitions,
    })
    .context("Failed to create query engine")?;

    for table in args.table_registrations() {
        engine
            .register_file(&table.name, &table.path)
            .await
            .with_context(|| {
                format!(
                    "Failed to register table '{}' from {}",
                    table.name,
                    table.path.display()
                )
            })?;
    }

    let formatter = OutputFormatter::new(args.format);

    if let Some(query) = &args.query {
        run_query(&engine, &formatter, query).await?;
    } else if let Some(query_file) = &args.query_file {
        let query = std::fs::read_to_string(query_file)
            .with_context(|| format!("Failed to read query file: {}", query_file.display()))?;
        run_query(&engine, &formatter, &query).await?;
    } else {
        run_repl(&engine, &formatter).await?;
    }

    Ok(())
}

async fn run_query(engine: &QueryEngine, formatter: &OutputFormatter, sql: &str) -> Result<()> {
    let batches = engine.query(sql).await?;
    let mut stdout = io::stdout();
    formatter.write_batches(&batches, &mut stdout)?;
    Ok(())
}

async fn run_repl(engine: &QueryEngine, formatter: &OutputFormatter) -> Result<()> {
    let history_path = dirs::data_local_dir()
        .map(|d| d.join("symsql").join("history.txt"))
        .unwrap_or_else(|| PathBuf::from(".symsql_history"));

    if let Some(parent) = history_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let mut repl = Repl::new()?.with_history(history_path.to_str().unwrap_or(".symsql_history"));

    println!("symsql - Resolve addresses to symbols with SQL");
    let tables = engine.table_names();
    if !tables.is_empty() {
        println!("Tables: {}", tables.join(", "));
    }
    println!("Type .help for help, .quit to exit");
    println!();

    loop {
        match repl.read_input()? {
            ReplInput::Exit => {
                println!("Goodbye!");
                break;
            }
            ReplInput::Command(cmd) => match cmd {
                ReplCommand::Empty => continue,
                ReplCommand::Quit => {
                    println!("Goodbye!");
                    break;
                }
                ReplCommand::Help => print_help(),
                ReplCommand::Tables => print_tables(engine),
                ReplCommand::Index => match engine.index_stats() {
                    Some(stats) => println!("{}", stats.format_summary()),
                    None => {
                        println!("Symbol index not loaded yet.");
                        println!("It is built on the first symbolize_address() call.");
                    }
                },
                ReplCommand::Sql(sql) => {
                    if let Err(e) = run_query(engine, formatter, &sql).await {
                        eprintln!("Error: {e}");
                    }
                }
                ReplCommand::Unknown(cmd) => {
                    eprintln!("Unknown command: {cmd}");
                    eprintln!("Type .help for available commands");
                }
            },
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  .help            Show this help");
    println!("  .tables          List registered tables");
    println!("  .index           Show symbol index information");
    println!("  .quit            Exit");
    println!();
    println!("Functions:");
    println!("  symbolize_address(addr)   Function name covering a UInt64 address");
    println!("  parse_address(text)       Parse '0x...' or decimal text to UInt64");
    println!("  address_to_hex(addr)      Format a UInt64 as 0x hex");
    println!("  symbol_index_info()       Symbol index statistics (table function)");
    println!();
    println!("SQL queries end with a semicolon (;)");
}

fn print_tables(engine: &QueryEngine) {
    let tables = engine.table_names();
    if tables.is_empty() {
        println!("No tables registered. Pass data files on the command line.");
        return;
    }

    println!("Tables:");
    for name in tables {
        println!("  {name}");
    }
}
