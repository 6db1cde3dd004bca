//! classio CLI - Tool for inspecting classio archives.

use std::env;
use std::io::{self, Write};

use classio::pack::Reader;
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let prog = args.first().map(String::as_str).unwrap_or("classio");

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "error",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    let Some(&command) = filtered_args.first() else {
        print_usage(prog);
        return;
    };

    let result = match command {
        "info" | "i" => with_file(prog, "info", &filtered_args, cmd_info),
        "ls" | "l" => with_file(prog, "ls", &filtered_args, cmd_ls),
        "cat" | "c" => {
            if filtered_args.len() < 3 {
                eprintln!("Usage: {} cat <file> <entry>", prog);
                std::process::exit(1);
            }
            cmd_cat(filtered_args[1], filtered_args[2])
        }
        "help" | "h" | "-h" | "--help" => {
            print_usage(prog);
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage(prog);
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn with_file(
    prog: &str,
    command: &str,
    args: &[&str],
    run: fn(&str) -> classio::Result<()>,
) -> classio::Result<()> {
    match args.get(1) {
        Some(path) => run(path),
        None => {
            eprintln!("Usage: {} {} <file>", prog, command);
            std::process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    println!("classio CLI - Inspect classio archives");
    println!();
    println!("Usage: {} [options] <command> <file> [entry]", prog);
    println!();
    println!("Commands:");
    println!("  i, info    Show archive header and totals");
    println!("  l, ls      List entries with sizes and checksums");
    println!("  c, cat     Write one entry's bytes to stdout");
    println!("  h, help    Show this help");
    println!();
    println!("Options:");
    println!("  -v, --verbose  Debug output");
    println!("  -vv, --trace   Trace output (very verbose)");
    println!("  -q, --quiet    Errors only");
    println!();
    println!("RUST_LOG overrides the log level.");
}

fn cmd_info(path: &str) -> classio::Result<()> {
    tracing::info!("Opening archive: {}", path);
    let reader = Reader::open(path)?;

    let stored: u64 = reader.entries().iter().map(|e| e.stored_size).sum();
    let compressed = reader.entries().iter().filter(|e| e.compressed).count();

    println!("Archive: {}", path);
    println!("Version: {}", reader.version());
    println!("Size:    {} bytes", reader.size());
    println!("Entries: {} ({} compressed, {} bytes stored)", reader.len(), compressed, stored);
    Ok(())
}

fn cmd_ls(path: &str) -> classio::Result<()> {
    tracing::info!("Opening archive: {}", path);
    let reader = Reader::open(path)?;

    let width = reader.names().map(str::len).max().unwrap_or(4).max(4);
    println!("{:<width$}  {:>10}  {:>4}  {:>8}", "NAME", "STORED", "ZLIB", "CRC32");
    for entry in reader.entries() {
        println!(
            "{:<width$}  {:>10}  {:>4}  {:08x}",
            entry.name,
            entry.stored_size,
            if entry.compressed { "yes" } else { "no" },
            entry.crc,
        );
    }
    Ok(())
}

fn cmd_cat(path: &str, name: &str) -> classio::Result<()> {
    tracing::debug!("Reading entry {} from {}", name, path);
    let reader = Reader::open(path)?;
    let data = reader.read_entry(name)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&data)?;
    stdout.flush()?;
    Ok(())
}
