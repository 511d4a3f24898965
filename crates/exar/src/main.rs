//! Exar command line.
//!
//! Prints decimal expansions of exact reals computed by the
//! precision-escalation engine.

mod commands;

use commands::{CliError, CliOptions};
use exar_engine::{Engine, EngineConfig};
use exar_real::{e, pi};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug=n` picks the level of the
/// engine crates.
fn init_tracing(debug: u8) {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(match debug {
                0 => "warn",
                1 => "warn,exar_engine=debug,exar_real=debug",
                _ => "warn,exar_engine=trace,exar_real=trace",
            })
        });
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init();
    });
}

fn main() {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let config = match EngineConfig::from_args(&mut args) {
        Ok(config) => config,
        Err(err) => fail(&err.into()),
    };
    init_tracing(config.debug);
    let options = match CliOptions::from_args(&mut args) {
        Ok(options) => options,
        Err(err) => fail(&err),
    };

    let Some((command, operands)) = args.split_first() else {
        print_usage();
        return;
    };

    let engine = Engine::new(config);
    let result = match command.as_str() {
        "sqrt" => commands::sqrt(&engine, &options, operands),
        "pi" => commands::constant(&engine, &options, "pi", &pi()),
        "e" => commands::constant(&engine, &options, "e", &e()),
        "compare" => commands::compare(&engine, &options, operands),
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        "version" | "--version" | "-v" => {
            println!("exar {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    match result {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        Err(err) => fail(&err),
    }
}

fn fail(err: &CliError) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}

fn print_usage() {
    println!("Exar (exact real arithmetic by precision escalation)");
    println!();
    println!("Usage: exar [options] <command>");
    println!();
    println!("Commands:");
    println!("  sqrt <n>...          Square roots, evaluated in parallel");
    println!("  pi                   Decimal expansion of pi");
    println!("  e                    Decimal expansion of e");
    println!("  compare <a> <b>      Order of two literals (42, -0.25, 1/3)");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Options:");
    println!("  --digits=n       [{}]   decimal places", commands::DEFAULT_DIGITS);
    println!("  --stats                 print per-evaluation statistics");
    println!();
    print!("{}", EngineConfig::usage());
    println!();
    println!("Examples:");
    println!("  exar pi --digits=100");
    println!("  exar sqrt 2 3 5 --stats");
    println!("  exar compare 1/3 0.333333 --prec_init=-8 --prec_inc=4");
    println!("  RUST_LOG=exar_engine=debug exar e");
}
