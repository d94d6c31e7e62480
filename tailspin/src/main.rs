use clap::{Parser, Subcommand};
use miette::{MietteHandlerOpts, Report};
use std::process;
use tailspin_runtime::{Interpreter, InterpreterConfig, Value};

mod demos;
mod error;

use error::CliError;

/// Environment variable holding the log filter (falls back to `RUST_LOG`)
const LOG_ENV: &str = "TAILSPIN_LOG";

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(
    name = "tailspin",
    version,
    about = "Run programs with proper tail calls",
    long_about = "Tailspin runs small demonstration programs whose marked tail calls replace \
                  the caller's activation record instead of growing the call stack."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the demonstration programs
    List,

    /// Run a demonstration program
    Run {
        /// Demo to run (see `tailspin list`)
        #[arg(value_name = "NAME")]
        name: String,

        /// Length of the tail-call chain
        #[arg(short, long, default_value_t = 100_000)]
        iterations: u32,

        /// Maximum number of live activation records
        #[arg(long, value_name = "DEPTH")]
        max_depth: Option<usize>,

        /// Run marked tail calls as ordinary, frame-growing calls
        #[arg(long)]
        no_tail_calls: bool,

        /// Print the stack trace seen by the final callee instead of its result
        #[arg(long)]
        trace: bool,
    },
}

fn main() {
    setup_miette_handler();
    setup_tracing();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Some(Commands::List) => {
            handle_list_command();
            Ok(())
        }
        Some(Commands::Run {
            name,
            iterations,
            max_depth,
            no_tail_calls,
            trace,
        }) => handle_run_command(&name, iterations, max_depth, no_tail_calls, trace),
        None => {
            // No subcommand provided, show help
            Cli::parse_from(["tailspin", "--help"]);
            Ok(())
        }
    };

    if let Err(error) = outcome {
        eprintln!("{:?}", Report::new(error));
        process::exit(1);
    }
}

fn setup_miette_handler() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .color(true)
                .with_cause_chain()
                .build(),
        )
    }))
    .ok();
}

/// Log to stderr, filtered by `TAILSPIN_LOG` or `RUST_LOG`
fn setup_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    let filter_expr = std::env::var(LOG_ENV)
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok());

    let builder = fmt().with_writer(std::io::stderr);

    let builder = match filter_expr.and_then(|expr| EnvFilter::try_new(expr).ok()) {
        Some(filter) => builder.with_env_filter(filter),
        None => builder.with_env_filter(DEFAULT_LOG_FILTER),
    };

    let _ = builder.try_init();
}

fn handle_list_command() {
    let width = demos::DEMOS
        .iter()
        .map(|demo| demo.name.len())
        .max()
        .unwrap_or(0);

    for demo in demos::DEMOS {
        println!("{:width$}  {}", demo.name, demo.description);
    }
}

fn handle_run_command(
    name: &str,
    iterations: u32,
    max_depth: Option<usize>,
    no_tail_calls: bool,
    trace: bool,
) -> Result<(), CliError> {
    let demo = demos::find(name).ok_or_else(|| CliError::UnknownDemo {
        name: name.to_string(),
    })?;

    let mut config = InterpreterConfig::from_env();
    if let Some(depth) = max_depth {
        config = config.max_call_depth(depth);
    }
    if no_tail_calls {
        config = config.tail_call_elimination(false);
    }

    tracing::debug!(
        target: "tailspin::cli",
        demo = demo.name,
        iterations,
        max_call_depth = config.max_call_depth,
        tail_call_elimination = config.tail_call_elimination,
        "running demo"
    );

    let mut interpreter = Interpreter::with_config(config);
    interpreter.load(&demo.program(trace))?;
    let value = interpreter.call_global(demo.entry, vec![Value::from(f64::from(iterations))])?;

    let lines: Vec<String> = match (&value, trace) {
        (Value::Array(names), true) => names
            .borrow()
            .iter()
            .enumerate()
            .map(|(depth, name)| format!("  {depth}: {name}"))
            .collect(),
        _ => vec![value.to_display_string()],
    };

    if trace {
        println!("stack trace in final callee (innermost first):");
    }
    for line in &lines {
        println!("{line}");
    }
    println!(
        "tail calls: {}, record slots used: {}",
        interpreter.call_stack().total_tail_calls(),
        interpreter.call_stack().capacity()
    );
    Ok(())
}
