use clap::{Parser as ClapParser, Subcommand};
use jse_lang::cli::{self, CheckOptions, CheckResult, CliError};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "jse")]
#[command(about = "jse - JSON-shaped expressions for predicates, transforms and reductions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and evaluate an expression
    Check {
        /// The expression, as JSON text
        expression: String,

        /// Variables as a JSON object (reads from stdin if not provided)
        #[arg(short, long)]
        vars: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate the expression and print its canonical form
        #[arg(long)]
        syntax_only: bool,

        /// Don't register the builtin functions
        #[arg(long)]
        no_builtins: bool,

        /// Log evaluation at debug level (overrides RUST_LOG)
        #[arg(long)]
        verbose: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            expression,
            vars,
            pretty,
            syntax_only,
            no_builtins,
            verbose,
        } => {
            init_tracing(verbose);
            let options = CheckOptions {
                expression,
                variables: vars,
                syntax_only,
                no_builtins,
            };
            run_check(options, pretty)
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_check(mut options: CheckOptions, pretty: bool) -> Result<(), CliError> {
    if options.variables.is_none() && !options.syntax_only && !atty::is(atty::Stream::Stdin) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        options.variables = Some(buffer);
    }

    let output = match cli::execute_check(&options)? {
        CheckResult::SyntaxValid(token) => token,
        CheckResult::Success(value) => value,
    };
    let json = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }?;
    println!("{}", json);
    Ok(())
}
