use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::interpreter::environment::is_variable;
use crate::interpreter::{parse_program, Environment, Interpreter, Value};
use crate::skills::console::console_skills;
use crate::skills::library::load_library;
use crate::skills::{HighLevelSkills, Skills};
use crate::worker::ExecutionOutcome;

#[derive(Parser)]
#[command(name = "minispec")]
#[command(about = "MiniSpec - a streaming interpreter for robot command programs", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// High-level skill library (overrides config file and env vars)
    #[arg(long, global = true)]
    pub library: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream a program through the interpreter
    Run {
        /// Program file, or `-` for stdin
        source: String,

        /// Characters per streamed fragment
        #[arg(long, default_value = "8")]
        chunk_size: usize,

        /// Pause between fragments, in milliseconds
        #[arg(long, default_value = "0")]
        chunk_delay_ms: u64,

        /// Initial variable binding, e.g. `--var _x=7`
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Evaluate the whole text at once instead of streaming it
        #[arg(long)]
        inline: bool,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the statement tree of a program
    Parse {
        /// Program file, or `-` for stdin
        source: String,
    },

    /// List available skills
    Skills,
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    let config = Config::builder()
        .config_path(cli.config)
        .skill_library(cli.library)
        .build()?;

    init_tracing(&config.log_filter);

    match cli.command {
        Commands::Run {
            source,
            chunk_size,
            chunk_delay_ms,
            vars,
            inline,
            json,
        } => {
            let text = read_source(&source)?;
            let env = parse_vars(&vars)?;
            let interpreter =
                Interpreter::with_options(build_skills(&config)?, config.interpreter.clone());

            let outcome = if inline {
                interpreter.evaluate(&text, env).await?
            } else {
                let delay = Duration::from_millis(chunk_delay_ms);
                let fragments = stream_chunks(&text, chunk_size, delay);
                interpreter.execute_with_env(fragments, env).await?
            };
            interpreter.shutdown().await;

            print_outcome(&outcome, json)?;
            if outcome.result.replan {
                std::process::exit(2);
            }
        }

        Commands::Parse { source } => {
            let text = read_source(&source)?;
            let program = parse_program(&text)?;

            for statement in program.statements() {
                println!("{}", statement);
            }
            println!("\n{} statement(s)", program.len());
        }

        Commands::Skills => {
            let skills = build_skills(&config)?;

            println!("Low-level skills:");
            for (name, skill) in skills.low_level().iter() {
                println!("  {:<12} {}", name, skill.description());
            }
            println!("\nHigh-level skills:");
            if skills.high_level().is_empty() {
                println!("  (none)");
            }
            for (name, skill) in skills.high_level().iter() {
                println!("  {:<12} {}", name, skill.description());
            }
        }
    }

    Ok(())
}

/// Install the stderr `tracing` subscriber; `RUST_LOG` wins over `default_filter`
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Console skills plus the configured high-level library
pub fn build_skills(config: &Config) -> Result<Skills> {
    let high = match &config.skill_library {
        Some(path) => {
            let library = load_library(path)?;
            info!(path = %path.display(), skills = library.len(), "skill library loaded");
            library
        }
        None => HighLevelSkills::new(),
    };
    Ok(Skills::new(console_skills(), high))
}

fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read program from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(Path::new(source))
        .with_context(|| format!("Failed to read program {}", source))
}

/// Parse `NAME=VALUE` bindings into an Environment
fn parse_vars(vars: &[String]) -> Result<Environment> {
    let mut env = Environment::new();
    for binding in vars {
        let Some((name, value)) = binding.split_once('=') else {
            bail!("Invalid binding `{}`: expected NAME=VALUE", binding);
        };
        let name = name.trim();
        if !is_variable(name) {
            bail!("Invalid binding `{}`: variable names start with `_`", binding);
        }
        env.set(name, Value::parse_literal(value.trim()));
    }
    Ok(env)
}

/// Replay `text` as a fragment stream, the way a completion API delivers it
fn stream_chunks(text: &str, size: usize, delay: Duration) -> UnboundedReceiverStream<String> {
    let chars: Vec<char> = text.chars().collect();
    let chunks: Vec<String> = chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect();

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        for chunk in chunks {
            if tx.send(chunk).is_err() {
                break;
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    });
    UnboundedReceiverStream::new(rx)
}

fn print_outcome(outcome: &ExecutionOutcome, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(outcome).context("Failed to serialize outcome")?;
        println!("{}", text);
        return Ok(());
    }

    if outcome.result.replan {
        println!("replan requested: {}", outcome.result.value);
    } else {
        println!("result: {}", outcome.result.value);
    }

    let mut vars: Vec<_> = outcome.env.iter().collect();
    vars.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in vars {
        println!("  {} = {}", name, value);
    }
    Ok(())
}
