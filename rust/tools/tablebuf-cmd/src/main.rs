use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tablebuf-cmd")]
#[command(about = "Command-line utility for tablebuf buffers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect a finished buffer and print a JSON summary
    Inspect {
        /// Increase verbosity (-v adds raw vtable bytes, -vv also enables debug logging)
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Path of the buffer file
        path: String,
    },

    /// Write the `TableInC` fixture buffer
    Sample {
        /// Value stored in the innermost `TableInNestedNS.foo`
        #[arg(long, default_value_t = 42)]
        foo: i32,

        /// Four-character file identifier written after the root offset
        #[arg(long)]
        identifier: Option<String>,

        /// Output path
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Inspect { verbose, .. } if *verbose > 1 => "debug",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Inspect { verbose, path } => commands::inspect::run(verbose, path),
        Commands::Sample {
            foo,
            identifier,
            path,
        } => commands::sample::run(foo, identifier, path),
    }
}
