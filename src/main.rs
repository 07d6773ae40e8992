use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use midi_tokenizer::{MidiTokenizer, Tokenizer, store};

#[derive(Parser, Debug)]
#[command(name = "midi-tokenizer")]
#[command(about = "Convert MIDI files to token sequences and back", long_about = None)]
struct Args {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tokenize a MIDI file into a raw u16 token file
    Encode {
        /// Path to the MIDI file
        midi: PathBuf,

        /// Output file (default: `<midi-name>.tokens`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the event names to stdout instead of writing a file
        #[arg(long)]
        text: bool,
    },
    /// Rebuild a MIDI file (at 120 BPM) from a token file
    Decode {
        /// Path to the token file
        tokens: PathBuf,

        /// Output file (default: `<tokens-name>.mid`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the start of the event-to-token table
    Vocab {
        /// How many entries to print
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn default_output(input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    PathBuf::from(format!("{}.{}", stem, extension))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let tokenizer = MidiTokenizer::new();

    match args.command {
        Command::Encode { midi, output, text } => {
            let tokens = tokenizer
                .midi_to_tokens(&midi)
                .with_context(|| format!("Failed to tokenize {}", midi.display()))?;

            if text {
                for event in tokenizer.events(&tokens)? {
                    println!("{}", event);
                }
                return Ok(());
            }

            let output = output.unwrap_or_else(|| default_output(&midi, "tokens"));
            store::save_tokens(&output, &tokens)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("{} tokens saved to {}", tokens.len(), output.display());
        }
        Command::Decode { tokens, output } => {
            let ids = store::load_tokens(&tokens)
                .with_context(|| format!("Failed to read {}", tokens.display()))?;
            let performance = tokenizer.decode(&ids);

            let output = output.unwrap_or_else(|| default_output(&tokens, "mid"));
            performance
                .save(&output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(
                "{} notes saved to {}",
                performance.notes.len(),
                output.display()
            );
        }
        Command::Vocab { limit } => {
            println!("Sample of event-to-integer mapping:");
            for (id, event) in tokenizer.vocab().iter().take(limit) {
                println!("'{}' -> {}", event, id);
            }
        }
    }

    Ok(())
}
