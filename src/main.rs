//! `sentiment` command line entrypoint.
//!
//! Classifies documents given as arguments, or one document per stdin line
//! when no arguments are given, and prints the results as JSON.

use std::io::{self, BufRead};
use std::sync::Arc;

use mimalloc::MiMalloc;

use sentiment::{Config, SentimentClassifier, SentimentModel};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const HELP: &str = "\
Usage: sentiment [-h | --help] [--] [DOCUMENT]...

Classifies each DOCUMENT (or each line of stdin) as POSITIVE or NEGATIVE.
Only the first argument is read as an option; `--` ends options.

Environment:
  SENTIMENT_MODEL_PATH   Model directory (config.json, model.safetensors, tokenizer.json)
  SENTIMENT_MAX_CHARS    Characters per document sent to the model [default: 512]
  SENTIMENT_WORKERS      Concurrent predictions [default: 1]
  SENTIMENT_FORCE_CPU    Skip GPU devices (1/true/yes)
  RUST_LOG               Log filter
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Classify(Vec<String>),
}

/// Documents may look like flags, so only the leading argument is checked.
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Command {
    let mut args = args.into_iter().peekable();
    let first = args.peek().cloned();

    match first.as_deref() {
        Some("-h" | "--help") => Command::Help,
        Some("--") => Command::Classify(args.skip(1).collect()),
        _ => Command::Classify(args.collect()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = match parse_args(std::env::args().skip(1)) {
        Command::Help => {
            print!("{HELP}");
            return Ok(());
        }
        Command::Classify(args) => args,
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    if config.model_path.is_none() {
        tracing::warn!("No SENTIMENT_MODEL_PATH configured, running model in stub mode");
    }

    let documents = if args.is_empty() {
        io::stdin().lock().lines().collect::<io::Result<Vec<_>>>()?
    } else {
        args
    };

    tracing::info!(
        documents = documents.len(),
        workers = config.workers,
        max_chars = config.max_chars,
        "Classifying"
    );

    let model = tokio::task::spawn_blocking({
        let model_config = config.model_config();
        move || SentimentModel::load(model_config)
    })
    .await??;

    let classifier = Arc::new(SentimentClassifier::from_config(model, &config));

    let results = if config.workers > 1 {
        classifier
            .classify_concurrent(documents, config.workers)
            .await?
    } else {
        tokio::task::spawn_blocking({
            let classifier = Arc::clone(&classifier);
            move || classifier.classify(&documents)
        })
        .await??
    };

    println!("{}", serde_json::to_string_pretty(&results)?);

    Ok(())
}
