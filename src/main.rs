use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hearth::console::Console;
use hearth::storage::{FileStore, DEFAULT_FILE};

#[derive(Parser, Debug)]
#[command(name = "hearth")]
#[command(version, about = "A line-oriented console for typed records with JSON file persistence")]
struct Cli {
    /// Storage file path
    #[arg(long, value_name = "PATH", default_value = DEFAULT_FILE)]
    file: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> hearth::Result<()> {
    let mut store = FileStore::new(cli.file);
    store.reload()?;
    tracing::info!(objects = store.all().len(), "console ready");

    let prompt = atty::is(atty::Stream::Stdin);
    let stdin = io::stdin();
    let mut console = Console::new(store, io::stdout());
    console.run(stdin.lock(), prompt)
}
