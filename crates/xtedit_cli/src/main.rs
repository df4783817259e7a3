#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "xtedit", about = "Typed value-graph document inspection and editing tools")]
struct Cli {
	/// Enable debug logging (overridden by `XTEDIT_LOG`).
	#[arg(short, long, global = true)]
	verbose: bool,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	Info(cmd::info::Args),
	Types(cmd::types::Args),
	Show(cmd::show::Args),
	Heap(cmd::heap::Args),
	Edit(cmd::edit::Args),
}

fn main() {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	if let Err(err) = run(cli.command) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn init_logging(verbose: bool) {
	let filter = EnvFilter::try_from_env("XTEDIT_LOG").unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
	let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn run(command: Commands) -> xtedit::doc::Result<()> {
	xtedit::doc::registry::init();

	match command {
		Commands::Info(args) => cmd::info::run(args),
		Commands::Types(args) => cmd::types::run(args),
		Commands::Show(args) => cmd::show::run(args),
		Commands::Heap(args) => cmd::heap::run(args),
		Commands::Edit(args) => cmd::edit::run(args),
	}
}
