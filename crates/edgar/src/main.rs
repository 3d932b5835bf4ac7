mod cli;
mod spider;

use clap::Parser;
use cli::{Cli, Commands};
use tracing::{subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

// open the .env file and log at `level` instead of drawing the tui
fn init_tracing(level: Level) {
    dotenv::dotenv().ok();
    let fmt_subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    subscriber::set_global_default(fmt_subscriber).expect("Set subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(level) = cli.trace {
        init_tracing(level.into());
    }
    trace!("command line input recorded: {cli:?}");

    // if no trace level provided, use tui
    let tui = cli.trace.is_none();

    match cli.command {
        // `edgar spider [--feed URL] [--types 8-K,10-K] [--folder DIR] [--json]`
        Commands::Spider { run, json } => spider::run(run, json, tui).await?,

        // `edgar watch --every 100`
        Commands::Watch { run, every } => spider::watch(run, every, tui).await?,
    }

    Ok(())
}
