use clap::{Parser, Subcommand, command};
use espport::error::PortResult;
use lines::{LineOptions, handle_enter, handle_reset};

mod lines;

#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
struct Cli {
    /// Log sequencing and drained bytes
    #[clap(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Put the target in ROM download mode and drain its boot log
    #[command(name = "enter", alias = "e")]
    Enter(LineOptions),

    /// Reboot the target into its application
    #[command(name = "reset", alias = "r")]
    Reset(LineOptions),
}

fn main() -> PortResult<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Command::Enter(opts) => handle_enter(opts)?,
        Command::Reset(opts) => handle_reset(opts)?,
    }

    Ok(())
}
