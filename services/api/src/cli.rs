use crate::demo::{run_signal_score, SignalScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use demand_intel::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Demand Intelligence Service",
    about = "Run and exercise the procurement demand-intelligence service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with demand signals without starting the server
    Signal {
        #[command(subcommand)]
        command: SignalCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SignalCommand {
    /// Score a candidate opportunity and print the breakdown and routing
    Score(SignalScoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Signal {
            command: SignalCommand::Score(args),
        } => run_signal_score(args),
    }
}
