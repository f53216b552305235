use crate::demo::{run_audit, run_demo, AuditArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use finance_qualify::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Buyer Financing Qualification",
    about = "Run the owner-financing buyer qualification service from the command line",
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
    /// Re-evaluate a CSV export of stored qualifications and report drift
    Audit(AuditArgs),
    /// Walk a scripted buyer through the questionnaire and print the outcome
    Demo(DemoArgs),
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
        Command::Audit(args) => run_audit(args),
        Command::Demo(args) => run_demo(args),
    }
}
