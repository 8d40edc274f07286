use crate::demo::{run_demo, run_reminder_demo, DemoArgs, ReminderArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use internlink::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "InternLink Marketplace",
    about = "Run the InternLink marketplace API and demo workflows from the command line",
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
    /// Walk a seeded marketplace through the full application lifecycle
    Demo(DemoArgs),
    /// Run the wishlist reminder sweep against seeded demo data
    Reminders(ReminderArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::Reminders(args) => run_reminder_demo(args),
    }
}
