use crate::render::{
    run_municipality_report, run_school_listing, run_school_report, MunicipalityReportArgs,
    SchoolReportArgs, SchoolsArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use equidar::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Equidar",
    about = "Serve and inspect school performance reports built from standardized-testing exports",
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
    /// Build a school or municipality report from the configured exports
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// List the schools of a city
    Schools(SchoolsArgs),
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Per-axis performance and upgrade points for one school
    School(SchoolReportArgs),
    /// Roll-up of every school in a municipality
    Municipality(MunicipalityReportArgs),
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
        Command::Report {
            command: ReportCommand::School(args),
        } => run_school_report(args),
        Command::Report {
            command: ReportCommand::Municipality(args),
        } => run_municipality_report(args),
        Command::Schools(args) => run_school_listing(args),
    }
}
