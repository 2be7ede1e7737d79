use crate::commands::{
    run_criteria_template, run_ledger_merge, run_ledger_show, run_score, CriteriaTemplateArgs,
    LedgerMergeArgs, LedgerShowArgs, ScoreArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use partner_scorecard::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Partner Scorecard",
    about = "Score channel partners against banded criteria and keep a running ledger",
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
    /// Score one partner from criteria and performance JSON files
    Score(ScoreArgs),
    /// Work with criteria snapshots
    Criteria {
        #[command(subcommand)]
        command: CriteriaCommand,
    },
    /// Work with partner ledger CSV snapshots
    Ledger {
        #[command(subcommand)]
        command: LedgerCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CriteriaCommand {
    /// Write an empty criteria snapshot listing every metric
    Template(CriteriaTemplateArgs),
}

#[derive(Subcommand, Debug)]
enum LedgerCommand {
    /// Merge two ledger snapshots, later rows winning per partner
    Merge(LedgerMergeArgs),
    /// Print a ledger with tier labels
    Show(LedgerShowArgs),
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
        Command::Score(args) => run_score(args),
        Command::Criteria {
            command: CriteriaCommand::Template(args),
        } => run_criteria_template(args),
        Command::Ledger {
            command: LedgerCommand::Merge(args),
        } => run_ledger_merge(args),
        Command::Ledger {
            command: LedgerCommand::Show(args),
        } => run_ledger_show(args),
    }
}
