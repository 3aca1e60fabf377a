//! Command-line interface.

pub mod init;
pub mod list;
pub mod output;
pub mod prompt;
pub mod run;
pub mod set;

use clap::{Args, Parser, Subcommand};

/// Stagehand - scoped deployment variables with KMS-encrypted values.
#[derive(Parser)]
#[command(
    name = "stagehand",
    about = "Scoped deployment variables with KMS-encrypted values",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Initialize a stagehand project in the current directory
    Init(InitArgs),

    /// Manage project variables
    Variables {
        #[command(subcommand)]
        action: VariablesAction,
    },

    /// Run a command with the materialized stage variable set injected
    Run(RunArgs),
}

/// `variables` subcommands.
#[derive(Subcommand)]
pub enum VariablesAction {
    /// Define a variable usable in any of the project's scopes
    Set(SetArgs),

    /// List variables, grouped by scope
    List(ListArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Project name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Declare a stage (repeatable, in deployment order)
    #[arg(short, long = "stage", value_name = "STAGE")]
    pub stages: Vec<String>,

    /// Declare a region as STAGE:REGION (repeatable)
    #[arg(short, long = "region", value_name = "STAGE:REGION")]
    pub regions: Vec<String>,

    /// KMS key ARN for variable encryption
    #[arg(long, value_name = "ARN")]
    pub kms: Option<String>,
}

#[derive(Args)]
pub struct SetArgs {
    /// Variable type (common, stage or region)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub scope_type: Option<String>,

    /// Stage you want to set the variable in
    #[arg(short, long)]
    pub stage: Option<String>,

    /// Region you want to set the variable in
    #[arg(short, long)]
    pub region: Option<String>,

    /// The key of the variable you want to set
    #[arg(short, long)]
    pub key: Option<String>,

    /// The value of the variable you want to set
    #[arg(short = 'v', long)]
    pub value: Option<String>,

    /// Encrypt the value with the configured KMS key
    #[arg(short, long)]
    pub encrypt: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Stage you want to list variables from
    #[arg(short, long)]
    pub stage: Option<String>,

    /// Region you want to list variables from
    #[arg(short, long)]
    pub region: Option<String>,

    /// List all available variables
    #[arg(short, long)]
    pub all: bool,

    /// Decrypt encrypted variables instead of masking them
    #[arg(short, long)]
    pub decrypt: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Select stage and region interactively
    #[arg(long)]
    pub interactive: bool,
}

#[derive(Args)]
pub struct RunArgs {
    /// Stage to run against
    #[arg(short, long)]
    pub stage: String,

    /// Region to run against (defaults to every region of the stage)
    #[arg(short, long)]
    pub region: Option<String>,

    /// The artifact is already resolved; skip materialization
    #[arg(long)]
    pub deployed: bool,

    /// Command and arguments to run
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

/// Execute a command.
pub fn execute(command: Command) -> crate::error::Result<()> {
    match command {
        Command::Init(args) => init::execute(args),
        Command::Variables { action } => match action {
            VariablesAction::Set(args) => set::execute(args),
            VariablesAction::List(args) => list::execute(args),
        },
        Command::Run(args) => run::execute(args),
    }
}
