use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Host prototype that drives the narrative progression core",
    version
)]
pub struct Args {
    /// Path to the unlock-rule table JSON
    #[arg(long, default_value = "assets/unlock_rules.json")]
    pub rules: PathBuf,

    /// Path to the progression save file
    #[arg(long, default_value = "progression_save.json")]
    pub save: PathBuf,

    /// Optional game config JSON overriding the built-in defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Optional image-asset manifest JSON; without one every image
    /// reference resolves
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Scenario playbook JSON to replay against the session
    #[arg(long)]
    pub playbook: Option<PathBuf>,

    /// Seed for random-dialogue selection (default: OS entropy)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Path to write the final session snapshot as JSON
    #[arg(long)]
    pub state_json: Option<PathBuf>,

    /// Path to write the engine event log as JSON
    #[arg(long)]
    pub event_log_json: Option<PathBuf>,

    /// Print every engine event after the run
    #[arg(long)]
    pub verbose: bool,
}
