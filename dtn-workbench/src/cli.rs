use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "dtn-workbench", version, about = "Delay-tolerant wireless network simulator")]
pub struct CliOpt {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a single scenario and write its reports
    Run(RunOpt),
    /// Fan a parameter sweep out over child processes
    Sweep(SweepOpt),
}

#[derive(Parser, Debug, Clone)]
pub struct RunOpt {
    /// Path to the scenario settings file
    pub scenario: PathBuf,

    /// Override the root RNG seed (`MovementModel.rngSeed`)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the scenario name used in report file names
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Override the generated message size, in bytes
    #[arg(short = 's', long)]
    pub size: Option<u64>,

    /// Override the radio transmit range, in meters
    #[arg(long)]
    pub range: Option<f64>,

    /// Override the number of hosts
    #[arg(short = 't', long)]
    pub total_hosts: Option<u32>,

    /// Override the communication mode (0 = intra-cluster, 1 = inter-cluster)
    #[arg(long)]
    pub mode: Option<u32>,

    /// Override the directory reports are written to
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Also write the run summary as JSON to this path
    #[arg(long)]
    pub stats_json: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct SweepOpt {
    /// Path to the scenario settings file every run starts from
    pub scenario: PathBuf,

    /// Maximum number of concurrently running child processes
    #[arg(short = 'j', long, default_value_t = 1)]
    pub jobs: usize,

    /// Repetitions per parameter combination; run i uses seed i
    #[arg(short = 'r', long, default_value_t = 1)]
    pub runs: u64,

    /// Message sizes to sweep, in bytes
    #[arg(short = 's', long, value_delimiter = ',')]
    pub sizes: Vec<u64>,

    /// Base name for the sweep's runs (default: the scenario's own name)
    #[arg(short = 'n', long)]
    pub name: Option<String>,

    /// Override the number of hosts for every run
    #[arg(short = 't', long)]
    pub total_hosts: Option<u32>,

    /// Transmit ranges to sweep, in meters
    #[arg(long, value_delimiter = ',')]
    pub ranges: Vec<f64>,

    /// Communication mode for every run (0 = intra-cluster, 1 = inter-cluster)
    #[arg(long)]
    pub mode: Option<u32>,

    /// Report directory for every run
    #[arg(long)]
    pub report_dir: Option<PathBuf>,
}
