mod cli;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{CliOpt, Command, RunOpt, SweepOpt};
use dtn_sim::{Scenario, Settings};
use std::fs::File;
use std::process::{Child, Command as ProcessCommand};
use tracing_subscriber::fmt::Subscriber;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .without_time()
        .init();

    let opt = CliOpt::parse();
    match opt.command {
        Command::Run(run_opt) => run(&run_opt),
        Command::Sweep(sweep_opt) => sweep(&sweep_opt),
    }
}

fn run(opt: &RunOpt) -> anyhow::Result<()> {
    let mut settings = Settings::from_file(&opt.scenario)
        .with_context(|| format!("unable to load scenario `{}`", opt.scenario.display()))?;
    apply_overrides(&mut settings, opt)?;

    let mut scenario = Scenario::build(&settings).context("invalid scenario configuration")?;

    println!("--- Params ---");
    println!("* Scenario: {}", scenario.name);
    println!("* Seed: {}", scenario.seed);
    println!("* Hosts: {}", scenario.simulation.world.hosts.len());
    println!("* Rooms: {}", scenario.simulation.world.rooms.len());

    let stats = scenario
        .simulation
        .run()
        .context("simulation aborted on a fatal scenario error")?;

    println!("--- Stats ---");
    print!("{stats}");

    let report_dir = opt.report_dir.clone().or(scenario.report_dir.clone());
    if let Some(dir) = report_dir {
        let written = scenario
            .simulation
            .write_reports(&dir, &scenario.name)
            .with_context(|| format!("failed to write reports to `{}`", dir.display()))?;
        for path in written {
            println!("* Report written: {}", path.display());
        }
    }

    if let Some(path) = &opt.stats_json {
        let file = File::create(path)
            .with_context(|| format!("failed to create `{}`", path.display()))?;
        serde_json::to_writer_pretty(file, &stats).context("failed to serialize stats")?;
    }

    Ok(())
}

fn apply_overrides(settings: &mut Settings, opt: &RunOpt) -> anyhow::Result<()> {
    if let Some(seed) = opt.seed {
        settings.set("MovementModel.rngSeed", seed);
    }
    if let Some(name) = &opt.name {
        settings.set("Scenario.name", name);
    }
    if let Some(size) = opt.size {
        settings.set("Events1.size", size);
    }
    if let Some(hosts) = opt.total_hosts {
        settings.set("Group1.nrofHosts", hosts);
    }
    if let Some(dir) = &opt.report_dir {
        settings.set("Report.reportDir", dir.display());
    }

    // Range and mode live under the interface's settings namespace
    if opt.range.is_some() || opt.mode.is_some() {
        let prefix = settings
            .get("Group1.interface1")
            .context("scenario has no `Group1.interface1` to override")?
            .to_string();
        if let Some(range) = opt.range {
            settings.set(&format!("{prefix}.transmitRange"), range);
        }
        if let Some(mode) = opt.mode {
            settings.set(&format!("{prefix}.communicationMode"), mode);
            settings.set("Events1.mode", mode);
        }
    }
    Ok(())
}

/// Runs the cartesian product of seeds × sizes × ranges as child processes,
/// at most `--jobs` at a time. Any failing child fails the sweep.
fn sweep(opt: &SweepOpt) -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("cannot locate own executable")?;
    let base_name = match &opt.name {
        Some(name) => name.clone(),
        None => Settings::from_file(&opt.scenario)
            .ok()
            .and_then(|s| s.get("Scenario.name").map(str::to_string))
            .unwrap_or_else(|| "sweep".to_string()),
    };

    let sizes: Vec<Option<u64>> = if opt.sizes.is_empty() {
        vec![None]
    } else {
        opt.sizes.iter().copied().map(Some).collect()
    };
    let ranges: Vec<Option<f64>> = if opt.ranges.is_empty() {
        vec![None]
    } else {
        opt.ranges.iter().copied().map(Some).collect()
    };

    let mut commands = Vec::new();
    for seed in 0..opt.runs {
        for &size in &sizes {
            for &range in &ranges {
                let mut name = format!("{base_name}_r{seed}");
                if let Some(size) = size {
                    name.push_str(&format!("_s{size}"));
                }
                if let Some(range) = range {
                    name.push_str(&format!("_t{range}"));
                }

                let mut command = ProcessCommand::new(&exe);
                command
                    .arg("run")
                    .arg(&opt.scenario)
                    .arg("--seed")
                    .arg(seed.to_string())
                    .arg("--name")
                    .arg(&name);
                if let Some(size) = size {
                    command.arg("--size").arg(size.to_string());
                }
                if let Some(range) = range {
                    command.arg("--range").arg(range.to_string());
                }
                if let Some(hosts) = opt.total_hosts {
                    command.arg("--total-hosts").arg(hosts.to_string());
                }
                if let Some(mode) = opt.mode {
                    command.arg("--mode").arg(mode.to_string());
                }
                if let Some(dir) = &opt.report_dir {
                    command.arg("--report-dir").arg(dir);
                }
                commands.push((name, command));
            }
        }
    }

    println!(
        "--- Sweep: {} runs, {} at a time ---",
        commands.len(),
        opt.jobs.max(1)
    );

    let mut failed = Vec::new();
    for batch in commands.chunks_mut(opt.jobs.max(1)) {
        let children: Vec<(&str, std::io::Result<Child>)> = batch
            .iter_mut()
            .map(|(name, command)| (name.as_str(), command.spawn()))
            .collect();

        for (name, child) in children {
            let status = child
                .with_context(|| format!("failed to spawn run `{name}`"))?
                .wait()
                .with_context(|| format!("failed to wait for run `{name}`"))?;
            if status.success() {
                println!("* {name}: ok");
            } else {
                println!("* {name}: FAILED ({status})");
                failed.push(name.to_string());
            }
        }
    }

    if !failed.is_empty() {
        bail!("{} of {} runs failed: {}", failed.len(), commands.len(), failed.join(", "));
    }
    Ok(())
}
