use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Context};
use canon::{replay, Canon, CanonEvent, CanonExtents};
use clap::{Parser, Subcommand};
use clap_stdin::FileOrStdin;
use machine_mock::{Scene, SimulatedMachine};
use probe_routines::{serve, ProbeParameters, ProbeRoutines, Routine};
use serde::Serialize;
use tokio::{
    io::{stdin, stdout, BufReader},
    runtime::Builder,
};
use tracing::info;

mod settings;
use settings::{merge_json, FileBackedValue};

#[derive(Parser, Debug)]
#[command(author, version, about = "Probing routines against a simulated machine.", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one routine and print its result as JSON.
    Run {
        /// Routine name, e.g. probe_xp or probe_round_pocket.
        routine: Routine,
        /// JSON object of parameters, applied over the saved settings.
        #[arg(short, long)]
        params: Option<String>,
        /// JSON scene for the simulated machine.
        #[arg(short, long)]
        scene: Option<PathBuf>,
        #[arg(long, default_value = "probe_settings.json")]
        settings: PathBuf,
        /// Seconds to wait for each command.
        #[arg(short, long)]
        timeout: Option<f64>,
    },
    /// Answer `<routine>$<json>` requests from stdin.
    Serve {
        #[arg(short, long)]
        scene: Option<PathBuf>,
    },
    /// Replay a JSON list of canon events and print the extents of the path.
    Extents {
        /// The file to process.
        events: FileOrStdin,
        #[arg(long)]
        arc_division: Option<u32>,
    },
}

#[derive(Serialize, Debug)]
struct ExtentsReport {
    segments: usize,
    extents: CanonExtents,
}

async fn load_scene(path: Option<PathBuf>) -> anyhow::Result<Scene> {
    match path {
        Some(path) => Scene::load(&path).await,
        None => Ok(Scene::default()),
    }
}

async fn run_routine(
    routine: Routine,
    params: Option<String>,
    scene: Option<PathBuf>,
    settings: PathBuf,
    timeout: Option<f64>,
) -> anyhow::Result<()> {
    let mut settings = FileBackedValue::new(settings, ProbeParameters::default)
        .await
        .context("Failed to load settings")?;
    if let Some(params) = params {
        let merged = merge_json(settings.get(), &params)?;
        settings.set(merged).await?;
    }
    let machine = SimulatedMachine::new(load_scene(scene).await?);
    let mut routines = ProbeRoutines::with_parameters(machine.clone(), machine, settings.get().clone());
    if let Some(seconds) = timeout {
        let timeout = Duration::try_from_secs_f64(seconds).map_err(|e| anyhow!("Invalid timeout {}: {}", seconds, e))?;
        routines.set_timeout(timeout);
    }
    let outcome = routines.run(routine).await;
    for entry in routines.take_history() {
        eprintln!("{}", entry);
    }
    outcome.with_context(|| format!("{} failed", routine))?;
    println!("{}", serde_json::to_string_pretty(routines.result())?);
    Ok(())
}

async fn serve_stdio(scene: Option<PathBuf>) -> anyhow::Result<()> {
    let machine = SimulatedMachine::new(load_scene(scene).await?);
    let mut routines = ProbeRoutines::new(machine.clone(), machine);
    info!("serving probe requests on stdin");
    serve(BufReader::new(stdin()), stdout(), &mut routines).await?;
    Ok(())
}

fn extents_report(events: &str, arc_division: Option<u32>) -> anyhow::Result<ExtentsReport> {
    let events: Vec<CanonEvent> = serde_json::from_str(events).context("Failed while parsing canon events")?;
    let mut canon = Canon::new();
    if let Some(quantum) = arc_division {
        canon.set_arc_division(quantum);
    }
    replay(&events, &mut canon);
    let extents = *canon.calc_extents();
    Ok(ExtentsReport { segments: canon.segments().len(), extents })
}

async fn run(args: Args) -> anyhow::Result<()> {
    match args.command {
        Command::Run { routine, params, scene, settings, timeout } => {
            run_routine(routine, params, scene, settings, timeout).await
        }
        Command::Serve { scene } => serve_stdio(scene).await,
        Command::Extents { events, arc_division } => {
            let report = extents_report(&events, arc_division)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let runtime = Builder::new_current_thread().enable_all().build()?;
    runtime.block_on(run(args))
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    pub fn test_extents_report() {
        let events = r#"[
            {"event": "straight_traverse", "position": [0, 0, 5, 0, 0, 0, 0, 0, 0]},
            {"event": "straight_feed", "position": [10, -2, 5, 0, 0, 0, 0, 0, 0]},
            {"event": "straight_feed", "position": [10, 4, -1, 0, 0, 0, 0, 0, 0]}
        ]"#;
        let report = extents_report(events, None).unwrap();
        assert_eq!(report.segments, 2);
        assert_eq!(report.extents.as_moved.extents.min, [0.0, -2.0, -1.0]);
        assert_eq!(report.extents.as_moved.extents.max, [10.0, 4.0, 5.0]);
        assert!(extents_report("{}", None).is_err());
    }

    #[test]
    pub fn test_arguments() {
        let args = Args::try_parse_from(["probe-cli", "run", "probe_xp", "--params", "{}", "--timeout", "2"]).unwrap();
        assert!(matches!(args.command, Command::Run { routine: Routine::ProbeXp, timeout: Some(_), .. }));
        assert!(Args::try_parse_from(["probe-cli", "run", "probe_nowhere"]).is_err());
    }
}
