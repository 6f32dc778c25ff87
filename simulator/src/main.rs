use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::ControlBridge;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::ScenarioConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Headless driver for geo-anchored drawing sessions")]
struct Args {
    /// Load a scenario from YAML
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// JSON file holding the drawing collection
    #[arg(long)]
    store: Option<PathBuf>,
    /// Search radius in meters, clamped to the configured bounds
    #[arg(long)]
    radius: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Keep drawings in memory only
    #[arg(long, default_value_t = false)]
    ephemeral: bool,
    /// Keep the session and its HTTP control bridge alive after the scenario
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value = "127.0.0.1:9000")]
    bind: SocketAddr,
}

async fn run(args: Args, scenario: ScenarioConfig) -> anyhow::Result<()> {
    let name = scenario.name.clone();
    let runner = Runner::new(scenario);
    let live = runner.start()?;
    let report = runner.drive(&live).await?;

    if args.serve {
        println!("Control bridge on http://{} (Ctrl+C to stop)...", args.bind);
        let bridge = ControlBridge::new(live.handle());
        bridge
            .serve(args.bind, async {
                if let Err(err) = signal::ctrl_c().await {
                    log::warn!("[driver] awaiting Ctrl+C failed: {}", err);
                }
            })
            .await?;
    }

    let result = live.finish(&name, report).await?;
    println!("{}", result.summary());
    log::debug!(
        "[driver] result {}",
        serde_json::to_string(&result).context("encoding scenario result")?
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let scenario = match &args.scenario {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    }
    .with_overrides(args.store.clone(), args.radius, args.seed, args.ephemeral);

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating session runtime")?;
    runtime.block_on(run(args, scenario))
}
