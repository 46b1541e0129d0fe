use std::path::PathBuf;

use algoviz_core::{
    ActionContext, ActionRegistry, AppConfig, Director, RecordingScene, SceneConfig, SceneEngine,
    ScriptedAdapter, Storyboard,
};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn main() -> algoviz_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => run_render(args),
        Commands::Actions => {
            for name in ActionRegistry::with_builtins().list() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn run_render(args: RenderArgs) -> algoviz_core::Result<()> {
    tracing::info!(scene = ?args.scene, storyboard = ?args.storyboard, "starting render");

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let timing = match args.mode {
        Some(mode) => config.timing.clone().with_mode(mode)?,
        None => config.timing.clone(),
    };

    let scene_config = SceneConfig::load(&args.scene)?;
    let engine = SceneEngine::new(&scene_config, timing)?;
    if config.strict_bindings {
        engine.validate_bindings()?;
    }

    let script = args.storyboard.as_ref().map(Storyboard::load).transpose()?;
    let storyboard = Storyboard::or_fallback(script, engine.algorithm());

    let scenario = match &args.scenario {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => Value::Null,
    };

    let registry = ActionRegistry::with_builtins();
    let mut ctx = ActionContext::new(engine).with_adapter(ScriptedAdapter::new(), scenario);
    let mut scene = RecordingScene::new();
    let mut director = Director::new(&storyboard, &registry);
    director.run(&mut scene, &mut ctx)?;

    let tracker = director.into_tracker();
    tracing::info!(
        beats = tracker.len(),
        events = ctx.events_played,
        failures = ctx.failures.len(),
        planned = tracker.total_planned(),
        actual = tracker.total_actual(),
        "render finished"
    );
    for failure in &ctx.failures {
        tracing::warn!(%failure, "event was not fully delivered");
    }

    if let Some(path) = &args.timings_csv {
        tracker.export_csv(path)?;
        tracing::info!(?path, "wrote timing csv");
    }
    if let Some(path) = &args.timings_json {
        tracker.export_json(path)?;
        tracing::info!(?path, "wrote timing json");
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Narrated algorithm visualisations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a storyboard against a scene and report beat timings.
    Render(RenderArgs),
    /// List the built-in storyboard actions.
    Actions,
}

#[derive(clap::Args, Debug)]
struct RenderArgs {
    /// Scene description (widgets and event bindings).
    #[arg(short, long)]
    scene: PathBuf,
    /// Storyboard script; a default five-beat script is used when omitted.
    #[arg(short = 'b', long)]
    storyboard: Option<PathBuf>,
    /// Scenario with the `events` the algorithm emits.
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Timing and binding configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Timing mode overriding the configured one (e.g. draft, normal, fast).
    #[arg(short, long)]
    mode: Option<String>,
    /// Write planned versus actual beat timings as CSV.
    #[arg(long)]
    timings_csv: Option<PathBuf>,
    /// Write planned versus actual beat timings as JSON.
    #[arg(long)]
    timings_json: Option<PathBuf>,
}
