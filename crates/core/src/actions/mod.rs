//! Built-in beat actions and the state they share across a run.

use std::fmt;

use serde_json::{Map, Value};

use crate::{
    events::{index_steps, AlgorithmAdapter},
    registry::Action,
    render::{Animation, Scene},
    router::{EventRouter, RoutingFailure},
    scene::SceneEngine,
    storyboard::Args,
    timing::TimingResolver,
    Result, VizError,
};

const TITLE: &str = "title";

/// Shared state handed to every action of one run.
///
/// When a scene engine is attached, beats and routed events are timed by the
/// same resolver.
pub struct ActionContext {
    engine: Option<SceneEngine>,
    pub adapter: Option<Box<dyn AlgorithmAdapter>>,
    /// Descriptor passed to the adapter by `play_events`.
    pub scenario: Value,
    timing: TimingResolver,
    /// Free-form values actions leave for later beats.
    pub vars: Map<String, Value>,
    pub failures: Vec<RoutingFailure>,
    pub events_played: usize,
}

impl Default for ActionContext {
    fn default() -> Self {
        Self::with_timing(TimingResolver::default())
    }
}

impl ActionContext {
    /// Context around `engine`, timed like the engine.
    pub fn new(engine: SceneEngine) -> Self {
        Self {
            timing: engine.timing().clone(),
            engine: Some(engine),
            ..Self::default()
        }
    }

    /// Context without a scene engine.
    pub fn with_timing(timing: TimingResolver) -> Self {
        Self {
            engine: None,
            adapter: None,
            scenario: Value::Null,
            timing,
            vars: Map::new(),
            failures: Vec::new(),
            events_played: 0,
        }
    }

    pub fn with_adapter<A>(mut self, adapter: A, scenario: Value) -> Self
    where
        A: AlgorithmAdapter + 'static,
    {
        self.adapter = Some(Box::new(adapter));
        self.scenario = scenario;
        self
    }

    pub fn engine(&self) -> Result<&SceneEngine> {
        self.engine.as_ref().ok_or_else(missing_engine)
    }

    pub fn timing(&self) -> &TimingResolver {
        &self.timing
    }
}

impl fmt::Debug for ActionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionContext")
            .field("engine", &self.engine.as_ref().map(SceneEngine::name))
            .field("adapter", &self.adapter.as_ref().map(|a| a.name()))
            .field("vars", &self.vars)
            .field("failures", &self.failures.len())
            .field("events_played", &self.events_played)
            .finish()
    }
}

fn missing_engine() -> VizError {
    VizError::msg("no scene engine is attached to this run")
}

fn str_arg<'a>(args: &'a Args, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Actions every registry created with
/// [`ActionRegistry::with_builtins`](crate::registry::ActionRegistry::with_builtins) knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinAction {
    ShowTitle,
    ShowText,
    SetupScene,
    SetupWidgets,
    PlayEvents,
    Highlight,
    Wait,
    Outro,
}

impl BuiltinAction {
    pub const ALL: [BuiltinAction; 8] = [
        Self::ShowTitle,
        Self::ShowText,
        Self::SetupScene,
        Self::SetupWidgets,
        Self::PlayEvents,
        Self::Highlight,
        Self::Wait,
        Self::Outro,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::ShowTitle => "show_title",
            Self::ShowText => "show_text",
            Self::SetupScene => "setup_scene",
            Self::SetupWidgets => "setup_widgets",
            Self::PlayEvents => "play_events",
            Self::Highlight => "highlight",
            Self::Wait => "wait",
            Self::Outro => "outro",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }
}

impl Action for BuiltinAction {
    fn run(
        &self,
        scene: &mut dyn Scene,
        args: &Args,
        run_time: f64,
        ctx: &mut ActionContext,
    ) -> Result<()> {
        match self {
            Self::ShowTitle => show_title(scene, args, run_time, ctx),
            Self::ShowText => show_text(scene, args, run_time, ctx),
            Self::SetupScene => setup_scene(scene, run_time, ctx),
            Self::SetupWidgets => setup_widgets(scene, run_time, ctx),
            Self::PlayEvents => play_events(scene, args, ctx),
            Self::Highlight => highlight(scene, args, run_time),
            Self::Wait => wait(scene, args, run_time),
            Self::Outro => outro(scene, run_time, ctx),
        }
    }
}

fn show_title(
    scene: &mut dyn Scene,
    args: &Args,
    run_time: f64,
    ctx: &mut ActionContext,
) -> Result<()> {
    let text = str_arg(args, "text")
        .map(str::to_string)
        .or_else(|| ctx.engine.as_ref().map(|engine| engine.name().to_string()))
        .unwrap_or_else(|| "Untitled".to_string());
    ctx.vars.insert(TITLE.to_string(), Value::String(text));

    scene.add(TITLE);
    scene.play(&[Animation::new(TITLE, "write")], run_time);
    Ok(())
}

fn show_text(
    scene: &mut dyn Scene,
    args: &Args,
    run_time: f64,
    ctx: &mut ActionContext,
) -> Result<()> {
    let text = str_arg(args, "text")
        .ok_or_else(|| VizError::msg("`show_text` needs a `text` argument"))?;
    let id = str_arg(args, "id").unwrap_or("caption");
    ctx.vars
        .insert(id.to_string(), Value::String(text.to_string()));

    scene.add(id);
    scene.play(&[Animation::new(id, "write")], run_time);
    Ok(())
}

fn setup_scene(scene: &mut dyn Scene, run_time: f64, ctx: &mut ActionContext) -> Result<()> {
    let engine = ctx.engine.as_ref().ok_or_else(missing_engine)?;
    let label = engine.name().to_string();
    let algorithm = engine.algorithm().to_string();

    scene.remove(TITLE);
    scene.add(&label);
    scene.play(&[Animation::new(label.as_str(), "fade_in")], run_time);

    ctx.vars.insert("scene".to_string(), Value::String(label));
    ctx.vars
        .insert("algorithm".to_string(), Value::String(algorithm));
    Ok(())
}

fn setup_widgets(scene: &mut dyn Scene, run_time: f64, ctx: &mut ActionContext) -> Result<()> {
    let engine = ctx.engine()?;
    let names = engine.widget_names();
    if names.is_empty() {
        return Ok(());
    }

    let animations: Vec<Animation> = names
        .iter()
        .map(|name| {
            scene.add(name);
            Animation::new(*name, "create")
        })
        .collect();
    scene.play(&animations, run_time);
    Ok(())
}

/// Pulls the adapter's stream through the router. Each event is timed by its
/// own bucket; `args.limit` stops playback early and `args.scenario`
/// replaces the run's scenario for this beat.
fn play_events(scene: &mut dyn Scene, args: &Args, ctx: &mut ActionContext) -> Result<()> {
    let ActionContext {
        engine,
        adapter,
        scenario,
        failures,
        events_played,
        ..
    } = ctx;
    let engine = engine.as_mut().ok_or_else(missing_engine)?;
    let adapter = adapter
        .as_deref()
        .ok_or_else(|| VizError::msg("`play_events` needs an algorithm adapter"))?;
    let scenario = args.get("scenario").unwrap_or(&*scenario);
    let limit = args
        .get("limit")
        .and_then(Value::as_u64)
        .map_or(usize::MAX, |n| n as usize);

    let stream = index_steps(adapter.run(scenario)?);
    let mut router = EventRouter::new(engine, scene);
    let played = router.playback(stream).take(limit).count();
    let new_failures = router.take_failures();

    tracing::info!(
        adapter = adapter.name(),
        played,
        failures = new_failures.len(),
        "event playback finished"
    );
    failures.extend(new_failures);
    *events_played += played;
    Ok(())
}

fn highlight(scene: &mut dyn Scene, args: &Args, run_time: f64) -> Result<()> {
    let target = str_arg(args, "target")
        .ok_or_else(|| VizError::msg("`highlight` needs a `target` argument"))?;
    let effect = str_arg(args, "effect").unwrap_or("indicate");
    scene.play(&[Animation::new(target, effect)], run_time);
    Ok(())
}

/// Waits `args.seconds`, or the beat's run-time.
fn wait(scene: &mut dyn Scene, args: &Args, run_time: f64) -> Result<()> {
    let seconds = args
        .get("seconds")
        .and_then(Value::as_f64)
        .unwrap_or(run_time);
    scene.wait(seconds);
    Ok(())
}

fn outro(scene: &mut dyn Scene, run_time: f64, ctx: &mut ActionContext) -> Result<()> {
    let mut targets = vec![TITLE.to_string()];
    if let Some(engine) = &ctx.engine {
        targets.push(engine.name().to_string());
        targets.extend(engine.widget_names().into_iter().map(str::to_string));
    }

    let animations: Vec<Animation> = targets
        .iter()
        .map(|target| Animation::new(target.as_str(), "fade_out"))
        .collect();
    scene.play(&animations, run_time);
    for target in &targets {
        scene.remove(target);
    }
    Ok(())
}

/// Adapts a closure into an [`Action`].
pub struct FnAction<F>(F);

impl<F> FnAction<F>
where
    F: Fn(&mut dyn Scene, &Args, f64, &mut ActionContext) -> Result<()>,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn(&mut dyn Scene, &Args, f64, &mut ActionContext) -> Result<()>,
{
    fn run(
        &self,
        scene: &mut dyn Scene,
        args: &Args,
        run_time: f64,
        ctx: &mut ActionContext,
    ) -> Result<()> {
        (self.0)(scene, args, run_time, ctx)
    }
}
