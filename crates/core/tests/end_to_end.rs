use algoviz_core::{
    index_steps, ActionContext, ActionRegistry, CellState, Director, DirectorState, EventRouter,
    RecordingScene, SceneConfig, SceneEngine, SceneOp, ScriptedAdapter, Storyboard, TimingConfig,
    VizEvent, WidgetSpec,
};
use serde_json::json;

fn bfs_scene() -> SceneConfig {
    SceneConfig::new("Breadth-first search", "bfs")
        .with_widget(
            "grid",
            WidgetSpec::new("grid")
                .with_param("rows", json!(3))
                .with_param("cols", json!(3)),
        )
        .with_widget("queue", WidgetSpec::new("queue"))
        .with_binding("enqueue", "grid.onEnqueue")
        .with_binding("enqueue", "queue.onEnqueue")
        .with_binding("dequeue", "grid.onDequeue")
        .with_binding("dequeue", "queue.onDequeue")
        .with_binding("goal_found", "grid.onGoal")
        .with_binding("visit", "grid")
}

fn play_runs(scene: &RecordingScene) -> Vec<f64> {
    scene
        .ops()
        .iter()
        .filter_map(|op| match op {
            SceneOp::Play { run_time, .. } => Some(*run_time),
            _ => None,
        })
        .collect()
}

#[test]
fn single_enqueue_reaches_both_widgets_with_event_timing() {
    let timing = TimingConfig::default();
    let mut engine = SceneEngine::new(&bfs_scene(), timing.clone()).unwrap();
    let expected = engine.timing().base_for("enqueue", None).unwrap();
    assert_eq!(expected, timing.events);

    let mut scene = RecordingScene::new();
    let events = vec![VizEvent::new("enqueue").with_payload("node", json!([0, 0]))];
    let mut router = EventRouter::new(&mut engine, &mut scene);
    let played: Vec<VizEvent> = router.playback(index_steps(events)).collect();

    assert_eq!(played.len(), 1);
    assert_eq!(played[0].step, 0);
    assert_eq!(router.delivered(), 2);
    assert!(router.failures().is_empty());
    drop(router);

    assert_eq!(play_runs(&scene), vec![expected, expected]);
    let grid = engine.widget("grid").unwrap().state();
    assert_eq!(grid["cells"]["0,0"], json!(CellState::Frontier));
    let queue = engine.widget("queue").unwrap().state();
    assert_eq!(queue["items"], json!([[0, 0]]));
}

#[test]
fn fallback_storyboard_plays_a_scripted_search() {
    let engine = SceneEngine::new(&bfs_scene(), TimingConfig::default()).unwrap();
    let storyboard = Storyboard::or_fallback(None, engine.algorithm());
    let scenario = json!({
        "events": [
            {"type": "enqueue", "payload": {"node": [0, 0]}},
            {"type": "dequeue", "payload": {"node": [0, 0]}},
            {"type": "visit", "payload": {"node": [0, 0]}},
            {"type": "relax"},
            {"type": "goal_found", "payload": {"node": [0, 0]}}
        ]
    });
    let registry = ActionRegistry::with_builtins();
    let mut ctx = ActionContext::new(engine).with_adapter(ScriptedAdapter::new(), scenario);
    let mut scene = RecordingScene::new();

    let mut director = Director::new(&storyboard, &registry);
    director.run(&mut scene, &mut ctx).unwrap();

    assert_eq!(director.state(), DirectorState::Completed);
    assert_eq!(ctx.events_played, 5);

    // The bare `grid` binding on `visit` is skipped, not fatal.
    assert_eq!(ctx.failures.len(), 1);
    assert_eq!(ctx.failures[0].step, 2);
    assert_eq!(ctx.failures[0].event_kind, "visit");

    let tracker = director.tracker();
    let actions: Vec<&str> = tracker.records().iter().map(|r| r.action.as_str()).collect();
    assert_eq!(
        actions,
        vec!["show_title", "setup_scene", "setup_widgets", "play_events", "outro"]
    );
    let playback = &tracker.records()[3];
    assert!((playback.planned - 0.6).abs() < 1e-9);
    // Four grid/queue updates for enqueue and dequeue plus one for the goal.
    assert!((playback.actual - 5.0 * 0.6).abs() < 1e-9);

    let grid = ctx.engine().unwrap().widget("grid").unwrap().state();
    assert_eq!(grid["cells"]["0,0"], json!(CellState::Goal));
    assert!(scene.objects().is_empty());
}

#[test]
fn draft_mode_halves_event_run_times() {
    let timing = TimingConfig::default().with_mode("draft").unwrap();
    let mut engine = SceneEngine::new(&bfs_scene(), timing).unwrap();
    let mut scene = RecordingScene::new();

    let delivered = EventRouter::new(&mut engine, &mut scene)
        .dispatch(&VizEvent::new("enqueue").with_payload("node", json!([1, 2])));

    assert_eq!(delivered, 2);
    assert_eq!(play_runs(&scene), vec![0.3, 0.3]);
}
