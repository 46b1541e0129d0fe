//! Storyboard playback.
//!
//! The director walks acts, shots and beats strictly in document order. Each
//! beat's handler comes from the [`ActionRegistry`]; its run-time is the
//! beat's explicit duration or the timing-bucket value for the action name.
//! Planned and actual run-times are recorded for every beat that finishes.
//! Handler errors are not caught here: they end the run.

use serde::Serialize;

use crate::{
    actions::{ActionContext, BuiltinAction},
    record::{TimingSink, TimingTracker},
    registry::ActionRegistry,
    render::Scene,
    storyboard::{Beat, Storyboard},
    Result, VizError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorState {
    NotStarted,
    Running,
    Completed,
    Failed,
}

#[derive(Debug)]
pub struct Director<'r, S = TimingTracker> {
    storyboard: &'r Storyboard,
    registry: &'r ActionRegistry,
    tracker: S,
    state: DirectorState,
}

impl<'r> Director<'r> {
    pub fn new(storyboard: &'r Storyboard, registry: &'r ActionRegistry) -> Self {
        Self::with_sink(storyboard, registry, TimingTracker::new())
    }
}

impl<'r, S: TimingSink> Director<'r, S> {
    pub fn with_sink(
        storyboard: &'r Storyboard,
        registry: &'r ActionRegistry,
        sink: S,
    ) -> Self {
        Self {
            storyboard,
            registry,
            tracker: sink,
            state: DirectorState::NotStarted,
        }
    }

    pub fn state(&self) -> DirectorState {
        self.state
    }

    pub fn tracker(&self) -> &S {
        &self.tracker
    }

    pub fn into_tracker(self) -> S {
        self.tracker
    }

    /// Plays the whole storyboard once.
    pub fn run(&mut self, scene: &mut dyn Scene, ctx: &mut ActionContext) -> Result<()> {
        if self.state != DirectorState::NotStarted {
            return Err(VizError::Orchestration(format!(
                "director cannot run from state {:?}",
                self.state
            )));
        }

        self.state = DirectorState::Running;
        tracing::info!(
            acts = self.storyboard.acts.len(),
            beats = self.storyboard.beat_count(),
            mode = ctx.timing().current_mode(),
            "storyboard started"
        );

        let storyboard = self.storyboard;
        for (act_index, act) in storyboard.acts.iter().enumerate() {
            tracing::debug!(act = act_index, title = %act.title, "entering act");
            for (shot_index, shot) in act.shots.iter().enumerate() {
                for beat in &shot.beats {
                    if let Err(err) = self.play_beat(beat, scene, ctx) {
                        self.state = DirectorState::Failed;
                        tracing::error!(
                            act = act_index,
                            shot = shot_index,
                            action = %beat.action,
                            error = %err,
                            "storyboard failed"
                        );
                        return Err(err);
                    }
                }
            }
        }

        self.state = DirectorState::Completed;
        tracing::info!(elapsed = scene.elapsed(), "storyboard completed");
        Ok(())
    }

    fn play_beat(
        &mut self,
        beat: &Beat,
        scene: &mut dyn Scene,
        ctx: &mut ActionContext,
    ) -> Result<()> {
        let registry = self.registry;
        let action = registry.get(&beat.action).map_err(|err| {
            VizError::Orchestration(format!("cannot play beat `{}`: {err}", beat.action))
        })?;
        let planned = match beat.duration {
            Some(seconds) if seconds.is_finite() && seconds >= 0.0 => seconds,
            Some(seconds) => {
                return Err(VizError::config(format!(
                    "beat `{}` has an invalid duration {seconds}",
                    beat.action
                )))
            }
            None if beat.action == BuiltinAction::Wait.name() => {
                ctx.timing().wait_for(None)?
            }
            None => ctx.timing().base_for(&beat.action, None)?,
        };

        tracing::debug!(action = %beat.action, planned, "playing beat");
        let started = scene.elapsed();
        action.run(scene, &beat.args, planned, ctx)?;
        let actual = scene.elapsed() - started;

        self.tracker.record(&beat.action, planned, actual);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;
    use crate::{
        actions::FnAction,
        config::TimingConfig,
        render::RecordingScene,
        storyboard::{Act, Args, Shot},
    };

    fn storyboard(actions: &[&[&str]]) -> Storyboard {
        let shots = actions
            .iter()
            .map(|beats| Shot::new(beats.iter().map(|a| Beat::new(*a)).collect()))
            .collect();
        Storyboard::new(vec![Act::new("test", shots)])
    }

    #[test]
    fn empty_storyboard_completes_without_timings() {
        let storyboard = Storyboard::default();
        let registry = ActionRegistry::new();
        let mut director = Director::new(&storyboard, &registry);

        director
            .run(&mut RecordingScene::new(), &mut ActionContext::default())
            .unwrap();
        assert_eq!(director.state(), DirectorState::Completed);
        assert!(director.tracker().is_empty());
    }

    #[test]
    fn runs_beats_in_order_and_records_timings() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut registry = ActionRegistry::new();
        for name in ["one", "two", "three"] {
            let order = order.clone();
            registry
                .register(
                    name,
                    FnAction::new(
                        move |scene: &mut dyn Scene, _: &Args, run_time: f64, _: &mut ActionContext| {
                            order.borrow_mut().push(name);
                            scene.wait(run_time);
                            Ok(())
                        },
                    ),
                )
                .unwrap();
        }
        let mut board = storyboard(&[&["one", "two"], &[], &["three"]]);
        board.acts[0].shots[0].beats[1] = Beat::new("two").with_duration(3.0);

        let mut director = Director::new(&board, &registry);
        director
            .run(&mut RecordingScene::new(), &mut ActionContext::default())
            .unwrap();

        assert_eq!(*order.borrow(), vec!["one", "two", "three"]);
        let records = director.tracker().records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].planned, 1.0);
        assert_eq!(records[1].planned, 3.0);
        assert_eq!(records[1].actual, 3.0);
    }

    #[test]
    fn unregistered_action_is_an_orchestration_error() {
        let board = storyboard(&[&["wait", "sparkle", "wait"]]);
        let registry = ActionRegistry::with_builtins();
        let mut director = Director::new(&board, &registry);

        let err = director
            .run(&mut RecordingScene::new(), &mut ActionContext::default())
            .unwrap_err();
        assert!(matches!(err, VizError::Orchestration(_)));
        assert!(err.to_string().contains("sparkle"));
        assert!(err.to_string().contains("play_events"));
        assert_eq!(director.state(), DirectorState::Failed);
        assert_eq!(director.tracker().len(), 1);
    }

    #[test]
    fn handler_errors_propagate_and_stop_the_run() {
        let mut registry = ActionRegistry::new();
        registry
            .register(
                "fail",
                FnAction::new(|_: &mut dyn Scene, _: &Args, _: f64, _: &mut ActionContext| {
                    Err(VizError::msg("handler gave up"))
                }),
            )
            .unwrap();
        registry
            .register(
                "ok",
                FnAction::new(|_: &mut dyn Scene, _: &Args, _: f64, _: &mut ActionContext| Ok(())),
            )
            .unwrap();
        let board = storyboard(&[&["ok", "fail", "ok"]]);
        let mut director = Director::new(&board, &registry);

        let err = director
            .run(&mut RecordingScene::new(), &mut ActionContext::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "handler gave up");
        assert_eq!(director.tracker().len(), 1);
    }

    #[test]
    fn wait_beats_last_their_duration() {
        let board = Storyboard::from_json_str(
            r#"{"acts": [{"shots": [{"beats": [
                {"action": "wait", "run_time": 2.0},
                {"action": "wait"}
            ]}]}]}"#,
        )
        .unwrap();
        let registry = ActionRegistry::with_builtins();
        let mut director = Director::new(&board, &registry);

        director
            .run(&mut RecordingScene::new(), &mut ActionContext::default())
            .unwrap();

        let records = director.tracker().records();
        assert_eq!(records[0].planned, 2.0);
        assert_eq!(records[0].actual, 2.0);
        let waits = TimingConfig::default().waits;
        assert_eq!(records[1].planned, waits);
        assert_eq!(records[1].actual, waits);
    }

    #[test]
    fn rejects_negative_and_nan_durations() {
        let registry = ActionRegistry::with_builtins();
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let board = Storyboard::new(vec![Act::new(
                "bad",
                vec![Shot::new(vec![Beat::new("wait").with_duration(bad)])],
            )]);
            let mut director = Director::new(&board, &registry);

            let err = director
                .run(&mut RecordingScene::new(), &mut ActionContext::default())
                .unwrap_err();
            assert!(matches!(err, VizError::Config(_)), "{bad}");
            assert_eq!(director.state(), DirectorState::Failed);
            assert!(director.tracker().is_empty());
        }
    }

    #[test]
    fn director_is_single_pass() {
        let storyboard = Storyboard::default();
        let registry = ActionRegistry::new();
        let mut director = Director::new(&storyboard, &registry);
        let mut ctx = ActionContext::default();

        director.run(&mut RecordingScene::new(), &mut ctx).unwrap();
        let err = director.run(&mut RecordingScene::new(), &mut ctx).unwrap_err();
        assert!(matches!(err, VizError::Orchestration(_)));
        assert_eq!(director.state(), DirectorState::Completed);
    }

    #[test]
    fn context_is_shared_across_beats() {
        let mut registry = ActionRegistry::new();
        registry
            .register(
                "remember",
                FnAction::new(|_: &mut dyn Scene, args: &Args, _: f64, ctx: &mut ActionContext| {
                    ctx.vars.insert("remembered".to_string(), args["value"].clone());
                    Ok(())
                }),
            )
            .unwrap();
        registry
            .register(
                "recall",
                FnAction::new(|_: &mut dyn Scene, _: &Args, _: f64, ctx: &mut ActionContext| {
                    match ctx.vars.get("remembered") {
                        Some(value) if value == &json!(42) => Ok(()),
                        _ => Err(VizError::msg("nothing remembered")),
                    }
                }),
            )
            .unwrap();
        let board = Storyboard::new(vec![Act::new(
            "memory",
            vec![
                Shot::new(vec![Beat::new("remember").with_arg("value", json!(42))]),
                Shot::new(vec![Beat::new("recall")]),
            ],
        )]);

        let mut director = Director::new(&board, &registry);
        director
            .run(&mut RecordingScene::new(), &mut ActionContext::default())
            .unwrap();
        assert_eq!(director.state(), DirectorState::Completed);
    }
}
