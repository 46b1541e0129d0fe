//! Event routing.
//!
//! Each event is delivered to the bindings registered for its type, in
//! declaration order. A binding that cannot be delivered (malformed, unknown
//! widget, or a widget returning an error) is recorded as a
//! [`RoutingFailure`] and skipped; delivery to the remaining bindings and to
//! later events continues.

use std::fmt;

use serde::Serialize;

use crate::{events::VizEvent, mapping::Binding, render::Scene, scene::SceneEngine};

/// One binding that could not be delivered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingFailure {
    pub step: usize,
    pub event_kind: String,
    pub binding: String,
    pub reason: String,
}

impl fmt::Display for RoutingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "step {} ({}) -> {}: {}",
            self.step, self.event_kind, self.binding, self.reason
        )
    }
}

pub struct EventRouter<'a> {
    engine: &'a mut SceneEngine,
    scene: &'a mut dyn Scene,
    failures: Vec<RoutingFailure>,
    delivered: usize,
}

impl<'a> EventRouter<'a> {
    pub fn new(engine: &'a mut SceneEngine, scene: &'a mut dyn Scene) -> Self {
        Self {
            engine,
            scene,
            failures: Vec::new(),
            delivered: 0,
        }
    }

    /// Runs every binding for `event` and returns how many succeeded.
    pub fn dispatch(&mut self, event: &VizEvent) -> usize {
        let (routing, timing, widgets) = self.engine.dispatch_parts();
        let Some(bindings) = routing.bindings_for(&event.kind) else {
            tracing::debug!(step = event.step, kind = %event.kind, "no route for event");
            return 0;
        };

        let run_time = timing.run_time_for(&event.kind);
        let mut succeeded = 0;
        for binding in bindings {
            let outcome = match binding {
                Binding::Malformed { .. } => Err("binding is not `widget.method`".to_string()),
                Binding::Method { widget, method, .. } => match widgets.get_mut(widget) {
                    None => Err(format!("no widget named `{widget}`")),
                    Some(target) => {
                        let run_time = binding.duration_override().unwrap_or(run_time);
                        target
                            .update(method, &mut *self.scene, event, run_time)
                            .map_err(|err| err.to_string())
                    }
                },
            };

            match outcome {
                Ok(()) => succeeded += 1,
                Err(reason) => {
                    let failure = RoutingFailure {
                        step: event.step,
                        event_kind: event.kind.clone(),
                        binding: binding.label(),
                        reason,
                    };
                    tracing::warn!(%failure, "skipping binding");
                    self.failures.push(failure);
                }
            }
        }

        self.delivered += succeeded;
        tracing::debug!(step = event.step, kind = %event.kind, handlers = succeeded, "event routed");
        succeeded
    }

    /// Lazily routes `events`, yielding each one after its handlers ran.
    pub fn playback<I>(&mut self, events: I) -> Playback<'_, 'a, I::IntoIter>
    where
        I: IntoIterator<Item = VizEvent>,
    {
        Playback {
            router: self,
            events: events.into_iter(),
        }
    }

    pub fn failures(&self) -> &[RoutingFailure] {
        &self.failures
    }

    pub fn take_failures(&mut self) -> Vec<RoutingFailure> {
        std::mem::take(&mut self.failures)
    }

    /// Total successful handler invocations so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

impl fmt::Debug for EventRouter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("scene", &self.engine.name())
            .field("failures", &self.failures.len())
            .field("delivered", &self.delivered)
            .finish()
    }
}

/// Forward-only, single-pass playback. Dropping it stops routing.
pub struct Playback<'r, 'a, I> {
    router: &'r mut EventRouter<'a>,
    events: I,
}

impl<I> Iterator for Playback<'_, '_, I>
where
    I: Iterator<Item = VizEvent>,
{
    type Item = VizEvent;

    fn next(&mut self) -> Option<VizEvent> {
        let event = self.events.next()?;
        self.router.dispatch(&event);
        Some(event)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.events.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::{json, Map, Value};

    use super::*;
    use crate::{
        config::TimingConfig,
        events::index_steps,
        render::RecordingScene,
        scene::{SceneConfig, WidgetSpec},
        widgets::{Widget, WidgetFactory},
        Result, VizError,
    };

    type CallLog = Rc<RefCell<Vec<String>>>;

    /// Records `name.method@step` for every call; `explode` always fails.
    #[derive(Debug)]
    struct Probe {
        name: String,
        log: CallLog,
    }

    impl Widget for Probe {
        fn kind(&self) -> &str {
            "probe"
        }

        fn update(
            &mut self,
            method: &str,
            _scene: &mut dyn Scene,
            event: &VizEvent,
            _run_time: f64,
        ) -> Result<()> {
            if method == "explode" {
                return Err(VizError::widget("boom"));
            }
            self.log
                .borrow_mut()
                .push(format!("{}.{method}@{}", self.name, event.step));
            Ok(())
        }

        fn state(&self) -> Value {
            Value::Null
        }
    }

    fn probe_factory(log: &CallLog) -> WidgetFactory {
        let mut factory = WidgetFactory::new();
        let log = log.clone();
        factory
            .register("probe", move |name: &str, _: &Map<String, Value>| {
                Ok(Box::new(Probe {
                    name: name.to_string(),
                    log: log.clone(),
                }) as Box<dyn Widget>)
            })
            .unwrap();
        factory
    }

    fn engine(config: &SceneConfig, log: &CallLog) -> SceneEngine {
        SceneEngine::with_factory(config, TimingConfig::default(), &probe_factory(log)).unwrap()
    }

    fn two_probes() -> SceneConfig {
        SceneConfig::new("probe", "test")
            .with_widget("a", WidgetSpec::new("probe"))
            .with_widget("b", WidgetSpec::new("probe"))
    }

    #[test]
    fn unrouted_events_are_noops() {
        let log = CallLog::default();
        let mut engine = engine(&two_probes().with_binding("visit", "a.onVisit"), &log);
        let mut scene = RecordingScene::new();
        let mut router = EventRouter::new(&mut engine, &mut scene);

        assert_eq!(router.dispatch(&VizEvent::new("enqueue")), 0);
        assert!(router.failures().is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn missing_widget_skips_only_that_binding() {
        let log = CallLog::default();
        let config = two_probes()
            .with_binding("visit", "a.onVisit")
            .with_binding("visit", "ghost.onVisit")
            .with_binding("visit", "b.onVisit");
        let mut engine = engine(&config, &log);
        let mut scene = RecordingScene::new();
        let mut router = EventRouter::new(&mut engine, &mut scene);

        assert_eq!(router.dispatch(&VizEvent::new("visit")), 2);
        assert_eq!(*log.borrow(), vec!["a.onVisit@0", "b.onVisit@0"]);
        assert_eq!(router.failures().len(), 1);
        assert_eq!(router.failures()[0].binding, "ghost.onVisit");
    }

    #[test]
    fn failing_widget_does_not_stop_siblings_or_later_events() {
        let log = CallLog::default();
        let config = two_probes()
            .with_binding("visit", "a.explode")
            .with_binding("visit", "malformed")
            .with_binding("visit", "b.onVisit");
        let mut engine = engine(&config, &log);
        let mut scene = RecordingScene::new();
        let mut router = EventRouter::new(&mut engine, &mut scene);

        let events = index_steps(vec![VizEvent::new("visit"), VizEvent::new("visit")]);
        let yielded: Vec<usize> = router.playback(events).map(|e| e.step).collect();

        assert_eq!(yielded, vec![0, 1]);
        assert_eq!(*log.borrow(), vec!["b.onVisit@0", "b.onVisit@1"]);
        assert_eq!(router.failures().len(), 4);
        assert!(router.failures()[0].reason.contains("boom"));
        assert_eq!(router.delivered(), 2);
    }

    #[test]
    fn playback_is_lazy_and_stoppable() {
        let log = CallLog::default();
        let mut engine = engine(&two_probes().with_binding("visit", "a.onVisit"), &log);
        let mut scene = RecordingScene::new();
        let mut router = EventRouter::new(&mut engine, &mut scene);

        let endless = index_steps(std::iter::repeat_with(|| VizEvent::new("visit")));
        let mut playback = router.playback(endless);
        assert_eq!(playback.next().map(|e| e.step), Some(0));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(playback.next().map(|e| e.step), Some(1));
        drop(playback);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn stock_widgets_use_event_run_time_and_binding_override() {
        let config = SceneConfig::new("bfs", "bfs")
            .with_widget("grid", WidgetSpec::new("grid"))
            .with_widget("queue", WidgetSpec::new("queue"))
            .with_binding("enqueue", "grid.onEnqueue")
            .with_binding(
                "enqueue",
                crate::mapping::BindingSpec::Detailed {
                    target: "queue.onEnqueue".to_string(),
                    params: serde_json::from_value(json!({ "duration": 0.1 })).unwrap(),
                },
            );
        let mut engine = SceneEngine::new(&config, TimingConfig::default()).unwrap();
        let mut scene = RecordingScene::new();
        {
            let mut router = EventRouter::new(&mut engine, &mut scene);
            let event = VizEvent::new("enqueue").with_payload("node", json!([0, 0]));
            assert_eq!(router.dispatch(&event), 2);
        }

        let expected = TimingConfig::default().events + 0.1;
        assert!((scene.elapsed() - expected).abs() < 1e-9);
        assert_eq!(engine.widget("queue").unwrap().state()["items"], json!([[0, 0]]));
    }
}
