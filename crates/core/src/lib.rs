//! Core library for narrated algorithm visualisations.
//!
//! A declarative scene description is compiled into live widgets and a
//! routing table ([`SceneEngine`]). A [`Director`] then walks a
//! [`Storyboard`] beat by beat, looking each action up in an
//! [`ActionRegistry`] and timing it with a [`TimingResolver`]. The
//! `play_events` action pulls an algorithm's event stream, step-indexes it and
//! hands it to the [`EventRouter`], which calls the bound widget methods and
//! contains any widget failure.

pub mod actions;
pub mod config;
pub mod director;
pub mod error;
pub mod events;
pub mod mapping;
pub mod record;
pub mod registry;
pub mod render;
pub mod router;
pub mod scene;
pub mod storyboard;
pub mod timeline;
pub mod timing;
pub mod widgets;

pub use actions::{ActionContext, BuiltinAction, FnAction};
pub use config::{AppConfig, TimingConfig};
pub use director::{Director, DirectorState};
pub use error::{RegistryError, Result, VizError};
pub use events::{
    index_steps, AlgorithmAdapter, EventStream, ScriptedAdapter, StepIndexed, VizEvent,
};
pub use mapping::{Binding, BindingSpec, RoutingMap};
pub use record::{TimingRecord, TimingSink, TimingTracker};
pub use registry::{Action, ActionRegistry};
pub use render::{Animation, RecordingScene, Scene, SceneOp};
pub use router::{EventRouter, Playback, RoutingFailure};
pub use scene::{SceneConfig, SceneEngine, WidgetSpec};
pub use storyboard::{Act, Args, Beat, Shot, Storyboard};
pub use timeline::PlaybackClock;
pub use timing::{Bucket, TimingResolver};
pub use widgets::{
    CellState, CounterWidget, GridWidget, QueueWidget, StackWidget, Widget, WidgetFactory,
};
