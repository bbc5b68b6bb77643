//! Core visualizer engine for the SoundDeck music dashboard.
//!
//! The engine turns a playing track into animated 2D drawing commands: a
//! [`graph::SourceAdapter`] wires the track's samples into the analysis
//! graph, a [`FrequencyAnalyzer`] condenses each transform window into a
//! byte-magnitude [`FrequencySnapshot`], and the [`RenderScheduler`] pulls
//! one snapshot per display refresh and hands it to the bar and circular
//! renderers. The embedding dashboard supplies the collaborators the engine
//! deliberately does not own: the decoded audio stream (via
//! [`MediaHandle`]), the fixed-size [`RenderSurface`], and the frame-timing
//! primitive (via [`scheduler::FrameTiming`]).

pub mod analysis;
pub mod bars;
pub mod config;
pub mod error;
pub mod graph;
pub mod radial;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod visualizer;

pub use analysis::{FrequencyAnalyzer, FrequencySnapshot};
pub use config::{AnalyzerConfig, AppConfig, RenderConfig};
pub use error::{Result, SoundDeckError};
pub use graph::{AudioGraph, GraphState, MediaHandle, MediaId, SourceAdapter, SourceNode};
pub use render::{Color, DrawCommand, GradientStop, Paint, Point, RenderSurface};
pub use scheduler::{
    FrameRequestId, FrameTiming, ManualFrameTiming, RenderScheduler, SchedulerState,
};
pub use session::PlaybackSession;
pub use visualizer::Visualizer;
