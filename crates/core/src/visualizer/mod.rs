use crate::{
    analysis::FrequencyAnalyzer,
    config::AppConfig,
    graph::{AudioGraph, MediaHandle, MediaId, SourceAdapter},
    render::RenderSurface,
    scheduler::{FrameRequestId, FrameTiming, RenderScheduler},
    session::PlaybackSession,
    Result, SoundDeckError,
};

/// The engine's inbound surface: wires playback sessions and drives the
/// render loop.
///
/// The embedding dashboard calls [`Visualizer::start_visualization`] whenever
/// a track begins playing and [`Visualizer::stop_visualization`] when the
/// player page goes away; both are safe to call repeatedly. The render host
/// owns the frame cadence and forwards each fired request to
/// [`Visualizer::on_frame`].
#[derive(Debug)]
pub struct Visualizer {
    config: AppConfig,
    graph: AudioGraph,
    adapter: SourceAdapter,
    session: Option<PlaybackSession>,
    scheduler: RenderScheduler,
    surface: Option<RenderSurface>,
}

impl Visualizer {
    pub fn new(config: AppConfig, timing: Box<dyn FrameTiming>) -> Result<Self> {
        config.validate()?;
        let graph = AudioGraph::new();
        let adapter = SourceAdapter::new(graph.clone());
        let scheduler = RenderScheduler::new(timing, config.render.clone());
        Ok(Self {
            config,
            graph,
            adapter,
            session: None,
            scheduler,
            surface: None,
        })
    }

    /// Accepts the fixed-size drawing surface from the render host. Must
    /// happen before the first start; the engine does not resize it.
    pub fn attach_surface(&mut self, surface: RenderSurface) {
        tracing::debug!(
            width = surface.width(),
            height = surface.height(),
            "render surface attached"
        );
        self.surface = Some(surface);
    }

    pub fn surface(&self) -> Option<&RenderSurface> {
        self.surface.as_ref()
    }

    /// Forwards a user gesture to the audio graph. Until this happens the
    /// analyzer reads silence, which renders as a flat baseline rather than
    /// an error.
    pub fn resume_audio(&self) {
        self.graph.resume();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Track the current playback session is bound to, if any.
    pub fn current_media(&self) -> Option<MediaId> {
        self.session.as_ref().map(PlaybackSession::media_id)
    }

    /// Attaches (or reuses) the audio session for `handle` and starts the
    /// render loop.
    ///
    /// Starting again with the same track reuses the wired session; a
    /// different track replaces it. Errors only when no surface has been
    /// attached yet.
    pub fn start_visualization(&mut self, handle: &MediaHandle) -> Result<()> {
        if self.surface.is_none() {
            return Err(SoundDeckError::SurfaceMissing);
        }

        let node = self.adapter.attach(handle);
        if self.current_media() != Some(handle.id()) {
            let analyzer = FrequencyAnalyzer::new(self.config.analyzer.clone())?;
            self.session = Some(PlaybackSession::establish(node, analyzer));
            tracing::info!(media = %handle.id(), "playback session established");
        }

        self.scheduler.start();
        Ok(())
    }

    /// Halts the render loop. Idempotent; a no-op without a prior start.
    pub fn stop_visualization(&mut self) {
        self.scheduler.stop();
    }

    /// Runs one animation frame for a fired request id.
    pub fn on_frame(&mut self, id: FrameRequestId) {
        if let (Some(session), Some(surface)) = (self.session.as_mut(), self.surface.as_mut()) {
            self.scheduler.on_frame(id, session, surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualFrameTiming;

    fn visualizer_with_surface(timing: &ManualFrameTiming) -> Visualizer {
        let mut config = AppConfig::default();
        config.analyzer.fft_size = 32;
        let mut visualizer = Visualizer::new(config, Box::new(timing.clone())).unwrap();
        visualizer.attach_surface(RenderSurface::new(200, 100).unwrap());
        visualizer
    }

    #[test]
    fn starting_without_a_surface_is_fatal() {
        let timing = ManualFrameTiming::default();
        let mut visualizer = Visualizer::new(AppConfig::default(), Box::new(timing)).unwrap();

        let err = visualizer
            .start_visualization(&MediaHandle::new(MediaId(1)))
            .unwrap_err();
        assert!(matches!(err, SoundDeckError::SurfaceMissing));
        assert!(!visualizer.is_running());
    }

    #[test]
    fn repeated_starts_keep_one_loop_and_one_session() {
        let timing = ManualFrameTiming::default();
        let mut visualizer = visualizer_with_surface(&timing);
        let handle = MediaHandle::new(MediaId(5));

        visualizer.start_visualization(&handle).unwrap();
        visualizer.start_visualization(&handle).unwrap();

        assert!(visualizer.is_running());
        assert_eq!(visualizer.current_media(), Some(MediaId(5)));
        assert_eq!(timing.pending_count(), 1);
    }

    #[test]
    fn switching_tracks_replaces_the_session() {
        let timing = ManualFrameTiming::default();
        let mut visualizer = visualizer_with_surface(&timing);

        visualizer
            .start_visualization(&MediaHandle::new(MediaId(1)))
            .unwrap();
        visualizer
            .start_visualization(&MediaHandle::new(MediaId(2)))
            .unwrap();

        assert_eq!(visualizer.current_media(), Some(MediaId(2)));
        assert_eq!(timing.pending_count(), 1);
    }

    #[test]
    fn stop_without_start_is_a_noop() {
        let timing = ManualFrameTiming::default();
        let mut visualizer = visualizer_with_surface(&timing);
        visualizer.stop_visualization();
        assert!(!visualizer.is_running());
    }

    #[test]
    fn frames_render_through_the_whole_pipeline() {
        let timing = ManualFrameTiming::default();
        let mut visualizer = visualizer_with_surface(&timing);
        let handle = MediaHandle::new(MediaId(9));
        handle.push_samples(&[0.8; 64]).unwrap();

        visualizer.resume_audio();
        visualizer.start_visualization(&handle).unwrap();

        let id = timing.next_due().unwrap();
        visualizer.on_frame(id);

        // Clear + 16 bars + ring + pulse.
        let surface = visualizer.surface().unwrap();
        assert_eq!(surface.commands().len(), 19);
        assert_eq!(timing.pending_count(), 1);
    }

    #[test]
    fn no_frames_render_after_stop() {
        let timing = ManualFrameTiming::default();
        let mut visualizer = visualizer_with_surface(&timing);
        visualizer
            .start_visualization(&MediaHandle::new(MediaId(1)))
            .unwrap();

        let id = timing.next_due().unwrap();
        visualizer.stop_visualization();
        assert_eq!(timing.pending_count(), 0);

        visualizer.on_frame(id);
        assert!(visualizer.surface().unwrap().commands().is_empty());
    }
}
