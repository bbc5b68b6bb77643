use crate::{
    analysis::{FrequencyAnalyzer, FrequencySnapshot},
    graph::{MediaId, SourceNode},
};

/// Binds one connected source node to one analyzer instance.
///
/// A session is established when visualization starts for a track and torn
/// down only when a session for a different track replaces it. Repeated
/// starts on the same track reuse the wired graph untouched; it is never
/// rewired in place.
#[derive(Debug)]
pub struct PlaybackSession {
    node: SourceNode,
    analyzer: FrequencyAnalyzer,
    block: Vec<f32>,
}

impl PlaybackSession {
    pub fn establish(node: SourceNode, analyzer: FrequencyAnalyzer) -> Self {
        let block = vec![0.0; analyzer.config().fft_size];
        Self {
            node,
            analyzer,
            block,
        }
    }

    pub fn media_id(&self) -> MediaId {
        self.node.media_id()
    }

    pub fn bin_count(&self) -> usize {
        self.analyzer.bin_count()
    }

    /// Pulls the newest audio block from the source and analyzes it.
    ///
    /// Never fails: a suspended graph reads as silence and produces a
    /// snapshot that decays to all-zero.
    pub fn sample(&mut self) -> FrequencySnapshot {
        self.node.latest_block(&mut self.block);
        self.analyzer.sample(&self.block)
    }
}
