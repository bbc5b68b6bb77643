use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::{Result, SoundDeckError};

/// Room for a few of the largest transform windows the analyzer supports.
const DEFAULT_RING_CAPACITY: usize = 8_192;

/// Identifier of a playable track within the dashboard library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(pub u64);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle over one playable track.
///
/// The player layer decodes audio however it likes and pushes PCM samples in
/// through the handle; the analysis graph reads the newest window back out.
/// Handles are cheap to clone and share the same underlying buffer.
#[derive(Debug, Clone)]
pub struct MediaHandle {
    id: MediaId,
    samples: Arc<Mutex<SampleRing>>,
}

impl MediaHandle {
    pub fn new(id: MediaId) -> Self {
        Self::with_capacity(id, DEFAULT_RING_CAPACITY)
    }

    pub fn with_capacity(id: MediaId, capacity: usize) -> Self {
        Self {
            id,
            samples: Arc::new(Mutex::new(SampleRing::with_capacity(capacity.max(1)))),
        }
    }

    pub fn id(&self) -> MediaId {
        self.id
    }

    /// Appends freshly decoded samples, overwriting the oldest once the
    /// buffer is full.
    pub fn push_samples(&self, samples: &[f32]) -> Result<()> {
        let mut ring = self.lock_ring()?;
        ring.push(samples);
        Ok(())
    }

    fn lock_ring(&self) -> Result<MutexGuard<'_, SampleRing>> {
        self.samples
            .lock()
            .map_err(|_| SoundDeckError::msg("media sample buffer has been poisoned"))
    }
}

/// Most-recent-samples ring shared between the player and the analysis graph.
#[derive(Debug)]
struct SampleRing {
    buf: Vec<f32>,
    head: usize,
    len: usize,
}

impl SampleRing {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0.0; capacity],
            head: 0,
            len: 0,
        }
    }

    fn push(&mut self, samples: &[f32]) {
        for &sample in samples {
            self.buf[self.head] = sample;
            self.head = (self.head + 1) % self.buf.len();
        }
        self.len = (self.len + samples.len()).min(self.buf.len());
    }

    /// Copies the newest `out.len()` samples in arrival order, zero-filling
    /// the front while the ring is still under-filled.
    fn copy_latest(&self, out: &mut [f32]) {
        let take = out.len().min(self.len);
        let lead = out.len() - take;
        out[..lead].fill(0.0);
        for (i, slot) in out[lead..].iter_mut().enumerate() {
            let idx = (self.head + self.buf.len() - take + i) % self.buf.len();
            *slot = self.buf[idx];
        }
    }
}

/// Run state of the process-wide analysis graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    /// Host audio stacks refuse to run before a user gesture; sources read
    /// as silence in this state.
    Suspended,
    Running,
}

/// Process-wide audio analysis graph. Starts suspended; [`AudioGraph::resume`]
/// is forwarded from a user interaction by the embedding layer.
#[derive(Debug, Clone)]
pub struct AudioGraph {
    state: Arc<Mutex<GraphState>>,
}

impl Default for AudioGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioGraph {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GraphState::Suspended)),
        }
    }

    pub fn resume(&self) {
        let mut state = self.lock_state();
        if *state == GraphState::Suspended {
            tracing::debug!("audio graph resumed");
        }
        *state = GraphState::Running;
    }

    pub fn state(&self) -> GraphState {
        *self.lock_state()
    }

    pub fn is_running(&self) -> bool {
        self.state() == GraphState::Running
    }

    fn lock_state(&self) -> MutexGuard<'_, GraphState> {
        // The state is a plain flag; a poisoned lock still holds a usable value.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Analysis-graph node wired to one media handle.
#[derive(Debug, Clone)]
pub struct SourceNode {
    id: MediaId,
    samples: Arc<Mutex<SampleRing>>,
    graph: AudioGraph,
}

impl SourceNode {
    fn connect(handle: &MediaHandle, graph: AudioGraph) -> Self {
        Self {
            id: handle.id,
            samples: Arc::clone(&handle.samples),
            graph,
        }
    }

    pub fn media_id(&self) -> MediaId {
        self.id
    }

    /// Copies the newest `out.len()` samples into `out` without blocking.
    ///
    /// Reads silence while the graph is suspended or the buffer is
    /// unavailable; analysis input degrades to silence, it never errors.
    pub fn latest_block(&self, out: &mut [f32]) {
        if !self.graph.is_running() {
            out.fill(0.0);
            return;
        }
        match self.samples.lock() {
            Ok(ring) => ring.copy_latest(out),
            Err(_) => out.fill(0.0),
        }
    }
}

/// Wires media handles into the analysis graph.
///
/// Attachment is idempotent per handle: asking for the same track again
/// reuses the existing node instead of wiring a duplicate. A different track
/// tears the old node down and connects exactly one new one.
#[derive(Debug)]
pub struct SourceAdapter {
    graph: AudioGraph,
    wired: Option<SourceNode>,
    connections: u64,
}

impl SourceAdapter {
    pub fn new(graph: AudioGraph) -> Self {
        Self {
            graph,
            wired: None,
            connections: 0,
        }
    }

    pub fn attach(&mut self, handle: &MediaHandle) -> SourceNode {
        if let Some(node) = &self.wired {
            if node.media_id() == handle.id() {
                return node.clone();
            }
        }
        if let Some(old) = self.wired.take() {
            tracing::debug!(media = %old.media_id(), "disconnecting previous source");
        }
        let node = SourceNode::connect(handle, self.graph.clone());
        self.connections += 1;
        tracing::debug!(media = %handle.id(), "source connected to analysis graph");
        self.wired = Some(node.clone());
        node
    }

    pub fn wired_id(&self) -> Option<MediaId> {
        self.wired.as_ref().map(SourceNode::media_id)
    }

    /// Total number of nodes ever wired; attachment idempotence keeps this at
    /// one per distinct track.
    pub fn connection_count(&self) -> u64 {
        self.connections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_graph() -> AudioGraph {
        let graph = AudioGraph::new();
        graph.resume();
        graph
    }

    #[test]
    fn suspended_graph_reads_silence() {
        let graph = AudioGraph::new();
        let handle = MediaHandle::new(MediaId(1));
        handle.push_samples(&[1.0; 64]).unwrap();

        let mut adapter = SourceAdapter::new(graph);
        let node = adapter.attach(&handle);

        let mut block = [0.5_f32; 32];
        node.latest_block(&mut block);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn reads_newest_samples_after_resume() {
        let handle = MediaHandle::with_capacity(MediaId(1), 8);
        handle.push_samples(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        handle.push_samples(&[6.0, 7.0]).unwrap();

        let mut adapter = SourceAdapter::new(running_graph());
        let node = adapter.attach(&handle);

        let mut block = [0.0_f32; 4];
        node.latest_block(&mut block);
        assert_eq!(block, [4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn under_filled_ring_zero_pads_the_front() {
        let handle = MediaHandle::new(MediaId(1));
        handle.push_samples(&[1.0, 2.0]).unwrap();

        let mut adapter = SourceAdapter::new(running_graph());
        let node = adapter.attach(&handle);

        let mut block = [9.0_f32; 4];
        node.latest_block(&mut block);
        assert_eq!(block, [0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn ring_overwrites_oldest_when_full() {
        let handle = MediaHandle::with_capacity(MediaId(1), 4);
        handle.push_samples(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

        let mut adapter = SourceAdapter::new(running_graph());
        let node = adapter.attach(&handle);

        let mut block = [0.0_f32; 4];
        node.latest_block(&mut block);
        assert_eq!(block, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn attaching_the_same_handle_wires_one_node() {
        let handle = MediaHandle::new(MediaId(7));
        let mut adapter = SourceAdapter::new(running_graph());

        adapter.attach(&handle);
        adapter.attach(&handle);

        assert_eq!(adapter.connection_count(), 1);
        assert_eq!(adapter.wired_id(), Some(MediaId(7)));
    }

    #[test]
    fn attaching_a_new_handle_replaces_the_node() {
        let mut adapter = SourceAdapter::new(running_graph());
        adapter.attach(&MediaHandle::new(MediaId(1)));
        adapter.attach(&MediaHandle::new(MediaId(2)));

        assert_eq!(adapter.connection_count(), 2);
        assert_eq!(adapter.wired_id(), Some(MediaId(2)));
    }
}
