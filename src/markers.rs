use std::collections::BTreeSet;
use std::fs;
use std::iter;
use std::path::Path;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Frames where an experiment section starts. Always sorted, never duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoMarkers(BTreeSet<usize>);

/// Half-open frame range `[start, end)` between two markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub start: usize,
    pub end: usize,
}

impl Section {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl VideoMarkers {
    pub fn new(frames: impl IntoIterator<Item = usize>) -> Self {
        VideoMarkers(frames.into_iter().collect())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("malformed video markers: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| e.in_file(path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Marks `frame`, or unmarks it if it was marked. Returns whether it is marked now.
    pub fn toggle(&mut self, frame: usize) -> bool {
        if self.contains(frame) {
            self.0.remove(&frame);
            false
        } else {
            self.0.insert(frame);
            true
        }
    }

    pub fn contains(&self, frame: usize) -> bool {
        self.0.contains(&frame)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Start of the section containing `frame`: the last marker at or before it,
    /// falling back to the first marker for frames ahead of every marker.
    pub fn section_start(&self, frame: usize) -> Option<usize> {
        self.0
            .range(..=frame)
            .next_back()
            .or_else(|| self.0.iter().next())
            .copied()
    }

    /// Sections between consecutive markers, the last one running to `frame_count`.
    /// Ends are capped at `frame_count`.
    pub fn sections(&self, frame_count: usize) -> Vec<Section> {
        self.iter()
            .chain(iter::once(frame_count))
            .tuple_windows()
            .map(|(start, end)| Section {
                start,
                end: end.min(frame_count),
            })
            .collect()
    }
}
