//! Viewport proximity observer.
//!
//! Resources register where they sit on the page; when the visible window,
//! widened by a preload margin, overlaps a resource's box, that resource is
//! reported as triggered.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Vertical extent of a resource on the page, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub top: f64,
    pub height: f64,
}

impl Placement {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    fn bottom(&self) -> f64 {
        self.top + self.height.max(0.0)
    }
}

/// The currently visible window, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub top: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }
}

#[derive(Debug, Default)]
pub struct ProximityObserver {
    margin_px: f64,
    placements: HashMap<String, Placement>,
}

impl ProximityObserver {
    pub fn new(margin_px: u32) -> Self {
        Self {
            margin_px: margin_px as f64,
            placements: HashMap::new(),
        }
    }

    pub fn register(&mut self, id: impl Into<String>, placement: Placement) {
        self.placements.insert(id.into(), placement);
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        self.placements.remove(id).is_some()
    }

    /// Ids of observed resources within the margin of `viewport`, top to bottom.
    pub fn observe(&self, viewport: Viewport) -> Vec<String> {
        let lower = viewport.top - self.margin_px;
        let upper = viewport.top + viewport.height.max(0.0) + self.margin_px;

        let mut hits: Vec<(&String, &Placement)> = self
            .placements
            .iter()
            .filter(|(_, p)| p.top <= upper && p.bottom() >= lower)
            .collect();
        hits.sort_by(|a, b| {
            a.1.top
                .partial_cmp(&b.1.top)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        hits.into_iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}
