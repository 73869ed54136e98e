//! Resource descriptors shared by the optimizer, scheduler and warmer.

use std::fmt;

use serde::{Deserialize, Serialize};

// == Resource Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    Script,
    Style,
    Font,
    #[default]
    Data,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Image => "image",
            ResourceKind::Script => "script",
            ResourceKind::Style => "style",
            ResourceKind::Font => "font",
            ResourceKind::Data => "data",
        };
        f.write_str(name)
    }
}

// == Resource ==
/// A loadable resource. `id` doubles as its cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: ResourceKind,
    /// Relative importance in `[0, 1]`; prefetches carry the prediction probability
    #[serde(default = "default_priority")]
    pub priority: f64,
}

fn default_priority() -> f64 {
    0.5
}

impl Resource {
    pub fn new(id: impl Into<String>, url: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            kind,
            priority: default_priority(),
        }
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }
}
