//! Menu tree node model.
//!
//! The tree serialises to the JSON shape the web UI consumes directly:
//!
//! ```json
//! {
//!   "name": "root",
//!   "type": "folder",
//!   "children": [
//!     { "name": "Pasta", "type": "timer", "mode": "fixed", "fixed": 480 }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// How a timer node obtains its duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// The node carries its own duration in `fixed`.
    Fixed,
    /// The duration is supplied by the client at start time.
    Variable,
}

/// Node kind selector for creation requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Timer,
}

/// One node of the menu tree. Folders hold children; timers are leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MenuNode {
    Folder {
        name: String,
        #[serde(default)]
        children: Vec<MenuNode>,
    },
    Timer {
        name: String,
        mode: TimerMode,
        /// Duration in seconds; present only for fixed-mode timers.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fixed: Option<u32>,
    },
}

impl MenuNode {
    pub fn folder(name: impl Into<String>) -> Self {
        Self::Folder {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn fixed_timer(name: impl Into<String>, seconds: u32) -> Self {
        Self::Timer {
            name: name.into(),
            mode: TimerMode::Fixed,
            fixed: Some(seconds),
        }
    }

    pub fn variable_timer(name: impl Into<String>) -> Self {
        Self::Timer {
            name: name.into(),
            mode: TimerMode::Variable,
            fixed: None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Folder { name, .. } | Self::Timer { name, .. } => name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder { .. })
    }

    /// Folder children, or `None` for a timer leaf.
    pub fn children(&self) -> Option<&[MenuNode]> {
        match self {
            Self::Folder { children, .. } => Some(children),
            Self::Timer { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<MenuNode>> {
        match self {
            Self::Folder { children, .. } => Some(children),
            Self::Timer { .. } => None,
        }
    }

    /// Direct child with the given name (exact match), if any.
    pub fn find_child(&self, name: &str) -> Option<&MenuNode> {
        self.children()?.iter().find(|c| c.name() == name)
    }

    /// Walk a slash-delimited path from this node. `"/"` (or any path with
    /// only empty segments) resolves to this node itself.
    pub fn resolve(&self, path: &str) -> Option<&MenuNode> {
        let mut node = self;
        for segment in segments(path) {
            node = node.find_child(segment)?;
        }
        Some(node)
    }

    /// Mutable variant of [`resolve`](Self::resolve).
    pub fn resolve_mut(&mut self, path: &str) -> Option<&mut MenuNode> {
        let mut node = self;
        for segment in segments(path) {
            node = node
                .children_mut()?
                .iter_mut()
                .find(|c| c.name() == segment)?;
        }
        Some(node)
    }
}

/// Non-empty segments of a slash-delimited path. Consecutive, leading and
/// trailing slashes are tolerated.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
