//! Persistent menu store.
//!
//! Owns the in-memory tree and keeps it in lock-step with the copy in
//! storage. Mutations follow a strict discipline: clone the tree, mutate
//! the clone, serialise, persist, and only then swap the clone in. A failed
//! write therefore never leaves the in-memory tree ahead of storage.

use log::{error, info, warn};

use crate::app::ports::StoragePort;
use crate::config::SystemConfig;
use crate::error::{MenuError, StorageError};

use super::node::{MenuNode, NodeKind, TimerMode};

/// Storage key for the serialised menu tree.
pub const MENU_KEY: &str = "menu";

/// Upper bound for the serialised tree (NVS blobs are small).
const MAX_MENU_BLOB: usize = 4096;

/// The menu tree plus a monotonic version counter, bumped on every
/// successful mutation. The web UI polls the version to detect changes.
pub struct MenuStore {
    root: MenuNode,
    version: u64,
    default_fixed_secs: u32,
}

impl MenuStore {
    /// Load the tree from storage. An absent, truncated or unparseable blob
    /// is replaced by the default template, which is persisted back so the
    /// next boot starts clean.
    pub fn load(storage: &mut impl StoragePort, config: &SystemConfig) -> Self {
        let mut buf = vec![0u8; MAX_MENU_BLOB];
        let root = match storage.read(MENU_KEY, &mut buf) {
            Ok(len) => match Self::parse_blob(&buf[..len]) {
                Ok(root) => {
                    info!("menu tree loaded ({len} bytes)");
                    Some(root)
                }
                Err(e) => {
                    warn!("stored menu rejected ({e}), restoring default");
                    None
                }
            },
            Err(StorageError::NotFound) => {
                info!("no stored menu, installing default template");
                None
            }
            Err(e) => {
                warn!("menu read failed ({e}), using default template");
                None
            }
        };

        let (root, needs_persist) = match root {
            Some(root) => (root, false),
            None => (Self::default_template(), true),
        };

        if needs_persist {
            if let Err(e) = Self::persist(storage, &root) {
                error!("failed to persist default menu template: {e}");
            }
        }

        Self {
            root,
            version: 0,
            default_fixed_secs: config.default_fixed_secs,
        }
    }

    /// Deserialise a stored blob. Anything shorter than the smallest valid
    /// tree counts as corrupt, same as a serde failure.
    fn parse_blob(bytes: &[u8]) -> Result<MenuNode, MenuError> {
        if bytes.len() <= 5 {
            warn!("stored menu truncated ({} bytes)", bytes.len());
            return Err(MenuError::Parse);
        }
        serde_json::from_slice(bytes).map_err(|e| {
            warn!("stored menu unparseable: {e}");
            MenuError::Parse
        })
    }

    /// The tree shipped on first boot (and restored after corruption).
    fn default_template() -> MenuNode {
        MenuNode::Folder {
            name: "root".into(),
            children: vec![MenuNode::Folder {
                name: "Sample Folder".into(),
                children: vec![
                    MenuNode::fixed_timer("Fixed 150s", 150),
                    MenuNode::variable_timer("Variable Timer"),
                ],
            }],
        }
    }

    pub fn root(&self) -> &MenuNode {
        &self.root
    }

    /// Monotonic mutation counter. Starts at 0 on load.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The whole tree as the JSON the web UI consumes.
    pub fn snapshot_json(&self) -> String {
        // Serialising an owned in-memory tree cannot fail.
        serde_json::to_string(&self.root).unwrap_or_default()
    }

    /// Resolve a slash-delimited path to a node.
    pub fn resolve(&self, path: &str) -> Result<&MenuNode, MenuError> {
        self.root.resolve(path).ok_or(MenuError::NotFound)
    }

    /// Add a child under the folder at `parent_path`.
    ///
    /// Fixed-mode timers created without a duration get the configured
    /// fallback. The tree is persisted before the in-memory copy changes.
    pub fn add_child(
        &mut self,
        storage: &mut impl StoragePort,
        parent_path: &str,
        name: &str,
        kind: NodeKind,
        mode: TimerMode,
        fixed: Option<u32>,
    ) -> Result<(), MenuError> {
        if name.trim().is_empty() {
            return Err(MenuError::InvalidArgument("name must not be empty"));
        }
        if name.contains('/') {
            return Err(MenuError::InvalidArgument("name must not contain '/'"));
        }

        let node = match kind {
            NodeKind::Folder => MenuNode::folder(name),
            NodeKind::Timer => match mode {
                TimerMode::Fixed => {
                    if fixed == Some(0) {
                        return Err(MenuError::InvalidArgument(
                            "fixed seconds must be positive",
                        ));
                    }
                    MenuNode::fixed_timer(name, fixed.unwrap_or(self.default_fixed_secs))
                }
                TimerMode::Variable => MenuNode::variable_timer(name),
            },
        };

        let mut working = self.root.clone();
        {
            // A timer leaf cannot parent anything; treat it like an
            // unresolvable folder path.
            let children = working
                .resolve_mut(parent_path)
                .and_then(MenuNode::children_mut)
                .ok_or(MenuError::NotFound)?;
            if children.iter().any(|c| c.name() == name) {
                return Err(MenuError::AlreadyExists);
            }
            children.push(node);
        }

        self.commit(storage, working)
    }

    /// Delete the direct child `name` of the folder at `parent_path`.
    pub fn delete_child(
        &mut self,
        storage: &mut impl StoragePort,
        parent_path: &str,
        name: &str,
    ) -> Result<(), MenuError> {
        let mut working = self.root.clone();
        {
            let children = working
                .resolve_mut(parent_path)
                .and_then(MenuNode::children_mut)
                .ok_or(MenuError::NotFound)?;
            let pos = children
                .iter()
                .position(|c| c.name() == name)
                .ok_or(MenuError::NotFound)?;
            children.remove(pos);
        }

        self.commit(storage, working)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    /// Persist `working`, then swap it in and bump the version.
    fn commit(
        &mut self,
        storage: &mut impl StoragePort,
        working: MenuNode,
    ) -> Result<(), MenuError> {
        Self::persist(storage, &working)?;
        self.root = working;
        self.version += 1;
        Ok(())
    }

    fn persist(storage: &mut impl StoragePort, root: &MenuNode) -> Result<(), MenuError> {
        let bytes = serde_json::to_vec(root).map_err(|_| MenuError::Persistence)?;
        if bytes.len() > MAX_MENU_BLOB {
            error!("menu tree too large to persist ({} bytes)", bytes.len());
            return Err(MenuError::Persistence);
        }
        storage.write(MENU_KEY, &bytes).map_err(|e| {
            error!("menu write failed: {e}");
            MenuError::Persistence
        })
    }
}
