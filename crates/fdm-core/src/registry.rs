//! The Property Registry: a hierarchical, path-addressed store of named
//! scalar state variables.
//!
//! Nodes live in a flat arena (`Vec<NodeSlot>`) indexed by [`NodeId`], the
//! same shape as an interner, but edges carry a path segment instead of
//! deduplicating a string. A node is *tied* when its value is produced on
//! read by a supplier callback instead of being stored; tied nodes reject
//! writes unconditionally.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;

bitflags::bitflags! {
    /// Attribute flags carried by every [`NodeSlot`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyAttrs: u8 {
        /// The node may be read. Set on every node created by the registry.
        const READ = 1 << 0;
        /// The node accepts `write` calls when it is not tied.
        const WRITE = 1 << 1;
        /// The node is tied: its value comes from a supplier, not storage.
        const TIED = 1 << 2;
    }
}

/// Handle to a node in the registry's arena. Cheap to copy, stable for the
/// registry's lifetime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Failure kinds raised by registry operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// `tie` was called on a node that already has a supplier attached.
    #[error("property already tied: {path}")]
    AlreadyTied { path: String },

    /// `write` was attempted on a tied node or one without the WRITE attribute.
    #[error("property not writable: {path}")]
    NotWritable { path: String },

    /// A `PropertyRef` failed to resolve its path against the registry.
    #[error("unresolved property: {path}")]
    UnresolvedProperty { path: String },
}

enum Storage {
    Stored(f64),
    Tied(Box<dyn Fn() -> f64>),
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Stored(v) => f.debug_tuple("Stored").field(v).finish(),
            Storage::Tied(_) => f.write_str("Tied(..)"),
        }
    }
}

#[derive(Debug)]
struct NodeSlot {
    path: String,
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    storage: Storage,
    attrs: PropertyAttrs,
}

/// Hierarchical, path-addressed store of named scalar state.
///
/// `getOrCreateNode` is idempotent: requesting the same path twice returns
/// the same [`NodeId`], creating any missing ancestors along the way.
#[derive(Debug)]
pub struct PropertyRegistry {
    nodes: RefCell<Vec<NodeSlot>>,
    by_path: RefCell<HashMap<String, NodeId>>,
    root: NodeId,
    /// Monotonically increasing frame counter backing expression memoisation
    /// (see the "Cached evaluation" design note): advancing it is how the
    /// surrounding simulation framework clears the per-frame cache.
    frame: Cell<u64>,
}

impl Default for PropertyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyRegistry {
    /// Create a registry containing only the root node (empty path).
    pub fn new() -> Self {
        let root_slot = NodeSlot {
            path: String::new(),
            name: String::new(),
            parent: None,
            children: Vec::new(),
            storage: Storage::Stored(0.0),
            attrs: PropertyAttrs::READ | PropertyAttrs::WRITE,
        };
        let nodes = RefCell::new(vec![root_slot]);
        let mut by_path = HashMap::new();
        by_path.insert(String::new(), NodeId::from_index(0));
        Self {
            nodes,
            by_path: RefCell::new(by_path),
            root: NodeId::from_index(0),
            frame: Cell::new(0),
        }
    }

    /// Handle to the registry root (the empty path).
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Current frame number. Expression memoisation slots compare against
    /// this to decide whether a cached value is still valid.
    pub fn current_frame(&self) -> u64 {
        self.frame.get()
    }

    /// Advance the frame counter, invalidating every expression's cached
    /// value. Call once per physics tick before the first evaluation that
    /// should see fresh property values.
    pub fn begin_frame(&self) -> u64 {
        let next = self.frame.get().wrapping_add(1);
        self.frame.set(next);
        next
    }

    /// Normalize a path by stripping a leading `-` sign marker (meaningful
    /// to [`PropertyRef`], not to the registry) and expanding any `#`
    /// placeholder with `prefix`.
    pub fn normalize_path(path: &str, prefix: Option<&str>) -> (String, f64) {
        let (sign, rest) = match path.strip_prefix('-') {
            Some(rest) => (-1.0, rest),
            None => (1.0, path),
        };
        let expanded = match prefix {
            Some(p) if rest.contains('#') => rest.replace('#', p),
            _ => rest.to_owned(),
        };
        (expanded, sign)
    }

    /// Look up a node by path, returning `None` if any segment is missing.
    pub fn lookup_node(&self, path: &str) -> Option<NodeId> {
        self.by_path.borrow().get(path).copied()
    }

    /// Whether a node exists at `path`.
    pub fn has_node(&self, path: &str) -> bool {
        self.lookup_node(path).is_some()
    }

    /// Return the leaf node for `path`, creating any missing ancestors.
    /// Idempotent: a second call with the same path returns the same id.
    pub fn get_or_create_node(&self, path: &str) -> NodeId {
        if let Some(id) = self.lookup_node(path) {
            return id;
        }

        let mut current = self.root;
        let mut current_path = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current_path.is_empty() {
                current_path.push('/');
            }
            current_path.push_str(segment);

            if let Some(id) = self.lookup_node(&current_path) {
                current = id;
                continue;
            }

            let id = NodeId::from_index(self.nodes.borrow().len());
            self.nodes.borrow_mut().push(NodeSlot {
                path: current_path.clone(),
                name: segment.to_owned(),
                parent: Some(current),
                children: Vec::new(),
                storage: Storage::Stored(0.0),
                attrs: PropertyAttrs::READ | PropertyAttrs::WRITE,
            });
            self.nodes.borrow_mut()[current.index()].children.push(id);
            self.by_path.borrow_mut().insert(current_path.clone(), id);

            tracing::debug!(path = %current_path, "created property node");
            current = id;
        }
        current
    }

    /// Attach a read-side supplier to a node, creating it if necessary.
    /// Fails if the node is already tied.
    pub fn tie(
        &self,
        path: &str,
        supplier: impl Fn() -> f64 + 'static,
    ) -> Result<NodeId, RegistryError> {
        let id = self.get_or_create_node(path);
        let mut nodes = self.nodes.borrow_mut();
        let slot = &mut nodes[id.index()];
        if slot.attrs.contains(PropertyAttrs::TIED) {
            return Err(RegistryError::AlreadyTied {
                path: path.to_owned(),
            });
        }
        slot.storage = Storage::Tied(Box::new(supplier));
        slot.attrs.insert(PropertyAttrs::TIED);
        tracing::debug!(path, "tied property node");
        Ok(id)
    }

    /// Restore a tied node to a stored-value node, preserving its last
    /// observed value.
    pub fn untie(&self, path: &str) -> Result<(), RegistryError> {
        let id = self
            .lookup_node(path)
            .ok_or_else(|| RegistryError::UnresolvedProperty {
                path: path.to_owned(),
            })?;
        let last_value = self.read(id);
        let mut nodes = self.nodes.borrow_mut();
        let slot = &mut nodes[id.index()];
        slot.storage = Storage::Stored(last_value);
        slot.attrs.remove(PropertyAttrs::TIED);
        Ok(())
    }

    /// Current value of `node`: the supplier's output when tied, else the
    /// stored value.
    pub fn read(&self, node: NodeId) -> f64 {
        let nodes = self.nodes.borrow();
        match &nodes[node.index()].storage {
            Storage::Stored(v) => *v,
            Storage::Tied(supplier) => supplier(),
        }
    }

    /// Write `value` into `node`. Fails when the node is tied or lacks the
    /// WRITE attribute.
    pub fn write(&self, node: NodeId, value: f64) -> Result<(), RegistryError> {
        let mut nodes = self.nodes.borrow_mut();
        let slot = &mut nodes[node.index()];
        if slot.attrs.contains(PropertyAttrs::TIED) || !slot.attrs.contains(PropertyAttrs::WRITE) {
            return Err(RegistryError::NotWritable {
                path: slot.path.clone(),
            });
        }
        slot.storage = Storage::Stored(value);
        Ok(())
    }

    /// Mark `node` read-only (clears WRITE), making it constant as long as
    /// it is not tied.
    pub fn set_readonly(&self, node: NodeId) {
        self.nodes.borrow_mut()[node.index()]
            .attrs
            .remove(PropertyAttrs::WRITE);
    }

    /// Full slash-separated path of `node`.
    pub fn path_of(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.index()].path.clone()
    }

    /// Local (unqualified) name of `node`.
    pub fn name_of(&self, node: NodeId) -> String {
        self.nodes.borrow()[node.index()].name.clone()
    }

    /// Whether `node` is tied.
    pub fn is_tied(&self, node: NodeId) -> bool {
        self.nodes.borrow()[node.index()]
            .attrs
            .contains(PropertyAttrs::TIED)
    }

    /// Whether `node` is constant: neither tied nor writable.
    pub fn is_constant(&self, node: NodeId) -> bool {
        let attrs = self.nodes.borrow()[node.index()].attrs;
        !attrs.contains(PropertyAttrs::TIED) && !attrs.contains(PropertyAttrs::WRITE)
    }

    /// Ordered child node ids of `node`.
    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes.borrow()[node.index()].children.clone()
    }
}

/// A late-bindable, optionally negated handle to a [`PropertyRegistry`] node.
///
/// Constructed from a textual path; a leading `-` sets the stored sign to
/// `-1.0`. Resolution against a registry happens lazily on first read and is
/// cached thereafter — later registry mutations do not re-trigger lookup.
#[derive(Debug)]
pub struct PropertyRef {
    path: String,
    sign: f64,
    resolved: Cell<Option<NodeId>>,
}

impl PropertyRef {
    /// Build a reference from a textual path. A leading `-` means sign =
    /// `-1.0`; an embedded `#` is left untouched here (callers that need
    /// instantiation-time prefixing should expand it before constructing).
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let (clean, sign) = PropertyRegistry::normalize_path(&path, None);
        Self {
            path: clean,
            sign,
            resolved: Cell::new(None),
        }
    }

    /// The (sign-stripped, placeholder-expanded) path this reference targets.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The reference's sign: `1.0` or `-1.0`.
    pub fn sign(&self) -> f64 {
        self.sign
    }

    /// Resolve against `registry`, caching the node id on first success.
    pub fn resolve(&self, registry: &PropertyRegistry) -> Result<NodeId, RegistryError> {
        if let Some(id) = self.resolved.get() {
            return Ok(id);
        }
        let id = registry
            .lookup_node(&self.path)
            .ok_or_else(|| RegistryError::UnresolvedProperty {
                path: self.path.clone(),
            })?;
        self.resolved.set(Some(id));
        Ok(id)
    }

    /// Resolve and read in one step, applying the stored sign.
    pub fn read(&self, registry: &PropertyRegistry) -> Result<f64, RegistryError> {
        let id = self.resolve(registry)?;
        Ok(registry.read(id) * self.sign)
    }
}

#[cfg(test)]
mod registry_tests;
