//! Visual nodes - the opaque scene-graph handles widgets are built from
//!
//! A node is owned by at most one parent at a time. Attaching it somewhere
//! else detaches it from its previous parent first. Mutation is only allowed
//! on an engine thread; reads are allowed anywhere.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;

use crate::engine::on_engine_thread;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a visual node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

struct NodeState {
    text: String,
    visible: bool,
    selected: bool,
    columns: usize,
    children: Vec<VisualNode>,
    parent: Weak<NodeCell>,
}

struct NodeCell {
    id: NodeId,
    kind: &'static str,
    state: Mutex<NodeState>,
}

/// Handle to a node in the presentation surface
#[derive(Clone)]
pub struct VisualNode {
    cell: Arc<NodeCell>,
}

impl PartialEq for VisualNode {
    fn eq(&self, other: &Self) -> bool {
        self.cell.id == other.cell.id
    }
}

impl Eq for VisualNode {}

impl std::fmt::Debug for VisualNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisualNode")
            .field("id", &self.cell.id)
            .field("kind", &self.cell.kind)
            .finish()
    }
}

fn assert_engine_thread() {
    debug_assert!(
        on_engine_thread(),
        "visual nodes may only be mutated on the engine thread"
    );
}

impl VisualNode {
    /// Create a detached node. Creation is allowed on any thread.
    pub fn new(kind: &'static str, text: impl Into<String>) -> Self {
        Self {
            cell: Arc::new(NodeCell {
                id: NodeId::next(),
                kind,
                state: Mutex::new(NodeState {
                    text: text.into(),
                    visible: true,
                    selected: false,
                    columns: 1,
                    children: Vec::new(),
                    parent: Weak::new(),
                }),
            }),
        }
    }

    /// Create a detached layout node with a column hint
    pub fn with_columns(kind: &'static str, text: impl Into<String>, columns: usize) -> Self {
        let node = Self::new(kind, text);
        node.cell.state.lock().columns = columns;
        node
    }

    pub fn id(&self) -> NodeId {
        self.cell.id
    }

    pub fn kind(&self) -> &'static str {
        self.cell.kind
    }

    pub fn text(&self) -> String {
        self.cell.state.lock().text.clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        assert_engine_thread();
        self.cell.state.lock().text = text.into();
    }

    pub fn is_visible(&self) -> bool {
        self.cell.state.lock().visible
    }

    pub fn set_visible(&self, visible: bool) {
        assert_engine_thread();
        self.cell.state.lock().visible = visible;
    }

    pub fn is_selected(&self) -> bool {
        self.cell.state.lock().selected
    }

    pub fn set_selected(&self, selected: bool) {
        assert_engine_thread();
        self.cell.state.lock().selected = selected;
    }

    pub fn columns(&self) -> usize {
        self.cell.state.lock().columns
    }

    pub fn set_columns(&self, columns: usize) {
        assert_engine_thread();
        self.cell.state.lock().columns = columns;
    }

    /// Current parent, if attached
    pub fn parent(&self) -> Option<VisualNode> {
        self.cell
            .state
            .lock()
            .parent
            .upgrade()
            .map(|cell| VisualNode { cell })
    }

    /// Copy of the ordered child list
    pub fn children(&self) -> Vec<VisualNode> {
        self.cell.state.lock().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.cell.state.lock().children.len()
    }

    pub fn has_child(&self, child: &VisualNode) -> bool {
        self.cell.state.lock().children.iter().any(|c| c == child)
    }

    /// Append `child`, taking it away from any previous parent.
    /// Attaching a node that is already a child of this one, or one of this
    /// node's own ancestors, does nothing.
    pub fn attach(&self, child: &VisualNode) {
        assert_engine_thread();
        if child == self || self.has_ancestor(child) {
            return;
        }

        if let Some(previous) = child.parent() {
            if previous == *self {
                return;
            }
            previous.detach(child);
        }

        self.cell.state.lock().children.push(child.clone());
        child.cell.state.lock().parent = Arc::downgrade(&self.cell);
    }

    fn has_ancestor(&self, node: &VisualNode) -> bool {
        let mut current = self.parent();
        while let Some(parent) = current {
            if parent == *node {
                return true;
            }
            current = parent.parent();
        }
        false
    }

    /// Remove `child` from this node. Returns false if it was not a child.
    pub fn detach(&self, child: &VisualNode) -> bool {
        assert_engine_thread();
        let removed = {
            let mut state = self.cell.state.lock();
            let before = state.children.len();
            state.children.retain(|c| c != child);
            state.children.len() != before
        };

        if removed {
            child.cell.state.lock().parent = Weak::new();
        }
        removed
    }

    /// Detach every child
    pub fn clear_children(&self) {
        assert_engine_thread();
        let children = std::mem::take(&mut self.cell.state.lock().children);
        for child in children {
            child.cell.state.lock().parent = Weak::new();
        }
    }

    /// Deep copy of this node and its subtree
    pub fn snapshot(&self) -> NodeSnapshot {
        let (text, visible, selected, columns, children) = {
            let state = self.cell.state.lock();
            (
                state.text.clone(),
                state.visible,
                state.selected,
                state.columns,
                state.children.clone(),
            )
        };

        NodeSnapshot {
            id: self.cell.id,
            kind: self.cell.kind.to_string(),
            text,
            visible,
            selected,
            columns,
            children: children.iter().map(VisualNode::snapshot).collect(),
        }
    }
}

/// Immutable copy of a node tree
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub kind: String,
    pub text: String,
    pub visible: bool,
    pub selected: bool,
    pub columns: usize,
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Texts of the direct children, in order
    pub fn child_texts(&self) -> Vec<String> {
        self.children.iter().map(|c| c.text.clone()).collect()
    }
}
