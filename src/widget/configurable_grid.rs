//! ConfigurableGrid - show only the members tagged with the active configuration
//!
//! Every member carries an immutable set of integer configuration tags. The
//! logical member list never changes on a configuration switch; only the
//! attached (materialized) children of the grid node are rebuilt, from
//! scratch, in insertion order.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::Result;
use crate::engine::Dispatcher;

use super::container::Container;
use super::element::{Element, ElementRef};
use super::node::{NodeId, VisualNode};

/// An element together with the configurations it belongs to
#[derive(Clone)]
pub struct TaggedItem {
    element: ElementRef,
    tags: BTreeSet<u32>,
}

impl TaggedItem {
    pub fn new(element: ElementRef, tags: &[u32]) -> Self {
        Self {
            element,
            tags: tags.iter().copied().collect(),
        }
    }

    pub fn element(&self) -> &ElementRef {
        &self.element
    }

    pub fn tags(&self) -> &BTreeSet<u32> {
        &self.tags
    }

    /// An item with no tags is in no configuration
    pub fn is_in(&self, configuration: u32) -> bool {
        self.tags.contains(&configuration)
    }
}

struct GridState {
    items: Vec<TaggedItem>,
    active: u32,
}

impl GridState {
    fn position(&self, id: NodeId) -> Option<usize> {
        self.items.iter().position(|item| item.element.id() == id)
    }

    /// Forget members that were attached into another container.
    /// Must run on the engine thread.
    fn prune(&mut self, node: &VisualNode) {
        self.items.retain(|item| owned_by(item, node));
    }
}

/// A hidden member has no parent; a shown one hangs off the grid node
fn owned_by(item: &TaggedItem, node: &VisualNode) -> bool {
    item.element
        .node()
        .parent()
        .map_or(true, |parent| parent == *node)
}

/// A row of elements filtered by the active configuration
pub struct ConfigurableGrid {
    node: VisualNode,
    dispatcher: Dispatcher,
    state: Arc<Mutex<GridState>>,
}

impl ConfigurableGrid {
    /// Create an empty grid whose active configuration is 0
    pub fn new(dispatcher: &Dispatcher, title: impl Into<String>) -> Self {
        Self {
            node: VisualNode::new("configurable-grid", title),
            dispatcher: dispatcher.clone(),
            state: Arc::new(Mutex::new(GridState {
                items: Vec::new(),
                active: 0,
            })),
        }
    }

    /// Add `element` with its configuration tags. It is shown immediately if
    /// the active configuration is among them. Re-adding a member does nothing;
    /// its tags stay as first given.
    pub fn add_tagged(&self, element: ElementRef, tags: &[u32]) -> Result<()> {
        let node = self.node.clone();
        let state = Arc::clone(&self.state);
        let item = TaggedItem::new(element, tags);

        self.dispatcher.run_now(move || {
            let mut state = state.lock();
            state.prune(&node);
            if state.position(item.element.id()).is_some() {
                return;
            }
            if item.is_in(state.active) {
                node.attach(item.element.node());
            }
            state.items.push(item);
        })
    }

    /// Active configuration
    pub fn configuration(&self) -> u32 {
        self.state.lock().active
    }

    /// Switch configuration and rebuild the visible children
    pub fn set_configuration(&self, configuration: u32) -> Result<()> {
        let node = self.node.clone();
        let state = Arc::clone(&self.state);

        self.dispatcher.run_now(move || {
            let mut state = state.lock();
            state.prune(&node);
            state.active = configuration;
            node.clear_children();
            for item in state.items.iter().filter(|item| item.is_in(configuration)) {
                node.attach(item.element.node());
            }
            log!(
                "configuration {} materialized {} of {} items",
                configuration,
                node.child_count(),
                state.items.len()
            );
        })
    }

    /// Tags of a member, or None if it is not one
    pub fn tags_of(&self, element: &dyn Element) -> Option<BTreeSet<u32>> {
        let state = self.state.lock();
        state
            .position(element.id())
            .map(|index| &state.items[index])
            .filter(|item| owned_by(item, &self.node))
            .map(|item| item.tags.clone())
    }

    /// Members currently shown, in insertion order
    pub fn visible_elements(&self) -> Result<Vec<ElementRef>> {
        let node = self.node.clone();
        let state = Arc::clone(&self.state);

        self.dispatcher.run_now(move || {
            let state = state.lock();
            state
                .items
                .iter()
                .filter(|item| node.has_child(item.element.node()))
                .map(|item| item.element.clone())
                .collect()
        })
    }
}

impl Element for ConfigurableGrid {
    fn node(&self) -> &VisualNode {
        &self.node
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Container for ConfigurableGrid {
    /// Adds with an empty tag set, so the element is never shown
    fn add(&self, element: ElementRef) -> Result<()> {
        self.add_tagged(element, &[])
    }

    fn remove(&self, element: &dyn Element) -> Result<()> {
        let id = element.id();
        let node = self.node.clone();
        let state = Arc::clone(&self.state);

        self.dispatcher.run_now(move || {
            let mut state = state.lock();
            if let Some(index) = state.position(id) {
                let item = state.items.remove(index);
                node.detach(item.element.node());
            }
        })
    }

    fn clear(&self) -> Result<()> {
        let node = self.node.clone();
        let state = Arc::clone(&self.state);

        self.dispatcher.run_now(move || {
            state.lock().items.clear();
            node.clear_children();
        })
    }

    /// All logical members, shown or not
    fn elements(&self) -> Result<Vec<ElementRef>> {
        let node = self.node.clone();
        let state = Arc::clone(&self.state);
        self.dispatcher.run_now(move || {
            let mut state = state.lock();
            state.prune(&node);
            state.items.iter().map(|item| item.element.clone()).collect()
        })
    }
}
