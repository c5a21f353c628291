//! Container - ordered collections of elements
//!
//! Every container operation runs on the engine thread, so composing a panel
//! from a worker thread is always safe. Membership order is the order of the
//! container node's children; an element that gets attached to another
//! container drops out of this one.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::Result;
use crate::engine::Dispatcher;

use super::element::{same_element, Element, ElementRef};
use super::node::{NodeId, VisualNode};

/// An element that hosts other elements
pub trait Container: Element {
    /// Append an element. Adding one that is already present does nothing.
    fn add(&self, element: ElementRef) -> Result<()>;

    fn add_all(&self, elements: Vec<ElementRef>) -> Result<()> {
        for element in elements {
            self.add(element)?;
        }
        Ok(())
    }

    /// Remove an element. Removing one that is not present does nothing.
    fn remove(&self, element: &dyn Element) -> Result<()>;

    fn remove_all(&self, elements: &[ElementRef]) -> Result<()> {
        for element in elements {
            self.remove(element.as_ref())?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()>;

    /// Snapshot of the members in order
    fn elements(&self) -> Result<Vec<ElementRef>>;

    fn contains(&self, element: &dyn Element) -> Result<bool> {
        Ok(self
            .elements()?
            .iter()
            .any(|e| same_element(e.as_ref(), element)))
    }
}

/// Membership bookkeeping shared by the concrete containers.
///
/// The `*_now` methods must run on the engine thread; the `dispatch_*`
/// methods marshal there first.
#[derive(Clone)]
pub struct ElementList {
    node: VisualNode,
    registry: Arc<Mutex<Vec<ElementRef>>>,
}

impl ElementList {
    pub fn new(node: VisualNode) -> Self {
        Self {
            node,
            registry: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn node(&self) -> &VisualNode {
        &self.node
    }

    /// Attach `element`; false if it was already a member or would be its own ancestor
    pub fn push_now(&self, element: ElementRef) -> bool {
        if self.node.has_child(element.node()) {
            return false;
        }

        self.node.attach(element.node());
        if !self.node.has_child(element.node()) {
            return false;
        }

        let mut registry = self.registry.lock();
        registry.retain(|e| e.id() != element.id());
        registry.push(element);
        true
    }

    /// Detach the member with this id; false if there was none
    pub fn remove_now(&self, id: NodeId) -> bool {
        let removed = {
            let mut registry = self.registry.lock();
            registry
                .iter()
                .position(|e| e.id() == id)
                .map(|index| registry.remove(index))
        };

        match removed {
            Some(element) => self.node.detach(element.node()),
            None => false,
        }
    }

    pub fn clear_now(&self) {
        self.registry.lock().clear();
        self.node.clear_children();
    }

    /// Members in child order, forgetting any that moved elsewhere
    pub fn snapshot_now(&self) -> Vec<ElementRef> {
        let children = self.node.children();
        let mut registry = self.registry.lock();
        registry.retain(|e| children.iter().any(|c| c.id() == e.id()));

        children
            .iter()
            .filter_map(|c| registry.iter().find(|e| e.id() == c.id()).cloned())
            .collect()
    }

    pub fn dispatch_add(&self, dispatcher: &Dispatcher, element: ElementRef) -> Result<()> {
        let list = self.clone();
        dispatcher.run_now(move || {
            list.push_now(element);
        })
    }

    pub fn dispatch_remove(&self, dispatcher: &Dispatcher, id: NodeId) -> Result<()> {
        let list = self.clone();
        dispatcher.run_now(move || {
            list.remove_now(id);
        })
    }

    pub fn dispatch_clear(&self, dispatcher: &Dispatcher) -> Result<()> {
        let list = self.clone();
        dispatcher.run_now(move || list.clear_now())
    }

    pub fn dispatch_snapshot(&self, dispatcher: &Dispatcher) -> Result<Vec<ElementRef>> {
        let list = self.clone();
        dispatcher.run_now(move || list.snapshot_now())
    }
}

/// A vertical stack of elements
pub struct Stack {
    list: ElementList,
    dispatcher: Dispatcher,
}

impl Stack {
    pub fn new(dispatcher: &Dispatcher, title: impl Into<String>) -> Self {
        Self {
            list: ElementList::new(VisualNode::new("stack", title)),
            dispatcher: dispatcher.clone(),
        }
    }
}

impl Element for Stack {
    fn node(&self) -> &VisualNode {
        self.list.node()
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Container for Stack {
    fn add(&self, element: ElementRef) -> Result<()> {
        self.list.dispatch_add(&self.dispatcher, element)
    }

    fn remove(&self, element: &dyn Element) -> Result<()> {
        self.list.dispatch_remove(&self.dispatcher, element.id())
    }

    fn clear(&self) -> Result<()> {
        self.list.dispatch_clear(&self.dispatcher)
    }

    fn elements(&self) -> Result<Vec<ElementRef>> {
        self.list.dispatch_snapshot(&self.dispatcher)
    }
}
