//! ListDisplay - a scrolling list of titled entries, used for logs and results
//!
//! Entries are addressed by the [`ItemHandle`] returned from `add`. At most one
//! entry is selected at a time.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::domain::Result;
use crate::engine::Dispatcher;

use super::element::Element;
use super::node::{NodeId, VisualNode};

/// Opaque reference to one entry of a [`ListDisplay`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ItemHandle(NodeId);

/// Read-only view of one entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub title: String,
    pub subtitle: String,
    pub selected: bool,
}

struct Entry {
    node: VisualNode,
    subtitle: VisualNode,
}

impl Entry {
    fn handle(&self) -> ItemHandle {
        ItemHandle(self.node.id())
    }

    fn view(&self) -> ListItem {
        ListItem {
            title: self.node.text(),
            subtitle: self.subtitle.text(),
            selected: self.node.is_selected(),
        }
    }
}

pub struct ListDisplay {
    node: VisualNode,
    dispatcher: Dispatcher,
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl ListDisplay {
    pub fn new(dispatcher: &Dispatcher, title: impl Into<String>) -> Self {
        Self {
            node: VisualNode::new("list", title),
            dispatcher: dispatcher.clone(),
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append an entry
    pub fn add(&self, title: &str, subtitle: &str) -> Result<ItemHandle> {
        let node = self.node.clone();
        let entries = Arc::clone(&self.entries);
        let title = title.to_string();
        let subtitle = subtitle.to_string();

        self.dispatcher.run_now(move || {
            let entry = Entry {
                node: VisualNode::new("list-item", title),
                subtitle: VisualNode::new("subtitle", subtitle),
            };
            entry.node.attach(&entry.subtitle);
            node.attach(&entry.node);

            let handle = entry.handle();
            entries.lock().push(entry);
            handle
        })
    }

    /// Remove an entry; a stale handle is ignored
    pub fn remove(&self, handle: ItemHandle) -> Result<()> {
        let node = self.node.clone();
        let entries = Arc::clone(&self.entries);

        self.dispatcher.run_now(move || {
            let mut entries = entries.lock();
            if let Some(index) = entries.iter().position(|e| e.handle() == handle) {
                let entry = entries.remove(index);
                node.detach(&entry.node);
            }
        })
    }

    /// Select one entry and deselect the rest. Returns false for a stale handle,
    /// leaving the selection unchanged.
    pub fn select(&self, handle: ItemHandle) -> Result<bool> {
        let entries = Arc::clone(&self.entries);

        self.dispatcher.run_now(move || {
            let entries = entries.lock();
            if !entries.iter().any(|e| e.handle() == handle) {
                return false;
            }
            for entry in entries.iter() {
                entry.node.set_selected(entry.handle() == handle);
            }
            true
        })
    }

    pub fn selected(&self) -> Option<ItemHandle> {
        self.entries
            .lock()
            .iter()
            .find(|e| e.node.is_selected())
            .map(Entry::handle)
    }

    pub fn clear(&self) -> Result<()> {
        let node = self.node.clone();
        let entries = Arc::clone(&self.entries);

        self.dispatcher.run_now(move || {
            entries.lock().clear();
            node.clear_children();
        })
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries in display order
    pub fn items(&self) -> Vec<ListItem> {
        self.entries.lock().iter().map(Entry::view).collect()
    }
}

impl Element for ListDisplay {
    fn node(&self) -> &VisualNode {
        &self.node
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}
