//! Fields - a titled section of labelled input fields
//!
//! Fields are created by their owning section and addressed afterwards with
//! the [`FieldHandle`] returned at creation. A handle whose field has been
//! removed is simply not found.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::domain::Result;
use crate::engine::Dispatcher;

use super::container::{Container, ElementList};
use super::element::{Element, ElementRef};
use super::node::{NodeId, VisualNode};

/// Value held by a field
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Number(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => write!(f, "{}", text),
            FieldValue::Flag(flag) => write!(f, "{}", flag),
            FieldValue::Number(number) => write!(f, "{}", number),
        }
    }
}

/// Opaque reference to one field of a [`Fields`] section
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FieldHandle(NodeId);

/// One labelled field
pub struct FieldRow {
    node: VisualNode,
    value_node: VisualNode,
    dispatcher: Dispatcher,
    value: Mutex<FieldValue>,
}

impl FieldRow {
    /// Build the row's node pair. Must run on the engine thread.
    fn build(dispatcher: Dispatcher, label: String, value: FieldValue) -> Arc<Self> {
        let node = VisualNode::new("field", label);
        let value_node = VisualNode::new("value", value.to_string());
        if let FieldValue::Flag(flag) = value {
            value_node.set_selected(flag);
        }
        node.attach(&value_node);

        Arc::new(Self {
            node,
            value_node,
            dispatcher,
            value: Mutex::new(value),
        })
    }

    pub fn handle(&self) -> FieldHandle {
        FieldHandle(self.node.id())
    }

    pub fn value(&self) -> FieldValue {
        self.value.lock().clone()
    }

    /// Must run on the engine thread
    fn store(&self, value: FieldValue) {
        self.value_node.set_text(value.to_string());
        if let FieldValue::Flag(flag) = value {
            self.value_node.set_selected(flag);
        }
        *self.value.lock() = value;
    }
}

impl Element for FieldRow {
    fn node(&self) -> &VisualNode {
        &self.node
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

/// A titled section of fields
pub struct Fields {
    list: ElementList,
    rows: Arc<Mutex<Vec<Arc<FieldRow>>>>,
    dispatcher: Dispatcher,
}

impl Fields {
    pub fn new(dispatcher: &Dispatcher, title: impl Into<String>) -> Self {
        Self {
            list: ElementList::new(VisualNode::new("fields", title)),
            rows: Arc::new(Mutex::new(Vec::new())),
            dispatcher: dispatcher.clone(),
        }
    }

    pub fn add_text_field(&self, label: &str, initial: &str) -> Result<FieldHandle> {
        self.add_field(label, FieldValue::Text(initial.to_string()))
    }

    pub fn add_check_box(&self, label: &str, initial: bool) -> Result<FieldHandle> {
        self.add_field(label, FieldValue::Flag(initial))
    }

    pub fn add_double_field(&self, label: &str, initial: f64) -> Result<FieldHandle> {
        self.add_field(label, FieldValue::Number(initial))
    }

    fn add_field(&self, label: &str, value: FieldValue) -> Result<FieldHandle> {
        let list = self.list.clone();
        let rows = Arc::clone(&self.rows);
        let dispatcher = self.dispatcher.clone();
        let label = label.to_string();

        self.dispatcher.run_now(move || {
            let row = FieldRow::build(dispatcher, label, value);
            list.push_now(row.clone());
            rows.lock().push(row.clone());
            row.handle()
        })
    }

    fn row(&self, handle: FieldHandle) -> Option<Arc<FieldRow>> {
        self.rows
            .lock()
            .iter()
            .find(|row| row.handle() == handle)
            .cloned()
    }

    /// Current value, or None for a stale handle
    pub fn value(&self, handle: FieldHandle) -> Option<FieldValue> {
        self.row(handle).map(|row| row.value())
    }

    pub fn label(&self, handle: FieldHandle) -> Option<String> {
        self.row(handle).map(|row| row.title())
    }

    /// Replace a field's value. Returns false for a stale handle.
    pub fn set_value(&self, handle: FieldHandle, value: FieldValue) -> Result<bool> {
        let Some(row) = self.row(handle) else {
            return Ok(false);
        };
        self.dispatcher.run_now(move || {
            row.store(value);
            true
        })
    }

    /// Show or hide a field. Returns false for a stale handle.
    pub fn set_field_visible(&self, handle: FieldHandle, visible: bool) -> Result<bool> {
        match self.row(handle) {
            Some(row) => row.set_visible(visible).map(|()| true),
            None => Ok(false),
        }
    }

    /// Remove a field. Returns false for a stale handle.
    pub fn remove_field(&self, handle: FieldHandle) -> Result<bool> {
        let list = self.list.clone();
        let rows = Arc::clone(&self.rows);
        self.dispatcher.run_now(move || {
            rows.lock().retain(|row| row.handle() != handle);
            list.remove_now(handle.0)
        })
    }

    /// Handles of the current fields, in display order
    pub fn handles(&self) -> Result<Vec<FieldHandle>> {
        let list = self.list.clone();
        self.dispatcher.run_now(move || {
            list.snapshot_now()
                .iter()
                .map(|e| FieldHandle(e.id()))
                .collect()
        })
    }

    /// (label, value) pairs in display order
    pub fn values(&self) -> Result<Vec<(String, FieldValue)>> {
        let list = self.list.clone();
        let rows = Arc::clone(&self.rows);
        self.dispatcher.run_now(move || {
            let rows = rows.lock();
            list.snapshot_now()
                .iter()
                .filter_map(|e| rows.iter().find(|row| row.node().id() == e.id()))
                .map(|row| (row.title(), row.value()))
                .collect()
        })
    }
}

/// A section of a sectioned layout is a [`Fields`] group
pub type Section = Fields;

impl Element for Fields {
    fn node(&self) -> &VisualNode {
        self.list.node()
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Container for Fields {
    fn add(&self, element: ElementRef) -> Result<()> {
        self.list.dispatch_add(&self.dispatcher, element)
    }

    fn remove(&self, element: &dyn Element) -> Result<()> {
        let id = element.id();
        let list = self.list.clone();
        let rows = Arc::clone(&self.rows);
        self.dispatcher.run_now(move || {
            rows.lock().retain(|row| row.node().id() != id);
            list.remove_now(id);
        })
    }

    fn clear(&self) -> Result<()> {
        let list = self.list.clone();
        let rows = Arc::clone(&self.rows);
        self.dispatcher.run_now(move || {
            rows.lock().clear();
            list.clear_now();
        })
    }

    fn elements(&self) -> Result<Vec<ElementRef>> {
        self.list.dispatch_snapshot(&self.dispatcher)
    }
}
