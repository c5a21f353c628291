//! Grid - a container that wraps its members into rows of fixed width

use crate::domain::{Result, UiError};
use crate::engine::Dispatcher;

use super::container::{Container, ElementList};
use super::element::{Element, ElementRef};
use super::node::VisualNode;

/// Column count used when none is given
pub const DEFAULT_NUM_COLUMNS: usize = 3;

/// A titled grid of elements
pub struct Grid {
    list: ElementList,
    dispatcher: Dispatcher,
}

impl Grid {
    /// Create a grid. A column count of zero is stored as one.
    pub fn new(dispatcher: &Dispatcher, title: impl Into<String>, columns: usize) -> Self {
        Self {
            list: ElementList::new(VisualNode::with_columns("grid", title, columns.max(1))),
            dispatcher: dispatcher.clone(),
        }
    }

    /// Create a grid with [`DEFAULT_NUM_COLUMNS`] columns
    pub fn with_default_columns(dispatcher: &Dispatcher, title: impl Into<String>) -> Self {
        Self::new(dispatcher, title, DEFAULT_NUM_COLUMNS)
    }

    pub fn columns(&self) -> usize {
        self.list.node().columns()
    }

    pub fn set_columns(&self, columns: usize) -> Result<()> {
        if columns == 0 {
            return Err(UiError::InvalidColumns(columns));
        }
        let node = self.list.node().clone();
        self.dispatcher.run_now(move || node.set_columns(columns))
    }

    /// Members wrapped into rows of `columns()`
    pub fn rows(&self) -> Result<Vec<Vec<ElementRef>>> {
        let list = self.list.clone();
        self.dispatcher.run_now(move || {
            let columns = list.node().columns().max(1);
            wrap_rows(list.snapshot_now(), columns)
        })
    }

    pub(crate) fn list(&self) -> &ElementList {
        &self.list
    }
}

/// Split `items` into consecutive rows of at most `columns` entries
pub fn wrap_rows<T>(items: Vec<T>, columns: usize) -> Vec<Vec<T>> {
    let columns = columns.max(1);
    let mut rows: Vec<Vec<T>> = Vec::with_capacity(items.len().div_ceil(columns));

    for item in items {
        match rows.last_mut() {
            Some(row) if row.len() < columns => row.push(item),
            _ => rows.push(vec![item]),
        }
    }
    rows
}

impl Element for Grid {
    fn node(&self) -> &VisualNode {
        self.list.node()
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Container for Grid {
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
