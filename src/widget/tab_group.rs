//! TabGroup - a container that shows one member at a time
//!
//! The first tab added becomes selected. Removing the selected tab moves the
//! selection to the tab that takes its place, or the last one.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::Result;
use crate::engine::Dispatcher;

use super::container::{Container, ElementList};
use super::element::{Element, ElementRef};
use super::node::VisualNode;

pub struct TabGroup {
    list: ElementList,
    dispatcher: Dispatcher,
    selected: Arc<Mutex<Option<usize>>>,
}

impl TabGroup {
    pub fn new(dispatcher: &Dispatcher, title: impl Into<String>) -> Self {
        Self {
            list: ElementList::new(VisualNode::new("tabs", title)),
            dispatcher: dispatcher.clone(),
            selected: Arc::new(Mutex::new(None)),
        }
    }

    /// Select the tab at `index`; out of range does nothing
    pub fn select(&self, index: usize) -> Result<()> {
        let list = self.list.clone();
        let selected = Arc::clone(&self.selected);

        self.dispatcher.run_now(move || {
            let tabs = list.snapshot_now();
            if index < tabs.len() {
                *selected.lock() = Some(index);
                mark_selected(&tabs, Some(index));
            }
        })
    }

    pub fn selected_index(&self) -> Option<usize> {
        *self.selected.lock()
    }

    pub fn selected_element(&self) -> Result<Option<ElementRef>> {
        let list = self.list.clone();
        let selected = Arc::clone(&self.selected);

        self.dispatcher.run_now(move || {
            let tabs = list.snapshot_now();
            let index = (*selected.lock())?;
            tabs.get(index).cloned()
        })
    }

    /// Must run on the engine thread
    fn reselect(list: &ElementList, selected: &Mutex<Option<usize>>) {
        let tabs = list.snapshot_now();
        let mut selected = selected.lock();
        *selected = match *selected {
            _ if tabs.is_empty() => None,
            None => Some(0),
            Some(index) => Some(index.min(tabs.len() - 1)),
        };
        mark_selected(&tabs, *selected);
    }
}

fn mark_selected(tabs: &[ElementRef], index: Option<usize>) {
    for (i, tab) in tabs.iter().enumerate() {
        tab.node().set_selected(Some(i) == index);
    }
}

impl Element for TabGroup {
    fn node(&self) -> &VisualNode {
        self.list.node()
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl Container for TabGroup {
    fn add(&self, element: ElementRef) -> Result<()> {
        let list = self.list.clone();
        let selected = Arc::clone(&self.selected);

        self.dispatcher.run_now(move || {
            list.push_now(element);
            Self::reselect(&list, &selected);
        })
    }

    fn remove(&self, element: &dyn Element) -> Result<()> {
        let id = element.id();
        let list = self.list.clone();
        let selected = Arc::clone(&self.selected);

        self.dispatcher.run_now(move || {
            if let Some(tab) = list.snapshot_now().iter().find(|tab| tab.id() == id) {
                tab.node().set_selected(false);
            }
            if list.remove_now(id) {
                Self::reselect(&list, &selected);
            }
        })
    }

    fn clear(&self) -> Result<()> {
        let list = self.list.clone();
        let selected = Arc::clone(&self.selected);

        self.dispatcher.run_now(move || {
            mark_selected(&list.snapshot_now(), None);
            list.clear_now();
            *selected.lock() = None;
        })
    }

    fn elements(&self) -> Result<Vec<ElementRef>> {
        self.list.dispatch_snapshot(&self.dispatcher)
    }
}
