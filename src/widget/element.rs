//! Element - the capability every composable visual unit provides

use std::sync::Arc;

use crate::domain::Result;
use crate::engine::Dispatcher;

use super::node::{NodeId, VisualNode};

/// A composable visual unit.
///
/// Reads go straight to the node; writes are marshalled onto the engine
/// thread through the element's dispatcher.
pub trait Element: Send + Sync {
    /// Root node of this element
    fn node(&self) -> &VisualNode;

    /// Dispatcher used for every mutation of this element
    fn dispatcher(&self) -> &Dispatcher;

    fn title(&self) -> String {
        self.node().text()
    }

    fn set_title(&self, title: &str) -> Result<()> {
        let node = self.node().clone();
        let title = title.to_string();
        self.dispatcher().run_now(move || node.set_text(title))
    }

    fn is_visible(&self) -> bool {
        self.node().is_visible()
    }

    fn set_visible(&self, visible: bool) -> Result<()> {
        let node = self.node().clone();
        self.dispatcher().run_now(move || node.set_visible(visible))
    }

    /// Identity used for membership tests
    fn id(&self) -> NodeId {
        self.node().id()
    }
}

/// Shared handle to any element
pub type ElementRef = Arc<dyn Element>;

/// True if both handles refer to the same element
pub fn same_element(a: &dyn Element, b: &dyn Element) -> bool {
    a.id() == b.id()
}

/// A plain text element
pub struct Label {
    node: VisualNode,
    dispatcher: Dispatcher,
}

impl Label {
    pub fn new(dispatcher: &Dispatcher, text: impl Into<String>) -> Self {
        Self {
            node: VisualNode::new("label", text),
            dispatcher: dispatcher.clone(),
        }
    }

    /// Create a label already wrapped for use in containers
    pub fn shared(dispatcher: &Dispatcher, text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(dispatcher, text))
    }
}

impl Element for Label {
    fn node(&self) -> &VisualNode {
        &self.node
    }

    fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PresentationEngine;
    use crate::shared::EngineSettings;
    use std::thread;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(PresentationEngine::new(&EngineSettings::default())))
    }

    #[test]
    fn test_label_title_and_visibility() {
        let label = Label::new(&dispatcher(), "Voltage");
        assert_eq!(label.title(), "Voltage");
        assert!(label.is_visible());

        label.set_title("Current").unwrap();
        label.set_visible(false).unwrap();

        assert_eq!(label.title(), "Current");
        assert!(!label.is_visible());
    }

    #[test]
    fn test_set_title_from_worker_thread() {
        let label = Label::shared(&dispatcher(), "idle");
        let worker = Arc::clone(&label);

        thread::spawn(move || worker.set_title("measuring").unwrap())
            .join()
            .unwrap();

        assert_eq!(label.title(), "measuring");
    }

    #[test]
    fn test_same_element() {
        let dispatcher = dispatcher();
        let a: ElementRef = Label::shared(&dispatcher, "a");
        let b: ElementRef = Label::shared(&dispatcher, "a");
        assert!(same_element(a.as_ref(), a.clone().as_ref()));
        assert!(!same_element(a.as_ref(), b.as_ref()));
    }
}
