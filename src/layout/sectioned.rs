//! Sectioned field layout - named field sections arranged in balanced rows
//!
//! With column spanning enabled, `count % num_columns` sections go into a
//! first row of their own so that row has fewer, wider cells. Everything else
//! wraps in a grid of `num_columns`. Any change rebuilds both rows from
//! scratch inside a single dispatched task.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::{Result, UiError};
use crate::engine::Dispatcher;
use crate::shared::LayoutSettings;
use crate::widget::{wrap_rows, Element, ElementRef, Fields, Grid, VisualNode};

/// Number of sections placed in the first row
pub fn remainder(count: usize, num_columns: usize, col_spanning: bool) -> usize {
    if col_spanning {
        count % num_columns.max(1)
    } else {
        0
    }
}

/// Where each section goes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionPlan<T> {
    /// Leading sections, one per column of a `first_row.len()` wide row
    pub first_row: Vec<T>,
    /// Remaining sections wrapped at `num_columns`
    pub rows: Vec<Vec<T>>,
}

/// Split `items` into a remainder first row and wrapped rows
pub fn plan_sections<T>(items: Vec<T>, num_columns: usize, col_spanning: bool) -> SectionPlan<T> {
    let split = remainder(items.len(), num_columns, col_spanning);
    let mut first_row = items;
    let rest = first_row.split_off(split);

    SectionPlan {
        first_row,
        rows: wrap_rows(rest, num_columns),
    }
}

/// Section titles as currently attached to the layout node
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Materialized {
    pub first_row: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A section keyed by the title it was added under
struct SectionEntry {
    key: String,
    fields: Arc<Fields>,
}

struct LayoutState {
    sections: Vec<SectionEntry>,
    num_columns: usize,
    col_spanning: bool,
    first_row: Option<Arc<Grid>>,
    other_rows: Option<Arc<Grid>>,
}

impl LayoutState {
    /// Position of a section still owned by this layout
    fn find(&self, key: &str) -> Option<usize> {
        self.sections
            .iter()
            .position(|entry| entry.key == key && self.owns(&entry.fields))
    }

    /// False once the section's node has been attached into another container
    fn owns(&self, fields: &Fields) -> bool {
        match fields.node().parent() {
            None => true,
            Some(parent) => [&self.first_row, &self.other_rows]
                .into_iter()
                .flatten()
                .any(|grid| *grid.node() == parent),
        }
    }

    fn owned(&self) -> Vec<Arc<Fields>> {
        self.sections
            .iter()
            .filter(|entry| self.owns(&entry.fields))
            .map(|entry| Arc::clone(&entry.fields))
            .collect()
    }

    /// Forget sections that moved elsewhere. Must run on the engine thread.
    fn prune(&mut self) {
        let owned = self.owned();
        self.sections
            .retain(|entry| owned.iter().any(|f| Arc::ptr_eq(f, &entry.fields)));
    }

    /// Clear and rebuild both rows. Must run on the engine thread.
    fn rebuild(&mut self, node: &VisualNode, dispatcher: &Dispatcher) {
        self.prune();
        node.clear_children();

        let sections = self.owned();
        let plan = plan_sections(sections, self.num_columns, self.col_spanning);
        let spanned = plan.first_row.len();

        let first_row = Arc::new(Grid::new(dispatcher, "first-row", spanned));
        for section in plan.first_row {
            first_row.list().push_now(section as ElementRef);
        }

        let other_rows = Arc::new(Grid::new(dispatcher, "other-rows", self.num_columns));
        for section in plan.rows.into_iter().flatten() {
            other_rows.list().push_now(section as ElementRef);
        }

        if spanned > 0 {
            node.attach(first_row.node());
            self.first_row = Some(first_row);
        } else {
            self.first_row = None;
        }
        node.attach(other_rows.node());
        self.other_rows = Some(other_rows);

        log!(
            "sectioned layout '{}': {} sections, {} columns, first row {}",
            node.text(),
            self.sections.len(),
            self.num_columns,
            spanned
        );
    }

    /// Must run on the engine thread
    fn materialized(&self) -> Materialized {
        let titles = |elements: Vec<ElementRef>| -> Vec<String> {
            elements.iter().map(|e| e.title()).collect()
        };

        let first_row = self
            .first_row
            .as_ref()
            .map(|grid| titles(grid.list().snapshot_now()))
            .unwrap_or_default();

        let rows = self
            .other_rows
            .as_ref()
            .map(|grid| {
                wrap_rows(grid.list().snapshot_now(), grid.columns())
                    .into_iter()
                    .map(titles)
                    .collect()
            })
            .unwrap_or_default();

        Materialized { first_row, rows }
    }
}

/// A panel of named [`Fields`] sections laid out in balanced rows
pub struct SectionedFieldLayout {
    node: VisualNode,
    dispatcher: Dispatcher,
    state: Arc<Mutex<LayoutState>>,
}

impl SectionedFieldLayout {
    /// Create an empty layout with the default layout settings
    pub fn new(dispatcher: &Dispatcher, title: impl Into<String>) -> Result<Self> {
        Self::with_settings(dispatcher, title, &LayoutSettings::default())
    }

    pub fn with_settings(
        dispatcher: &Dispatcher,
        title: impl Into<String>,
        settings: &LayoutSettings,
    ) -> Result<Self> {
        if settings.default_columns == 0 {
            return Err(UiError::InvalidColumns(0));
        }

        let layout = Self {
            node: VisualNode::new("sectioned-layout", title),
            dispatcher: dispatcher.clone(),
            state: Arc::new(Mutex::new(LayoutState {
                sections: Vec::new(),
                num_columns: settings.default_columns,
                col_spanning: settings.col_spanning,
                first_row: None,
                other_rows: None,
            })),
        };
        layout.update(|_| ())?;
        Ok(layout)
    }

    /// Apply `change` to the state and rebuild, all in one engine task
    fn update<F, R>(&self, change: F) -> Result<R>
    where
        F: FnOnce(&mut LayoutState) -> R + Send + 'static,
        R: Send + 'static,
    {
        let node = self.node.clone();
        let dispatcher = self.dispatcher.clone();
        let state = Arc::clone(&self.state);

        self.dispatcher.run_now(move || {
            let mut state = state.lock();
            let result = change(&mut state);
            state.rebuild(&node, &dispatcher);
            result
        })
    }

    /// Section added under `title`, created and appended if there is none yet.
    /// Sections are keyed by that title even if they are renamed later.
    pub fn add_section(&self, title: &str) -> Result<Arc<Fields>> {
        if let Some(existing) = self.section(title) {
            return Ok(existing);
        }

        let dispatcher = self.dispatcher.clone();
        let key = title.to_string();
        self.update(move |state| match state.find(&key) {
            Some(index) => Arc::clone(&state.sections[index].fields),
            None => {
                let fields = Arc::new(Fields::new(&dispatcher, key.clone()));
                state.sections.push(SectionEntry {
                    key,
                    fields: Arc::clone(&fields),
                });
                fields
            }
        })
    }

    pub fn section(&self, title: &str) -> Option<Arc<Fields>> {
        let state = self.state.lock();
        state
            .find(title)
            .map(|index| Arc::clone(&state.sections[index].fields))
    }

    /// Remove the section added under `title`; false if there was none
    pub fn remove_section(&self, title: &str) -> Result<bool> {
        let key = title.to_string();
        self.update(move |state| match state.find(&key) {
            Some(index) => {
                state.sections.remove(index);
                true
            }
            None => false,
        })
    }

    /// Sections in insertion order
    pub fn sections(&self) -> Vec<Arc<Fields>> {
        self.state.lock().owned()
    }

    pub fn num_columns(&self) -> usize {
        self.state.lock().num_columns
    }

    pub fn set_num_columns(&self, columns: usize) -> Result<()> {
        if columns == 0 {
            return Err(UiError::InvalidColumns(columns));
        }
        self.update(move |state| state.num_columns = columns)
    }

    pub fn is_col_spanning(&self) -> bool {
        self.state.lock().col_spanning
    }

    pub fn set_col_spanning(&self, flag: bool) -> Result<()> {
        self.update(move |state| state.col_spanning = flag)
    }

    /// Titles of the attached rows, read on the engine thread
    pub fn materialized(&self) -> Result<Materialized> {
        let state = Arc::clone(&self.state);
        self.dispatcher.run_now(move || state.lock().materialized())
    }
}

impl Element for SectionedFieldLayout {
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
    use crate::widget::{Container, FieldValue, Stack};
    use proptest::prelude::*;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(PresentationEngine::new(&EngineSettings::default())))
    }

    fn five_sections(dispatcher: &Dispatcher) -> SectionedFieldLayout {
        let layout = SectionedFieldLayout::new(dispatcher, "Measurement").unwrap();
        for title in ["Source-Drain", "Gate", "Timing", "Temperature", "Output"] {
            layout.add_section(title).unwrap();
        }
        layout
    }

    #[test]
    fn test_remainder() {
        assert_eq!(remainder(5, 2, true), 1);
        assert_eq!(remainder(6, 3, true), 0);
        assert_eq!(remainder(5, 2, false), 0);
        assert_eq!(remainder(2, 4, true), 2);
        assert_eq!(remainder(0, 3, true), 0);
    }

    #[test]
    fn test_plan_five_sections_two_columns() {
        let plan = plan_sections(vec![1, 2, 3, 4, 5], 2, true);
        assert_eq!(plan.first_row, vec![1]);
        assert_eq!(plan.rows, vec![vec![2, 3], vec![4, 5]]);

        let plan = plan_sections(vec![1, 2, 3, 4, 5], 2, false);
        assert!(plan.first_row.is_empty());
        assert_eq!(plan.rows, vec![vec![1, 2], vec![3, 4], vec![5]]);
    }

    #[test]
    fn test_spanning_layout() {
        let layout = five_sections(&dispatcher());
        let view = layout.materialized().unwrap();

        assert_eq!(view.first_row, vec!["Source-Drain"]);
        assert_eq!(
            view.rows,
            vec![vec!["Gate", "Timing"], vec!["Temperature", "Output"]]
        );
        assert_eq!(layout.node().child_count(), 2);
    }

    #[test]
    fn test_without_spanning() {
        let layout = five_sections(&dispatcher());
        layout.set_col_spanning(false).unwrap();
        let view = layout.materialized().unwrap();

        assert!(view.first_row.is_empty());
        assert_eq!(view.rows.len(), 3);
        assert!(view.rows.iter().all(|row| row.len() <= 2));
        assert_eq!(layout.node().child_count(), 1);
    }

    #[test]
    fn test_empty_layout_keeps_other_rows() {
        let layout = SectionedFieldLayout::new(&dispatcher(), "Empty").unwrap();
        let snapshot = layout.node().snapshot();

        assert_eq!(snapshot.children.len(), 1);
        assert_eq!(snapshot.children[0].text, "other-rows");
        assert_eq!(layout.materialized().unwrap(), Materialized::default());
    }

    #[test]
    fn test_changes_rebuild_without_stale_rows() {
        let layout = five_sections(&dispatcher());

        layout.set_num_columns(3).unwrap();
        let view = layout.materialized().unwrap();
        assert_eq!(view.first_row, vec!["Source-Drain", "Gate"]);
        assert_eq!(view.rows, vec![vec!["Timing", "Temperature", "Output"]]);

        assert!(layout.remove_section("Gate").unwrap());
        assert!(!layout.remove_section("Gate").unwrap());
        let view = layout.materialized().unwrap();
        assert_eq!(view.first_row, vec!["Source-Drain"]);
        assert_eq!(view.rows, vec![vec!["Timing", "Temperature", "Output"]]);

        layout.set_num_columns(4).unwrap();
        let view = layout.materialized().unwrap();
        assert!(view.first_row.is_empty());
        assert_eq!(view.rows.len(), 1);
        assert_eq!(layout.node().child_count(), 1);
    }

    #[test]
    fn test_zero_columns_rejected() {
        let dispatcher = dispatcher();
        let layout = five_sections(&dispatcher);
        assert_eq!(layout.set_num_columns(0), Err(UiError::InvalidColumns(0)));
        assert_eq!(layout.num_columns(), 2);

        let settings = LayoutSettings {
            default_columns: 0,
            ..LayoutSettings::default()
        };
        assert!(SectionedFieldLayout::with_settings(&dispatcher, "x", &settings).is_err());
    }

    #[test]
    fn test_add_section_reuses_title() {
        let layout = SectionedFieldLayout::new(&dispatcher(), "Measurement").unwrap();
        let first = layout.add_section("Gate").unwrap();
        let handle = first.add_double_field("Voltage [V]", 0.5).unwrap();

        let again = layout.add_section("Gate").unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(layout.sections().len(), 1);
        assert_eq!(again.value(handle), Some(FieldValue::Number(0.5)));
        assert!(layout.section("Missing").is_none());
    }

    #[test]
    fn test_sections_keep_fields_across_rebuilds() {
        let layout = five_sections(&dispatcher());
        let gate = layout.section("Gate").unwrap();
        gate.add_text_field("Name", "vg").unwrap();

        layout.set_num_columns(1).unwrap();
        layout.set_col_spanning(false).unwrap();

        assert_eq!(gate.values().unwrap().len(), 1);
        assert!(gate.node().parent().is_some());
    }

    #[test]
    fn test_with_settings() {
        let settings = LayoutSettings {
            default_columns: 3,
            col_spanning: false,
            ..LayoutSettings::default()
        };
        let layout = SectionedFieldLayout::with_settings(&dispatcher(), "x", &settings).unwrap();
        assert_eq!(layout.num_columns(), 3);
        assert!(!layout.is_col_spanning());
    }

    #[test]
    fn test_sections_keyed_by_added_title() {
        let layout = SectionedFieldLayout::new(&dispatcher(), "Measurement").unwrap();
        let a = layout.add_section("A").unwrap();
        let b = layout.add_section("B").unwrap();
        b.set_title("A").unwrap();

        assert!(Arc::ptr_eq(&layout.add_section("A").unwrap(), &a));
        assert!(Arc::ptr_eq(&layout.add_section("B").unwrap(), &b));
        assert_eq!(layout.sections().len(), 2);

        assert!(layout.remove_section("B").unwrap());
        assert!(Arc::ptr_eq(&layout.section("A").unwrap(), &a));
        assert!(layout.section("B").is_none());
        assert_eq!(layout.materialized().unwrap().first_row, vec!["A"]);
    }

    #[test]
    fn test_rebuild_leaves_moved_section_alone() {
        let dispatcher = dispatcher();
        let layout = five_sections(&dispatcher);
        let gate = layout.section("Gate").unwrap();

        let elsewhere = Stack::new(&dispatcher, "elsewhere");
        elsewhere.add(gate.clone()).unwrap();

        layout.set_num_columns(3).unwrap();
        assert!(elsewhere.contains(gate.as_ref()).unwrap());
        assert!(layout.section("Gate").is_none());
        assert_eq!(layout.sections().len(), 4);

        let view = layout.materialized().unwrap();
        assert_eq!(view.first_row, vec!["Source-Drain"]);
        assert_eq!(view.rows, vec![vec!["Timing", "Temperature", "Output"]]);

        // The title is free again
        let fresh = layout.add_section("Gate").unwrap();
        assert!(!Arc::ptr_eq(&fresh, &gate));
        assert!(elsewhere.contains(gate.as_ref()).unwrap());
    }

    proptest! {
        /// Every item is placed exactly once and in order.
        #[test]
        fn prop_plan_preserves_order(count in 0usize..40, columns in 1usize..8, spanning in any::<bool>()) {
            let items: Vec<usize> = (0..count).collect();
            let plan = plan_sections(items.clone(), columns, spanning);

            let flattened: Vec<usize> = plan
                .first_row
                .iter()
                .copied()
                .chain(plan.rows.iter().flatten().copied())
                .collect();
            prop_assert_eq!(flattened, items);
        }

        /// The first row is the remainder and the wrapped rows are full except the last.
        #[test]
        fn prop_plan_shape(count in 0usize..40, columns in 1usize..8, spanning in any::<bool>()) {
            let plan = plan_sections((0..count).collect::<Vec<_>>(), columns, spanning);

            prop_assert_eq!(plan.first_row.len(), remainder(count, columns, spanning));
            prop_assert!(plan.first_row.len() < columns);
            if spanning {
                prop_assert!(plan.rows.iter().all(|row| row.len() == columns));
            }
            if let Some((last, full)) = plan.rows.split_last() {
                prop_assert!(!last.is_empty() && last.len() <= columns);
                prop_assert!(full.iter().all(|row| row.len() == columns));
            }
        }
    }
}
