//! CheckGrid - a columns x rows matrix of check boxes
//!
//! Out-of-range positions read as unchecked and writes to them are ignored.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::Result;
use crate::engine::Dispatcher;

use super::element::Element;
use super::node::VisualNode;

/// Boxes indexed as `[column][row]`
type Boxes = Vec<Vec<VisualNode>>;

pub struct CheckGrid {
    node: VisualNode,
    dispatcher: Dispatcher,
    boxes: Arc<Mutex<Boxes>>,
}

impl CheckGrid {
    /// Create a grid with every box checked
    pub fn new(
        dispatcher: &Dispatcher,
        title: impl Into<String>,
        columns: usize,
        rows: usize,
    ) -> Result<Self> {
        let grid = Self {
            node: VisualNode::new("check-grid", title),
            dispatcher: dispatcher.clone(),
            boxes: Arc::new(Mutex::new(Vec::new())),
        };
        grid.set_size(columns, rows)?;
        Ok(grid)
    }

    /// Rebuild the matrix at a new size; every box starts checked
    pub fn set_size(&self, columns: usize, rows: usize) -> Result<()> {
        let node = self.node.clone();
        let boxes = Arc::clone(&self.boxes);

        self.dispatcher.run_now(move || {
            node.clear_children();
            node.set_columns(columns.max(1));

            let mut fresh: Boxes = Vec::with_capacity(columns);
            for x in 0..columns {
                let column: Vec<VisualNode> = (0..rows)
                    .map(|y| {
                        let check = VisualNode::new("check", format!("{},{}", x, y));
                        check.set_selected(true);
                        check
                    })
                    .collect();
                fresh.push(column);
            }

            // Attach row by row so the node order reads left-to-right
            for y in 0..rows {
                for column in &fresh {
                    node.attach(&column[y]);
                }
            }

            *boxes.lock() = fresh;
        })
    }

    pub fn column_count(&self) -> usize {
        self.boxes.lock().len()
    }

    pub fn row_count(&self) -> usize {
        self.boxes.lock().first().map_or(0, Vec::len)
    }

    /// State of one box; false when out of range
    pub fn is_checked(&self, column: usize, row: usize) -> bool {
        self.boxes
            .lock()
            .get(column)
            .and_then(|c| c.get(row))
            .is_some_and(VisualNode::is_selected)
    }

    /// Set one box; ignored when out of range
    pub fn set_checked(&self, column: usize, row: usize, checked: bool) -> Result<()> {
        let boxes = Arc::clone(&self.boxes);
        self.dispatcher.run_now(move || {
            if let Some(check) = boxes.lock().get(column).and_then(|c| c.get(row)) {
                check.set_selected(checked);
            }
        })
    }

    pub fn set_all(&self, checked: bool) -> Result<()> {
        self.update(move |_, _| Some(checked))
    }

    pub fn set_column(&self, column: usize, checked: bool) -> Result<()> {
        self.update(move |x, _| (x == column).then_some(checked))
    }

    pub fn set_row(&self, row: usize, checked: bool) -> Result<()> {
        self.update(move |_, y| (y == row).then_some(checked))
    }

    fn update<F>(&self, decide: F) -> Result<()>
    where
        F: Fn(usize, usize) -> Option<bool> + Send + 'static,
    {
        let boxes = Arc::clone(&self.boxes);
        self.dispatcher.run_now(move || {
            for (x, column) in boxes.lock().iter().enumerate() {
                for (y, check) in column.iter().enumerate() {
                    if let Some(checked) = decide(x, y) {
                        check.set_selected(checked);
                    }
                }
            }
        })
    }

    /// All states as `[column][row]`
    pub fn values(&self) -> Vec<Vec<bool>> {
        self.boxes
            .lock()
            .iter()
            .map(|column| column.iter().map(VisualNode::is_selected).collect())
            .collect()
    }
}

impl Element for CheckGrid {
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

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(PresentationEngine::new(&EngineSettings::default())))
    }

    #[test]
    fn test_starts_all_checked() {
        let grid = CheckGrid::new(&dispatcher(), "Pixels", 3, 2).unwrap();
        assert_eq!(grid.column_count(), 3);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.values(), vec![vec![true, true]; 3]);
        assert_eq!(grid.node().child_count(), 6);
    }

    #[test]
    fn test_out_of_range_is_safe() {
        let grid = CheckGrid::new(&dispatcher(), "Pixels", 2, 2).unwrap();
        assert!(!grid.is_checked(5, 0));
        assert!(!grid.is_checked(0, 9));
        grid.set_checked(7, 7, false).unwrap();
        assert_eq!(grid.values(), vec![vec![true, true]; 2]);
    }

    #[test]
    fn test_rows_and_columns() {
        let grid = CheckGrid::new(&dispatcher(), "Pixels", 3, 3).unwrap();
        grid.set_all(false).unwrap();
        grid.set_column(1, true).unwrap();
        grid.set_row(2, true).unwrap();
        grid.set_checked(0, 0, true).unwrap();

        assert_eq!(
            grid.values(),
            vec![
                vec![true, false, true],
                vec![true, true, true],
                vec![false, false, true],
            ]
        );
        assert!(grid.is_checked(1, 0));
        assert!(!grid.is_checked(2, 1));
    }

    #[test]
    fn test_resize_rebuilds() {
        let grid = CheckGrid::new(&dispatcher(), "Pixels", 2, 2).unwrap();
        grid.set_all(false).unwrap();
        grid.set_size(1, 4).unwrap();

        assert_eq!(grid.values(), vec![vec![true; 4]]);
        assert_eq!(grid.node().child_count(), 4);

        grid.set_size(0, 0).unwrap();
        assert_eq!(grid.row_count(), 0);
        assert!(!grid.is_checked(0, 0));
    }
}
