//! Widget system for panelkit
//!
//! Widgets are composable elements backed by a [`VisualNode`]. Every
//! mutation is marshalled onto the engine thread through the element's
//! [`Dispatcher`](crate::engine::Dispatcher), so panels can be composed and
//! updated from any thread:
//! - [`Element`] is the capability every widget provides
//! - [`Container`] hosts an ordered list of elements
//! - concrete widgets (grids, field sections, lists, tabs) build on both

pub mod check_grid;
pub mod configurable_grid;
pub mod container;
pub mod element;
pub mod fields;
pub mod grid;
pub mod list_display;
pub mod node;
pub mod tab_group;

pub use check_grid::CheckGrid;
pub use configurable_grid::{ConfigurableGrid, TaggedItem};
pub use container::{Container, ElementList, Stack};
pub use element::{same_element, Element, ElementRef, Label};
pub use fields::{FieldHandle, FieldRow, FieldValue, Fields, Section};
pub use grid::{wrap_rows, Grid, DEFAULT_NUM_COLUMNS};
pub use list_display::{ItemHandle, ListDisplay, ListItem};
pub use node::{NodeId, NodeSnapshot, VisualNode};
pub use tab_group::TabGroup;
