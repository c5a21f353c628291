//! Layout algorithms built on top of the widget containers

pub mod sectioned;

pub use sectioned::{plan_sections, remainder, Materialized, SectionPlan, SectionedFieldLayout};
