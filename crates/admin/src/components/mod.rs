//! Reusable view components for admin pages.

pub mod data_table;

pub use data_table::{FilterOption, Pager, TableFilter};
