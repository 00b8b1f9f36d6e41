pub mod formatter;

pub use formatter::{format_change_set, format_result};
