//! Common utilities and helpers

pub mod path;

pub use path::PathUtils;
