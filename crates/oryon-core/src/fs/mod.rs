//! Filesystem primitives shared across resolvers.

pub mod copy;

pub use copy::{copy_module_tree, same_path};
