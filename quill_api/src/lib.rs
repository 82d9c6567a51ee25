//! Shared quill data models consumed by the core library and backend crates.

pub mod diff;
pub mod operation;
pub mod reconcile;
pub mod selection;

pub use diff::*;
pub use operation::*;
pub use reconcile::*;
pub use selection::*;
