//! Owned document tree with stable node identities.
//!
//! The tree is the unit of state the rendering VM mutates: nodes own their
//! children, every node carries an `Id` that stays valid until the node is
//! removed or replaced, and all structural edits go through [`Document`] so
//! that id allocation stays in one place.

mod document;
mod markup;
mod node;
mod query;
pub mod snapshot;

pub use document::Document;
pub use markup::parse_markup;
pub use node::{Attr, Id, Node, NodeId, NodeKind};
