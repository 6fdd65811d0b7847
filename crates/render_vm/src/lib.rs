//! Rendering VM: a resumable binary-instruction interpreter over a live
//! document tree.
//!
//! The host computes what the tree should look like and encodes tree edits
//! as an opcode stream (see the `wire` crate); this crate applies them. The
//! interpreter keeps no shadow tree: the document's current shape is the
//! implicit previous version, and a cursor plus deferred-move state machine
//! walks it, reusing nodes that already match and replacing the ones that
//! don't. Attributes, event listeners, and injected resource tags are
//! reconciled against per-pass marker sets, with explicit sweep opcodes
//! removing whatever was not re-asserted.
//!
//! All state persists in [`RenderVm`] between `apply` calls, which is what
//! lets a host stream an arbitrarily large edit through a small fixed
//! buffer. Document events flow the other way through a fixed outbound
//! buffer and a synchronous host callback (see [`DomEvent`] and
//! [`EventScope`]).

mod callbacks;
mod error;
mod event;
mod external;
mod interp;
mod listeners;
mod state;

pub use callbacks::{CallbackError, CallbackManager, NodeHandler};
pub use error::RenderError;
pub use event::{
    ActiveEvent, DispatchOutcome, DomEvent, EVENT_BUFFER_CAPACITY, EventBuffer, EventScope,
};
pub use interp::RenderVm;
pub use state::{EventKey, PendingMove};
