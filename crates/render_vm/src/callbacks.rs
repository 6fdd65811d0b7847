//! Host-side callback bookkeeping for element lifecycle hooks.
//!
//! The interpreter only ever says "callback N fired (with this node)"; the
//! meaning of N is host state. [`CallbackManager`] implements the common
//! create/populate pattern: a create entry records the node reference the
//! instruction stream delivers, and the paired populate entry routes to the
//! same node later in the pass.

use core_types::CallbackId;
use dom::Id;
use std::collections::HashMap;
use std::fmt;

pub type NodeHandler = Box<dyn FnMut(Id)>;

#[derive(Debug, PartialEq, Eq)]
pub enum CallbackError {
    UnknownCallback(CallbackId),
    /// A create callback arrived without a node reference.
    MissingNode(CallbackId),
    /// A populate callback fired before its create delivered the node.
    CreateNotRun(CallbackId),
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackError::UnknownCallback(id) => write!(f, "unknown callback id {id}"),
            CallbackError::MissingNode(id) => {
                write!(f, "create callback {id} fired without a node reference")
            }
            CallbackError::CreateNotRun(id) => {
                write!(f, "populate callback {id} fired before its create callback")
            }
        }
    }
}

impl std::error::Error for CallbackError {}

enum Entry {
    Create {
        node: Option<Id>,
        handler: Option<NodeHandler>,
    },
    Populate {
        create_id: CallbackId,
        handler: NodeHandler,
    },
}

/// Allocates callback ids for one render pass and dispatches them as the
/// stream plays back. Ids restart from 1 each pass; 0 is never a valid id.
pub struct CallbackManager {
    next_id: CallbackId,
    entries: HashMap<CallbackId, Entry>,
}

impl CallbackManager {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: HashMap::new(),
        }
    }

    /// Prepare for the next render pass.
    pub fn start_render(&mut self) {
        self.next_id = 1;
        self.entries.clear();
    }

    /// Register create/populate hooks for one element. Returns the ids to
    /// encode; 0 means "no instruction needed". Even a nil create gets an
    /// entry when populate is set, because populate needs the node reference
    /// the create callback carries.
    pub fn add_create_and_populate(
        &mut self,
        create: Option<NodeHandler>,
        populate: Option<NodeHandler>,
    ) -> (CallbackId, CallbackId) {
        if create.is_none() && populate.is_none() {
            return (0, 0);
        }

        let create_id = self.next_id;
        self.next_id += 1;
        self.entries.insert(
            create_id,
            Entry::Create {
                node: None,
                handler: create,
            },
        );

        let mut populate_id = 0;
        if let Some(handler) = populate {
            populate_id = self.next_id;
            self.next_id += 1;
            self.entries
                .insert(populate_id, Entry::Populate { create_id, handler });
        }

        (create_id, populate_id)
    }

    /// Route one callback instruction. Wire this into the VM's callback
    /// handler registration.
    pub fn handle(&mut self, id: CallbackId, node: Option<Id>) -> Result<(), CallbackError> {
        enum Kind {
            Create,
            Populate(CallbackId),
        }
        let kind = match self.entries.get(&id) {
            None => return Err(CallbackError::UnknownCallback(id)),
            Some(Entry::Create { .. }) => Kind::Create,
            Some(Entry::Populate { create_id, .. }) => Kind::Populate(*create_id),
        };

        match kind {
            Kind::Create => {
                let node = node.ok_or(CallbackError::MissingNode(id))?;
                if let Some(Entry::Create { node: slot, handler }) = self.entries.get_mut(&id) {
                    *slot = Some(node);
                    if let Some(handler) = handler {
                        handler(node);
                    }
                }
                Ok(())
            }
            Kind::Populate(create_id) => {
                let node = match self.entries.get(&create_id) {
                    Some(Entry::Create { node: Some(node), .. }) => *node,
                    _ => return Err(CallbackError::CreateNotRun(id)),
                };
                if let Some(Entry::Populate { handler, .. }) = self.entries.get_mut(&id) {
                    handler(node);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn create_then_populate_routes_to_same_node() {
        let seen: Rc<RefCell<Vec<(&'static str, Id)>>> = Rc::default();
        let mut mgr = CallbackManager::new();
        let c = Rc::clone(&seen);
        let p = Rc::clone(&seen);
        let (create_id, populate_id) = mgr.add_create_and_populate(
            Some(Box::new(move |id| c.borrow_mut().push(("create", id)))),
            Some(Box::new(move |id| p.borrow_mut().push(("populate", id)))),
        );
        assert_eq!((create_id, populate_id), (1, 2));

        mgr.handle(create_id, Some(Id(9))).unwrap();
        mgr.handle(populate_id, None).unwrap();
        assert_eq!(*seen.borrow(), vec![("create", Id(9)), ("populate", Id(9))]);
    }

    #[test]
    fn populate_without_create_node_is_an_error() {
        let mut mgr = CallbackManager::new();
        let (_, populate_id) =
            mgr.add_create_and_populate(None, Some(Box::new(|_| {})));
        assert_eq!(
            mgr.handle(populate_id, None),
            Err(CallbackError::CreateNotRun(populate_id))
        );
    }

    #[test]
    fn no_hooks_means_no_ids() {
        let mut mgr = CallbackManager::new();
        assert_eq!(mgr.add_create_and_populate(None, None), (0, 0));
    }

    #[test]
    fn start_render_resets_ids() {
        let mut mgr = CallbackManager::new();
        let (c1, _) = mgr.add_create_and_populate(Some(Box::new(|_| {})), None);
        mgr.start_render();
        let (c2, _) = mgr.add_create_and_populate(Some(Box::new(|_| {})), None);
        assert_eq!(c1, c2);
        assert_eq!(mgr.handle(99, None), Err(CallbackError::UnknownCallback(99)));
    }
}
