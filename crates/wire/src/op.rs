//! Opcode numbering. Wire-stable: renumbering breaks host compatibility.
//! Gaps are retired opcodes from earlier protocol revisions.

pub const END: u8 = 0;
pub const CLEAR_SELECTED_NODE: u8 = 1;
pub const REMOVE_OTHER_ATTRS: u8 = 5;
pub const SET_ATTR: u8 = 6;
pub const SELECT_MOUNT_POINT: u8 = 7;

pub const MOVE_TO_FIRST_CHILD: u8 = 20;
pub const SET_ELEMENT: u8 = 21;
pub const SET_TEXT: u8 = 23;
pub const SET_COMMENT: u8 = 24;
pub const MOVE_TO_PARENT: u8 = 25;
pub const MOVE_TO_NEXT_SIBLING: u8 = 26;
pub const REMOVE_OTHER_EVENT_LISTENERS: u8 = 27;
pub const SET_EVENT_LISTENER: u8 = 28;
pub const SET_INNER_MARKUP: u8 = 29;

pub const SET_EXTERNAL_INLINE_TAG: u8 = 30;
pub const REMOVE_OTHER_EXTERNAL_INLINE_TAGS: u8 = 31;
pub const SET_EXTERNAL_LINKED_TAG: u8 = 32;
pub const REMOVE_OTHER_EXTERNAL_LINKED_TAGS: u8 = 33;

pub const SET_PROPERTY: u8 = 35;
pub const SELECT_BY_QUERY: u8 = 36;
pub const BUFFER_INNER_MARKUP: u8 = 37;
pub const SET_ATTR_NAMESPACED: u8 = 38;
pub const SET_ELEMENT_NAMESPACED: u8 = 39;

pub const CALLBACK: u8 = 40;
pub const CALLBACK_WITH_CURRENT_NODE: u8 = 41;

/// Opcode name for logs and errors.
pub fn name(opcode: u8) -> &'static str {
    match opcode {
        END => "End",
        CLEAR_SELECTED_NODE => "ClearSelectedNode",
        REMOVE_OTHER_ATTRS => "RemoveOtherAttrs",
        SET_ATTR => "SetAttr",
        SELECT_MOUNT_POINT => "SelectMountPoint",
        MOVE_TO_FIRST_CHILD => "MoveToFirstChild",
        SET_ELEMENT => "SetElement",
        SET_TEXT => "SetText",
        SET_COMMENT => "SetComment",
        MOVE_TO_PARENT => "MoveToParent",
        MOVE_TO_NEXT_SIBLING => "MoveToNextSibling",
        REMOVE_OTHER_EVENT_LISTENERS => "RemoveOtherEventListeners",
        SET_EVENT_LISTENER => "SetEventListener",
        SET_INNER_MARKUP => "SetInnerMarkup",
        SET_EXTERNAL_INLINE_TAG => "SetExternalInlineTag",
        REMOVE_OTHER_EXTERNAL_INLINE_TAGS => "RemoveOtherExternalInlineTags",
        SET_EXTERNAL_LINKED_TAG => "SetExternalLinkedTag",
        REMOVE_OTHER_EXTERNAL_LINKED_TAGS => "RemoveOtherExternalLinkedTags",
        SET_PROPERTY => "SetProperty",
        SELECT_BY_QUERY => "SelectByQuery",
        BUFFER_INNER_MARKUP => "BufferInnerMarkup",
        SET_ATTR_NAMESPACED => "SetAttrNamespaced",
        SET_ELEMENT_NAMESPACED => "SetElementNamespaced",
        CALLBACK => "Callback",
        CALLBACK_WITH_CURRENT_NODE => "CallbackWithCurrentNode",
        _ => "unknown",
    }
}
