// Stack frames: local bindings, type tables, and flow-control masks

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

use crate::name::Name;

use super::types::TypeDescriptor;
use super::value::{StructValue, Value};

// Flow-control bits
pub const FC_RETURN: u8 = 1 << 0;
pub const FC_BREAK: u8 = 1 << 1;
pub const FC_CONTINUE: u8 = 1 << 2;
pub const FC_ALL: u8 = FC_RETURN | FC_BREAK | FC_CONTINUE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Bottom-of-stack frame holding the built-in type registry
    Base,
    /// Pushed while a struct body binds its members
    Struct,
    /// Pushed for a user function call; name lookup stops here
    Function,
    /// Block, loop, and switch scopes
    Scope,
}

/// One record of the frame stack.
pub struct Frame {
    pub kind: FrameKind,
    /// Local variable bindings
    pub vars: FxHashMap<Name, (TypeDescriptor, Value)>,
    /// Type names visible from this frame
    pub var_types: FxHashMap<Name, TypeDescriptor>,
    /// Flow-control kinds this frame absorbs
    pub handles_flowctrl: u8,
    /// Flow-control kinds that may not cross this frame
    pub blocks_flowctrl: u8,
    /// Declared return type (function frames)
    pub return_type: Option<TypeDescriptor>,
    /// Member mapping being populated (struct frames)
    pub struct_members: Option<Rc<RefCell<StructValue>>>,
}

impl Frame {
    fn empty(kind: FrameKind, handles: u8, blocks: u8) -> Self {
        Self {
            kind,
            vars: FxHashMap::default(),
            var_types: FxHashMap::default(),
            handles_flowctrl: handles,
            blocks_flowctrl: blocks,
            return_type: None,
            struct_members: None,
        }
    }

    pub fn base() -> Self {
        Self::empty(FrameKind::Base, 0, FC_ALL)
    }

    pub fn struct_frame(members: Rc<RefCell<StructValue>>) -> Self {
        let mut frame = Self::empty(FrameKind::Struct, 0, FC_ALL);
        frame.struct_members = Some(members);
        frame
    }

    pub fn function(return_type: TypeDescriptor) -> Self {
        let mut frame = Self::empty(FrameKind::Function, FC_RETURN, FC_BREAK | FC_CONTINUE);
        frame.return_type = Some(return_type);
        frame
    }

    /// A scope frame absorbing the given flow-control kinds (loops pass
    /// `FC_BREAK | FC_CONTINUE`, switches `FC_BREAK`, plain blocks 0).
    pub fn scope(handles: u8) -> Self {
        Self::empty(FrameKind::Scope, handles, 0)
    }
}
