use super::byte_code::chunk::{AddressType, Chunk, LineNumber};
use super::value::ObjRef;
use std::rc::Rc;

// The code a frame executes.
// The top level script is borrowed from the caller, functions own a share of their chunk.
#[derive(Debug, Clone)]
pub enum Code<'a> {
    Script(&'a Chunk),
    Function(Rc<Chunk>),
}

impl<'a> Code<'a> {
    #[inline]
    pub fn chunk(&self) -> &Chunk {
        match self {
            Code::Script(chunk) => chunk,
            Code::Function(chunk) => chunk,
        }
    }
}

// A callframe is a piece of control data
// that is associated with every live function
#[derive(Debug)]
pub struct CallFrame<'a> {
    // `None` for the top level script
    pub closure: Option<ObjRef>,
    pub code: Code<'a>,
    pub ip: AddressType,
    // address of the opcode of the instruction that is currently executed
    pub op_address: AddressType,
    pub stack_base: usize,
}

impl<'a> CallFrame<'a> {
    pub fn script(chunk: &'a Chunk) -> Self {
        Self {
            closure: None,
            code: Code::Script(chunk),
            ip: 0,
            op_address: 0,
            stack_base: 0,
        }
    }

    pub fn function(closure: ObjRef, chunk: Rc<Chunk>, stack_base: usize) -> Self {
        Self {
            closure: Some(closure),
            code: Code::Function(chunk),
            ip: 0,
            op_address: 0,
            stack_base,
        }
    }

    #[inline]
    pub fn chunk(&self) -> &Chunk {
        self.code.chunk()
    }

    pub fn is_script(&self) -> bool {
        self.closure.is_none()
    }

    pub fn line_number_for_current_instruction(&self) -> Option<LineNumber> {
        self.chunk().line_for(self.op_address)
    }
}
