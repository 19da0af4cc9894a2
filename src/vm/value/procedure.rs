use super::{ObjRef, Value};
use crate::vm::byte_code::chunk::Chunk;
use crate::vm::heap::Heap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    Many,
}

impl Arity {
    pub fn accepts(&self, arg_count: usize) -> bool {
        match self {
            Arity::Exactly(n) => arg_count == *n,
            Arity::AtLeast(n) => arg_count >= *n,
            Arity::Many => true,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Many => f.write_str("any number of"),
        }
    }
}

// A compiled function. The chunk is shared with every closure created from it.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Option<ObjRef>,
    pub arity: usize,
    pub up_value_count: usize,
    pub chunk: Rc<Chunk>,
}

impl Function {
    pub fn new(name: Option<ObjRef>, arity: usize, up_value_count: usize, chunk: Chunk) -> Self {
        Self {
            name,
            arity,
            up_value_count,
            chunk: Rc::new(chunk),
        }
    }
}

pub type NativeResult = std::result::Result<Value, String>;
pub type NativeImpl = dyn Fn(&mut Heap, &[Value]) -> NativeResult;

// A function implemented by the host
pub struct Native {
    pub name: ObjRef,
    pub arity: Arity,
    proc: Rc<NativeImpl>,
}

impl Native {
    pub fn new<I>(name: ObjRef, arity: Arity, op: I) -> Self
    where
        I: 'static + Fn(&mut Heap, &[Value]) -> NativeResult,
    {
        Self {
            name,
            arity,
            proc: Rc::new(op),
        }
    }

    // The implementation is shared so it can be invoked while the heap is mutably borrowed.
    pub fn implementation(&self) -> Rc<NativeImpl> {
        self.proc.clone()
    }
}

impl std::fmt::Debug for Native {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format!("Native({:?}, {:?})", self.name, self.arity))
    }
}
