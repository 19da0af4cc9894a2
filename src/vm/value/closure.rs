use super::{ObjRef, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub function: ObjRef,
    pub up_values: Vec<ObjRef>,
}

impl Closure {
    pub fn new(function: ObjRef, up_values: Vec<ObjRef>) -> Self {
        Self {
            function,
            up_values,
        }
    }

    #[inline]
    pub fn get_up_value(&self, addr: usize) -> Option<ObjRef> {
        self.up_values.get(addr).copied()
    }
}

// A captured variable.
//
// While the variable is still live on the stack the up-value points at its slot.
// Once the slot goes away the value moves into the up-value itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpValue {
    Open(usize),
    Closed(Value),
}

impl UpValue {
    pub fn is_open(&self) -> bool {
        matches!(self, UpValue::Open(_))
    }
}
