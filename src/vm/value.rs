#[cfg(test)]
pub mod arbitrary;
pub mod class;
pub mod closure;
pub mod error;
pub mod number;
pub mod object;
pub mod procedure;

pub use object::{ObjRef, Object};

// Values used at runtime by the VM.
//
// Primitives are copied freely. `Object` is a non-owning handle into the heap,
// the heap decides when the referenced object goes away.
//
// Equality is per tag and never holds across tags. Numbers compare by IEEE
// semantics and objects by handle, which is content equality for strings since
// every string is interned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Object(ObjRef),
}

impl Value {
    /// `nil` and `false` are falsey, everything else is truthy.
    #[inline]
    pub fn is_falsey(&self) -> bool {
        matches!(self, Value::Nil | Value::Bool(false))
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<ObjRef> {
        match self {
            Value::Object(r) => Some(*r),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::Nil
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<ObjRef> for Value {
    fn from(r: ObjRef) -> Value {
        Value::Object(r)
    }
}
