use super::class::{BoundMethod, Class, Instance};
use super::closure::{Closure, UpValue};
use super::procedure::{Function, Native};
use super::Value;
use std::rc::Rc;

/// Handle to an object living in the heap.
///
/// Handles are plain indices. They are only meaningful for the heap that handed them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef(u32);

impl ObjRef {
    pub fn from_index(index: u32) -> Self {
        ObjRef(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug)]
pub enum Object {
    String(Rc<str>),
    Function(Function),
    Native(Native),
    Closure(Closure),
    UpValue(UpValue),
    Class(Class),
    Instance(Instance),
    BoundMethod(BoundMethod),
}

impl Object {
    /// Call `visit` with every value this object keeps alive.
    pub fn trace<F: FnMut(Value)>(&self, mut visit: F) {
        match self {
            Object::String(_) => (),
            Object::Function(function) => {
                if let Some(name) = function.name {
                    visit(Value::Object(name));
                }
                for constant in function.chunk.constants() {
                    visit(*constant);
                }
            }
            Object::Native(native) => visit(Value::Object(native.name)),
            Object::Closure(closure) => {
                visit(Value::Object(closure.function));
                for up_value in &closure.up_values {
                    visit(Value::Object(*up_value));
                }
            }
            Object::UpValue(UpValue::Closed(value)) => visit(*value),
            Object::UpValue(UpValue::Open(_)) => (),
            Object::Class(class) => {
                visit(Value::Object(class.name));
                for (name, method) in &class.methods {
                    visit(Value::Object(*name));
                    visit(*method);
                }
            }
            Object::Instance(instance) => {
                visit(Value::Object(instance.class));
                for (name, field) in &instance.fields {
                    visit(Value::Object(*name));
                    visit(*field);
                }
            }
            Object::BoundMethod(bound) => {
                visit(bound.receiver);
                visit(Value::Object(bound.method));
            }
        }
    }
}
