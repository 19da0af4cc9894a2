use super::{ObjRef, Value};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct Class {
    pub name: ObjRef,
    pub methods: FxHashMap<ObjRef, Value>,
}

impl Class {
    pub fn new(name: ObjRef) -> Self {
        Self {
            name,
            methods: FxHashMap::default(),
        }
    }

    pub fn find_method(&self, name: ObjRef) -> Option<Value> {
        self.methods.get(&name).copied()
    }
}

#[derive(Debug, Clone)]
pub struct Instance {
    pub class: ObjRef,
    pub fields: FxHashMap<ObjRef, Value>,
}

impl Instance {
    pub fn new(class: ObjRef) -> Self {
        Self {
            class,
            fields: FxHashMap::default(),
        }
    }
}

// A method closure together with the receiver it was looked up on
#[derive(Debug, Clone, Copy)]
pub struct BoundMethod {
    pub receiver: Value,
    pub method: ObjRef,
}
