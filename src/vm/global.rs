use super::heap::Heap;
use super::value::{ObjRef, Value};
use rustc_hash::FxHashMap;

/// Global bindings, keyed by interned name.
#[derive(Debug, Default)]
pub struct Globals {
    bindings: FxHashMap<ObjRef, Value>,
}

impl Globals {
    pub fn new() -> Self {
        Self {
            bindings: FxHashMap::default(),
        }
    }

    pub fn binding_names(&self, heap: &Heap) -> Vec<String> {
        self.bindings
            .keys()
            .filter_map(|k| heap.as_str(*k))
            .map(String::from)
            .collect()
    }

    // Defining an existing binding overwrites it
    pub fn define(&mut self, k: ObjRef, v: Value) {
        self.bindings.insert(k, v);
    }

    // Returns false if `k` isn't bound, in which case nothing is stored
    pub fn set(&mut self, k: ObjRef, v: Value) -> bool {
        match self.bindings.get_mut(&k) {
            Some(slot) => {
                *slot = v;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, k: ObjRef) -> Option<Value> {
        self.bindings.get(&k).copied()
    }

    /// Every name and value, used as roots when collecting the heap
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.bindings
            .iter()
            .flat_map(|(k, v)| vec![Value::Object(*k), *v])
    }
}
