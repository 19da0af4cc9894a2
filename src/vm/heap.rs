use super::value::class::{Class, Instance};
use super::value::closure::{Closure, UpValue};
use super::value::procedure::{Function, Native};
use super::value::{ObjRef, Object, Value};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// The object heap.
///
/// Objects live in an arena and are addressed through [`ObjRef`] handles.
/// Strings are interned: two strings with the same content always share one handle,
/// which makes handle equality content equality.
///
/// Reclamation is explicit. [`Heap::collect`] frees every object that isn't reachable
/// from the given roots. Handles to freed objects must not be used afterwards.
#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Option<Object>>,
    free_slots: Vec<u32>,
    strings: FxHashMap<Rc<str>, ObjRef>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.objects.len() - self.free_slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn alloc(&mut self, object: Object) -> ObjRef {
        if let Some(index) = self.free_slots.pop() {
            self.objects[index as usize] = Some(object);
            ObjRef::from_index(index)
        } else {
            self.objects.push(Some(object));
            ObjRef::from_index((self.objects.len() - 1) as u32)
        }
    }

    pub fn intern(&mut self, s: &str) -> ObjRef {
        if let Some(existing) = self.strings.get(s) {
            return *existing;
        }
        self.insert_string(Rc::from(s))
    }

    /// Intern an owned string, reusing an existing handle when the content is already known.
    pub fn take_string(&mut self, s: String) -> ObjRef {
        if let Some(existing) = self.strings.get(s.as_str()) {
            return *existing;
        }
        self.insert_string(Rc::from(s))
    }

    fn insert_string(&mut self, chars: Rc<str>) -> ObjRef {
        let r = self.alloc(Object::String(chars.clone()));
        self.strings.insert(chars, r);
        r
    }

    pub fn string_value(&mut self, s: &str) -> Value {
        Value::Object(self.intern(s))
    }

    #[inline]
    pub fn get(&self, r: ObjRef) -> &Object {
        match self.objects.get(r.index()) {
            Some(Some(object)) => object,
            _ => panic!("dangling object reference {:?}", r),
        }
    }

    #[inline]
    pub fn get_mut(&mut self, r: ObjRef) -> &mut Object {
        match self.objects.get_mut(r.index()) {
            Some(Some(object)) => object,
            _ => panic!("dangling object reference {:?}", r),
        }
    }

    pub fn contains(&self, r: ObjRef) -> bool {
        matches!(self.objects.get(r.index()), Some(Some(_)))
    }

    ///////////////////////////////////////////////////////
    // Typed access
    ///////////////////////////////////////////////////////

    pub fn as_str(&self, r: ObjRef) -> Option<&str> {
        match self.get(r) {
            Object::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// The string content of `value`, if it is a string
    pub fn string(&self, value: &Value) -> Option<&str> {
        value.as_object().and_then(|r| self.as_str(r))
    }

    pub fn is_string(&self, value: &Value) -> bool {
        self.string(value).is_some()
    }

    pub fn as_function(&self, r: ObjRef) -> Option<&Function> {
        match self.get(r) {
            Object::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_native(&self, r: ObjRef) -> Option<&Native> {
        match self.get(r) {
            Object::Native(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_closure(&self, r: ObjRef) -> Option<&Closure> {
        match self.get(r) {
            Object::Closure(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_up_value(&self, r: ObjRef) -> Option<&UpValue> {
        match self.get(r) {
            Object::UpValue(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_up_value_mut(&mut self, r: ObjRef) -> Option<&mut UpValue> {
        match self.get_mut(r) {
            Object::UpValue(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_class(&self, r: ObjRef) -> Option<&Class> {
        match self.get(r) {
            Object::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self, r: ObjRef) -> Option<&mut Class> {
        match self.get_mut(r) {
            Object::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_instance(&self, r: ObjRef) -> Option<&Instance> {
        match self.get(r) {
            Object::Instance(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_instance_mut(&mut self, r: ObjRef) -> Option<&mut Instance> {
        match self.get_mut(r) {
            Object::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// The name of a function object, `None` for the top level script
    pub fn function_name(&self, function: &Function) -> Option<&str> {
        function.name.and_then(|name| self.as_str(name))
    }

    ///////////////////////////////////////////////////////
    // Reclamation
    ///////////////////////////////////////////////////////

    /// Free every object that is not reachable from `roots`.
    ///
    /// Returns the number of freed objects.
    pub fn collect<I>(&mut self, roots: I) -> usize
    where
        I: IntoIterator<Item = Value>,
    {
        let mut marks = vec![false; self.objects.len()];
        let mut gray: Vec<ObjRef> = roots.into_iter().filter_map(|v| v.as_object()).collect();

        while let Some(r) = gray.pop() {
            if marks[r.index()] || !self.contains(r) {
                continue;
            }
            marks[r.index()] = true;
            self.get(r).trace(|v| {
                if let Value::Object(child) = v {
                    gray.push(child);
                }
            });
        }

        let mut freed = 0;
        for (index, marked) in marks.iter().enumerate() {
            if *marked {
                continue;
            }
            if let Some(object) = self.objects[index].take() {
                if let Object::String(chars) = &object {
                    self.strings.remove(chars);
                }
                self.free_slots.push(index as u32);
                freed += 1;
            }
        }

        log::debug!("heap collection freed {} objects, {} live", freed, self.len());
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::byte_code::chunk::Chunk;

    #[test]
    fn test_intern_deduplicates() {
        let mut heap = Heap::new();
        let first = heap.intern("foo");
        let second = heap.take_string(String::from("foo"));
        let third = heap.intern("bar");

        assert_eq!(first, second);
        assert_ne!(first, third);
        assert_eq!(heap.as_str(first), Some("foo"));
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn test_collect_frees_unreachable() {
        let mut heap = Heap::new();
        let kept = heap.intern("kept");
        heap.intern("garbage");

        assert_eq!(heap.collect(vec![Value::Object(kept)]), 1);
        assert_eq!(heap.len(), 1);
        assert!(heap.contains(kept));

        // the freed string can be interned again and reuses the slot
        let again = heap.intern("garbage");
        assert_eq!(heap.as_str(again), Some("garbage"));
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn test_collect_traces_through_objects() {
        let mut heap = Heap::new();
        let name = heap.intern("f");
        let constant = heap.string_value("constant");
        let mut chunk = Chunk::new();
        chunk.add_constant(constant);

        let function = heap.alloc(Object::Function(Function::new(Some(name), 0, 0, chunk)));
        let closure = heap.alloc(Object::Closure(Closure::new(function, vec![])));
        heap.intern("unreachable");

        assert_eq!(heap.collect(vec![Value::Object(closure)]), 1);
        assert_eq!(heap.string(&constant), Some("constant"));
        assert_eq!(heap.as_str(name), Some("f"));
    }
}
