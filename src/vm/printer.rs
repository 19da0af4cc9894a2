// The printer turns values into their user facing representation.
// This is what `print` and the top level `return` write to the output.
use super::heap::Heap;
use super::value::procedure::Function;
use super::value::{number, ObjRef, Object, Value};

pub struct Printer<'a> {
    heap: &'a Heap,
}

impl<'a> Printer<'a> {
    pub fn new(heap: &'a Heap) -> Self {
        Self { heap }
    }

    pub fn print(&self, value: &Value) -> String {
        match value {
            Value::Nil => String::from("nil"),
            Value::Bool(true) => String::from("true"),
            Value::Bool(false) => String::from("false"),
            Value::Number(n) => number::format(*n),
            Value::Object(r) => self.print_object(*r),
        }
    }

    fn print_object(&self, r: ObjRef) -> String {
        match self.heap.get(r) {
            Object::String(s) => s.to_string(),
            Object::Function(f) => self.print_function(f),
            Object::Native(_) => String::from("<native fn>"),
            Object::Closure(c) => self.print_object(c.function),
            Object::UpValue(_) => String::from("upvalue"),
            Object::Class(c) => self.name(c.name),
            Object::Instance(i) => match self.heap.as_class(i.class) {
                Some(class) => format!("{} instance", self.name(class.name)),
                None => String::from("instance"),
            },
            Object::BoundMethod(b) => self.print_object(b.method),
        }
    }

    fn print_function(&self, f: &Function) -> String {
        match self.heap.function_name(f) {
            Some(name) => format!("<fn {}>", name),
            None => String::from("<script>"),
        }
    }

    fn name(&self, r: ObjRef) -> String {
        self.heap.as_str(r).unwrap_or("?").to_string()
    }
}
