use crate::vm::heap::Heap;
use crate::vm::printer::Printer;
use crate::vm::value::Value;

// Utilities to get insights into how the stack is arranged

// Render the stack as a single line, bottom first.
// Slots below `frame_base` belong to callers and are separated by a bar.
pub fn pretty_print(stack: &[Value], frame_base: usize, heap: &Heap) -> String {
    let printer = Printer::new(heap);
    let mut out = String::from("          ");

    for (idx, value) in stack.iter().enumerate() {
        if idx == frame_base && idx > 0 {
            out.push_str("| ");
        }
        out.push_str(&format!("[ {} ]", stack_print(&printer, heap, value)));
    }
    out
}

fn stack_print(printer: &Printer, heap: &Heap, v: &Value) -> String {
    match heap.string(v) {
        Some(s) => format!("{:?}", s),
        None => printer.print(v),
    }
}
