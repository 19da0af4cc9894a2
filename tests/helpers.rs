#![allow(dead_code)]

use pepper::vm::byte_code::chunk::{AddressType, Chunk, LineNumber};
use pepper::vm::byte_code::OpCode;
use pepper::vm::heap::Heap;
use pepper::vm::value::error::RuntimeError;
use pepper::vm::value::procedure::Function;
use pepper::vm::value::{Object, Value};
pub use pepper::vm::Error;
pub use pepper::vm::Result;
use pepper::vm::VM;
pub use matches::assert_matches;

pub type TestVM = VM<Vec<u8>>;

pub fn test_vm() -> TestVM {
    VM::with_output(Vec::new())
}

pub fn run_code(vm: &mut TestVM, code: &str) -> Result<()> {
    vm.run_string(code)
}

/// Everything printed since the last call
pub fn take_output(vm: &mut TestVM) -> String {
    let output = String::from_utf8_lossy(vm.output()).into_owned();
    vm.output_mut().clear();
    output
}

pub fn assert_output_eq(vm: &mut TestVM, code: &str, expected: &str) {
    run_code(vm, code).unwrap();
    assert_eq!(take_output(vm), expected)
}

pub fn assert_chunk_output_eq(vm: &mut TestVM, chunk: &Chunk, expected: &str) {
    vm.interpret(chunk).unwrap();
    assert_eq!(take_output(vm), expected)
}

/// Unwrap the runtime error of a failed run together with the line it was raised on
pub fn expect_runtime_error(result: Result<()>) -> (RuntimeError, LineNumber) {
    match result {
        Err(Error::RuntimeError { error, trace }) => (error, trace.line()),
        other => panic!("expected a runtime error but got {:?}", other),
    }
}

/// Assembles chunks by hand, for code the compiler can't produce yet.
pub struct ChunkBuilder<'h> {
    heap: &'h mut Heap,
    chunk: Chunk,
    line: LineNumber,
}

impl<'h> ChunkBuilder<'h> {
    pub fn new(heap: &'h mut Heap) -> Self {
        Self {
            heap,
            chunk: Chunk::new(),
            line: 1,
        }
    }

    /// A builder for a function body that shares the heap of this one
    pub fn nested(&mut self) -> ChunkBuilder<'_> {
        ChunkBuilder {
            heap: &mut *self.heap,
            chunk: Chunk::new(),
            line: self.line,
        }
    }

    pub fn line(&mut self, line: LineNumber) -> &mut Self {
        self.line = line;
        self
    }

    pub fn len(&self) -> AddressType {
        self.chunk.len()
    }

    pub fn op(&mut self, op_code: OpCode) -> &mut Self {
        self.chunk.write_opcode(op_code, self.line);
        self
    }

    pub fn byte(&mut self, byte: u8) -> &mut Self {
        self.chunk.write(byte, self.line);
        self
    }

    pub fn number(&mut self, n: f64) -> &mut Self {
        self.chunk.write_constant(Value::Number(n), self.line);
        self
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        let value = self.heap.string_value(s);
        self.chunk.write_constant(value, self.line);
        self
    }

    /// Add `name` to the constant pool and return its index
    pub fn name(&mut self, name: &str) -> usize {
        let value = self.heap.string_value(name);
        self.chunk.add_constant(value)
    }

    /// Emit an instruction whose operand is the name constant `name`
    pub fn named(&mut self, op_code: OpCode, name: &str) -> &mut Self {
        let index = self.name(name);
        self.chunk.write_indexed(op_code, index, self.line);
        self
    }

    pub fn slot(&mut self, op_code: OpCode, slot: usize) -> &mut Self {
        self.chunk.write_indexed(op_code, slot, self.line);
        self
    }

    pub fn call(&mut self, arg_count: u8) -> &mut Self {
        self.op(OpCode::Call).byte(arg_count)
    }

    pub fn invoke(&mut self, op_code: OpCode, name: &str, arg_count: u8) -> &mut Self {
        let index = self.name(name);
        self.op(op_code).byte(index as u8).byte(arg_count)
    }

    /// Emit a `CLOSURE` over a new function.
    ///
    /// Each capture is `(is_local, index)`.
    pub fn closure(
        &mut self,
        name: &str,
        arity: usize,
        body: Chunk,
        captures: &[(bool, u8)],
    ) -> &mut Self {
        let name = self.heap.intern(name);
        let function = Function::new(Some(name), arity, captures.len(), body);
        let function = Value::Object(self.heap.alloc(Object::Function(function)));
        let index = self.chunk.add_constant(function);

        self.chunk.write_indexed(OpCode::Closure, index, self.line);
        for (is_local, index) in captures {
            self.byte(*is_local as u8).byte(*index);
        }
        self
    }

    pub fn jump(&mut self, op_code: OpCode) -> AddressType {
        self.chunk.write_jump(op_code, self.line)
    }

    pub fn patch(&mut self, placeholder: AddressType) -> &mut Self {
        self.chunk.patch_jump(placeholder).unwrap();
        self
    }

    pub fn loop_to(&mut self, loop_start: AddressType) -> &mut Self {
        self.chunk.write_loop(loop_start, self.line).unwrap();
        self
    }

    pub fn build(self) -> Chunk {
        self.chunk
    }
}
