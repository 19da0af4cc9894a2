pub mod byte_code;
pub mod call_frame;
pub mod debug;
pub mod disassembler;
pub mod global;
pub mod heap;
pub mod instance;
pub mod printer;
pub mod settings;
pub mod stack;
pub mod stack_trace;
pub mod value;

use crate::compiler;
use byte_code::chunk::{Chunk, LineNumber};
use byte_code::DecodeError;
use global::Globals;
use heap::Heap;
use instance::Instance;
use printer::Printer;
pub use settings::{Setting, Settings};
use stack::Stack;
use stack_trace::StackTrace;
use std::io::{self, Stdout, Write};
use thiserror::Error;
use value::error::RuntimeError;
use value::procedure::{Arity, Native, NativeResult};
use value::{Object, Value};

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    CompilerError(#[from] compiler::Error),
    #[error("{error}\n{trace}")]
    RuntimeError {
        error: RuntimeError,
        trace: StackTrace,
    },
    #[error("CorruptChunk: {0}")]
    CorruptChunk(#[from] DecodeError),
    #[error(transparent)]
    IoError(#[from] io::Error),
}

impl Error {
    /// The source line a runtime error was raised on
    pub fn line(&self) -> Option<LineNumber> {
        match self {
            Error::RuntimeError { trace, .. } => Some(trace.line()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub type ValueStack = Stack<Value>;

/// Outcome of a run as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    CompileError,
    RuntimeError,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::CompileError => 65,
            Status::RuntimeError => 70,
        }
    }
}

impl<T> From<&Result<T>> for Status {
    fn from(result: &Result<T>) -> Status {
        match result {
            Ok(_) => Status::Ok,
            Err(Error::CompilerError(_)) => Status::CompileError,
            Err(_) => Status::RuntimeError,
        }
    }
}

/// The interpreter.
///
/// A `VM` keeps its heap and global bindings across runs. Each run starts
/// with an empty stack and a failed run leaves the stack empty again.
/// Everything the program prints goes to the output writer `W`.
pub struct VM<W: Write = Stdout> {
    pub settings: Settings,
    heap: Heap,
    globals: Globals,
    stack: ValueStack,
    out: W,
}

impl VM<Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for VM<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> VM<W> {
    pub fn with_output(out: W) -> Self {
        let mut vm = Self {
            settings: Settings::default(),
            heap: Heap::new(),
            globals: Globals::new(),
            stack: ValueStack::default(),
            out,
        };
        vm.register_core_natives();
        vm
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn binding_names(&self) -> Vec<String> {
        self.globals.binding_names(&self.heap)
    }

    pub fn stack(&self) -> &[Value] {
        self.stack.as_slice()
    }

    /// Bind a host function to the global `name`.
    pub fn define_native<I>(&mut self, name: &str, arity: Arity, op: I)
    where
        I: 'static + Fn(&mut Heap, &[Value]) -> NativeResult,
    {
        let name = self.heap.intern(name);
        let native = self.heap.alloc(Object::Native(Native::new(name, arity, op)));
        self.globals.define(name, Value::Object(native));
    }

    fn register_core_natives(&mut self) {
        self.define_native("clock", Arity::Exactly(0), |_, _| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| Value::Number(d.as_secs_f64()))
                .map_err(|e| e.to_string())
        });
    }

    /// Compile `source` into a fresh chunk.
    pub fn compile(&mut self, source: &str) -> Result<Chunk> {
        let mut chunk = Chunk::new();
        compiler::compile(source, &mut self.heap, &mut chunk)?;

        #[cfg(feature = "debug_code")]
        println!("{}", self.disassemble(&chunk, "code"));

        if self.settings.is_enabled(&Setting::PrintCode) {
            eprint!("{}", self.disassemble(&chunk, "code"));
        }
        Ok(chunk)
    }

    /// Compile and run `source`.
    ///
    /// Nothing is reclaimed implicitly, chunks held by the caller stay valid.
    /// Call [`VM::collect_garbage`] with the chunks that are still in use to free the rest.
    pub fn run_string(&mut self, source: &str) -> Result<()> {
        let chunk = self.compile(source)?;
        self.interpret(&chunk)
    }

    /// Execute `chunk` until it returns or fails.
    pub fn interpret(&mut self, chunk: &Chunk) -> Result<()> {
        self.reset();
        log::debug!("interpreting chunk of {} bytes", chunk.len());

        let trace_execution =
            cfg!(feature = "debug_vm") || self.settings.is_enabled(&Setting::TraceExecution);
        let result = Instance::interpret(
            chunk,
            &mut self.heap,
            &mut self.globals,
            &mut self.stack,
            &mut self.out,
            trace_execution,
        );

        if let Err(e) = &result {
            log::debug!("run failed: {}", e);
            self.reset();
        }
        self.out.flush()?;
        result
    }

    pub fn reset(&mut self) {
        self.stack.clear();
    }

    /// Reclaim heap objects that are reachable neither from the global bindings
    /// nor from the constants of `live` chunks.
    pub fn collect_garbage(&mut self, live: &[&Chunk]) -> usize {
        let mut roots: Vec<Value> = self.globals.values().collect();
        roots.extend(self.stack.as_slice().iter().copied());
        for chunk in live {
            roots.extend(chunk.constants().iter().copied());
        }
        self.heap.collect(roots)
    }

    pub fn print(&self, value: &Value) -> String {
        Printer::new(&self.heap).print(value)
    }

    pub fn disassemble(&self, chunk: &Chunk, context: &str) -> String {
        disassembler::disassemble(chunk, &self.heap, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_exit_codes() {
        assert_eq!(Status::Ok.exit_code(), 0);
        assert_eq!(Status::CompileError.exit_code(), 65);
        assert_eq!(Status::RuntimeError.exit_code(), 70);
    }

    #[test]
    fn test_run_string_prints_result() {
        let mut vm = VM::with_output(Vec::new());

        vm.run_string("1 + 2").unwrap();
        assert_eq!(String::from_utf8_lossy(vm.output()), "3\n");
        assert!(vm.stack().is_empty());
    }

    #[test]
    fn test_status_from_result() {
        let mut vm = VM::with_output(Vec::new());

        assert_eq!(Status::from(&vm.run_string("1")), Status::Ok);
        assert_eq!(Status::from(&vm.run_string("1 +")), Status::CompileError);
        assert_eq!(Status::from(&vm.run_string("-nil")), Status::RuntimeError);
    }

    #[test]
    fn test_collect_garbage_frees_temporaries() {
        let mut vm = VM::with_output(Vec::new());
        let baseline = vm.heap().len();

        vm.run_string("\"a\" + \"b\" + \"c\"").unwrap();
        assert_eq!(String::from_utf8_lossy(vm.output()), "abc\n");
        assert!(vm.heap().len() > baseline);

        assert_eq!(vm.collect_garbage(&[]), 5);
        assert_eq!(vm.heap().len(), baseline);
    }

    #[test]
    fn test_held_chunks_survive_other_runs() {
        let mut vm = VM::with_output(Vec::new());
        let chunk = vm.compile("\"shared\" + \"!\"").unwrap();

        vm.interpret(&chunk).unwrap();
        vm.run_string("\"other\" + \"text\"").unwrap();
        vm.collect_garbage(&[&chunk]);
        vm.run_string("\"more\" + \"text\"").unwrap();
        vm.interpret(&chunk).unwrap();

        assert_eq!(
            String::from_utf8_lossy(vm.output()),
            "shared!\nothertext\nmoretext\nshared!\n"
        );
    }
}
