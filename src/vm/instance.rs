use super::byte_code::chunk::Chunk;
use super::byte_code::{DecodeError, Instruction, OpCode};
use super::call_frame::CallFrame;
use super::debug;
use super::disassembler::Disassembler;
use super::global::Globals;
use super::heap::Heap;
use super::printer::Printer;
use super::stack::FRAMES_MAX;
use super::stack_trace::StackTrace;
use super::value::class::{self, BoundMethod};
use super::value::closure::{self, UpValue};
use super::value::error::{self, RuntimeError};
use super::value::number;
use super::value::procedure::{Arity, Function};
use super::value::{ObjRef, Object, Value};
use super::{Error, Result, ValueStack};
use std::io::{self, Write};

// What a callee turned out to be once it was looked up in the heap
enum Callee {
    Closure,
    BoundMethod(BoundMethod),
    Class,
    Native,
    Other,
}

// The outcome of `ADD` before it is pushed
enum Sum {
    Number(f64),
    Text(String),
}

/// A single run of a chunk.
///
/// The instance borrows the long lived parts of the [`super::VM`] and owns the
/// control state of the run: the call frames and the open up-values.
pub struct Instance<'a, W: Write> {
    heap: &'a mut Heap,
    globals: &'a mut Globals,
    stack: &'a mut ValueStack,
    out: &'a mut W,
    // the currently active frame
    frame: CallFrame<'a>,
    // suspended callers, the script frame is at the bottom
    frames: Vec<CallFrame<'a>>,
    // up-values that still point into the stack, ordered by slot
    open_up_values: Vec<ObjRef>,
    init_string: ObjRef,
    trace_execution: bool,
}

impl<'a, W: Write> Instance<'a, W> {
    pub fn new(
        chunk: &'a Chunk,
        heap: &'a mut Heap,
        globals: &'a mut Globals,
        stack: &'a mut ValueStack,
        out: &'a mut W,
        trace_execution: bool,
    ) -> Self {
        let init_string = heap.intern("init");

        Self {
            heap,
            globals,
            stack,
            out,
            frame: CallFrame::script(chunk),
            frames: Vec::with_capacity(FRAMES_MAX),
            open_up_values: Vec::new(),
            init_string,
            trace_execution,
        }
    }

    pub fn interpret(
        chunk: &'a Chunk,
        heap: &'a mut Heap,
        globals: &'a mut Globals,
        stack: &'a mut ValueStack,
        out: &'a mut W,
        trace_execution: bool,
    ) -> Result<()> {
        let mut instance = Self::new(chunk, heap, globals, stack, out, trace_execution);
        instance.run()
    }

    fn run(&mut self) -> Result<()> {
        use OpCode::*;

        loop {
            if self.trace_execution {
                self.debug_cycle()?;
            }

            let instruction = self.next_instruction()?;
            let operand = instruction.operand as usize;

            if self.stack.len() < instruction.stack_operands() {
                return Err(DecodeError::StackUnderflow(self.frame.op_address).into());
            }

            match instruction.op_code {
                Constant | ConstantLong => {
                    let value = self.read_constant(operand)?;
                    self.push(value)?
                }
                Nil => self.push(Value::Nil)?,
                True => self.push(Value::Bool(true))?,
                False => self.push(Value::Bool(false))?,
                Pop => {
                    self.pop();
                }

                GetLocal | GetLocalLong => self.get_local(operand)?,
                SetLocal | SetLocalLong => self.set_local(operand)?,
                GetGlobal | GetGlobalLong => self.get_global(operand)?,
                DefineGlobal | DefineGlobalLong => self.define_global(operand)?,
                SetGlobal | SetGlobalLong => self.set_global(operand)?,
                GetUpValue | GetUpValueLong => self.get_up_value(operand)?,
                SetUpValue | SetUpValueLong => self.set_up_value(operand)?,
                GetProperty => self.get_property(operand)?,
                SetProperty => self.set_property(operand)?,
                GetSuper => self.get_super(operand)?,

                Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a == b))?
                }
                Greater => self.binary_op(|a, b| Value::Bool(a > b))?,
                Less => self.binary_op(|a, b| Value::Bool(a < b))?,
                Add => self.add()?,
                Subtract => self.binary_op(|a, b| Value::Number(a - b))?,
                Multiply => self.binary_op(|a, b| Value::Number(a * b))?,
                Divide => self.binary_op(|a, b| Value::Number(a / b))?,
                Not => {
                    let value = self.pop();
                    self.push(Value::Bool(value.is_falsey()))?
                }
                Negate => self.negate()?,
                Print => {
                    let value = self.pop();
                    let text = self.print(&value);
                    writeln!(self.out, "{}", text)?
                }

                Jump => self.jump_forward(operand)?,
                JumpIfFalse => {
                    if self.peek(0).is_falsey() {
                        self.jump_forward(operand)?
                    }
                }
                Loop => self.jump_backward(operand)?,

                Call => self.call_value(operand)?,
                Invoke => self.invoke(self.read_name(operand)?, instruction.arg_count as usize)?,
                SuperInvoke => {
                    self.super_invoke(self.read_name(operand)?, instruction.arg_count as usize)?
                }
                Closure | ClosureLong => self.create_closure(instruction)?,
                CloseUpValue => {
                    self.close_up_values(self.stack.len() - 1);
                    self.pop();
                }
                Return => {
                    if self.return_from_frame()? {
                        return Ok(());
                    }
                }

                Class => self.create_class(operand)?,
                Inherit => self.inherit()?,
                Method => self.define_method(operand)?,
            }
        }
    }

    #[inline]
    fn next_instruction(&mut self) -> Result<Instruction> {
        let address = self.frame.ip;
        let (instruction, next) = self.frame.chunk().decode(address)?;
        log::trace!("{:04} {}", address, instruction.op_code.name());

        self.frame.op_address = address;
        self.frame.ip = next;
        Ok(instruction)
    }

    // read a byte that trails the current instruction (closure capture descriptors)
    fn read_byte(&mut self) -> Result<u8> {
        let address = self.frame.ip;
        let byte = self
            .frame
            .chunk()
            .read_byte(address)
            .ok_or(DecodeError::Truncated(self.frame.op_address))?;
        self.frame.ip += 1;
        Ok(byte)
    }

    fn read_u24(&mut self) -> Result<u32> {
        let address = self.frame.ip;
        let value = self
            .frame
            .chunk()
            .read_u24(address)
            .ok_or(DecodeError::Truncated(self.frame.op_address))?;
        self.frame.ip += 3;
        Ok(value)
    }

    #[inline]
    fn read_constant(&self, index: usize) -> Result<Value> {
        match self.frame.chunk().constants().get(index) {
            Some(value) => Ok(*value),
            None => Err(DecodeError::InvalidConstant(index).into()),
        }
    }

    // constants that name globals, properties and methods are always strings
    fn read_name(&self, index: usize) -> Result<ObjRef> {
        let value = self.read_constant(index)?;
        match value.as_object() {
            Some(name) if self.heap.is_string(&value) => Ok(name),
            _ => Err(DecodeError::InvalidConstant(index).into()),
        }
    }

    fn name_of(&self, name: ObjRef) -> String {
        self.heap.as_str(name).unwrap_or_default().to_string()
    }

    fn print(&self, value: &Value) -> String {
        Printer::new(self.heap).print(value)
    }

    ///////////////////////////////////////////////////////////
    //
    // Manage the value stack
    //
    ///////////////////////////////////////////////////////////

    #[inline]
    fn push(&mut self, v: Value) -> Result<()> {
        match self.stack.push(v) {
            Ok(()) => Ok(()),
            Err(_) => self.runtime_error(RuntimeError::StackOverflow),
        }
    }

    #[inline]
    fn pop(&mut self) -> Value {
        self.stack.pop()
    }

    // Return the item that is `distance` slots away from the top of the stack.
    //
    // peek(0) is the top, peek(1) the value right below it.
    #[inline]
    fn peek(&self, distance: usize) -> &Value {
        self.stack.peek(distance)
    }

    // absolute stack index of the slot `distance` below the top
    #[inline]
    fn slot_below_top(&self, distance: usize) -> usize {
        self.stack.len() - distance - 1
    }

    ///////////////////////////////////////////////////////
    // Arithmetic and comparison
    ///////////////////////////////////////////////////////

    fn binary_op<F>(&mut self, op: F) -> Result<()>
    where
        F: FnOnce(f64, f64) -> Value,
    {
        match (self.peek(1).as_number(), self.peek(0).as_number()) {
            (Some(a), Some(b)) => {
                self.pop();
                self.pop();
                self.push(op(a, b))
            }
            _ => self.runtime_error(RuntimeError::OperandsMustBeNumbers),
        }
    }

    fn negate(&mut self) -> Result<()> {
        match self.peek(0).as_number() {
            Some(n) => {
                self.pop();
                self.push(Value::Number(-n))
            }
            None => self.runtime_error(RuntimeError::OperandMustBeNumber),
        }
    }

    // `ADD` sums numbers and concatenates strings. A number next to a string is
    // rendered and concatenated on its side.
    fn add(&mut self) -> Result<()> {
        let b = *self.peek(0);
        let a = *self.peek(1);

        let sum = match (self.heap.string(&a), self.heap.string(&b)) {
            (Some(lhs), Some(rhs)) => Sum::Text([lhs, rhs].concat()),
            (None, None) => match (a.as_number(), b.as_number()) {
                (Some(lhs), Some(rhs)) => Sum::Number(lhs + rhs),
                _ => return self.runtime_error(RuntimeError::InvalidAddition),
            },
            (None, Some(rhs)) => match a.as_number() {
                Some(lhs) => Sum::Text(number::format(lhs) + rhs),
                None => return self.runtime_error(RuntimeError::InvalidAddition),
            },
            (Some(lhs), None) => match b.as_number() {
                Some(rhs) => Sum::Text(format!("{}{}", lhs, number::format(rhs))),
                None => return self.runtime_error(RuntimeError::InvalidAddition),
            },
        };

        self.pop();
        self.pop();
        match sum {
            Sum::Number(n) => self.push(Value::Number(n)),
            Sum::Text(s) => {
                let s = self.heap.take_string(s);
                self.push(Value::Object(s))
            }
        }
    }

    ///////////////////////////////////////////////////////
    // Jumps and conditional jumps
    ///////////////////////////////////////////////////////

    #[inline]
    fn jump_forward(&mut self, distance: usize) -> Result<()> {
        let target = self.frame.ip + distance;
        if target > self.frame.chunk().len() {
            return Err(DecodeError::InvalidJump(self.frame.op_address).into());
        }
        self.frame.ip = target;
        Ok(())
    }

    #[inline]
    fn jump_backward(&mut self, distance: usize) -> Result<()> {
        match self.frame.ip.checked_sub(distance) {
            Some(target) => {
                self.frame.ip = target;
                Ok(())
            }
            None => Err(DecodeError::InvalidJump(self.frame.op_address).into()),
        }
    }

    ///////////////////////////////////////////////////////
    // Local variables
    ///////////////////////////////////////////////////////

    fn local_index(&self, slot: usize) -> Result<usize> {
        let index = self.frame.stack_base + slot;
        if index < self.stack.len() {
            Ok(index)
        } else {
            Err(DecodeError::InvalidSlot(slot).into())
        }
    }

    #[inline]
    fn get_local(&mut self, slot: usize) -> Result<()> {
        let index = self.local_index(slot)?;
        let value = *self.stack.at(index);
        self.push(value)
    }

    #[inline]
    fn set_local(&mut self, slot: usize) -> Result<()> {
        let index = self.local_index(slot)?;
        let value = *self.peek(0);
        self.stack.set(index, value);
        Ok(())
    }

    ///////////////////////////////////////////////////////
    // Global variables
    ///////////////////////////////////////////////////////

    fn get_global(&mut self, index: usize) -> Result<()> {
        let name = self.read_name(index)?;

        match self.globals.get(name) {
            Some(value) => self.push(value),
            None => self.runtime_error(error::undefined_variable(self.name_of(name))),
        }
    }

    fn define_global(&mut self, index: usize) -> Result<()> {
        let name = self.read_name(index)?;
        let value = *self.peek(0);
        self.globals.define(name, value);
        self.pop();
        Ok(())
    }

    fn set_global(&mut self, index: usize) -> Result<()> {
        let name = self.read_name(index)?;
        let value = *self.peek(0);

        if self.globals.set(name, value) {
            Ok(())
        } else {
            self.runtime_error(error::undefined_variable(self.name_of(name)))
        }
    }

    ///////////////////////////////////////////////////////
    // Closure variables aka up-values
    ///////////////////////////////////////////////////////

    fn current_up_value(&self, index: usize) -> Result<ObjRef> {
        self.frame
            .closure
            .and_then(|c| self.heap.as_closure(c))
            .and_then(|c| c.get_up_value(index))
            .ok_or_else(|| DecodeError::InvalidSlot(index).into())
    }

    fn get_up_value(&mut self, index: usize) -> Result<()> {
        let up_value = self.current_up_value(index)?;

        let value = match self.heap.as_up_value(up_value) {
            Some(UpValue::Open(slot)) => *self.stack.at(*slot),
            Some(UpValue::Closed(value)) => *value,
            None => return Err(DecodeError::InvalidSlot(index).into()),
        };
        self.push(value)
    }

    fn set_up_value(&mut self, index: usize) -> Result<()> {
        let up_value = self.current_up_value(index)?;
        let value = *self.peek(0);

        match self.heap.as_up_value_mut(up_value) {
            Some(UpValue::Open(slot)) => {
                let slot = *slot;
                self.stack.set(slot, value);
            }
            Some(closed) => *closed = UpValue::Closed(value),
            None => return Err(DecodeError::InvalidSlot(index).into()),
        }
        Ok(())
    }

    #[inline]
    fn open_slot(&self, up_value: ObjRef) -> Option<usize> {
        match self.heap.as_up_value(up_value) {
            Some(UpValue::Open(slot)) => Some(*slot),
            _ => None,
        }
    }

    // Reuse the open up-value for `slot` or create one.
    // Two closures capturing the same variable share the up-value.
    fn capture_up_value(&mut self, slot: usize) -> Result<ObjRef> {
        if slot >= self.stack.len() {
            return Err(DecodeError::InvalidSlot(slot).into());
        }

        let position = self
            .open_up_values
            .partition_point(|u| self.open_slot(*u).map_or(false, |s| s < slot));

        if let Some(existing) = self.open_up_values.get(position).copied() {
            if self.open_slot(existing) == Some(slot) {
                return Ok(existing);
            }
        }

        let up_value = self.heap.alloc(Object::UpValue(UpValue::Open(slot)));
        self.open_up_values.insert(position, up_value);
        Ok(up_value)
    }

    // Move every variable at or above `last` off the stack and into its up-value.
    fn close_up_values(&mut self, last: usize) {
        while let Some(up_value) = self.open_up_values.last().copied() {
            match self.open_slot(up_value) {
                Some(slot) if slot >= last => {
                    let value = *self.stack.at(slot);
                    if let Some(cell) = self.heap.as_up_value_mut(up_value) {
                        *cell = UpValue::Closed(value);
                    }
                    self.open_up_values.pop();
                }
                _ => break,
            }
        }
    }

    ///////////////////////////////////////////////////////
    // Closure creation
    ///////////////////////////////////////////////////////

    fn create_closure(&mut self, instruction: Instruction) -> Result<()> {
        let index = instruction.operand as usize;
        let constant = self.read_constant(index)?;

        let (function, up_value_count) = match constant
            .as_object()
            .and_then(|r| self.heap.as_function(r).map(|f| (r, f.up_value_count)))
        {
            Some(found) => found,
            None => return Err(DecodeError::InvalidConstant(index).into()),
        };

        let mut up_values = Vec::with_capacity(up_value_count);
        for _ in 0..up_value_count {
            let is_local = self.read_byte()?;
            let index = match instruction.op_code {
                OpCode::ClosureLong => self.read_u24()? as usize,
                _ => self.read_byte()? as usize,
            };

            let up_value = if is_local == 1 {
                self.capture_up_value(self.frame.stack_base + index)?
            } else {
                self.current_up_value(index)?
            };
            up_values.push(up_value);
        }

        let closure = self
            .heap
            .alloc(Object::Closure(closure::Closure::new(function, up_values)));
        self.push(Value::Object(closure))
    }

    ///////////////////////////////////////////////////////
    // Calls
    ///////////////////////////////////////////////////////

    fn call_value(&mut self, arg_count: usize) -> Result<()> {
        let callee = *self.peek(arg_count);
        let r = match callee.as_object() {
            Some(r) => r,
            None => return self.runtime_error(RuntimeError::NonCallable),
        };

        let kind = match self.heap.get(r) {
            Object::Closure(_) => Callee::Closure,
            Object::BoundMethod(bound) => Callee::BoundMethod(*bound),
            Object::Class(_) => Callee::Class,
            Object::Native(_) => Callee::Native,
            _ => Callee::Other,
        };

        match kind {
            Callee::Closure => self.call_closure(r, arg_count),
            Callee::BoundMethod(bound) => {
                // the receiver takes the callee's slot and becomes local 0
                let slot = self.slot_below_top(arg_count);
                self.stack.set(slot, bound.receiver);
                self.call_closure(bound.method, arg_count)
            }
            Callee::Class => self.instantiate(r, arg_count),
            Callee::Native => self.call_native(r, arg_count),
            Callee::Other => self.runtime_error(RuntimeError::NonCallable),
        }
    }

    fn function_of(&self, closure: ObjRef) -> Option<&Function> {
        self.heap
            .as_closure(closure)
            .and_then(|c| self.heap.as_function(c.function))
    }

    fn call_closure(&mut self, closure: ObjRef, arg_count: usize) -> Result<()> {
        let (arity, chunk) = match self.function_of(closure) {
            Some(function) => (function.arity, function.chunk.clone()),
            None => return self.runtime_error(RuntimeError::NonCallable),
        };

        if arg_count != arity {
            return self.runtime_error(error::arity_mismatch(Arity::Exactly(arity), arg_count));
        }

        if self.frames.len() + 1 >= FRAMES_MAX {
            return self.runtime_error(RuntimeError::StackOverflow);
        }

        let stack_base = self.slot_below_top(arg_count);
        let frame = CallFrame::function(closure, chunk, stack_base);
        let caller = std::mem::replace(&mut self.frame, frame);
        self.frames.push(caller);

        log::trace!("entered frame {} at stack base {}", self.frames.len(), stack_base);
        Ok(())
    }

    fn call_native(&mut self, native: ObjRef, arg_count: usize) -> Result<()> {
        let (arity, implementation) = match self.heap.as_native(native) {
            Some(native) => (native.arity, native.implementation()),
            None => return self.runtime_error(RuntimeError::NonCallable),
        };

        if !arity.accepts(arg_count) {
            return self.runtime_error(error::arity_mismatch(arity, arg_count));
        }

        let first_argument = self.stack.len() - arg_count;
        let result = implementation(&mut *self.heap, &self.stack.as_slice()[first_argument..]);

        match result {
            Ok(value) => {
                // drop the arguments and the callee
                self.stack.truncate(first_argument - 1);
                self.push(value)
            }
            Err(message) => self.runtime_error(error::native_error(message)),
        }
    }

    fn instantiate(&mut self, class: ObjRef, arg_count: usize) -> Result<()> {
        let instance = self
            .heap
            .alloc(Object::Instance(class::Instance::new(class)));
        let slot = self.slot_below_top(arg_count);
        self.stack.set(slot, Value::Object(instance));

        let initializer = self
            .heap
            .as_class(class)
            .and_then(|c| c.find_method(self.init_string));

        match initializer {
            Some(Value::Object(initializer)) => self.call_closure(initializer, arg_count),
            _ if arg_count != 0 => {
                self.runtime_error(error::arity_mismatch(Arity::Exactly(0), arg_count))
            }
            _ => Ok(()),
        }
    }

    fn invoke(&mut self, name: ObjRef, arg_count: usize) -> Result<()> {
        let receiver = *self.peek(arg_count);

        let (field, class) = match receiver.as_object().and_then(|r| self.heap.as_instance(r)) {
            Some(instance) => (instance.fields.get(&name).copied(), instance.class),
            None => return self.runtime_error(RuntimeError::NoMethods),
        };

        // a field holding a callable shadows the method
        if let Some(field) = field {
            let slot = self.slot_below_top(arg_count);
            self.stack.set(slot, field);
            return self.call_value(arg_count);
        }

        self.invoke_from_class(class, name, arg_count)
    }

    fn invoke_from_class(&mut self, class: ObjRef, name: ObjRef, arg_count: usize) -> Result<()> {
        match self.heap.as_class(class).and_then(|c| c.find_method(name)) {
            Some(Value::Object(method)) => self.call_closure(method, arg_count),
            _ => self.runtime_error(error::undefined_property(self.name_of(name))),
        }
    }

    fn super_invoke(&mut self, name: ObjRef, arg_count: usize) -> Result<()> {
        let superclass = self.pop_class()?;
        self.invoke_from_class(superclass, name, arg_count)
    }

    // Returns true once the script frame returned
    fn return_from_frame(&mut self) -> Result<bool> {
        let result = self.pop();

        if self.frame.is_script() {
            let text = self.print(&result);
            writeln!(self.out, "{}", text)?;
            self.stack.clear();
            return Ok(true);
        }

        let stack_base = self.frame.stack_base;
        self.close_up_values(stack_base);

        match self.frames.pop() {
            Some(caller) => self.frame = caller,
            None => return Ok(true),
        }

        self.stack.truncate(stack_base);
        self.push(result)?;
        Ok(false)
    }

    ///////////////////////////////////////////////////////
    // Classes and instances
    ///////////////////////////////////////////////////////

    fn pop_class(&mut self) -> Result<ObjRef> {
        match self.peek(0).as_object() {
            Some(r) if self.heap.as_class(r).is_some() => {
                self.pop();
                Ok(r)
            }
            _ => self.runtime_error(RuntimeError::InvalidSuperclass),
        }
    }

    fn create_class(&mut self, index: usize) -> Result<()> {
        let name = self.read_name(index)?;
        let class = self.heap.alloc(Object::Class(class::Class::new(name)));
        self.push(Value::Object(class))
    }

    fn inherit(&mut self) -> Result<()> {
        let methods = match self
            .peek(1)
            .as_object()
            .and_then(|r| self.heap.as_class(r))
        {
            Some(superclass) => superclass.methods.clone(),
            None => return self.runtime_error(RuntimeError::InvalidSuperclass),
        };

        match self
            .peek(0)
            .as_object()
            .and_then(|r| self.heap.as_class_mut(r))
        {
            Some(subclass) => subclass.methods.extend(methods),
            None => return self.runtime_error(RuntimeError::InvalidSuperclass),
        }

        self.pop();
        Ok(())
    }

    fn define_method(&mut self, index: usize) -> Result<()> {
        let name = self.read_name(index)?;
        let method = *self.peek(0);

        match self
            .peek(1)
            .as_object()
            .and_then(|r| self.heap.as_class_mut(r))
        {
            Some(class) => {
                class.methods.insert(name, method);
            }
            None => return Err(DecodeError::InvalidConstant(index).into()),
        }

        self.pop();
        Ok(())
    }

    fn get_property(&mut self, index: usize) -> Result<()> {
        let name = self.read_name(index)?;
        let receiver = *self.peek(0);

        let (field, class) = match receiver.as_object().and_then(|r| self.heap.as_instance(r)) {
            Some(instance) => (instance.fields.get(&name).copied(), instance.class),
            None => return self.runtime_error(RuntimeError::NoProperties),
        };

        match field {
            Some(value) => {
                self.pop();
                self.push(value)
            }
            None => self.bind_method(class, name),
        }
    }

    fn set_property(&mut self, index: usize) -> Result<()> {
        let name = self.read_name(index)?;
        let value = *self.peek(0);

        match self
            .peek(1)
            .as_object()
            .and_then(|r| self.heap.as_instance_mut(r))
        {
            Some(instance) => {
                instance.fields.insert(name, value);
            }
            None => return self.runtime_error(RuntimeError::NoFields),
        }

        // leave the assigned value in place of the instance
        self.pop();
        self.pop();
        self.push(value)
    }

    fn get_super(&mut self, index: usize) -> Result<()> {
        let name = self.read_name(index)?;
        let superclass = self.pop_class()?;
        self.bind_method(superclass, name)
    }

    // Replace the receiver on top of the stack with `class.name` bound to it
    fn bind_method(&mut self, class: ObjRef, name: ObjRef) -> Result<()> {
        let method = match self.heap.as_class(class).and_then(|c| c.find_method(name)) {
            Some(Value::Object(method)) => method,
            _ => return self.runtime_error(error::undefined_property(self.name_of(name))),
        };

        let receiver = *self.peek(0);
        let bound = self
            .heap
            .alloc(Object::BoundMethod(BoundMethod { receiver, method }));
        self.pop();
        self.push(Value::Object(bound))
    }

    ///////////////////////////////////////////////////////
    // Errors and debugging
    ///////////////////////////////////////////////////////

    fn runtime_error<T>(&self, error: RuntimeError) -> Result<T> {
        let trace = StackTrace::new(&self.frames, &self.frame, self.heap);
        log::debug!("runtime error: {} at line {}", error, trace.line());
        Err(Error::RuntimeError { error, trace })
    }

    fn debug_cycle(&self) -> io::Result<()> {
        let stack =
            debug::stack::pretty_print(self.stack.as_slice(), self.frame.stack_base, self.heap);
        let mut stderr = io::stderr();
        writeln!(stderr, "{}", stack)?;

        let mut disassembler = Disassembler::new(stderr, self.heap);
        disassembler.disassemble_instruction(self.frame.chunk(), self.frame.ip)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(chunk: &Chunk, heap: &mut Heap) -> (Result<()>, String) {
        let mut globals = Globals::new();
        let mut stack = ValueStack::default();
        let mut out = Vec::new();
        let result = Instance::interpret(chunk, heap, &mut globals, &mut stack, &mut out, false);
        (result, String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn test_arithmetic() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Number(1.2), 1);
        chunk.write_constant(Value::Number(3.4), 1);
        chunk.write_opcode(OpCode::Add, 1);
        chunk.write_constant(Value::Number(5.6), 1);
        chunk.write_opcode(OpCode::Divide, 1);
        chunk.write_opcode(OpCode::Negate, 1);
        chunk.write_opcode(OpCode::Return, 1);

        let (result, out) = run(&chunk, &mut heap);
        assert!(result.is_ok());
        assert_eq!(out, format!("{}\n", number::format(-((1.2 + 3.4) / 5.6))));
    }

    #[test]
    fn test_negate_non_number() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write_opcode(OpCode::Nil, 4);
        chunk.write_opcode(OpCode::Negate, 4);
        chunk.write_opcode(OpCode::Return, 4);

        let (result, out) = run(&chunk, &mut heap);
        assert_matches!(
            result,
            Err(Error::RuntimeError { error: RuntimeError::OperandMustBeNumber, .. })
        );
        assert_eq!(out, "");
    }

    #[test]
    fn test_jump_if_false_keeps_condition() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write_opcode(OpCode::False, 1);
        let jump = chunk.write_jump(OpCode::JumpIfFalse, 1);
        chunk.write_opcode(OpCode::Pop, 1);
        chunk.write_opcode(OpCode::True, 1);
        chunk.patch_jump(jump).unwrap();
        chunk.write_opcode(OpCode::Return, 1);

        let (result, out) = run(&chunk, &mut heap);
        assert!(result.is_ok());
        assert_eq!(out, "false\n");
    }

    #[test]
    fn test_running_off_the_end() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write_opcode(OpCode::Nil, 1);

        let (result, _) = run(&chunk, &mut heap);
        assert_matches!(result, Err(Error::CorruptChunk(DecodeError::Truncated(1))));
    }

    #[test]
    fn test_invalid_constant() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write_opcode(OpCode::Constant, 1);
        chunk.write(3, 1);

        let (result, _) = run(&chunk, &mut heap);
        assert_matches!(result, Err(Error::CorruptChunk(DecodeError::InvalidConstant(3))));
    }

    #[test]
    fn test_stack_underflow_is_corrupt_chunk() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        chunk.write_opcode(OpCode::Add, 1);
        chunk.write_opcode(OpCode::Return, 1);

        let (result, out) = run(&chunk, &mut heap);
        assert_matches!(result, Err(Error::CorruptChunk(DecodeError::StackUnderflow(0))));
        assert_eq!(out, "");

        let mut chunk = Chunk::new();
        chunk.write_opcode(OpCode::CloseUpValue, 1);

        let (result, _) = run(&chunk, &mut heap);
        assert_matches!(result, Err(Error::CorruptChunk(DecodeError::StackUnderflow(0))));

        // one operand short for the binary op at offset 2
        let mut chunk = Chunk::new();
        chunk.write_opcode(OpCode::True, 1);
        chunk.write_opcode(OpCode::True, 1);
        chunk.write_opcode(OpCode::Equal, 1);
        chunk.write_opcode(OpCode::Equal, 1);
        chunk.write_opcode(OpCode::Return, 1);

        let (result, _) = run(&chunk, &mut heap);
        assert_matches!(result, Err(Error::CorruptChunk(DecodeError::StackUnderflow(3))));
    }
}
