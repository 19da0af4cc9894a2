// Implementation of the value stack used by the VM
pub const FRAMES_MAX: usize = 64;
pub const STACK_MAX: usize = FRAMES_MAX * 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overflow;

// A stack with a fixed capacity
#[derive(Debug)]
pub struct Stack<V> {
    cap: usize,
    repr: Vec<V>,
}

impl<V> Stack<V> {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            repr: Vec::with_capacity(cap),
        }
    }

    // Push a value to the stack.
    // Fails if the push would exceed the stack's capacity.
    #[inline]
    pub fn push(&mut self, v: V) -> Result<(), Overflow> {
        if self.repr.len() < self.cap {
            self.repr.push(v);
            Ok(())
        } else {
            Err(Overflow)
        }
    }

    // Pop from the top of the stack.
    // The caller has to make sure that the stack is not empty.
    #[inline]
    pub fn pop(&mut self) -> V {
        match self.repr.pop() {
            Some(v) => v,
            None => panic!("Stack underflow"),
        }
    }

    // Peek into the stack at the position that is `distance` elements away from the stack top.
    //
    // | 10 | <- top
    // |----|
    // | 12 |
    // |----|
    // | 13 |
    // |----|
    // | 14 |
    // |----|
    //
    // Given the above stack `peek(2)` would return 13.
    // If distance is greater than the size of the stack the function will panic.
    #[inline]
    pub fn peek(&self, distance: usize) -> &V {
        &self.repr[self.repr.len() - distance - 1]
    }

    #[inline]
    pub fn at(&self, index: usize) -> &V {
        &self.repr[index]
    }

    #[inline]
    pub fn set(&mut self, index: usize, v: V) {
        self.repr[index] = v
    }

    pub fn len(&self) -> usize {
        self.repr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repr.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn truncate(&mut self, len: usize) {
        self.repr.truncate(len)
    }

    pub fn clear(&mut self) {
        self.repr.clear()
    }

    // returns the stack elements in the order they appear on the stack from bottom to top
    pub fn as_slice(&self) -> &[V] {
        &self.repr
    }
}

impl<V> Default for Stack<V> {
    fn default() -> Stack<V> {
        Stack::new(STACK_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::value::Value;

    #[test]
    fn test_stack_push() {
        let mut stack: Stack<Value> = Stack::default();

        stack.push(Value::Bool(true)).unwrap();
        stack.push(Value::Bool(false)).unwrap();

        assert_eq!(stack.as_slice(), &[Value::Bool(true), Value::Bool(false)])
    }

    #[test]
    fn test_stack_pop() {
        let mut stack: Stack<Value> = Stack::default();

        stack.push(Value::Bool(true)).unwrap();
        stack.push(Value::Bool(false)).unwrap();

        assert_eq!(stack.pop(), Value::Bool(false));
        assert_eq!(stack.as_slice(), &[Value::Bool(true)]);
    }

    #[test]
    fn test_stack_peek() {
        let mut stack: Stack<Value> = Stack::default();

        stack.push(Value::Bool(true)).unwrap();
        stack.push(Value::Bool(false)).unwrap();
        stack.push(Value::Number(1.0)).unwrap();
        stack.push(Value::Number(2.0)).unwrap();

        assert_eq!(stack.peek(0), &Value::Number(2.0));
        assert_eq!(stack.peek(3), &Value::Bool(true));
    }

    #[test]
    fn test_stack_overflow() {
        let mut stack: Stack<Value> = Stack::new(1);

        assert_eq!(stack.push(Value::Nil), Ok(()));
        assert_eq!(stack.push(Value::Nil), Err(Overflow));
        assert_eq!(stack.len(), 1);
    }
}
