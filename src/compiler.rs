pub mod error;
pub mod parser;
pub mod scanner;

use crate::vm::byte_code::chunk::Chunk;
use crate::vm::heap::Heap;
pub use error::Error;
use parser::Parser;

pub type Result<T> = std::result::Result<T, Error>;

/// Compile the expression in `source` into `chunk`.
///
/// String literals are interned into `heap`. On failure the chunk holds
/// partial code and must not be run.
pub fn compile(source: &str, heap: &mut Heap, chunk: &mut Chunk) -> Result<()> {
    let tokens = scanner::scan(source);
    let result = Parser::new(tokens, heap, chunk).parse();

    match &result {
        Ok(_) => log::debug!(
            "compiled {} bytes and {} constants",
            chunk.len(),
            chunk.constants().len()
        ),
        Err(e) => log::debug!("compilation failed: {}", e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vm::byte_code::OpCode;
    use crate::vm::value::Value;

    fn compile_ok(source: &str) -> (Chunk, Heap) {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        compile(source, &mut heap, &mut chunk).unwrap();
        (chunk, heap)
    }

    fn ops(chunk: &Chunk) -> Vec<OpCode> {
        let mut address = 0;
        let mut result = vec![];
        while address < chunk.len() {
            let (instruction, next) = chunk.decode(address).unwrap();
            result.push(instruction.op_code);
            address = next;
        }
        result
    }

    #[test]
    fn test_compile_precedence() {
        let (chunk, _) = compile_ok("1 + 2 * 3");

        assert_eq!(
            ops(&chunk),
            vec![
                OpCode::Constant,
                OpCode::Constant,
                OpCode::Constant,
                OpCode::Multiply,
                OpCode::Add,
                OpCode::Return
            ]
        );
        assert_eq!(
            chunk.constants(),
            &[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]
        );
    }

    #[test]
    fn test_compile_grouping_and_unary() {
        let (chunk, _) = compile_ok("-(1 - 2)");
        assert_eq!(
            ops(&chunk),
            vec![
                OpCode::Constant,
                OpCode::Constant,
                OpCode::Subtract,
                OpCode::Negate,
                OpCode::Return
            ]
        );
    }

    #[test]
    fn test_compile_derived_comparisons() {
        let (chunk, _) = compile_ok("1 <= 2");
        assert_eq!(
            ops(&chunk),
            vec![
                OpCode::Constant,
                OpCode::Constant,
                OpCode::Greater,
                OpCode::Not,
                OpCode::Return
            ]
        );

        let (chunk, _) = compile_ok("1 != 2");
        assert_eq!(ops(&chunk)[2..4], [OpCode::Equal, OpCode::Not]);

        let (chunk, _) = compile_ok("1 >= 2");
        assert_eq!(ops(&chunk)[2..4], [OpCode::Less, OpCode::Not]);
    }

    #[test]
    fn test_compile_string_literal_is_interned() {
        let (chunk, mut heap) = compile_ok("\"abc\"");
        let expected = heap.string_value("abc");
        assert_eq!(chunk.constants(), &[expected]);
    }

    #[test]
    fn test_compile_records_lines() {
        let (chunk, _) = compile_ok("1 +\n\n2");
        assert_eq!(chunk.line_for(0), Some(1));
        assert_eq!(chunk.line_for(2), Some(3));
    }

    #[test]
    fn test_compile_errors() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();

        let e = compile("1 +", &mut heap, &mut chunk).unwrap_err();
        assert_eq!(e.to_string(), "[line 1] Error at end: Expect expression.");

        let mut chunk = Chunk::new();
        let e = compile("(1", &mut heap, &mut chunk).unwrap_err();
        assert_eq!(
            e.to_string(),
            "[line 1] Error at end: Expect ')' after expression."
        );

        let mut chunk = Chunk::new();
        let e = compile("1 2", &mut heap, &mut chunk).unwrap_err();
        assert_eq!(
            e.to_string(),
            "[line 1] Error at '2': Expect end of expression."
        );

        let mut chunk = Chunk::new();
        let e = compile("1 + @", &mut heap, &mut chunk).unwrap_err();
        assert_eq!(e.to_string(), "[line 1] Error: Unexpected character.");
    }

    #[test]
    fn test_compile_jump_too_far() {
        let mut heap = Heap::new();
        let mut chunk = Chunk::new();
        let operand = vec!["1"; 16_000].join(" + ");
        let source = format!("true and ({})", operand);

        let e = compile(&source, &mut heap, &mut chunk).unwrap_err();
        assert_eq!(
            e.to_string(),
            "[line 1] Error at ')': Too much code to jump over."
        );

        // shorter operands still fit
        let mut chunk = Chunk::new();
        let operand = vec!["1"; 1_000].join(" + ");
        assert!(compile(&format!("false or ({})", operand), &mut heap, &mut chunk).is_ok());
    }
}
