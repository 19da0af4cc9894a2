use super::error::{Error, Location, SyntaxError};
use super::scanner::{Token, TokenKind};
use crate::vm::byte_code::chunk::{AddressType, Chunk, LineNumber};
use crate::vm::byte_code::{OpCode, LONG_OPERAND_MAX};
use crate::vm::heap::Heap;
use crate::vm::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    fn next(self) -> Precedence {
        use Precedence::*;

        match self {
            None => Assignment,
            Assignment => Or,
            Or => And,
            And => Equality,
            Equality => Comparison,
            Comparison => Term,
            Term => Factor,
            Factor => Unary,
            Unary => Call,
            Call => Primary,
            Primary => Primary,
        }
    }

    fn of(kind: TokenKind) -> Precedence {
        match kind {
            TokenKind::Or => Precedence::Or,
            TokenKind::And => Precedence::And,
            TokenKind::BangEqual | TokenKind::EqualEqual => Precedence::Equality,
            TokenKind::Greater
            | TokenKind::GreaterEqual
            | TokenKind::Less
            | TokenKind::LessEqual => Precedence::Comparison,
            TokenKind::Minus | TokenKind::Plus => Precedence::Term,
            TokenKind::Slash | TokenKind::Star => Precedence::Factor,
            _ => Precedence::None,
        }
    }
}

/// Single pass Pratt parser that emits byte code while it parses.
pub struct Parser<'a, 'h> {
    tokens: Vec<Token<'a>>,
    next: usize,
    current: Token<'a>,
    previous: Token<'a>,
    heap: &'h mut Heap,
    chunk: &'h mut Chunk,
    errors: Vec<SyntaxError>,
    // suppress follow up errors until the parser synchronizes
    panic_mode: bool,
}

impl<'a, 'h> Parser<'a, 'h> {
    pub fn new(tokens: Vec<Token<'a>>, heap: &'h mut Heap, chunk: &'h mut Chunk) -> Self {
        let start = Token::new(TokenKind::Eof, "", 1, 0);

        Self {
            tokens,
            next: 0,
            current: start,
            previous: start,
            heap,
            chunk,
            errors: vec![],
            panic_mode: false,
        }
    }

    /// Parse a single expression followed by the end of input.
    pub fn parse(mut self) -> Result<(), Error> {
        self.advance();
        self.expression();
        self.consume(TokenKind::Eof, "Expect end of expression.");
        self.emit_op(OpCode::Return);

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::SyntaxErrors(self.errors))
        }
    }

    ///////////////////////////////////////////////////////
    // Token stream
    ///////////////////////////////////////////////////////

    fn advance(&mut self) {
        self.previous = self.current;

        // the final eof token is sticky
        while let Some(token) = self.tokens.get(self.next).copied() {
            self.next += 1;
            self.current = token;

            if token.kind != TokenKind::Error {
                break;
            }
            self.error_at_current(token.lexeme);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
        } else {
            self.error_at_current(message);
        }
    }

    ///////////////////////////////////////////////////////
    // Expressions
    ///////////////////////////////////////////////////////

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();

        if !self.prefix(self.previous.kind) {
            self.error("Expect expression.");
            return;
        }

        while precedence <= Precedence::of(self.current.kind) {
            self.advance();
            self.infix(self.previous.kind);
        }
    }

    // Returns false if `kind` can't start an expression
    fn prefix(&mut self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::LeftParen => self.grouping(),
            TokenKind::Minus | TokenKind::Bang => self.unary(),
            TokenKind::Number => self.number(),
            TokenKind::String => self.string(),
            TokenKind::False | TokenKind::True | TokenKind::Nil => self.literal(),
            _ => return false,
        }
        true
    }

    fn infix(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::And => self.and(),
            TokenKind::Or => self.or(),
            _ => self.binary(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);

        match operator {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            _ => self.emit_op(OpCode::Not),
        }
    }

    fn binary(&mut self) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::of(operator).next());

        match operator {
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::BangEqual => self.emit_ops(OpCode::Equal, OpCode::Not),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => self.emit_ops(OpCode::Less, OpCode::Not),
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => self.emit_ops(OpCode::Greater, OpCode::Not),
            _ => (),
        }
    }

    // `a and b`: leave a falsey `a` on the stack, otherwise evaluate to `b`
    fn and(&mut self) {
        let line = self.line();
        let end_jump = self.chunk.write_jump(OpCode::JumpIfFalse, line);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    // `a or b`: leave a truthy `a` on the stack, otherwise evaluate to `b`
    fn or(&mut self) {
        let line = self.line();
        let else_jump = self.chunk.write_jump(OpCode::JumpIfFalse, line);
        let end_jump = self.chunk.write_jump(OpCode::Jump, line);

        self.patch_jump(else_jump);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }

    fn number(&mut self) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(n) => self.emit_constant(Value::Number(n)),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    fn string(&mut self) {
        let lexeme = self.previous.lexeme;
        let content = &lexeme[1..lexeme.len() - 1];
        let value = self.heap.string_value(content);
        self.emit_constant(value);
    }

    fn literal(&mut self) {
        match self.previous.kind {
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::True => self.emit_op(OpCode::True),
            _ => self.emit_op(OpCode::Nil),
        }
    }

    ///////////////////////////////////////////////////////
    // Code generation
    ///////////////////////////////////////////////////////

    #[inline]
    fn line(&self) -> LineNumber {
        self.previous.line
    }

    fn emit_op(&mut self, op_code: OpCode) {
        let line = self.line();
        self.chunk.write_opcode(op_code, line);
    }

    fn emit_ops(&mut self, first: OpCode, second: OpCode) {
        self.emit_op(first);
        self.emit_op(second);
    }

    fn patch_jump(&mut self, placeholder: AddressType) {
        if self.chunk.patch_jump(placeholder).is_err() {
            self.error("Too much code to jump over.");
        }
    }

    fn emit_constant(&mut self, value: Value) {
        if self.chunk.constants().len() > LONG_OPERAND_MAX {
            self.error("Too many constants in one chunk.");
            return;
        }
        let line = self.line();
        self.chunk.write_constant(value, line);
    }

    ///////////////////////////////////////////////////////
    // Errors
    ///////////////////////////////////////////////////////

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.error_at(token, message);
    }

    fn error_at(&mut self, token: Token, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;

        let location = match token.kind {
            TokenKind::Eof => Location::AtEnd,
            TokenKind::Error => Location::Unknown,
            _ => Location::At(token.lexeme.to_string()),
        };

        self.errors.push(SyntaxError {
            line: token.line,
            span: token.span(),
            location,
            message: message.to_string(),
        });
    }
}
