pub mod chunk;

use std::convert::TryFrom;
use thiserror::Error;

/// Largest constant (or slot) index that fits the short operand form.
pub const SHORT_OPERAND_MAX: usize = u8::MAX as usize;
/// Largest index addressable through the 24-bit operand of the `*_LONG` forms.
pub const LONG_OPERAND_MAX: usize = (1 << 24) - 1;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Unknown opcode {0} at offset {1}")]
    UnknownOpCode(u8, usize),
    #[error("Instruction at offset {0} is truncated")]
    Truncated(usize),
    #[error("Constant {0} is missing or has the wrong type")]
    InvalidConstant(usize),
    #[error("Slot {0} is out of range")]
    InvalidSlot(usize),
    #[error("Jump at offset {0} leaves the chunk")]
    InvalidJump(usize),
    #[error("Instruction at offset {0} needs more operands than the stack holds")]
    StackUnderflow(usize),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("Jump distance {0} does not fit into 16 bits")]
    JumpTooLarge(usize),
}

macro_rules! op_codes {
    ($($variant:ident => $name:literal),* $(,)?) => {
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum OpCode {
            $($variant),*
        }

        const ALL_OP_CODES: &[OpCode] = &[$(OpCode::$variant),*];

        impl OpCode {
            pub fn name(self) -> &'static str {
                match self {
                    $(OpCode::$variant => $name),*
                }
            }
        }
    };
}

op_codes! {
    Constant => "OP_CONSTANT",
    ConstantLong => "OP_CONSTANT_LONG",
    Nil => "OP_NIL",
    True => "OP_TRUE",
    False => "OP_FALSE",
    Pop => "OP_POP",
    GetLocal => "OP_GET_LOCAL",
    GetLocalLong => "OP_GET_LOCAL_LONG",
    SetLocal => "OP_SET_LOCAL",
    SetLocalLong => "OP_SET_LOCAL_LONG",
    GetGlobal => "OP_GET_GLOBAL",
    GetGlobalLong => "OP_GET_GLOBAL_LONG",
    DefineGlobal => "OP_DEFINE_GLOBAL",
    DefineGlobalLong => "OP_DEFINE_GLOBAL_LONG",
    SetGlobal => "OP_SET_GLOBAL",
    SetGlobalLong => "OP_SET_GLOBAL_LONG",
    GetUpValue => "OP_GET_UPVALUE",
    GetUpValueLong => "OP_GET_UPVALUE_LONG",
    SetUpValue => "OP_SET_UPVALUE",
    SetUpValueLong => "OP_SET_UPVALUE_LONG",
    GetProperty => "OP_GET_PROPERTY",
    SetProperty => "OP_SET_PROPERTY",
    GetSuper => "OP_GET_SUPER",
    Equal => "OP_EQUAL",
    Greater => "OP_GREATER",
    Less => "OP_LESS",
    Add => "OP_ADD",
    Subtract => "OP_SUBTRACT",
    Multiply => "OP_MULTIPLY",
    Divide => "OP_DIVIDE",
    Not => "OP_NOT",
    Negate => "OP_NEGATE",
    Print => "OP_PRINT",
    Jump => "OP_JUMP",
    JumpIfFalse => "OP_JUMP_IF_FALSE",
    Loop => "OP_LOOP",
    Call => "OP_CALL",
    Invoke => "OP_INVOKE",
    SuperInvoke => "OP_SUPER_INVOKE",
    Closure => "OP_CLOSURE",
    ClosureLong => "OP_CLOSURE_LONG",
    CloseUpValue => "OP_CLOSE_UPVALUE",
    Return => "OP_RETURN",
    Class => "OP_CLASS",
    Inherit => "OP_INHERIT",
    Method => "OP_METHOD",
}

/// The shape of the operand that trails an opcode in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    // 1 byte index
    Short,
    // 3 byte little endian index
    Long,
    // 2 byte little endian branch distance
    Jump,
    // 1 byte name constant followed by 1 byte argument count
    Invoke,
}

impl Operand {
    pub fn width(self) -> usize {
        match self {
            Operand::None => 0,
            Operand::Short => 1,
            Operand::Long => 3,
            Operand::Jump => 2,
            Operand::Invoke => 2,
        }
    }
}

impl OpCode {
    pub fn operand(self) -> Operand {
        use OpCode::*;

        match self {
            Constant | GetLocal | SetLocal | GetGlobal | DefineGlobal | SetGlobal | GetUpValue
            | SetUpValue | GetProperty | SetProperty | GetSuper | Call | Closure | Class
            | Method => Operand::Short,
            ConstantLong | GetLocalLong | SetLocalLong | GetGlobalLong | DefineGlobalLong
            | SetGlobalLong | GetUpValueLong | SetUpValueLong | ClosureLong => Operand::Long,
            Jump | JumpIfFalse | Loop => Operand::Jump,
            Invoke | SuperInvoke => Operand::Invoke,
            _ => Operand::None,
        }
    }

    /// The paired wide form of a short-operand opcode, if there is one.
    pub fn long_form(self) -> Option<OpCode> {
        use OpCode::*;

        match self {
            Constant => Some(ConstantLong),
            GetLocal => Some(GetLocalLong),
            SetLocal => Some(SetLocalLong),
            GetGlobal => Some(GetGlobalLong),
            DefineGlobal => Some(DefineGlobalLong),
            SetGlobal => Some(SetGlobalLong),
            GetUpValue => Some(GetUpValueLong),
            SetUpValue => Some(SetUpValueLong),
            Closure => Some(ClosureLong),
            _ => None,
        }
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(byte: u8) -> std::result::Result<Self, Self::Error> {
        ALL_OP_CODES.get(byte as usize).copied().ok_or(byte)
    }
}

/// A decoded instruction.
///
/// Short and long forms decode into the same `u32` operand so handlers never
/// need to know how wide the operand was in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op_code: OpCode,
    pub operand: u32,
    // only meaningful for INVOKE and SUPER_INVOKE
    pub arg_count: u8,
}

impl Instruction {
    /// How many values the instruction reads from the top of the stack.
    pub fn stack_operands(&self) -> usize {
        use OpCode::*;

        match self.op_code {
            Constant | ConstantLong | Nil | True | False | GetLocal | GetLocalLong | GetGlobal
            | GetGlobalLong | GetUpValue | GetUpValueLong | Jump | Loop | Closure
            | ClosureLong | Class => 0,
            Pop | SetLocal | SetLocalLong | DefineGlobal | DefineGlobalLong | SetGlobal
            | SetGlobalLong | SetUpValue | SetUpValueLong | GetProperty | Not | Negate
            | Print | JumpIfFalse | CloseUpValue | Return => 1,
            SetProperty | GetSuper | Equal | Greater | Less | Add | Subtract | Multiply
            | Divide | Inherit | Method => 2,
            // the callee sits below its arguments
            Call => self.operand as usize + 1,
            Invoke => self.arg_count as usize + 1,
            // the superclass sits on top of the arguments
            SuperInvoke => self.arg_count as usize + 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_code_byte_roundtrip() {
        for op in ALL_OP_CODES {
            assert_eq!(OpCode::try_from(u8::from(*op)), Ok(*op));
        }
        assert_eq!(OpCode::try_from(ALL_OP_CODES.len() as u8), Err(46));
    }

    #[test]
    fn test_stack_operands() {
        let instruction = |op_code, operand, arg_count| Instruction {
            op_code,
            operand,
            arg_count,
        };

        assert_eq!(instruction(OpCode::Constant, 7, 0).stack_operands(), 0);
        assert_eq!(instruction(OpCode::Return, 0, 0).stack_operands(), 1);
        assert_eq!(instruction(OpCode::Add, 0, 0).stack_operands(), 2);
        assert_eq!(instruction(OpCode::Call, 3, 0).stack_operands(), 4);
        assert_eq!(instruction(OpCode::Invoke, 1, 2).stack_operands(), 3);
        assert_eq!(instruction(OpCode::SuperInvoke, 1, 2).stack_operands(), 4);
    }

    #[test]
    fn test_long_forms_carry_long_operands() {
        for op in ALL_OP_CODES {
            if let Some(long) = op.long_form() {
                assert_eq!(op.operand(), Operand::Short, "{:?}", op);
                assert_eq!(long.operand(), Operand::Long, "{:?}", long);
            }
        }
    }
}
