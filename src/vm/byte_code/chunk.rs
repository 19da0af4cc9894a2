use super::*;
use crate::vm::value::Value;

pub type LineNumber = u32;
pub type AddressType = usize;

// Marks the first offset of a run of bytes that belong to the same source line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineStart {
    pub offset: AddressType,
    pub line: LineNumber,
}

/// A compiled unit of byte code.
///
/// The chunk owns the raw instruction stream, the constants referenced by the
/// instructions and a run-length encoded table mapping offsets to source lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chunk {
    pub(crate) code: Vec<u8>,
    pub(crate) constants: Vec<Value>,
    pub(crate) lines: Vec<LineStart>,
}

impl Chunk {
    pub fn new() -> Chunk {
        Chunk {
            code: vec![],
            constants: vec![],
            lines: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    pub fn lines(&self) -> &[LineStart] {
        &self.lines
    }

    pub fn write(&mut self, byte: u8, line: LineNumber) -> AddressType {
        let offset = self.code.len();
        self.code.push(byte);

        match self.lines.last() {
            Some(last) if last.line == line => (),
            _ => self.lines.push(LineStart { offset, line }),
        }
        offset
    }

    pub fn write_opcode(&mut self, op_code: OpCode, line: LineNumber) -> AddressType {
        self.write(op_code.into(), line)
    }

    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    /// Add `value` to the constant pool and emit the instruction that loads it.
    pub fn write_constant(&mut self, value: Value, line: LineNumber) -> usize {
        let index = self.add_constant(value);
        self.write_indexed(OpCode::Constant, index, line);
        index
    }

    /// Emit `op_code` with `index` as its operand, switching to the long form
    /// of the opcode when the index does not fit into a single byte.
    ///
    /// Panics if `op_code` has no long form and the index exceeds the short range,
    /// or if the index exceeds the 24 bit range of the long form.
    pub fn write_indexed(&mut self, op_code: OpCode, index: usize, line: LineNumber) {
        if index <= SHORT_OPERAND_MAX {
            self.write_opcode(op_code, line);
            self.write(index as u8, line);
            return;
        }

        let long = match op_code.long_form() {
            Some(long) => long,
            None => panic!("{} has no long form for index {}", op_code.name(), index),
        };
        assert!(index <= LONG_OPERAND_MAX, "operand {} out of range", index);

        self.write_opcode(long, line);
        self.write_u24(index as u32, line);
    }

    pub fn write_u24(&mut self, value: u32, line: LineNumber) {
        self.write((value & 0xff) as u8, line);
        self.write(((value >> 8) & 0xff) as u8, line);
        self.write(((value >> 16) & 0xff) as u8, line);
    }

    /// Emit a forward branch with a placeholder distance and return the
    /// address of the placeholder so it can be patched later.
    pub fn write_jump(&mut self, op_code: OpCode, line: LineNumber) -> AddressType {
        self.write_opcode(op_code, line);
        let placeholder = self.write(0xff, line);
        self.write(0xff, line);
        placeholder
    }

    /// Point the branch whose operand lives at `placeholder` to the current end of the code.
    ///
    /// The placeholder is left untouched if the distance doesn't fit into the operand.
    pub fn patch_jump(&mut self, placeholder: AddressType) -> Result<(), EncodeError> {
        let distance = self.code.len() - placeholder - 2;
        if distance > u16::MAX as usize {
            return Err(EncodeError::JumpTooLarge(distance));
        }

        self.code[placeholder] = (distance & 0xff) as u8;
        self.code[placeholder + 1] = ((distance >> 8) & 0xff) as u8;
        Ok(())
    }

    /// Emit a backward branch to `loop_start`.
    pub fn write_loop(
        &mut self,
        loop_start: AddressType,
        line: LineNumber,
    ) -> Result<(), EncodeError> {
        let distance = self.code.len() + 3 - loop_start;
        if distance > u16::MAX as usize {
            return Err(EncodeError::JumpTooLarge(distance));
        }

        self.write_opcode(OpCode::Loop, line);
        self.write((distance & 0xff) as u8, line);
        self.write(((distance >> 8) & 0xff) as u8, line);
        Ok(())
    }

    #[inline]
    pub fn read_byte(&self, address: AddressType) -> Option<u8> {
        self.code.get(address).copied()
    }

    #[inline]
    pub fn read_constant(&self, index: usize) -> &Value {
        &self.constants[index]
    }

    pub fn read_u24(&self, address: AddressType) -> Option<u32> {
        let bytes = self.code.get(address..address + 3)?;
        Some(bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16)
    }

    fn read_u16(&self, address: AddressType) -> Option<u32> {
        let bytes = self.code.get(address..address + 2)?;
        Some(bytes[0] as u32 | (bytes[1] as u32) << 8)
    }

    /// Decode the instruction starting at `address`.
    ///
    /// Returns the instruction together with the address of the byte that follows its operand.
    /// Trailing upvalue descriptors of `CLOSURE` are not part of the decoded instruction.
    pub fn decode(
        &self,
        address: AddressType,
    ) -> std::result::Result<(Instruction, AddressType), DecodeError> {
        let byte = self
            .read_byte(address)
            .ok_or(DecodeError::Truncated(address))?;
        let op_code =
            OpCode::try_from(byte).map_err(|b| DecodeError::UnknownOpCode(b, address))?;
        let operand_address = address + 1;
        let truncated = || DecodeError::Truncated(address);

        let (operand, arg_count) = match op_code.operand() {
            Operand::None => (0, 0),
            Operand::Short => (self.read_byte(operand_address).ok_or_else(truncated)? as u32, 0),
            Operand::Long => (self.read_u24(operand_address).ok_or_else(truncated)?, 0),
            Operand::Jump => (self.read_u16(operand_address).ok_or_else(truncated)?, 0),
            Operand::Invoke => (
                self.read_byte(operand_address).ok_or_else(truncated)? as u32,
                self.read_byte(operand_address + 1).ok_or_else(truncated)?,
            ),
        };

        let instruction = Instruction {
            op_code,
            operand,
            arg_count,
        };

        Ok((instruction, operand_address + op_code.operand().width()))
    }

    /// Find the source line of the byte at `address`.
    ///
    /// Returns `None` only for an empty chunk.
    pub fn line_for(&self, address: AddressType) -> Option<LineNumber> {
        let idx = self.lines.partition_point(|start| start.offset <= address);
        if idx == 0 {
            None
        } else {
            Some(self.lines[idx - 1].line)
        }
    }

    /// Returns true if the byte at `address` starts a new run in the line table.
    pub fn starts_line(&self, address: AddressType) -> bool {
        self.lines
            .binary_search_by_key(&address, |start| start.offset)
            .is_ok()
    }
}
