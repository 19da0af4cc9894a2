use super::byte_code::chunk::{AddressType, Chunk};
use super::byte_code::{DecodeError, Instruction, OpCode, Operand};
use super::heap::Heap;
use super::printer::Printer;
use std::io::{self, Write};

pub struct Disassembler<'a, T: Write> {
    writer: T,
    heap: &'a Heap,
}

impl<'a, T: Write> Disassembler<'a, T> {
    pub fn new(writer: T, heap: &'a Heap) -> Self {
        Disassembler { writer, heap }
    }

    pub fn into_inner(self) -> T {
        self.writer
    }

    pub fn disassemble(&mut self, chunk: &Chunk, context: &str) -> io::Result<()> {
        let mut address: usize = 0;

        writeln!(self.writer, "== {} ==", context)?;

        while address < chunk.len() {
            address = self.disassemble_instruction(chunk, address)?;
        }
        Ok(())
    }

    /// Write the instruction at `address` and return the address of the next one.
    pub fn disassemble_instruction(
        &mut self,
        chunk: &Chunk,
        address: AddressType,
    ) -> io::Result<AddressType> {
        write!(self.writer, "{:04} ", address)?;

        if address > 0 && !chunk.starts_line(address) {
            self.writer.write_all("   | ".as_bytes())?;
        } else {
            write!(self.writer, "{:4} ", chunk.line_for(address).unwrap_or(0))?;
        }

        match chunk.decode(address) {
            Ok((instruction, next)) => self.disassemble_decoded(chunk, instruction, address, next),
            Err(DecodeError::UnknownOpCode(byte, _)) => {
                writeln!(self.writer, "Unknown opcode {}", byte)?;
                Ok(address + 1)
            }
            Err(e) => {
                writeln!(self.writer, "{}", e)?;
                Ok(chunk.len())
            }
        }
    }

    fn disassemble_decoded(
        &mut self,
        chunk: &Chunk,
        instruction: Instruction,
        address: AddressType,
        next: AddressType,
    ) -> io::Result<AddressType> {
        use OpCode::*;

        let name = instruction.op_code.name();
        let operand = instruction.operand;

        match instruction.op_code {
            Constant | ConstantLong | GetGlobal | GetGlobalLong | DefineGlobal
            | DefineGlobalLong | SetGlobal | SetGlobalLong | GetProperty | SetProperty
            | GetSuper | Class | Method => {
                let constant = self.constant(chunk, operand as usize);
                writeln!(self.writer, "{:<21} {:4} '{}'", name, operand, constant)?;
                Ok(next)
            }
            GetLocal | GetLocalLong | SetLocal | SetLocalLong | GetUpValue | GetUpValueLong
            | SetUpValue | SetUpValueLong | Call => {
                writeln!(self.writer, "{:<21} {:4}", name, operand)?;
                Ok(next)
            }
            Jump | JumpIfFalse => {
                let target = next + operand as usize;
                writeln!(self.writer, "{:<21} {:4} -> {}", name, address, target)?;
                Ok(next)
            }
            Loop => {
                let target = next.saturating_sub(operand as usize);
                writeln!(self.writer, "{:<21} {:4} -> {}", name, address, target)?;
                Ok(next)
            }
            Invoke | SuperInvoke => {
                let constant = self.constant(chunk, operand as usize);
                writeln!(
                    self.writer,
                    "{:<21} ({} args) {:4} '{}'",
                    name, instruction.arg_count, operand, constant
                )?;
                Ok(next)
            }
            Closure | ClosureLong => self.disassemble_closure(chunk, instruction, next),
            _ => {
                writeln!(self.writer, "{}", name)?;
                Ok(next)
            }
        }
    }

    fn disassemble_closure(
        &mut self,
        chunk: &Chunk,
        instruction: Instruction,
        next: AddressType,
    ) -> io::Result<AddressType> {
        let operand = instruction.operand;
        let function = chunk.constants().get(operand as usize).copied();
        writeln!(
            self.writer,
            "{:<21} {:4} {}",
            instruction.op_code.name(),
            operand,
            self.constant(chunk, operand as usize)
        )?;

        let up_value_count = function
            .and_then(|f| f.as_object())
            .and_then(|r| self.heap.as_function(r))
            .map(|f| f.up_value_count)
            .unwrap_or(0);
        let index_width = instruction.op_code.operand().width();

        let mut address = next;
        for _ in 0..up_value_count {
            let is_local = chunk.read_byte(address).unwrap_or(0);
            let index = match instruction.op_code.operand() {
                Operand::Long => chunk.read_u24(address + 1).unwrap_or(0),
                _ => chunk.read_byte(address + 1).unwrap_or(0) as u32,
            };
            writeln!(
                self.writer,
                "{:04}    |                       {} {}",
                address,
                if is_local == 1 { "local" } else { "upvalue" },
                index
            )?;
            address += 1 + index_width;
        }
        Ok(address)
    }

    fn constant(&self, chunk: &Chunk, index: usize) -> String {
        match chunk.constants().get(index) {
            Some(value) => Printer::new(self.heap).print(value),
            None => String::from("<invalid constant>"),
        }
    }
}

/// Disassemble `chunk` into a string.
pub fn disassemble(chunk: &Chunk, heap: &Heap, context: &str) -> String {
    let mut disassembler = Disassembler::new(Vec::new(), heap);
    // writing into a vector can't fail
    let _ = disassembler.disassemble(chunk, context);
    String::from_utf8_lossy(&disassembler.into_inner()).into_owned()
}
