use std::cmp::Ordering;
use std::convert::TryFrom;
use std::io::{self, Write};

use crate::memory::{Byte, Memory};
use log::*;
use num_enum::IntoPrimitive;
use num_enum::TryFromPrimitive;
use thiserror::Error;

/// Runtime faults raised by the execution core.
///
/// None of these are recovered mid-run: each one aborts the current run and
/// carries enough context (program counter, opcode, operand) to diagnose it.
#[derive(Debug, Error)]
pub enum Fault {
    /// The byte at the program counter decodes to no known instruction.
    #[error("unknown opcode 0b{opcode:08b} at pc=0x{pc:02X}")]
    UnknownOpcode { pc: usize, opcode: Byte },
    /// A non-ALU instruction was handed to the ALU.
    #[error("unsupported ALU operation `{op}`")]
    UnsupportedOperation { op: &'static str },
    /// The program counter or a computed address left the memory.
    #[error("address 0x{addr:02X} is outside of memory")]
    OutOfBoundsAddress { addr: usize },
    /// An operand named a register the register file does not have.
    #[error("register index {index} out of bounds")]
    InvalidRegister { index: Byte },
    /// DIV or MOD with a zero divisor.
    #[error("division by zero at pc=0x{pc:02X}")]
    DivisionByZero { pc: usize },
    /// The output sink rejected a PRN/PRA write.
    #[error("failed to write to the output sink")]
    Io(#[from] io::Error),
}

pub type Result<T, E = Fault> = std::result::Result<T, E>;

/// Outcome of the most recent CMP, consumed by JEQ/JNE.
///
/// CMP sets exactly one of the three fields; they are never set together.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flags {
    pub equal: bool,
    pub less: bool,
    pub greater: bool,
}

impl Flags {
    /// Records the ordering of `a` relative to `b`, clearing the other bits.
    pub fn compare(&mut self, a: Byte, b: Byte) {
        *self = match a.cmp(&b) {
            Ordering::Equal => Flags {
                equal: true,
                ..Flags::default()
            },
            Ordering::Less => Flags {
                less: true,
                ..Flags::default()
            },
            Ordering::Greater => Flags {
                greater: true,
                ..Flags::default()
            },
        };
    }
}

/// Index of the stack pointer in the register file.
const SP: usize = 7;

/// Emulates an LS-8 CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Processor {
    /// Program counter
    pub pc: usize,
    /// General purpose registers. `reg[7]` is the stack pointer; `reg[0]`
    /// is clobbered by RET (see [`Instruction::RET`]).
    pub reg: [Byte; 8],
    /// Comparison flags
    pub fl: Flags,
    /// Termination flag. Set to true once HLT executes
    pub halted: bool,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor {
    /// Initializes a new CPU with the program counter at 0 and the stack
    /// pointer at 0xF4.
    pub fn new() -> Self {
        let mut reg = [0; 8];
        reg[SP] = 0xF4;
        Self {
            pc: 0,
            reg,
            fl: Flags::default(),
            halted: false,
        }
    }

    /// Reads a register, faulting on an out-of-range index.
    pub fn reg_read(&self, index: Byte) -> Result<Byte> {
        self.reg
            .get(usize::from(index))
            .copied()
            .ok_or(Fault::InvalidRegister { index })
    }

    /// Writes a register, faulting on an out-of-range index.
    pub fn reg_write(&mut self, index: Byte, value: Byte) -> Result<()> {
        match self.reg.get_mut(usize::from(index)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Fault::InvalidRegister { index }),
        }
    }

    /// Decrements the stack pointer, then writes `value` at its new address.
    fn push<const S: usize>(&mut self, memory: &mut Memory<S>, value: Byte) -> Result<()> {
        self.reg[SP] = self.reg[SP].wrapping_sub(1);
        memory.write_byte(usize::from(self.reg[SP]), value)
    }

    /// Reads the byte at the stack pointer, then increments the pointer.
    fn pop<const S: usize>(&mut self, memory: &Memory<S>) -> Result<Byte> {
        let value = memory.read_byte(usize::from(self.reg[SP]))?;
        self.reg[SP] = self.reg[SP].wrapping_add(1);
        Ok(value)
    }

    /// Performs an ALU operation on the registers named by `a` and `b`.
    ///
    /// Arithmetic wraps modulo 256: the registers are true 8-bit cells.
    /// CMP is the only operation that touches the flags, and it sets
    /// exactly one of them. Handing the ALU a non-ALU instruction is an
    /// [`Fault::UnsupportedOperation`].
    pub fn alu(&mut self, op: Instruction, a: Byte, b: Byte) -> Result<()> {
        use Instruction::*;

        let lhs = self.reg_read(a)?;
        let result = match op {
            ADD => lhs.wrapping_add(self.reg_read(b)?),
            SUB => lhs.wrapping_sub(self.reg_read(b)?),
            MUL => lhs.wrapping_mul(self.reg_read(b)?),
            DIV => {
                let rhs = self.reg_read(b)?;
                if rhs == 0 {
                    return Err(Fault::DivisionByZero { pc: self.pc });
                }
                lhs / rhs
            }
            MOD => {
                let rhs = self.reg_read(b)?;
                if rhs == 0 {
                    return Err(Fault::DivisionByZero { pc: self.pc });
                }
                lhs % rhs
            }
            CMP => {
                self.fl.compare(lhs, self.reg_read(b)?);
                return Ok(());
            }
            AND => lhs & self.reg_read(b)?,
            OR => lhs | self.reg_read(b)?,
            XOR => lhs ^ self.reg_read(b)?,
            NOT => !lhs,
            // Bits shifted out are discarded; shifting by 8 or more empties
            // the register.
            SHL => lhs.checked_shl(u32::from(self.reg_read(b)?)).unwrap_or(0),
            SHR => lhs.checked_shr(u32::from(self.reg_read(b)?)).unwrap_or(0),
            INC => lhs.wrapping_add(1),
            DEC => lhs.wrapping_sub(1),
            other => return Err(Fault::UnsupportedOperation { op: other.name() }),
        };
        self.reg_write(a, result)
    }

    /// Executes a single decoded instruction.
    ///
    /// Instructions whose opcode carries the PC bit (CALL, RET, JMP, JEQ,
    /// JNE) reposition `self.pc` themselves; for all others the caller
    /// advances the program counter by the instruction length.
    pub fn execute_instruction<const S: usize, W: Write>(
        &mut self,
        instruction: Instruction,
        a: Byte,
        b: Byte,
        memory: &mut Memory<S>,
        out: &mut W,
    ) -> Result<()> {
        use Instruction::*;

        match instruction {
            NOP => {
                debug!("NOP");
            }
            HLT => {
                self.halted = true;

                debug!("HLT");
            }
            LDI => {
                self.reg_write(a, b)?;

                debug!("LDI r{} {}", a, b);
            }
            LD => {
                let addr = self.reg_read(b)?;
                let value = memory.read_byte(usize::from(addr))?;
                self.reg_write(a, value)?;

                debug!("LD r{} r{}: {}", a, b, value);
            }
            ST => {
                let addr = self.reg_read(a)?;
                memory.write_byte(usize::from(addr), self.reg_read(b)?)?;

                debug!("ST r{} r{}", a, b);
            }
            PRN => {
                let value = self.reg_read(a)?;
                writeln!(out, "{}", value)?;

                debug!("PRN r{}: {}", a, value);
            }
            PRA => {
                let value = self.reg_read(a)?;
                write!(out, "{}", char::from(value))?;

                debug!("PRA r{}: {:?}", a, char::from(value));
            }
            PUSH => {
                let value = self.reg_read(a)?;
                self.push(memory, value)?;

                debug!("PUSH r{}: {}", a, value);
            }
            POP => {
                let value = self.pop(memory)?;
                self.reg_write(a, value)?;

                debug!("POP r{}: {}", a, value);
            }
            CALL => {
                let return_addr = self.pc + 2;
                let return_addr = Byte::try_from(return_addr)
                    .map_err(|_| Fault::OutOfBoundsAddress { addr: return_addr })?;
                self.push(memory, return_addr)?;
                self.pc = usize::from(self.reg_read(a)?);

                debug!("CALL r{}: {} (ret {})", a, self.pc, return_addr);
            }
            RET => {
                // RET pops through register 0: the scratch register does
                // not survive a call/return pair.
                let addr = self.pop(memory)?;
                self.reg[0] = addr;
                self.pc = usize::from(addr);

                debug!("RET: {}", addr);
            }
            JMP => {
                self.pc = usize::from(self.reg_read(a)?);

                debug!("JMP r{}: {}", a, self.pc);
            }
            JEQ => {
                if self.fl.equal {
                    self.pc = usize::from(self.reg_read(a)?);
                } else {
                    self.pc += 2;
                }

                debug!("JEQ r{}: {}", a, self.fl.equal);
            }
            JNE => {
                if !self.fl.equal {
                    self.pc = usize::from(self.reg_read(a)?);
                } else {
                    self.pc += 2;
                }

                debug!("JNE r{}: {}", a, !self.fl.equal);
            }
            op if op.is_alu() => self.alu(op, a, b)?,
            op => return Err(Fault::UnsupportedOperation { op: op.name() }),
        }

        Ok(())
    }

    /// Runs one fetch-decode-execute step.
    ///
    /// Operand bytes are only fetched when the opcode's operand count asks
    /// for them, so a program may end with HLT in the last memory cell.
    pub fn execute<const S: usize, W: Write>(
        &mut self,
        memory: &mut Memory<S>,
        out: &mut W,
    ) -> Result<()> {
        let opcode = memory.read_byte(self.pc)?;
        let instruction = Instruction::try_from(opcode).map_err(|_| Fault::UnknownOpcode {
            pc: self.pc,
            opcode,
        })?;

        let operands = instruction.operands();
        let a = if operands >= 1 {
            memory.read_byte(self.pc + 1)?
        } else {
            0
        };
        let b = if operands >= 2 {
            memory.read_byte(self.pc + 2)?
        } else {
            0
        };

        self.trace(instruction, a, b);
        self.execute_instruction(instruction, a, b, memory, out)?;

        if !instruction.sets_pc() {
            self.pc += operands + 1;
        }

        Ok(())
    }

    /// Run the program until HLT, streaming PRN/PRA output into `out`.
    ///
    /// Returns `Ok(())` on normal termination; any fault aborts the run
    /// and is handed back to the caller.
    pub fn execute_until_halt<const S: usize, W: Write>(
        &mut self,
        memory: &mut Memory<S>,
        out: &mut W,
    ) -> Result<()> {
        while !self.halted {
            self.execute(memory, out)?;
        }

        debug!("program halted at pc=0x{:02X}", self.pc);

        Ok(())
    }

    /// Logs the CPU state before an instruction executes. Debug aid only.
    fn trace(&self, instruction: Instruction, a: Byte, b: Byte) {
        trace!(
            "TRACE: {:02X} | {} {:02X} {:02X} | {:02X} {:02X} {:02X} {:02X} {:02X} {:02X} {:02X} {:02X}",
            self.pc,
            instruction,
            a,
            b,
            self.reg[0],
            self.reg[1],
            self.reg[2],
            self.reg[3],
            self.reg[4],
            self.reg[5],
            self.reg[6],
            self.reg[7],
        );
    }
}

macro_rules! instructions {
    ( $( $( #[doc = $doc:expr] )+ $name:ident = $repr:literal , )+ ) => {
        /// The LS-8 instruction set.
        ///
        /// The opcode byte encodes the instruction's shape: the top two
        /// bits are the operand count (so length = count + 1), bit 4 marks
        /// instructions that reposition the program counter themselves,
        /// and bit 5 marks ALU operations.
        #[repr(u8)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        #[derive(TryFromPrimitive, IntoPrimitive)]
        pub enum Instruction {
            $(
                $( #[doc = $doc] )+
                $name = $repr,
            )+
        }

        impl Instruction {
            pub const ALL: &'static [Self] = &[
                $( Self::$name , )+
            ];

            pub fn name(&self) -> &'static str {
                match self {
                    $( Self::$name => stringify!($name) , )+
                }
            }
        }

        impl ::std::fmt::Display for Instruction {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    $( Self::$name => f.write_str(stringify!($name)) , )+
                }
            }
        }
    }
}

impl Instruction {
    /// Number of operand bytes following the opcode (0-2).
    pub fn operands(self) -> usize {
        usize::from(u8::from(self) >> 6)
    }

    /// True if the instruction's handler sets the program counter itself.
    pub fn sets_pc(self) -> bool {
        u8::from(self) & 0b0001_0000 != 0
    }

    /// True if the instruction is carried out by the ALU.
    pub fn is_alu(self) -> bool {
        u8::from(self) & 0b0010_0000 != 0
    }
}

instructions! {
    /// No operation
    NOP = 0b00000000,
    /// Halt the CPU; the run terminates normally
    HLT = 0b00000001,
    /// Return from subroutine: pop the return address through register 0
    /// and jump to it. Register 0 is clobbered
    RET = 0b00010001,
    /// Push a register's value onto the stack
    PUSH = 0b01000101,
    /// Pop the top of the stack into a register
    POP = 0b01000110,
    /// Print a register's value as a decimal number
    PRN = 0b01000111,
    /// Print a register's value as an ASCII character
    PRA = 0b01001000,
    /// Call the subroutine at the address held in a register
    CALL = 0b01010000,
    /// Jump to the address held in a register
    JMP = 0b01010100,
    /// Jump if the Equal flag is set
    JEQ = 0b01010101,
    /// Jump if the Equal flag is clear
    JNE = 0b01010110,
    /// Increment a register
    INC = 0b01100101,
    /// Decrement a register
    DEC = 0b01100110,
    /// Bitwise NOT of a register, in place
    NOT = 0b01101001,
    /// Load an immediate value into a register
    LDI = 0b10000010,
    /// Load a register from the memory address held in another register
    LD = 0b10000011,
    /// Store a register at the memory address held in another register
    ST = 0b10000100,
    /// Add two registers, result in the first
    ADD = 0b10100000,
    /// Subtract the second register from the first
    SUB = 0b10100001,
    /// Multiply two registers, result in the first
    MUL = 0b10100010,
    /// Integer-divide the first register by the second
    DIV = 0b10100011,
    /// Remainder of the first register divided by the second
    MOD = 0b10100100,
    /// Compare two registers and set exactly one of the flags
    CMP = 0b10100111,
    /// Bitwise AND of two registers
    AND = 0b10101000,
    /// Bitwise OR of two registers
    OR = 0b10101010,
    /// Bitwise XOR of two registers
    XOR = 0b10101011,
    /// Shift the first register left by the second
    SHL = 0b10101100,
    /// Shift the first register right by the second
    SHR = 0b10101101,
}

#[cfg(test)]
mod tests {
    use crate::memory::{Byte, Ram};
    use crate::write_instructions;

    use super::*;
    use color_eyre::eyre::Result;

    fn run(mem: &mut Ram) -> Result<(Processor, String)> {
        let mut cpu = Processor::new();
        let mut out = Vec::new();
        cpu.execute_until_halt(mem, &mut out)?;
        Ok((cpu, String::from_utf8(out)?))
    }

    #[test]
    fn test_instruction_length_matches_top_bits() {
        for instruction in Instruction::ALL {
            let opcode = u8::from(*instruction);
            let expected = usize::from(opcode >> 6) + 1;
            assert_eq!(instruction.operands() + 1, expected, "{}", instruction);
        }
    }

    #[test]
    fn test_pc_bit_set_exactly_for_jumps() {
        use Instruction::*;
        for instruction in Instruction::ALL {
            let expected = matches!(instruction, RET | CALL | JMP | JEQ | JNE);
            assert_eq!(instruction.sets_pc(), expected, "{}", instruction);
        }
    }

    #[test]
    fn test_ldi_prn_round_trip() -> Result<()> {
        use Instruction::*;
        for value in 0..=255u8 {
            let mut mem = Ram::default();
            write_instructions!(mem : 0 => LDI, 0, value, PRN, 0, HLT);

            let (cpu, out) = run(&mut mem)?;
            assert!(cpu.halted);
            assert_eq!(out, format!("{}\n", value));
        }

        Ok(())
    }

    #[test]
    fn test_push_pop_round_trip() -> Result<()> {
        use Instruction::*;
        let mut mem = Ram::default();
        write_instructions!(mem : 0 => LDI, 1, 99, PUSH, 1, POP, 2, HLT);

        let (cpu, _) = run(&mut mem)?;
        assert_eq!(cpu.reg[1], 99);
        assert_eq!(cpu.reg[2], 99);
        assert_eq!(cpu.reg[SP], 0xF4);

        Ok(())
    }

    #[test]
    fn test_push_writes_below_stack_pointer() -> Result<()> {
        use Instruction::*;
        let mut mem = Ram::default();
        write_instructions!(mem : 0 => LDI, 3, 17, PUSH, 3, HLT);

        let (cpu, _) = run(&mut mem)?;
        assert_eq!(cpu.reg[SP], 0xF3);
        assert_eq!(mem.read_byte(0xF3)?, 17);

        Ok(())
    }

    #[test]
    fn test_mul() -> Result<()> {
        let mut cpu = Processor::new();
        cpu.reg[0] = 6;
        cpu.reg[1] = 7;
        cpu.alu(Instruction::MUL, 0, 1)?;

        assert_eq!(cpu.reg[0], 42);

        Ok(())
    }

    #[test]
    fn test_add_wraps_modulo_256() -> Result<()> {
        let mut cpu = Processor::new();
        cpu.reg[0] = 250;
        cpu.reg[1] = 10;
        cpu.alu(Instruction::ADD, 0, 1)?;

        assert_eq!(cpu.reg[0], 4);

        Ok(())
    }

    #[test]
    fn test_cmp_sets_exactly_one_flag() -> Result<()> {
        let cases = [
            (
                5u8,
                5u8,
                Flags {
                    equal: true,
                    less: false,
                    greater: false,
                },
            ),
            (
                3,
                5,
                Flags {
                    equal: false,
                    less: true,
                    greater: false,
                },
            ),
            (
                5,
                3,
                Flags {
                    equal: false,
                    less: false,
                    greater: true,
                },
            ),
        ];

        for (a, b, expected) in cases.iter().copied() {
            let mut cpu = Processor::new();
            cpu.reg[0] = a;
            cpu.reg[1] = b;
            // Stale flags must be cleared by the compare.
            cpu.fl = Flags {
                equal: true,
                less: true,
                greater: true,
            };
            cpu.alu(Instruction::CMP, 0, 1)?;

            assert_eq!(cpu.fl, expected, "{} cmp {}", a, b);
        }

        Ok(())
    }

    #[test]
    fn test_division_by_zero_faults() {
        let mut cpu = Processor::new();
        cpu.reg[0] = 8;
        cpu.reg[1] = 0;

        let err = cpu.alu(Instruction::DIV, 0, 1).unwrap_err();
        assert!(matches!(err, Fault::DivisionByZero { .. }));
    }

    #[test]
    fn test_alu_rejects_non_alu_instruction() {
        let mut cpu = Processor::new();

        let err = cpu.alu(Instruction::PRN, 0, 1).unwrap_err();
        assert!(matches!(err, Fault::UnsupportedOperation { op: "PRN" }));
    }

    #[test]
    fn test_shift_by_register_width_clears() -> Result<()> {
        let mut cpu = Processor::new();
        cpu.reg[0] = 0xFF;
        cpu.reg[1] = 8;
        cpu.alu(Instruction::SHL, 0, 1)?;

        assert_eq!(cpu.reg[0], 0);

        Ok(())
    }

    #[test]
    fn test_call_and_ret() -> Result<()> {
        use Instruction::*;
        let mut mem = Ram::default();
        // The subroutine at 10 doubles r0 and prints it before returning,
        // since RET clobbers r0 with the return address.
        write_instructions!(mem : 0 => LDI, 0, 21, LDI, 1, 10, CALL, 1, HLT);
        write_instructions!(mem : 10 => ADD, 0, 0, PRN, 0, RET);

        let (cpu, out) = run(&mut mem)?;
        assert_eq!(out, "42\n");
        assert_eq!(cpu.reg[SP], 0xF4);

        Ok(())
    }

    #[test]
    fn test_call_pushes_return_address() -> Result<()> {
        use Instruction::*;
        let mut mem = Ram::default();
        write_instructions!(mem : 0 => LDI, 1, 8, CALL, 1, HLT);
        write_instructions!(mem : 8 => HLT);

        let mut cpu = Processor::new();
        let mut out = Vec::new();
        cpu.execute(&mut mem, &mut out)?; // LDI
        cpu.execute(&mut mem, &mut out)?; // CALL

        assert_eq!(cpu.pc, 8);
        assert_eq!(cpu.reg[SP], 0xF3);
        assert_eq!(mem.read_byte(0xF3)?, 5);

        Ok(())
    }

    #[test]
    fn test_ret_restores_pc_through_register_zero() -> Result<()> {
        let mut mem = Ram::default();
        let mut cpu = Processor::new();
        cpu.reg[SP] = 0xF3;
        mem.write_byte(0xF3, 0x2A)?;

        let mut out = Vec::new();
        cpu.execute_instruction(Instruction::RET, 0, 0, &mut mem, &mut out)?;

        assert_eq!(cpu.pc, 0x2A);
        assert_eq!(cpu.reg[0], 0x2A);
        assert_eq!(cpu.reg[SP], 0xF4);

        Ok(())
    }

    #[test]
    fn test_jeq_only_jumps_on_equal() -> Result<()> {
        let mut mem = Ram::default();
        let mut out = Vec::new();

        let mut cpu = Processor::new();
        cpu.pc = 4;
        cpu.reg[2] = 0x30;
        cpu.fl.equal = true;
        cpu.execute_instruction(Instruction::JEQ, 2, 0, &mut mem, &mut out)?;
        assert_eq!(cpu.pc, 0x30);

        let mut cpu = Processor::new();
        cpu.pc = 4;
        cpu.reg[2] = 0x30;
        cpu.execute_instruction(Instruction::JEQ, 2, 0, &mut mem, &mut out)?;
        assert_eq!(cpu.pc, 6);

        Ok(())
    }

    #[test]
    fn test_jne_jumps_unless_equal() -> Result<()> {
        let mut mem = Ram::default();
        let mut out = Vec::new();

        let mut cpu = Processor::new();
        cpu.pc = 4;
        cpu.reg[2] = 0x30;
        cpu.execute_instruction(Instruction::JNE, 2, 0, &mut mem, &mut out)?;
        assert_eq!(cpu.pc, 0x30);

        let mut cpu = Processor::new();
        cpu.pc = 4;
        cpu.reg[2] = 0x30;
        cpu.fl.equal = true;
        cpu.execute_instruction(Instruction::JNE, 2, 0, &mut mem, &mut out)?;
        assert_eq!(cpu.pc, 6);

        Ok(())
    }

    #[test]
    fn test_ld_and_st() -> Result<()> {
        use Instruction::*;
        let mut mem = Ram::default();
        // r0 holds an address, r1 a value: ST writes it, LD reads it back
        // into r2.
        write_instructions!(mem : 0 =>
            LDI, 0, 0x80,
            LDI, 1, 123,
            ST, 0, 1,
            LD, 2, 0,
            HLT
        );

        let (cpu, _) = run(&mut mem)?;
        assert_eq!(mem.read_byte(0x80)?, 123);
        assert_eq!(cpu.reg[2], 123);

        Ok(())
    }

    #[test]
    fn test_pra_prints_character() -> Result<()> {
        use Instruction::*;
        let mut mem = Ram::default();
        write_instructions!(mem : 0 => LDI, 0, b'A', PRA, 0, HLT);

        let (_, out) = run(&mut mem)?;
        assert_eq!(out, "A");

        Ok(())
    }

    #[test]
    fn test_print8_end_to_end() -> Result<()> {
        use Instruction::*;
        let mut mem = Ram::default();
        write_instructions!(mem : 0 => LDI, 0, 8, PRN, 0, HLT);

        let (cpu, out) = run(&mut mem)?;
        assert!(cpu.halted);
        assert_eq!(out, "8\n");

        Ok(())
    }

    #[test]
    fn test_unknown_opcode_faults() {
        let mut mem = Ram::default();
        mem.data[0] = 0b11111111;

        let mut cpu = Processor::new();
        let mut out = Vec::new();
        let err = cpu.execute(&mut mem, &mut out).unwrap_err();

        assert!(matches!(
            err,
            Fault::UnknownOpcode {
                pc: 0,
                opcode: 0b11111111
            }
        ));
        assert_eq!(cpu.pc, 0);
    }

    #[test]
    fn test_halt_in_last_cell_is_legal() -> Result<()> {
        let mut mem = Ram::default();
        let mut cpu = Processor::new();
        mem.data[255] = Instruction::HLT as Byte;
        cpu.pc = 255;

        let mut out = Vec::new();
        cpu.execute_until_halt(&mut mem, &mut out)?;
        assert!(cpu.halted);

        Ok(())
    }

    #[test]
    fn test_pc_running_off_memory_faults() {
        // LDI at 254 needs an operand byte at 256.
        let mut mem = Ram::default();
        mem.data[254] = Instruction::LDI as Byte;

        let mut cpu = Processor::new();
        cpu.pc = 254;
        let mut out = Vec::new();
        let err = cpu.execute(&mut mem, &mut out).unwrap_err();

        assert!(matches!(err, Fault::OutOfBoundsAddress { addr: 256 }));
    }

    #[test]
    fn test_operand_naming_missing_register_faults() {
        use Instruction::*;
        let mut mem = Ram::default();
        write_instructions!(mem : 0 => LDI, 8, 1, HLT);

        let mut cpu = Processor::new();
        let mut out = Vec::new();
        let err = cpu.execute(&mut mem, &mut out).unwrap_err();

        assert!(matches!(err, Fault::InvalidRegister { index: 8 }));
    }

    #[test]
    fn test_countdown_loop() -> Result<()> {
        use Instruction::*;
        let mut mem = Ram::default();
        // Count r0 down from 3 to 0, printing each value.
        write_instructions!(mem : 0 =>
            LDI, 0, 3,
            LDI, 1, 0,
            LDI, 2, 9,  // loop head: the PRN below
            PRN, 0,
            DEC, 0,
            CMP, 0, 1,
            JNE, 2,
            PRN, 0,
            HLT
        );

        let (_, out) = run(&mut mem)?;
        assert_eq!(out, "3\n2\n1\n0\n");

        Ok(())
    }

    #[test]
    fn test_branch_test_program_from_file() -> Result<()> {
        let mut mem = Ram::from_file("demos/programs/sctest.ls8")?;

        let (cpu, out) = run(&mut mem)?;
        assert!(cpu.halted);
        assert_eq!(out, "1\n4\n5\n");

        Ok(())
    }
}
