//! Simulator for the LS-8, an 8-bit educational instruction-set
//! architecture: 256 bytes of RAM, 8 general-purpose registers, a
//! downward-growing stack and a small flags register.
//!
//! ```
//! use ls8::memory::{Byte, Ram};
//! use ls8::processor::Processor;
//! use ls8::write_instructions;
//!
//! use ls8::processor::Instruction::*;
//! let mut mem = Ram::default();
//! write_instructions!(mem : 0 => LDI, 0, 8, PRN, 0, HLT);
//!
//! let mut cpu = Processor::new();
//! let mut out = Vec::new();
//! cpu.execute_until_halt(&mut mem, &mut out)?;
//! assert_eq!(out, b"8\n");
//! # Ok::<(), ls8::processor::Fault>(())
//! ```

pub mod memory;
pub mod processor;
