use std::io;

use color_eyre::eyre::Result;

use log::LevelFilter;
use ls8::memory::{Byte, Ram};
use ls8::processor::Processor;
use ls8::write_instructions;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .init()
        .unwrap(); // logging

    let mut mem = Ram::default();
    let mut cpu = Processor::new();

    use ls8::processor::Instruction::*;
    write_instructions!(mem : 0 =>
        LDI, 0, 8,
        PRN, 0,
        HLT
    );

    cpu.execute_until_halt(&mut mem, &mut io::stdout())?;

    Ok(())
}
