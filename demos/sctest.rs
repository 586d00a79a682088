use std::io;

use color_eyre::eyre::Result;

use log::LevelFilter;
use ls8::memory::Ram;
use ls8::processor::Processor;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap(); // logging

    // Exercises CMP with JMP, JEQ and JNE; expected output: 1, 4, 5.
    let mut mem = Ram::from_file("demos/programs/sctest.ls8")?;
    let mut cpu = Processor::new();

    cpu.execute_until_halt(&mut mem, &mut io::stdout())?;

    Ok(())
}
