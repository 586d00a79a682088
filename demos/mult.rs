use std::io;

use color_eyre::eyre::Result;

use ls8::memory::Ram;
use ls8::processor::Processor;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new().init().unwrap(); // logging

    let mut mem = Ram::from_file("demos/programs/mult.ls8")?;
    let mut cpu = Processor::new();

    cpu.execute_until_halt(&mut mem, &mut io::stdout())?;

    Ok(())
}
