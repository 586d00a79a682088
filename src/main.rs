use std::io::{self, Write};
use std::{env, process};

use color_eyre::eyre::Result;
use log::LevelFilter;
use ls8::memory::Ram;
use ls8::processor::Processor;
use simple_logger::SimpleLogger;

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling
    SimpleLogger::new()
        .with_level(LevelFilter::Warn)
        .init()
        .unwrap(); // logging

    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: ls8 <program.ls8>");
            process::exit(2);
        }
    };

    // Load failures are fatal and reported before execution begins.
    let mut mem = match Ram::from_file(&path) {
        Ok(mem) => mem,
        Err(err) => {
            eprintln!("{}", err);
            process::exit(2);
        }
    };

    let mut cpu = Processor::new();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    cpu.execute_until_halt(&mut mem, &mut out)?;
    out.flush()?;

    Ok(())
}
