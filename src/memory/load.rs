//! Loads an `.ls8` program file into memory.
//!
//! The format is one instruction byte per line, written as a binary
//! literal. Anything after a `#` is a comment and blank lines are
//! skipped. Bytes are written into memory sequentially from address 0:
//!
//! ```text
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```

use std::fs;
use std::path::Path;
use std::str::{FromStr, Lines};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use thiserror::Error;

use super::{Byte, Memory};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadErrorKind {
    /// The line is not a valid 8-bit binary literal.
    #[error("expected an 8-bit binary literal, found `{found}`")]
    InvalidByte { found: String },
    /// The program has more bytes than the memory has cells.
    #[error("memory has no address `0x{address:x}`")]
    OutOfMemory { address: usize },
}

/// A load failure, annotated with the 1-based source line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error [ln: {line_nr}]: {kind}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub line_nr: usize,
}

impl LoadError {
    fn new(kind: LoadErrorKind, line_nr: usize) -> Self {
        Self { kind, line_nr }
    }
}

pub type Result<T, E = LoadError> = std::result::Result<T, E>;

/// Line-oriented loader which populates a [`Memory`] from program text.
#[derive(Debug, Clone)]
pub struct Loader<'a, const S: usize> {
    lines: Lines<'a>,
    line_nr: usize,
    address: usize,
    memory: Memory<S>,
}

impl<'a, const S: usize> Loader<'a, S> {
    /// Creates a new loader for `data` which will try to populate `memory`.
    pub fn new(data: &'a str, memory: Memory<S>) -> Self {
        Self {
            lines: data.lines(),
            line_nr: 0,
            address: 0,
            memory,
        }
    }

    /// Consumes `self` and tries to load all of the program text into memory.
    ///
    /// # Errors
    ///
    /// All errors which may occur are collected and returned at the end.
    pub fn load(mut self) -> Result<Memory<S>, Vec<LoadError>> {
        let mut errors = Vec::new();

        while let Some(res) = self.load_next_line() {
            if let Err(err) = res {
                log::error!("{}", err);
                errors.push(err);
            }
        }

        if errors.is_empty() {
            Ok(self.memory)
        } else {
            Err(errors)
        }
    }

    /// Tries to load the next line of program text. Each instruction byte
    /// is located on its own line.
    fn load_next_line(&mut self) -> Option<Result<()>> {
        let line = self.lines.next()?;
        self.line_nr += 1;

        // Strip the comment, if any, before looking at the value.
        let value = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        }
        .trim();

        if value.is_empty() {
            // Comment or empty line; skip
            return Some(Ok(()));
        }

        let byte = match Byte::from_str_radix(value, 2) {
            Ok(byte) => byte,
            Err(_) => {
                return Some(Err(LoadError::new(
                    LoadErrorKind::InvalidByte {
                        found: value.to_owned(),
                    },
                    self.line_nr,
                )))
            }
        };

        Some(self.write_byte(byte))
    }

    /// Writes `byte` at the next load address and advances it.
    fn write_byte(&mut self, byte: Byte) -> Result<()> {
        if self.address >= S {
            return Err(LoadError::new(
                LoadErrorKind::OutOfMemory {
                    address: self.address,
                },
                self.line_nr,
            ));
        }

        self.memory.data[self.address] = byte;
        self.address += 1;
        Ok(())
    }
}

impl<const S: usize> FromStr for Memory<S> {
    type Err = Vec<LoadError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Loader::new(s, Memory::default()).load()
    }
}

impl<const S: usize> Memory<S> {
    /// Reads and loads a program file.
    ///
    /// Load failures are reported once, before execution starts; they
    /// never reach the execution core. Each offending line is also logged
    /// through [`log::error!`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> EyreResult<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .wrap_err_with(|| format!("cannot read program file `{}`", path.display()))?;

        data.parse().map_err(|errors: Vec<LoadError>| {
            match errors.into_iter().next() {
                Some(first) => eyre!("failed to load `{}`: {}", path.display(), first),
                None => eyre!("failed to load `{}`", path.display()),
            }
        })
    }
}
