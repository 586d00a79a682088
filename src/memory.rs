pub mod load;

use crate::processor::{Fault, Result};

pub type Byte = u8; // 1 byte

/// The LS-8's RAM: 256 byte-addressable cells.
pub type Ram = Memory<256>;

/// Emulates memory for use with the CPU
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Memory<const S: usize> {
    /// The actual data of the memory
    pub data: [Byte; S],
}

impl<const S: usize> Default for Memory<S> {
    /// Initializes the memory
    fn default() -> Self {
        Memory { data: [0; S] }
    }
}

impl<const S: usize> Memory<S> {
    /// Reads a byte from the memory, faulting on an out-of-bounds address
    pub fn read_byte(&self, position: usize) -> Result<Byte> {
        self.data
            .get(position)
            .copied()
            .ok_or(Fault::OutOfBoundsAddress { addr: position })
    }

    /// Writes a byte to the memory, faulting on an out-of-bounds address
    pub fn write_byte(&mut self, position: usize, value: Byte) -> Result<()> {
        match self.data.get_mut(position) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Fault::OutOfBoundsAddress { addr: position }),
        }
    }

    /// Writes an array of bytes to the memory. Host-side loading only;
    /// panics if the block does not fit.
    pub fn write_array(&mut self, position: usize, data: &[Byte]) {
        self.data[position..position + data.len()].copy_from_slice(data);
    }
}

/// Writes a block of instructions directly into the memory
#[macro_export]
macro_rules! write_instructions {
    ( $mem:ident : $pos:expr => $( $byte:expr ),+ $(,)? ) => {
        $mem.write_array($pos, &[
            $(
                $byte as Byte,
            )+
        ]);
    };
}
