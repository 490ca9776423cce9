use thiserror::Error;

/// Faults the interpreter reports back to the driver. None of them are
/// recovered from inside a step; the driver decides whether to halt or reset.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("invalid opcode {opcode:#06X} at {pc:#05X}")]
    InvalidOpcode { opcode: u16, pc: u16 },

    #[error("call stack overflow at {pc:#05X}")]
    StackOverflow { pc: u16 },

    #[error("return with empty call stack at {pc:#05X}")]
    StackUnderflow { pc: u16 },

    #[error("memory access at {address:#06X} out of range (pc {pc:#05X})")]
    AddressOutOfRange { address: usize, pc: u16 },

    #[error("ROM is {size} bytes, at most {max} fit in program memory")]
    RomTooLarge { size: usize, max: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
