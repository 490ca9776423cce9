//! CHIP-8 virtual machine: machine state plus a fetch/decode/execute engine.
//! Rendering, input and timing are left to the driver.

pub mod chip8;
pub mod config;

pub use crate::chip8::{
    disassemble, Chip8, Chip8Error, Instruction, Keypad, MachineState, Opcode, Step,
};
pub use crate::config::{CollisionFlag, Config, Quirks};
