use super::error::{Chip8Error, Result};
use log::debug;
use std::io::Read;

pub const MEMORY_SIZE: usize = 4096;
pub const PROGRAM_START: u16 = 0x200;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;
pub const FONT_BASE: u16 = 0x000;
pub const FONT_GLYPH_SIZE: u16 = 5;
pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const STACK_DEPTH: usize = 16;
pub const KEY_COUNT: usize = 16;
pub const FLAG: usize = 0xF;

const FONTSET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Everything the interpreter mutates. The engine in the parent module is
/// the only writer of most fields; drivers get read accessors plus the
/// keypad and timer mutators.
pub struct MachineState {
    pub(super) memory: [u8; MEMORY_SIZE],
    pub(super) v: [u8; 16], // V0-VE, VF doubles as the flag register
    pub(super) i: u16,      // address register
    pub(super) pc: u16,     // next instruction to fetch
    pub(super) sp: i8,      // index of the top of stack, -1 when empty
    pub(super) stack: [u16; STACK_DEPTH],
    pub(super) gfx: [u8; DISPLAY_WIDTH * DISPLAY_HEIGHT],
    pub(super) delay_timer: u8,
    pub(super) sound_timer: u8, // both count down at the driver's frame rate
    pub(super) keys: [bool; KEY_COUNT],
    pub(super) draw_flag: bool,
}

impl MachineState {
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];

        // CHIP-8 systems kept the interpreter below 0x200; we don't need that
        // space so the font sits at the very bottom
        let font = FONT_BASE as usize;
        memory[font..font + FONTSET.len()].copy_from_slice(&FONTSET);

        Self {
            memory,
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: -1,
            stack: [0; STACK_DEPTH],
            gfx: [0; DISPLAY_WIDTH * DISPLAY_HEIGHT],
            delay_timer: 0,
            sound_timer: 0,
            keys: [false; KEY_COUNT],
            draw_flag: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Copies a program verbatim to 0x200. Nothing is written when the
    /// program would run past the end of memory.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.memory[start..start + rom.len()].copy_from_slice(rom);
        debug!("loaded {} byte ROM at {:#05X}", rom.len(), PROGRAM_START);
        Ok(())
    }

    pub fn load_rom_from(&mut self, reader: &mut impl Read) -> Result<()> {
        let mut rom = Vec::new();
        reader.read_to_end(&mut rom)?;
        self.load_rom(&rom)
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn v(&self, register: usize) -> u8 {
        self.v[register & 0xF]
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn sp(&self) -> i8 {
        self.sp
    }

    /// Return addresses currently pushed, oldest first.
    pub fn stack(&self) -> &[u16] {
        &self.stack[..(self.sp + 1) as usize]
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn decrement_delay(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
    }

    pub fn decrement_sound(&mut self) {
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// One 60Hz tick of both timers.
    pub fn tick_timers(&mut self) {
        self.decrement_delay();
        self.decrement_sound();
    }

    pub fn keys(&self) -> &[bool; KEY_COUNT] {
        &self.keys
    }

    pub fn keys_mut(&mut self) -> &mut [bool; KEY_COUNT] {
        &mut self.keys
    }

    pub fn set_keys(&mut self, keys: [bool; KEY_COUNT]) {
        self.keys = keys;
    }

    pub fn set_key(&mut self, key: usize, pressed: bool) {
        self.keys[key & 0xF] = pressed;
    }

    pub fn clear_keys(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    /// Row-major 64x32 framebuffer, one byte (0 or 1) per pixel.
    pub fn gfx(&self) -> &[u8] {
        &self.gfx
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.gfx[DISPLAY_WIDTH * (y % DISPLAY_HEIGHT) + x % DISPLAY_WIDTH] == 1
    }

    /// Set when the last step cleared or drew to the framebuffer.
    pub fn draw_flag(&self) -> bool {
        self.draw_flag
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new()
    }
}
