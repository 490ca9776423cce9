use crate::config::{CollisionFlag, Config, Quirks};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::ops::Range;
use std::path::Path;

mod error;
mod instruction;
mod state;

pub use error::{Chip8Error, Result};
pub use instruction::{disassemble, Instruction, Opcode};
pub use state::{
    MachineState, DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_BASE, KEY_COUNT, MAX_ROM_SIZE, MEMORY_SIZE,
    PROGRAM_START, STACK_DEPTH,
};

use state::{FLAG, FONT_GLYPH_SIZE};

/// Result of one successful call to [`Chip8::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Executed(Instruction),
    /// `LD Vx, K` found no key down. PC still points at it, so stepping
    /// again after refreshing the keypad retries the wait.
    AwaitingKey,
}

/// Host input as seen from inside a blocked `LD Vx, K`.
pub trait Keypad {
    /// Refresh `keys` from the host. Returning `false` abandons the wait and
    /// hands control back to the driver.
    fn poll(&mut self, keys: &mut [bool; KEY_COUNT]) -> bool;
}

/// What an instruction wants done with the program counter afterwards.
enum ProgramCounter {
    Next,
    Skip,
    Jump(u16),
    Wait,
}

impl ProgramCounter {
    fn skip_if(condition: bool) -> Self {
        if condition {
            ProgramCounter::Skip
        } else {
            ProgramCounter::Next
        }
    }
}

pub struct Chip8 {
    state: MachineState,
    quirks: Quirks,
    rng: StdRng,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: MachineState::new(),
            quirks: config.quirks,
            rng,
        }
    }

    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        self.state.load_rom(rom)
    }

    pub fn load_game(&mut self, filename: impl AsRef<Path>) -> Result<()> {
        let mut file = File::open(filename)?;
        self.state.load_rom_from(&mut file)
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut MachineState {
        &mut self.state
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    /// Fetches, decodes and executes a single instruction. On error nothing
    /// has been changed and PC still points at the offending instruction.
    pub fn step(&mut self) -> Result<Step> {
        let pc = self.state.pc;
        let opcode = self.fetch()?;
        let inst = Instruction::decode(opcode).ok_or(Chip8Error::InvalidOpcode {
            opcode: opcode.0,
            pc,
        })?;
        trace!("{:#05X}: {:04X}  {}", pc, opcode, inst);

        // a redraw still pending from the previous step survives a fault
        let pending = self.state.draw_flag;
        self.state.draw_flag = false;
        let next = match self.execute(inst) {
            Ok(next) => next,
            Err(e) => {
                self.state.draw_flag = pending;
                return Err(e);
            }
        };

        match next {
            ProgramCounter::Next => self.state.pc = pc.wrapping_add(2),
            ProgramCounter::Skip => self.state.pc = pc.wrapping_add(4),
            ProgramCounter::Jump(addr) => self.state.pc = addr,
            ProgramCounter::Wait => return Ok(Step::AwaitingKey),
        }

        trace!(
            "V {:02X?} I {:#05X} SP {} DT {} ST {}",
            self.state.v,
            self.state.i,
            self.state.sp,
            self.state.delay_timer,
            self.state.sound_timer
        );
        Ok(Step::Executed(inst))
    }

    /// Like [`step`](Self::step), but a key wait polls `keypad` until a key
    /// goes down instead of returning. If the keypad asks to stop, the wait
    /// is abandoned and `Step::AwaitingKey` is returned.
    pub fn step_blocking(&mut self, keypad: &mut impl Keypad) -> Result<Step> {
        loop {
            match self.step()? {
                Step::AwaitingKey => {
                    if !keypad.poll(&mut self.state.keys) {
                        debug!("key wait at {:#05X} abandoned", self.state.pc);
                        return Ok(Step::AwaitingKey);
                    }
                }
                executed => return Ok(executed),
            }
        }
    }

    fn fetch(&self) -> Result<Opcode> {
        let pc = self.state.pc as usize;
        if pc + 1 >= MEMORY_SIZE {
            return Err(Chip8Error::AddressOutOfRange {
                address: pc,
                pc: self.state.pc,
            });
        }
        // two-byte opcodes, big endian
        Ok(Opcode::from_bytes(
            self.state.memory[pc],
            self.state.memory[pc + 1],
        ))
    }

    /// Bounds-checks `len` bytes of memory starting at I.
    fn memory_at_i(&self, len: usize) -> Result<Range<usize>> {
        if len == 0 {
            return Ok(0..0);
        }
        let start = self.state.i as usize;
        if start + len > MEMORY_SIZE {
            return Err(Chip8Error::AddressOutOfRange {
                address: start.max(MEMORY_SIZE),
                pc: self.state.pc,
            });
        }
        Ok(start..start + len)
    }

    fn execute(&mut self, inst: Instruction) -> Result<ProgramCounter> {
        use Instruction::*;

        let pc = match inst {
            Sys { .. } => ProgramCounter::Next, // machine code routines aren't emulated
            Cls => self.cls(),
            Ret => self.ret()?,
            Jp { nnn } => ProgramCounter::Jump(nnn),
            Call { nnn } => self.call(nnn)?,
            SeByte { x, kk } => ProgramCounter::skip_if(self.state.v[x] == kk),
            SneByte { x, kk } => ProgramCounter::skip_if(self.state.v[x] != kk),
            SeReg { x, y } => ProgramCounter::skip_if(self.state.v[x] == self.state.v[y]),
            LdByte { x, kk } => {
                self.state.v[x] = kk;
                ProgramCounter::Next
            }
            AddByte { x, kk } => {
                // no carry
                self.state.v[x] = self.state.v[x].wrapping_add(kk);
                ProgramCounter::Next
            }
            LdReg { .. } | Or { .. } | And { .. } | Xor { .. } | AddReg { .. } | Sub { .. }
            | Shr { .. } | Subn { .. } | Shl { .. } => self.alu(inst),
            SneReg { x, y } => ProgramCounter::skip_if(self.state.v[x] != self.state.v[y]),
            LdI { nnn } => {
                self.state.i = nnn;
                ProgramCounter::Next
            }
            JpV0 { nnn } => ProgramCounter::Jump(nnn + self.state.v[0] as u16),
            Rnd { x, kk } => {
                self.state.v[x] = self.rng.gen::<u8>() & kk;
                ProgramCounter::Next
            }
            Drw { x, y, n } => self.draw(x, y, n)?,
            Skp { x } => ProgramCounter::skip_if(self.key_down(x)),
            Sknp { x } => ProgramCounter::skip_if(!self.key_down(x)),
            LdVxK { x } => self.wait_key(x),
            LdVxDt { .. } | LdDtVx { .. } | LdStVx { .. } | AddI { .. } | LdF { .. }
            | LdB { .. } | LdIVx { .. } | LdVxI { .. } => self.misc(inst)?,
        };
        Ok(pc)
    }

    fn cls(&mut self) -> ProgramCounter {
        // 00E0
        self.state.gfx = [0; DISPLAY_WIDTH * DISPLAY_HEIGHT];
        self.state.draw_flag = true;
        ProgramCounter::Next
    }

    fn ret(&mut self) -> Result<ProgramCounter> {
        // 00EE
        // pop the return address pushed by CALL
        if self.state.sp < 0 {
            return Err(Chip8Error::StackUnderflow { pc: self.state.pc });
        }
        let addr = self.state.stack[self.state.sp as usize];
        self.state.sp -= 1;
        debug!("return to {:#05X}", addr);
        Ok(ProgramCounter::Jump(addr))
    }

    fn call(&mut self, nnn: u16) -> Result<ProgramCounter> {
        // 2NNN
        // push the address of the next instruction, then jump
        if self.state.sp >= STACK_DEPTH as i8 - 1 {
            return Err(Chip8Error::StackOverflow { pc: self.state.pc });
        }
        self.state.sp += 1;
        self.state.stack[self.state.sp as usize] = self.state.pc.wrapping_add(2);
        debug!("call {:#05X} from {:#05X}", nnn, self.state.pc);
        Ok(ProgramCounter::Jump(nnn))
    }

    fn alu(&mut self, inst: Instruction) -> ProgramCounter {
        use Instruction::*;

        let v = &mut self.state.v;
        match inst {
            LdReg { x, y } => v[x] = v[y],
            Or { x, y } => v[x] |= v[y],
            And { x, y } => v[x] &= v[y],
            Xor { x, y } => v[x] ^= v[y],
            AddReg { x, y } => {
                // 8XY4
                // VF = 1 on carry
                let sum = v[x] as u16 + v[y] as u16;
                v[FLAG] = (sum > 0xFF) as u8;
                v[x] = sum as u8;
            }
            Sub { x, y } => {
                // 8XY5
                // VF = 1 when there's no borrow
                let (vx, vy) = (v[x], v[y]);
                v[FLAG] = (vx > vy) as u8;
                v[x] = vx.wrapping_sub(vy);
            }
            Subn { x, y } => {
                // 8XY7
                let (vx, vy) = (v[x], v[y]);
                v[FLAG] = (vy > vx) as u8;
                v[x] = vy.wrapping_sub(vx);
            }
            Shr { x, .. } => {
                // 8XY6, VY is ignored
                let vx = v[x];
                v[FLAG] = vx & 0x1;
                v[x] = vx >> 1;
            }
            Shl { x, .. } => {
                // 8XYE, VY is ignored
                let vx = v[x];
                v[FLAG] = (vx & 0x80) >> 7;
                v[x] = vx << 1;
            }
            _ => unreachable!("{} is not an ALU instruction", inst),
        }
        ProgramCounter::Next
    }

    fn draw(&mut self, x: usize, y: usize, height: u8) -> Result<ProgramCounter> {
        // DXYN
        // XOR an 8xN sprite from memory at I onto the screen at VX,VY.
        // coordinates wrap around both edges
        let rows = self.memory_at_i(height as usize)?;
        let vx = self.state.v[x] as usize;
        let vy = self.state.v[y] as usize;
        let any_pixel = self.quirks.collision == CollisionFlag::AnyPixel;

        if any_pixel {
            self.state.v[FLAG] = 0;
        }
        for (row, addr) in rows.enumerate() {
            let sprite = self.state.memory[addr];
            for col in 0..8 {
                let bit = (sprite >> (7 - col)) & 0x1;
                let offset =
                    DISPLAY_WIDTH * ((vy + row) % DISPLAY_HEIGHT) + (vx + col) % DISPLAY_WIDTH;
                let old = self.state.gfx[offset];
                let erased = old == 1 && bit == 1;
                self.state.gfx[offset] = old ^ bit;

                if !any_pixel {
                    // every bit overwrites VF, the last one wins
                    self.state.v[FLAG] = erased as u8;
                } else if erased {
                    self.state.v[FLAG] = 1;
                }
            }
        }

        self.state.draw_flag = true;
        Ok(ProgramCounter::Next)
    }

    fn key_down(&self, x: usize) -> bool {
        self.state.keys[(self.state.v[x] & 0xF) as usize]
    }

    fn wait_key(&mut self, x: usize) -> ProgramCounter {
        // FX0A
        // the lowest numbered key held down wins
        match self.state.keys.iter().position(|&pressed| pressed) {
            Some(key) => {
                debug!("key {:X} satisfied wait into V{:X}", key, x);
                self.state.v[x] = key as u8;
                ProgramCounter::Next
            }
            None => ProgramCounter::Wait,
        }
    }

    fn misc(&mut self, inst: Instruction) -> Result<ProgramCounter> {
        use Instruction::*;

        match inst {
            LdVxDt { x } => self.state.v[x] = self.state.delay_timer,
            LdDtVx { x } => self.state.delay_timer = self.state.v[x],
            LdStVx { x } => self.state.sound_timer = self.state.v[x],
            AddI { x } => {
                // FX1E
                // wraps at 16 bits; an out of range I only faults when used
                self.state.i = self.state.i.wrapping_add(self.state.v[x] as u16);
            }
            LdF { x } => {
                // FX29
                // point I at the font glyph for the hex digit in VX
                let digit = (self.state.v[x] & 0xF) as u16;
                self.state.i = FONT_BASE + digit * FONT_GLYPH_SIZE;
            }
            LdB { x } => {
                // FX33
                // 193 becomes [1, 9, 3] at I
                let range = self.memory_at_i(3)?;
                let vx = self.state.v[x];
                self.state.memory[range].copy_from_slice(&[vx / 100, (vx / 10) % 10, vx % 10]);
            }
            LdIVx { x } => {
                // FX55
                // V0 to VX inclusive into memory at I; I is left alone
                let range = self.memory_at_i(x + 1)?;
                self.state.memory[range].copy_from_slice(&self.state.v[..=x]);
            }
            LdVxI { x } => {
                // FX65
                let range = self.memory_at_i(x + 1)?;
                self.state.v[..=x].copy_from_slice(&self.state.memory[range]);
            }
            _ => unreachable!("{} is not an F-group instruction", inst),
        }
        Ok(ProgramCounter::Next)
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}
