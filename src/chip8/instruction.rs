use super::state::PROGRAM_START;
use std::fmt;

/// Raw two-byte instruction word with the usual operand slices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    pub fn from_bytes(hi: u8, lo: u8) -> Self {
        Opcode(u16::from_be_bytes([hi, lo]))
    }

    /// bits 8-11
    pub fn x(self) -> usize {
        ((self.0 & 0x0F00) >> 8) as usize
    }

    /// bits 4-7
    pub fn y(self) -> usize {
        ((self.0 & 0x00F0) >> 4) as usize
    }

    pub fn kk(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// sprite height; the low nibble of kk
    pub fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    pub fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }
}

impl fmt::UpperHex for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::UpperHex::fmt(&self.0, f)
    }
}

/// The 35 instructions of the base CHIP-8 set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    Sys { nnn: u16 },                  // 0NNN
    Cls,                               // 00E0
    Ret,                               // 00EE
    Jp { nnn: u16 },                   // 1NNN
    Call { nnn: u16 },                 // 2NNN
    SeByte { x: usize, kk: u8 },       // 3XKK
    SneByte { x: usize, kk: u8 },      // 4XKK
    SeReg { x: usize, y: usize },      // 5XY0
    LdByte { x: usize, kk: u8 },       // 6XKK
    AddByte { x: usize, kk: u8 },      // 7XKK
    LdReg { x: usize, y: usize },      // 8XY0
    Or { x: usize, y: usize },         // 8XY1
    And { x: usize, y: usize },        // 8XY2
    Xor { x: usize, y: usize },        // 8XY3
    AddReg { x: usize, y: usize },     // 8XY4
    Sub { x: usize, y: usize },        // 8XY5
    Shr { x: usize, y: usize },        // 8XY6
    Subn { x: usize, y: usize },       // 8XY7
    Shl { x: usize, y: usize },        // 8XYE
    SneReg { x: usize, y: usize },     // 9XY0
    LdI { nnn: u16 },                  // ANNN
    JpV0 { nnn: u16 },                 // BNNN
    Rnd { x: usize, kk: u8 },          // CXKK
    Drw { x: usize, y: usize, n: u8 }, // DXYN
    Skp { x: usize },                  // EX9E
    Sknp { x: usize },                 // EXA1
    LdVxDt { x: usize },               // FX07
    LdVxK { x: usize },                // FX0A
    LdDtVx { x: usize },               // FX15
    LdStVx { x: usize },               // FX18
    AddI { x: usize },                 // FX1E
    LdF { x: usize },                  // FX29
    LdB { x: usize },                  // FX33
    LdIVx { x: usize },                // FX55
    LdVxI { x: usize },                // FX65
}

impl Instruction {
    /// Classifies an opcode, most specific mask first: whole-word matches,
    /// then nibble plus low byte/nibble, then the bare top nibble.
    /// Returns `None` for words outside the instruction set.
    pub fn decode(op: Opcode) -> Option<Self> {
        use Instruction::*;

        let (x, y, kk, n, nnn) = (op.x(), op.y(), op.kk(), op.n(), op.nnn());

        match op.0 {
            0x00E0 => return Some(Cls),
            0x00EE => return Some(Ret),
            _ => {}
        }

        let inst = match op.0 & 0xF00F {
            0x5000 => Some(SeReg { x, y }),
            0x8000 => Some(LdReg { x, y }),
            0x8001 => Some(Or { x, y }),
            0x8002 => Some(And { x, y }),
            0x8003 => Some(Xor { x, y }),
            0x8004 => Some(AddReg { x, y }),
            0x8005 => Some(Sub { x, y }),
            0x8006 => Some(Shr { x, y }),
            0x8007 => Some(Subn { x, y }),
            0x800E => Some(Shl { x, y }),
            0x9000 => Some(SneReg { x, y }),
            _ => None,
        };
        if inst.is_some() {
            return inst;
        }

        let inst = match op.0 & 0xF0FF {
            0xE09E => Some(Skp { x }),
            0xE0A1 => Some(Sknp { x }),
            0xF007 => Some(LdVxDt { x }),
            0xF00A => Some(LdVxK { x }),
            0xF015 => Some(LdDtVx { x }),
            0xF018 => Some(LdStVx { x }),
            0xF01E => Some(AddI { x }),
            0xF029 => Some(LdF { x }),
            0xF033 => Some(LdB { x }),
            0xF055 => Some(LdIVx { x }),
            0xF065 => Some(LdVxI { x }),
            _ => None,
        };
        if inst.is_some() {
            return inst;
        }

        // 5, 8, 9, E and F only exist in the forms matched above
        match op.0 & 0xF000 {
            0x0000 => Some(Sys { nnn }),
            0x1000 => Some(Jp { nnn }),
            0x2000 => Some(Call { nnn }),
            0x3000 => Some(SeByte { x, kk }),
            0x4000 => Some(SneByte { x, kk }),
            0x6000 => Some(LdByte { x, kk }),
            0x7000 => Some(AddByte { x, kk }),
            0xA000 => Some(LdI { nnn }),
            0xB000 => Some(JpV0 { nnn }),
            0xC000 => Some(Rnd { x, kk }),
            0xD000 => Some(Drw { x, y, n }),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            Sys { nnn } => write!(f, "SYS {:#05X}", nnn),
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp { nnn } => write!(f, "JP {:#05X}", nnn),
            Call { nnn } => write!(f, "CALL {:#05X}", nnn),
            SeByte { x, kk } => write!(f, "SE V{:X}, {:#04X}", x, kk),
            SneByte { x, kk } => write!(f, "SNE V{:X}, {:#04X}", x, kk),
            SeReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            LdByte { x, kk } => write!(f, "LD V{:X}, {:#04X}", x, kk),
            AddByte { x, kk } => write!(f, "ADD V{:X}, {:#04X}", x, kk),
            LdReg { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr { x, y } => write!(f, "SHR V{:X}, V{:X}", x, y),
            Subn { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl { x, y } => write!(f, "SHL V{:X}, V{:X}", x, y),
            SneReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI { nnn } => write!(f, "LD I, {:#05X}", nnn),
            JpV0 { nnn } => write!(f, "JP V0, {:#05X}", nnn),
            Rnd { x, kk } => write!(f, "RND V{:X}, {:#04X}", x, kk),
            Drw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Skp { x } => write!(f, "SKP V{:X}", x),
            Sknp { x } => write!(f, "SKNP V{:X}", x),
            LdVxDt { x } => write!(f, "LD V{:X}, DT", x),
            LdVxK { x } => write!(f, "LD V{:X}, K", x),
            LdDtVx { x } => write!(f, "LD DT, V{:X}", x),
            LdStVx { x } => write!(f, "LD ST, V{:X}", x),
            AddI { x } => write!(f, "ADD I, V{:X}", x),
            LdF { x } => write!(f, "LD F, V{:X}", x),
            LdB { x } => write!(f, "LD B, V{:X}", x),
            LdIVx { x } => write!(f, "LD [I], V{:X}", x),
            LdVxI { x } => write!(f, "LD V{:X}, [I]", x),
        }
    }
}

/// Walks a ROM image word by word as it would sit in memory, pairing each
/// address with its raw word and decoded form. A trailing odd byte is skipped.
/// Data mixed into the program decodes as whatever it happens to spell.
pub fn disassemble(
    rom: &[u8],
) -> impl Iterator<Item = (u16, Opcode, Option<Instruction>)> + '_ {
    rom.chunks_exact(2).enumerate().map(|(n, word)| {
        let op = Opcode::from_bytes(word[0], word[1]);
        let addr = PROGRAM_START.wrapping_add(2 * n as u16);
        (addr, op, Instruction::decode(op))
    })
}
