use std::fmt::Display;

/// Low six bits of an instruction prefix hold the opcode, the high two bits
/// select the operand width.
const OPCODE_MASK: u8 = 0b0011_1111;
const WIDTH_SHIFT: u8 = 6;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Nop,
    Ldi,
    Ldl,
    Stl,
    Pop,
    Dup,
    Add,
    Sub,
    Umul,
    Imul,
    Udiv,
    Idiv,
    Fadd,
    Fsub,
    Fmul,
    Fdiv,
    And,
    Or,
    Not,
    Eq,
    Gt,
    Lt,
    Feq,
    Fgt,
    Flt,
    Call,
    Ret,
    Br,
    I2f,
    F2i,
}

impl OpCode {
    const ALL: [OpCode; 30] = [
        OpCode::Nop,
        OpCode::Ldi,
        OpCode::Ldl,
        OpCode::Stl,
        OpCode::Pop,
        OpCode::Dup,
        OpCode::Add,
        OpCode::Sub,
        OpCode::Umul,
        OpCode::Imul,
        OpCode::Udiv,
        OpCode::Idiv,
        OpCode::Fadd,
        OpCode::Fsub,
        OpCode::Fmul,
        OpCode::Fdiv,
        OpCode::And,
        OpCode::Or,
        OpCode::Not,
        OpCode::Eq,
        OpCode::Gt,
        OpCode::Lt,
        OpCode::Feq,
        OpCode::Fgt,
        OpCode::Flt,
        OpCode::Call,
        OpCode::Ret,
        OpCode::Br,
        OpCode::I2f,
        OpCode::F2i,
    ];

    pub fn operand_kind(self) -> OperandKind {
        match self {
            OpCode::Ldi => OperandKind::Immediate,
            OpCode::Ldl | OpCode::Stl => OperandKind::Local,
            OpCode::Call => OperandKind::Symbol,
            OpCode::Br => OperandKind::Position,
            _ => OperandKind::None,
        }
    }

    pub fn has_operand(self) -> bool {
        self.operand_kind() != OperandKind::None
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            OpCode::Nop => "nop",
            OpCode::Ldi => "ldi",
            OpCode::Ldl => "ldl",
            OpCode::Stl => "stl",
            OpCode::Pop => "pop",
            OpCode::Dup => "dup",
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Umul => "umul",
            OpCode::Imul => "imul",
            OpCode::Udiv => "udiv",
            OpCode::Idiv => "idiv",
            OpCode::Fadd => "fadd",
            OpCode::Fsub => "fsub",
            OpCode::Fmul => "fmul",
            OpCode::Fdiv => "fdiv",
            OpCode::And => "and",
            OpCode::Or => "or",
            OpCode::Not => "not",
            OpCode::Eq => "eq",
            OpCode::Gt => "gt",
            OpCode::Lt => "lt",
            OpCode::Feq => "feq",
            OpCode::Fgt => "fgt",
            OpCode::Flt => "flt",
            OpCode::Call => "call",
            OpCode::Ret => "ret",
            OpCode::Br => "br",
            OpCode::I2f => "i2f",
            OpCode::F2i => "f2i",
        }
    }
}

impl From<OpCode> for u8 {
    fn from(value: OpCode) -> u8 {
        value as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Invalid byte {0} found when expecting OpCode value between 0 and {}",
    OpCode::ALL.len() - 1
)]
pub struct OpCodeFromU8Error(pub u8);

impl TryFrom<u8> for OpCode {
    type Error = OpCodeFromU8Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        OpCode::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(OpCodeFromU8Error(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    None,
    Immediate,
    Local,
    Symbol,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandWidth {
    U8,
    U16,
    U32,
    U64,
}

impl OperandWidth {
    /// Smallest width that represents `value` without loss.
    pub fn for_value(value: u64) -> Self {
        if value <= u64::from(u8::MAX) {
            OperandWidth::U8
        } else if value <= u64::from(u16::MAX) {
            OperandWidth::U16
        } else if value <= u64::from(u32::MAX) {
            OperandWidth::U32
        } else {
            OperandWidth::U64
        }
    }

    fn from_selector(selector: u8) -> Self {
        match selector & 0b11 {
            0 => OperandWidth::U8,
            1 => OperandWidth::U16,
            2 => OperandWidth::U32,
            _ => OperandWidth::U64,
        }
    }

    fn selector(self) -> u8 {
        match self {
            OperandWidth::U8 => 0,
            OperandWidth::U16 => 1,
            OperandWidth::U32 => 2,
            OperandWidth::U64 => 3,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            OperandWidth::U8 => 1,
            OperandWidth::U16 => 2,
            OperandWidth::U32 => 4,
            OperandWidth::U64 => 8,
        }
    }
}

pub fn prefix(opcode: OpCode, width: OperandWidth) -> u8 {
    u8::from(opcode) | (width.selector() << WIDTH_SHIFT)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error(transparent)]
    OpCode(#[from] OpCodeFromU8Error),
    #[error("Opcode {} takes no operand but has width selector {width}", opcode.mnemonic())]
    UnexpectedWidth { opcode: OpCode, width: u8 },
    #[error("Instruction at offset {offset} runs past the end of the code")]
    Truncated { offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: OpCode,
    /// Zero for opcodes without an operand.
    pub operand: u64,
    /// Encoded length in bytes, prefix included.
    pub len: usize,
}

impl Instruction {
    /// Decodes the instruction starting at `offset`.
    pub fn decode(code: &[u8], offset: usize) -> Result<Instruction, DecodeError> {
        let prefix = *code.get(offset).ok_or(DecodeError::Truncated { offset })?;
        let opcode = OpCode::try_from(prefix & OPCODE_MASK)?;
        let selector = prefix >> WIDTH_SHIFT;

        if !opcode.has_operand() {
            if selector != 0 {
                return Err(DecodeError::UnexpectedWidth {
                    opcode,
                    width: selector,
                });
            }
            return Ok(Instruction {
                opcode,
                operand: 0,
                len: 1,
            });
        }

        let width = OperandWidth::from_selector(selector);
        let bytes = code
            .get(offset + 1..offset + 1 + width.bytes())
            .ok_or(DecodeError::Truncated { offset })?;
        let mut le = [0u8; 8];
        le[..bytes.len()].copy_from_slice(bytes);

        Ok(Instruction {
            opcode,
            operand: u64::from_le_bytes(le),
            len: 1 + width.bytes(),
        })
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.opcode.operand_kind() {
            OperandKind::None => write!(f, "{}", self.opcode.mnemonic()),
            OperandKind::Immediate => write!(f, "{:<6} {}", self.opcode.mnemonic(), self.operand as i64),
            OperandKind::Local => write!(f, "{:<6} #{}", self.opcode.mnemonic(), self.operand),
            OperandKind::Symbol => write!(f, "{:<6} @{:#x}", self.opcode.mnemonic(), self.operand),
            OperandKind::Position => write!(f, "{:<6} {:04}", self.opcode.mnemonic(), self.operand),
        }
    }
}

/// Host functions reached through `call` with a reserved symbol id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Native {
    PrintInteger,
    PrintFloat,
    PrintBoolean,
}

impl Native {
    const BASE_ID: u32 = 0xdead_beef;

    pub fn id(self) -> u32 {
        Self::BASE_ID + self as u32
    }

    pub fn from_id(id: u32) -> Option<Native> {
        match id.wrapping_sub(Self::BASE_ID) {
            0 => Some(Native::PrintInteger),
            1 => Some(Native::PrintFloat),
            2 => Some(Native::PrintBoolean),
            _ => None,
        }
    }
}

/// Entry point of one user function. `size` is the byte size of its local
/// region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub id: u32,
    pub size: u32,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub symbols: Vec<Symbol>,
    pub code: Vec<u8>,
}

impl Program {
    pub fn symbol(&self, id: u32) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| symbol.id == id)
    }

    /// Decodes every instruction in order, stopping at the first malformed one.
    pub fn instructions(&self) -> impl Iterator<Item = Result<(usize, Instruction), DecodeError>> + '_ {
        let mut offset = 0;
        let mut failed = false;
        std::iter::from_fn(move || {
            if failed || offset >= self.code.len() {
                return None;
            }
            let at = offset;
            match Instruction::decode(&self.code, at) {
                Ok(instruction) => {
                    offset += instruction.len;
                    Some(Ok((at, instruction)))
                }
                Err(e) => {
                    failed = true;
                    Some(Err(e))
                }
            }
        })
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "== symbols ==")?;
        for symbol in &self.symbols {
            writeln!(
                f,
                "@{:#x} size {} at {:04}",
                symbol.id, symbol.size, symbol.offset
            )?;
        }

        writeln!(f, "== code ==")?;
        for entry in self.instructions() {
            match entry {
                Ok((offset, instruction)) => {
                    if let Some(symbol) = self.symbols.iter().find(|s| s.offset == offset) {
                        writeln!(f, "@{:#x}:", symbol.id)?;
                    }
                    writeln!(f, "{offset:04} {instruction}")?;
                }
                Err(e) => writeln!(f, "<{e}>")?,
            }
        }
        Ok(())
    }
}
