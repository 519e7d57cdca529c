mod frame;
mod stack;

use rustc_hash::FxHashMap;

use crate::bytecode::{DecodeError, Instruction, Native, OpCode, Program, Symbol};

use self::{frame::CallStack, stack::Stack};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("Program has no code to run")]
    NoEntryPoint,
    #[error("Failed to read instruction at {offset:04}: {source}")]
    Decode {
        offset: usize,
        #[source]
        source: DecodeError,
    },
    #[error("Call to unknown symbol {0:#x}")]
    UnresolvedSymbol(u64),
    #[error("Data stack underflow")]
    StackUnderflow,
    #[error("Data stack overflow")]
    StackOverflow,
    #[error("Call stack overflow")]
    CallStackOverflow,
    #[error("Local #{slot} is outside the current frame of {size} bytes")]
    LocalOutOfFrame { slot: u64, size: usize },
    #[error("Integer division by zero")]
    DivisionByZero,
    #[error("Integer division overflow")]
    DivisionOverflow,
    #[error("Step limit of {0} instructions exceeded")]
    StepLimit(u64),
}

/// How the size of a call frame's local region is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameLayout {
    /// Use the size recorded in the callee's symbol.
    #[default]
    Derived,
    /// Give every frame the same number of bytes.
    Fixed(usize),
}

impl FrameLayout {
    /// Eight slots per frame, whatever the function declares.
    pub const COMPATIBLE: FrameLayout = FrameLayout::Fixed(64);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VmConfig {
    pub frame_layout: FrameLayout,
    /// Abort after this many executed instructions.
    pub step_limit: Option<u64>,
}

pub struct Vm<'a> {
    program: &'a Program,
    symbols: FxHashMap<u32, Symbol>,
    config: VmConfig,
    ip: usize,
    steps: u64,
    stack: Stack,
    frames: CallStack,
    output: String,
}

impl<'a> Vm<'a> {
    pub fn new(program: &'a Program, config: VmConfig) -> Self {
        // Later symbols shadow earlier ones with the same id.
        let symbols: FxHashMap<u32, Symbol> = program
            .symbols
            .iter()
            .map(|symbol| (symbol.id, *symbol))
            .collect();

        let entry_size = match config.frame_layout {
            FrameLayout::Derived => program
                .symbols
                .iter()
                .find(|symbol| symbol.offset == 0)
                .map_or(0, |symbol| symbol.size as usize),
            FrameLayout::Fixed(size) => size,
        };

        Self {
            program,
            symbols,
            config,
            ip: 0,
            steps: 0,
            stack: Stack::new(),
            frames: CallStack::new(entry_size),
            output: String::new(),
        }
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }

    /// Executes from offset 0 until the entry function returns.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        if self.program.code.is_empty() {
            return Err(RuntimeError::NoEntryPoint);
        }

        loop {
            if let Some(limit) = self.config.step_limit {
                if self.steps >= limit {
                    return Err(RuntimeError::StepLimit(limit));
                }
            }
            self.steps += 1;

            let instruction = Instruction::decode(&self.program.code, self.ip).map_err(|source| {
                RuntimeError::Decode {
                    offset: self.ip,
                    source,
                }
            })?;

            #[cfg(feature = "trace")]
            {
                println!("{}", self.stack);
                println!("{:04} {}", self.ip, instruction);
            }

            self.ip += instruction.len;
            let operand = instruction.operand;

            match instruction.opcode {
                OpCode::Nop => {}
                OpCode::Ldi => self.stack.push(operand)?,
                OpCode::Ldl => {
                    let value = self.frames.load(operand)?;
                    self.stack.push(value)?;
                }
                OpCode::Stl => {
                    let value = self.stack.pop()?;
                    self.frames.store(operand, value)?;
                }
                OpCode::Pop => {
                    self.stack.pop()?;
                }
                OpCode::Dup => {
                    let value = self.stack.peek()?;
                    self.stack.push(value)?;
                }
                OpCode::Add => binary_op(&mut self.stack, |a, b| Ok(a.wrapping_add(b)))?,
                OpCode::Sub => binary_op(&mut self.stack, |a, b| Ok(a.wrapping_sub(b)))?,
                OpCode::Umul => binary_op(&mut self.stack, |a, b| Ok(a.wrapping_mul(b)))?,
                OpCode::Imul => binary_op(&mut self.stack, |a, b| {
                    Ok((a as i64).wrapping_mul(b as i64) as u64)
                })?,
                OpCode::Udiv => binary_op(&mut self.stack, |a, b| {
                    a.checked_div(b).ok_or(RuntimeError::DivisionByZero)
                })?,
                OpCode::Idiv => binary_op(&mut self.stack, |a, b| {
                    if b == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    (a as i64)
                        .checked_div(b as i64)
                        .map(|quotient| quotient as u64)
                        .ok_or(RuntimeError::DivisionOverflow)
                })?,
                OpCode::Fadd => float_op(&mut self.stack, |a, b| (a + b).to_bits())?,
                OpCode::Fsub => float_op(&mut self.stack, |a, b| (a - b).to_bits())?,
                OpCode::Fmul => float_op(&mut self.stack, |a, b| (a * b).to_bits())?,
                OpCode::Fdiv => float_op(&mut self.stack, |a, b| (a / b).to_bits())?,
                OpCode::And => binary_op(&mut self.stack, |a, b| Ok(u64::from(a != 0 && b != 0)))?,
                OpCode::Or => binary_op(&mut self.stack, |a, b| Ok(u64::from(a != 0 || b != 0)))?,
                OpCode::Not => unary_op(&mut self.stack, |a| u64::from(a == 0))?,
                OpCode::Eq => binary_op(&mut self.stack, |a, b| Ok(u64::from(a == b)))?,
                OpCode::Gt => binary_op(&mut self.stack, |a, b| {
                    Ok(u64::from((a as i64) > (b as i64)))
                })?,
                OpCode::Lt => binary_op(&mut self.stack, |a, b| {
                    Ok(u64::from((a as i64) < (b as i64)))
                })?,
                OpCode::Feq => float_op(&mut self.stack, |a, b| u64::from(a == b))?,
                OpCode::Fgt => float_op(&mut self.stack, |a, b| u64::from(a > b))?,
                OpCode::Flt => float_op(&mut self.stack, |a, b| u64::from(a < b))?,
                OpCode::Call => self.call(operand)?,
                OpCode::Ret => match self.frames.pop().and_then(|frame| frame.return_offset) {
                    Some(offset) => self.ip = offset,
                    None => break,
                },
                OpCode::Br => {
                    if self.stack.pop()? != 0 {
                        self.ip = usize::try_from(operand).unwrap_or(usize::MAX);
                    }
                }
                OpCode::I2f => unary_op(&mut self.stack, |a| (a as i64 as f64).to_bits())?,
                OpCode::F2i => unary_op(&mut self.stack, |a| f64::from_bits(a) as i64 as u64)?,
            }
        }

        if self.stack.len() != 1 {
            self.output.push_str(&format!(
                "Invalid stack size on exit. Was {} but expected 8.",
                self.stack.size()
            ));
        }

        tracing::debug!(steps = self.steps, output = self.output.len(), "halted");
        Ok(())
    }

    fn call(&mut self, operand: u64) -> Result<(), RuntimeError> {
        let id = u32::try_from(operand).map_err(|_| RuntimeError::UnresolvedSymbol(operand))?;

        if let Some(native) = Native::from_id(id) {
            let value = self.stack.pop()?;
            let text = match native {
                Native::PrintInteger => (value as i64).to_string(),
                Native::PrintFloat => f64::from_bits(value).to_string(),
                Native::PrintBoolean => (if value != 0 { "sand" } else { "falsk" }).to_string(),
            };
            self.output.push_str(&text);
            self.output.push('\n');
            return self.stack.push(0);
        }

        let symbol = self
            .symbols
            .get(&id)
            .copied()
            .ok_or(RuntimeError::UnresolvedSymbol(operand))?;
        let size = match self.config.frame_layout {
            FrameLayout::Derived => symbol.size as usize,
            FrameLayout::Fixed(size) => size,
        };
        self.frames.push(size, self.ip)?;
        tracing::trace!(id, size, depth = self.frames.depth(), "call");
        self.ip = symbol.offset;
        Ok(())
    }
}

/// Runs `program` to completion and returns everything it printed.
pub fn run(program: &Program, config: VmConfig) -> Result<String, RuntimeError> {
    let mut vm = Vm::new(program, config);
    vm.run()?;
    Ok(vm.into_output())
}

fn binary_op(
    stack: &mut Stack,
    op: impl Fn(u64, u64) -> Result<u64, RuntimeError>,
) -> Result<(), RuntimeError> {
    let b = stack.pop()?;
    let a = stack.pop()?;
    stack.push(op(a, b)?)
}

fn float_op(stack: &mut Stack, op: impl Fn(f64, f64) -> u64) -> Result<(), RuntimeError> {
    binary_op(stack, |a, b| Ok(op(f64::from_bits(a), f64::from_bits(b))))
}

fn unary_op(stack: &mut Stack, op: impl Fn(u64) -> u64) -> Result<(), RuntimeError> {
    let a = stack.pop()?;
    stack.push(op(a))
}
