use std::fmt::Display;

use super::RuntimeError;

const MAX_STACK_CELLS: usize = 1 << 20;

/// Operand stack of untyped 8-byte cells.
pub struct Stack {
    storage: Vec<u64>,
}

impl Stack {
    pub fn new() -> Self {
        Stack {
            storage: Vec::with_capacity(256),
        }
    }

    pub fn push(&mut self, value: u64) -> Result<(), RuntimeError> {
        if self.storage.len() >= MAX_STACK_CELLS {
            return Err(RuntimeError::StackOverflow);
        }
        self.storage.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u64, RuntimeError> {
        self.storage.pop().ok_or(RuntimeError::StackUnderflow)
    }

    pub fn peek(&self) -> Result<u64, RuntimeError> {
        self.storage
            .last()
            .copied()
            .ok_or(RuntimeError::StackUnderflow)
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Size of the live region in bytes.
    pub fn size(&self) -> usize {
        self.storage.len() * 8
    }
}

impl Display for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "          ")?;
        for value in self.storage.iter() {
            write!(f, "[ {:>8} ]", *value as i64)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::new();
        stack.push(1).unwrap();
        stack.push(2).unwrap();
        assert_eq!(stack.peek(), Ok(2));
        assert_eq!(stack.size(), 16);
        assert_eq!(stack.pop(), Ok(2));
        assert_eq!(stack.pop(), Ok(1));
        assert_eq!(stack.pop(), Err(RuntimeError::StackUnderflow));
        assert_eq!(stack.len(), 0);
    }
}
