use super::RuntimeError;

const MAX_FRAMES: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// First slot of the frame's locals.
    pub base: usize,
    /// Byte size of the local region.
    pub size: usize,
    /// Where `ret` resumes; `None` for the entry frame, whose return halts.
    pub return_offset: Option<usize>,
}

/// Frames and the local slots they own. Slots are 8 bytes wide and a frame's
/// slots are released when it returns.
pub struct CallStack {
    frames: Vec<Frame>,
    slots: Vec<u64>,
}

impl CallStack {
    pub fn new(entry_size: usize) -> Self {
        let mut call_stack = CallStack {
            frames: Vec::new(),
            slots: Vec::new(),
        };
        call_stack.open(entry_size, None);
        call_stack
    }

    fn open(&mut self, size: usize, return_offset: Option<usize>) {
        let base = self.slots.len();
        self.slots.resize(base + size.div_ceil(8), 0);
        self.frames.push(Frame {
            base,
            size,
            return_offset,
        });
    }

    pub fn push(&mut self, size: usize, return_offset: usize) -> Result<(), RuntimeError> {
        if self.frames.len() >= MAX_FRAMES {
            return Err(RuntimeError::CallStackOverflow);
        }
        self.open(size, Some(return_offset));
        Ok(())
    }

    /// Drops the current frame and returns it. The entry frame is never
    /// dropped.
    pub fn pop(&mut self) -> Option<Frame> {
        if self.frames.len() <= 1 {
            return None;
        }
        let frame = self.frames.pop()?;
        self.slots.truncate(frame.base);
        Some(frame)
    }

    pub fn current(&self) -> Frame {
        // `new` opens the entry frame and `pop` keeps it.
        self.frames[self.frames.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn slot_index(&self, slot: u64) -> Result<usize, RuntimeError> {
        let frame = self.current();
        let in_frame = usize::try_from(slot)
            .ok()
            .filter(|slot| slot.saturating_mul(8).saturating_add(8) <= frame.size);
        match in_frame {
            Some(slot) => Ok(frame.base + slot),
            None => Err(RuntimeError::LocalOutOfFrame {
                slot,
                size: frame.size,
            }),
        }
    }

    pub fn load(&self, slot: u64) -> Result<u64, RuntimeError> {
        let index = self.slot_index(slot)?;
        Ok(self.slots[index])
    }

    pub fn store(&mut self, slot: u64, value: u64) -> Result<(), RuntimeError> {
        let index = self.slot_index(slot)?;
        self.slots[index] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_are_isolated() {
        let mut frames = CallStack::new(16);
        frames.store(1, 7).unwrap();

        frames.push(8, 42).unwrap();
        assert_eq!(frames.load(0), Ok(0));
        frames.store(0, 9).unwrap();
        assert_eq!(
            frames.load(1),
            Err(RuntimeError::LocalOutOfFrame { slot: 1, size: 8 })
        );

        let popped = frames.pop().unwrap();
        assert_eq!(popped.return_offset, Some(42));
        assert_eq!(frames.load(1), Ok(7));
        assert_eq!(frames.depth(), 1);
    }

    #[test]
    fn test_entry_frame_stays() {
        let mut frames = CallStack::new(0);
        assert_eq!(frames.pop(), None);
        assert_eq!(frames.current().return_offset, None);
        assert_eq!(
            frames.store(0, 1),
            Err(RuntimeError::LocalOutOfFrame { slot: 0, size: 0 })
        );
    }
}
