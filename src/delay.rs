//! Calibratable delay line.
//!
//! The timer on this platform ticks in microseconds, far too coarse for a
//! carrier in the medium-wave band. The delay between two DAC writes is
//! therefore set by counting instructions: a buffer of no-op slots ends in a
//! single return slot, and running the buffer costs one no-op per slot in
//! front of the return. Moving the return is the only knob.
//!
//! Instruction timing on a pipelined core with caches cannot be predicted
//! from the cycle tables, which is why the position is found by measurement
//! (see [`crate::calibration`]) rather than computed.
//!
//! # Invariant
//!
//! Exactly one slot holds [`Opcode::Return`]; every other slot holds
//! [`Opcode::Nop`].

use core::sync::atomic::{compiler_fence, Ordering};

/// Delay-line slot contents.
///
/// Values are the Thumb encodings of `nop` and `bx lr`, kept so a dump of the
/// buffer reads like the routine it stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum Opcode {
    /// Burn one slot.
    Nop = 0xBF00,
    /// Stop and hand control back.
    Return = 0x4770,
}

/// A delay whose length is set by a single integer position.
///
/// Implemented by [`InstructionBuffer`]; tests substitute counting doubles.
pub trait DelayLine {
    /// Number of slots.
    fn capacity(&self) -> usize;

    /// Slot currently holding the return.
    fn return_position(&self) -> usize;

    /// Move the return to `position`.
    ///
    /// # Panics
    ///
    /// If `position >= capacity()`.
    fn set_return_position(&mut self, position: usize);

    /// Run the delay. Returns the number of no-ops executed.
    fn invoke(&self) -> usize;
}

/// Fixed-capacity no-op buffer with one movable return.
pub struct InstructionBuffer<const N: usize = { crate::config::MAX_SLOTS }> {
    slots: [Opcode; N],
    ret: usize,
}

impl<const N: usize> InstructionBuffer<N> {
    /// Create a buffer with the return in slot 0 (shortest delay).
    pub const fn new() -> Self {
        assert!(N >= 3, "Delay line needs at least three slots");

        let mut slots = [Opcode::Nop; N];
        slots[0] = Opcode::Return;
        Self { slots, ret: 0 }
    }

    /// Slot contents, for inspection.
    #[inline]
    pub fn slots(&self) -> &[Opcode; N] {
        &self.slots
    }

    /// Opcode at `index`.
    #[inline]
    pub fn opcode(&self, index: usize) -> Option<Opcode> {
        self.slots.get(index).copied()
    }
}

impl<const N: usize> Default for InstructionBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DelayLine for InstructionBuffer<N> {
    #[inline]
    fn capacity(&self) -> usize {
        N
    }

    #[inline]
    fn return_position(&self) -> usize {
        self.ret
    }

    /// Touches only the old and the new slot.
    #[inline]
    fn set_return_position(&mut self, position: usize) {
        assert!(position < N, "return position {} out of range", position);
        self.slots[self.ret] = Opcode::Nop;
        self.slots[position] = Opcode::Return;
        self.ret = position;
    }

    /// Walk the buffer from slot 0 until the return.
    ///
    /// Each slot is loaded with a volatile read so the walk cannot be folded
    /// into a multiply, and every no-op costs a real `nop`.
    #[inline(never)]
    fn invoke(&self) -> usize {
        compiler_fence(Ordering::SeqCst);

        let base = self.slots.as_ptr();
        let mut executed = 0;
        while executed < N {
            // SAFETY: executed < N, so the pointer stays inside `slots`.
            let op = unsafe { core::ptr::read_volatile(base.add(executed)) };
            if op == Opcode::Return {
                break;
            }
            nop();
            executed += 1;
        }

        compiler_fence(Ordering::SeqCst);
        executed
    }
}

/// Burn one cycle.
#[inline(always)]
fn nop() {
    // SAFETY: `nop` has no operands and no side effects.
    unsafe { core::arch::asm!("nop", options(nomem, nostack, preserves_flags)) };
}
