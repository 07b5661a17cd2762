// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Supervisor Trap Vector Base Address Register

use super::set;

set!(0x105);

/// Installs `base` as the trap vector.
///
/// The two low bits of `stvec` encode the [`Mode`], so `base` must be 4-byte aligned.
///
/// # Safety
///
/// `base` must point to a valid trap entry point that stays alive for as long as traps can occur.
pub unsafe fn write(base: usize, mode: Mode) {
    debug_assert_eq!(base & 0b11, 0, "trap vector base must be 4-byte aligned");

    // Safety: ensured by caller
    unsafe {
        _set(encode(base, mode));
    }
}

const fn encode(base: usize, mode: Mode) -> usize {
    base | mode as usize
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    /// All exceptions set `pc` to `BASE`.
    Direct = 0,
    /// Asynchronous interrupts set `pc` to `BASE+4×cause`.
    Vectored = 1,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_lands_in_low_bits() {
        assert_eq!(encode(0x8020_1000, Mode::Direct), 0x8020_1000);
        assert_eq!(encode(0x8020_1000, Mode::Vectored), 0x8020_1001);
        assert_eq!(encode(0x8020_1000, Mode::Vectored) & !0b11, 0x8020_1000);
    }
}
