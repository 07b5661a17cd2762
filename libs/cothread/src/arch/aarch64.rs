// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! ## Stack layout
//!
//! AAPCS64 makes X19-X29, the link register and the low halves of V8-V15 callee-saved. `switch`
//! stores all of them in a single 0xa0 byte area:
//!
//! ```text
//! +--------------+  <- Stack pointer before the switch
//! | Saved D15    |
//! +--------------+
//! ~     ...      ~
//! +--------------+
//! | Saved D8     |
//! +--------------+
//! | Saved X30/LR |
//! +--------------+
//! | Saved X29/FP |
//! +--------------+
//! ~     ...      ~
//! +--------------+
//! | Saved X19    |
//! +--------------+  <- Saved stack pointer
//! ```
//!
//! Fresh threads get the same area with everything zeroed except LR, which holds the entry
//! function.

use core::arch::naked_asm;
use static_assertions::const_assert_eq;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchFrame {
    pub x19_x28: [usize; 10],
    pub fp: usize,
    pub lr: usize,
    pub d8_d15: [u64; 8],
}

const_assert_eq!(size_of::<SwitchFrame>(), 0xa0);
const_assert_eq!(core::mem::offset_of!(SwitchFrame, lr), 0x58);

impl SwitchFrame {
    pub fn new(entry: crate::Entry) -> Self {
        Self {
            x19_x28: [0; 10],
            fp: 0,
            lr: entry as usize,
            d8_d15: [0; 8],
        }
    }
}

/// Suspends the running context and resumes the one whose stack pointer is stored in `next_sp`.
///
/// # Safety
///
/// - `prev_sp` must be valid for writes and `next_sp` valid for reads.
/// - `next_sp` must hold either a stack pointer written by a previous `switch` or one produced by
///   [`init_frame`](super::init_frame), and the stack it points into must not be in use.
#[unsafe(naked)]
pub unsafe extern "C" fn switch(prev_sp: *mut usize, next_sp: *const usize) {
    naked_asm! {
        ".balign 16",
        "sub sp, sp, #0xa0",
        "stp x19, x20, [sp, #0x00]",
        "stp x21, x22, [sp, #0x10]",
        "stp x23, x24, [sp, #0x20]",
        "stp x25, x26, [sp, #0x30]",
        "stp x27, x28, [sp, #0x40]",
        "stp x29, x30, [sp, #0x50]",
        "stp d8, d9, [sp, #0x60]",
        "stp d10, d11, [sp, #0x70]",
        "stp d12, d13, [sp, #0x80]",
        "stp d14, d15, [sp, #0x90]",

        "mov x2, sp",
        "str x2, [x0]",
        "ldr x2, [x1]",
        "mov sp, x2",

        "ldp x19, x20, [sp, #0x00]",
        "ldp x21, x22, [sp, #0x10]",
        "ldp x23, x24, [sp, #0x20]",
        "ldp x25, x26, [sp, #0x30]",
        "ldp x27, x28, [sp, #0x40]",
        "ldp x29, x30, [sp, #0x50]",
        "ldp d8, d9, [sp, #0x60]",
        "ldp d10, d11, [sp, #0x70]",
        "ldp d12, d13, [sp, #0x80]",
        "ldp d14, d15, [sp, #0x90]",
        "add sp, sp, #0xa0",
        "ret",
    }
}

/// Number of callee-saved registers [`call_with_pinned_registers`] checks.
#[cfg(test)]
pub(crate) const PINNED_REGISTERS: usize = 19;

/// Loads `seed + k` into the k-th callee-saved register (X19-X29, then the bits of D8-D15), calls
/// `f` and returns what those registers hold once `f` returns. Any value other than `seed + k`
/// means `f` clobbered a register the calling convention says it must preserve.
#[cfg(test)]
pub(crate) fn call_with_pinned_registers(
    seed: u64,
    f: extern "C" fn(),
) -> [u64; PINNED_REGISTERS] {
    let mut out = [0u64; PINNED_REGISTERS];

    // Safety: every register the block overwrites is either declared through `clobber_abi` or
    // stored on entry and reloaded before it ends. Every adjustment of sp is a multiple of 16.
    unsafe {
        core::arch::asm! {
            "stp x29, x30, [sp, #-16]!",
            "stp x19, x20, [sp, #-16]!",
            "stp x21, x22, [sp, #-16]!",
            "stp x23, x24, [sp, #-16]!",
            "stp x25, x26, [sp, #-16]!",
            "stp x27, x28, [sp, #-16]!",
            "stp d8, d9, [sp, #-16]!",
            "stp d10, d11, [sp, #-16]!",
            "stp d12, d13, [sp, #-16]!",
            "stp d14, d15, [sp, #-16]!",
            "str x0, [sp, #-16]!",

            "mov x19, x1",
            "add x20, x1, #1",
            "add x21, x1, #2",
            "add x22, x1, #3",
            "add x23, x1, #4",
            "add x24, x1, #5",
            "add x25, x1, #6",
            "add x26, x1, #7",
            "add x27, x1, #8",
            "add x28, x1, #9",
            "add x29, x1, #10",
            "add x9, x1, #11",
            "fmov d8, x9",
            "add x9, x1, #12",
            "fmov d9, x9",
            "add x9, x1, #13",
            "fmov d10, x9",
            "add x9, x1, #14",
            "fmov d11, x9",
            "add x9, x1, #15",
            "fmov d12, x9",
            "add x9, x1, #16",
            "fmov d13, x9",
            "add x9, x1, #17",
            "fmov d14, x9",
            "add x9, x1, #18",
            "fmov d15, x9",

            "blr x2",

            "ldr x0, [sp], #16",
            "stp x19, x20, [x0, #0]",
            "stp x21, x22, [x0, #16]",
            "stp x23, x24, [x0, #32]",
            "stp x25, x26, [x0, #48]",
            "stp x27, x28, [x0, #64]",
            "str x29, [x0, #80]",
            "stp d8, d9, [x0, #88]",
            "stp d10, d11, [x0, #104]",
            "stp d12, d13, [x0, #120]",
            "stp d14, d15, [x0, #136]",

            "ldp d14, d15, [sp], #16",
            "ldp d12, d13, [sp], #16",
            "ldp d10, d11, [sp], #16",
            "ldp d8, d9, [sp], #16",
            "ldp x27, x28, [sp], #16",
            "ldp x25, x26, [sp], #16",
            "ldp x23, x24, [sp], #16",
            "ldp x21, x22, [sp], #16",
            "ldp x19, x20, [sp], #16",
            "ldp x29, x30, [sp], #16",
            in("x0") out.as_mut_ptr(),
            in("x1") seed,
            in("x2") f,
            clobber_abi("C"),
        }
    }

    out
}
