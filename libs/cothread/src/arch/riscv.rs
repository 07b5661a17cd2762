// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! ## Stack layout
//!
//! Here is what the top of a suspended thread's stack looks like. `switch` pushes exactly the
//! callee-saved registers of the RISC-V calling convention plus the return address, 13 words in
//! total:
//!
//! ```text
//! |              |
//! ~ thread data  ~
//! |              |
//! +--------------+
//! | Saved S11    |
//! +--------------+
//! ~     ...      ~
//! +--------------+
//! | Saved S1     |
//! +--------------+
//! | Saved S0/FP  |
//! +--------------+
//! | Saved RA     |
//! +--------------+  <- Saved stack pointer
//! ```
//!
//! A thread that has never run gets the same frame synthesized at the very top of its stack, with
//! every S register zeroed and RA pointing at the thread's entry function:
//!
//! ```text
//! +--------------+  <- Stack top
//! | 0 (S11)      |
//! +--------------+
//! ~     ...      ~
//! +--------------+
//! | 0 (S0/FP)    |
//! +--------------+
//! | Entry        |
//! +--------------+  <- Initial stack pointer
//! ```
//!
//! The restore path of `switch` then loads those zeroes, pops the frame (leaving SP at the stack
//! top) and `ret`s straight into the entry function.

use core::arch::naked_asm;
use riscv::{load_gp, save_gp, xlen_bytes};
use static_assertions::const_assert_eq;

#[cfg(any(target_feature = "f", target_feature = "d"))]
compile_error!("floating point callee-saved registers are not preserved across a thread switch");

/// Number of words in a [`SwitchFrame`].
const SWITCH_FRAME_WORDS: usize = 13;

macro_rules! addi {
    ($dest:expr, $src:expr, $word_offset:expr) => {
        concat!("addi ", $dest, ", ", $src, ", ", xlen_bytes!($word_offset),)
    };
}

/// The save area `switch` pushes onto the outgoing stack.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchFrame {
    pub ra: usize,
    pub s0: usize,
    pub s: [usize; 11],
}

const_assert_eq!(size_of::<SwitchFrame>(), SWITCH_FRAME_WORDS * size_of::<usize>());
const_assert_eq!(core::mem::offset_of!(SwitchFrame, ra), 0);
const_assert_eq!(core::mem::offset_of!(SwitchFrame, s0), size_of::<usize>());
const_assert_eq!(core::mem::offset_of!(SwitchFrame, s), 2 * size_of::<usize>());

impl SwitchFrame {
    pub fn new(entry: crate::Entry) -> Self {
        Self {
            ra: entry as usize,
            s0: 0,
            s: [0; 11],
        }
    }
}

/// Suspends the running context and resumes the one whose stack pointer is stored in `next_sp`.
///
/// The current stack pointer is written to `prev_sp` after the callee-saved registers have been
/// pushed, so resuming from `prev_sp` later makes this call return as if nothing had happened.
///
/// # Safety
///
/// - `prev_sp` must be valid for writes and `next_sp` valid for reads.
/// - `next_sp` must hold either a stack pointer written by a previous `switch` or one produced by
///   [`init_frame`](super::init_frame), and the stack it points into must not be in use.
/// - No trap may be taken while the stack pointer is in flux.
#[unsafe(naked)]
pub unsafe extern "C" fn switch(prev_sp: *mut usize, next_sp: *const usize) {
    naked_asm! {
        ".balign 4",
        // Make room for the save area on the outgoing stack.
        addi!("sp", "sp", -13),

        save_gp!(ra => sp[0]),
        save_gp!(s0 => sp[1]),
        save_gp!(s1 => sp[2]),
        save_gp!(s2 => sp[3]),
        save_gp!(s3 => sp[4]),
        save_gp!(s4 => sp[5]),
        save_gp!(s5 => sp[6]),
        save_gp!(s6 => sp[7]),
        save_gp!(s7 => sp[8]),
        save_gp!(s8 => sp[9]),
        save_gp!(s9 => sp[10]),
        save_gp!(s10 => sp[11]),
        save_gp!(s11 => sp[12]),

        // Publish where the outgoing thread has to resume and switch stacks.
        save_gp!(sp => a0[0]),
        load_gp!(a1[0] => sp),

        load_gp!(sp[0] => ra),
        load_gp!(sp[1] => s0),
        load_gp!(sp[2] => s1),
        load_gp!(sp[3] => s2),
        load_gp!(sp[4] => s3),
        load_gp!(sp[5] => s4),
        load_gp!(sp[6] => s5),
        load_gp!(sp[7] => s6),
        load_gp!(sp[8] => s7),
        load_gp!(sp[9] => s8),
        load_gp!(sp[10] => s9),
        load_gp!(sp[11] => s10),
        load_gp!(sp[12] => s11),

        addi!("sp", "sp", 13),
        "ret",
    }
}
