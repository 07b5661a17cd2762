// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! ## Stack layout
//!
//! `switch` is entered through a `call`, so the return address is already on the stack. It then
//! pushes the System V callee-saved registers on top of it:
//!
//! ```text
//! |              |
//! ~ thread data  ~
//! |              |
//! +--------------+
//! | Return addr  |
//! +--------------+
//! | Saved RBP    |
//! +--------------+
//! | Saved RBX    |
//! +--------------+
//! | Saved R12    |
//! +--------------+
//! ~     ...      ~
//! +--------------+
//! | Saved R15    |
//! +--------------+  <- Saved stack pointer
//! ```
//!
//! A fresh thread gets a frame whose return address is its entry function, followed by one word
//! of padding. After `ret` pops the entry address the stack pointer sits 8 bytes below the
//! aligned stack top, exactly where a regular `call` would have left it.

use core::arch::naked_asm;
use static_assertions::const_assert_eq;

/// The save area `switch` pushes onto the outgoing stack, plus the alignment word used by
/// freshly initialized threads.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchFrame {
    pub r15: usize,
    pub r14: usize,
    pub r13: usize,
    pub r12: usize,
    pub rbx: usize,
    pub rbp: usize,
    pub ret: usize,
    pub pad: usize,
}

const_assert_eq!(size_of::<SwitchFrame>(), 64);
const_assert_eq!(core::mem::offset_of!(SwitchFrame, ret), 48);

impl SwitchFrame {
    pub fn new(entry: crate::Entry) -> Self {
        Self {
            r15: 0,
            r14: 0,
            r13: 0,
            r12: 0,
            rbx: 0,
            rbp: 0,
            ret: entry as usize,
            pad: 0,
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
        "push rbp",
        "push rbx",
        "push r12",
        "push r13",
        "push r14",
        "push r15",

        "mov [rdi], rsp",
        "mov rsp, [rsi]",

        "pop r15",
        "pop r14",
        "pop r13",
        "pop r12",
        "pop rbx",
        "pop rbp",
        "ret",
    }
}

/// Number of callee-saved registers [`call_with_pinned_registers`] checks.
#[cfg(test)]
pub(crate) const PINNED_REGISTERS: usize = 6;

/// Loads `seed + k` into the k-th callee-saved register (RBX, RBP, R12-R15), calls `f` and returns
/// what those registers hold once `f` returns. Any value other than `seed + k` means `f`
/// clobbered a register the calling convention says it must preserve.
#[cfg(test)]
pub(crate) fn call_with_pinned_registers(
    seed: u64,
    f: extern "C" fn(),
) -> [u64; PINNED_REGISTERS] {
    let mut out = [0u64; PINNED_REGISTERS];

    // Safety: every register the block overwrites is either declared through `clobber_abi` or
    // pushed on entry and popped before it ends. The stack is 16-byte aligned at the `call`
    // because the block starts aligned and pushes eight words.
    unsafe {
        core::arch::asm! {
            "push rbx",
            "push rbp",
            "push r12",
            "push r13",
            "push r14",
            "push r15",
            "push rdi",
            "sub rsp, 8",

            "mov rbx, rsi",
            "lea rbp, [rsi + 1]",
            "lea r12, [rsi + 2]",
            "lea r13, [rsi + 3]",
            "lea r14, [rsi + 4]",
            "lea r15, [rsi + 5]",

            "call rdx",

            "mov rax, [rsp + 8]",
            "mov [rax], rbx",
            "mov [rax + 8], rbp",
            "mov [rax + 16], r12",
            "mov [rax + 24], r13",
            "mov [rax + 32], r14",
            "mov [rax + 40], r15",

            "add rsp, 16",
            "pop r15",
            "pop r14",
            "pop r13",
            "pop r12",
            "pop rbp",
            "pop rbx",
            in("rdi") out.as_mut_ptr(),
            in("rsi") seed,
            in("rdx") f,
            clobber_abi("C"),
        }
    }

    out
}
