// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! RISC-V architecture support crate.
#![cfg_attr(not(test), no_std)]

pub mod console;
mod macros;
pub mod register;
pub mod sbi;
pub mod trap;

pub use register::*;

/// Parks the current hart forever.
///
/// This is the terminal state of every fatal path in the kernel: the hart sleeps in a `wfi` loop
/// and never returns to the interrupted code.
pub fn halt() -> ! {
    loop {
        cfg_if::cfg_if! {
            if #[cfg(any(target_arch = "riscv64", target_arch = "riscv32"))] {
                // Safety: `wfi` has no side effects besides stalling the hart
                unsafe { core::arch::asm!("wfi") };
            } else {
                core::hint::spin_loop();
            }
        }
    }
}
