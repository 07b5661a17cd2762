// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Fatal trap handling.
//!
//! The kernel never expects a trap: there are no interrupts enabled and no user mode. Anything
//! that does reach the trap vector is reported and the hart is parked.

use core::arch::naked_asm;
use riscv::trap::TrapReport;
use riscv::{stval, stvec};

pub fn init() {
    let entry = trap_entry as unsafe extern "C" fn() -> !;
    // Safety: `trap_entry` is 4-byte aligned and lives for the whole lifetime of the kernel
    unsafe { stvec::write(entry as usize, stvec::Mode::Direct) };
}

#[unsafe(naked)]
unsafe extern "C" fn trap_entry() -> ! {
    naked_asm! {
        ".balign 4",
        // capture the trap state before anything can clobber it
        "csrr a0, scause",
        "csrr a1, sepc",
        "call {report}",
        "1:",
        "   wfi",
        "   j 1b",
        report = sym report_fatal_trap,
    }
}

extern "C" fn report_fatal_trap(scause: usize, sepc: usize) -> ! {
    let report = TrapReport::new(scause, sepc);

    riscv::println!("{report}");
    log::error!(
        "unhandled {:?} in thread {} (stval {:#x})",
        report.scause,
        crate::SCHEDULER.current(),
        stval::read()
    );

    riscv::halt()
}

/// Executes an illegal instruction, which takes the fatal trap path.
#[cfg(feature = "trap-demo")]
pub fn raise_illegal_instruction() {
    log::warn!("raising an illegal instruction trap");

    // Safety: `unimp` traps immediately and the trap never returns here
    unsafe {
        core::arch::asm!("unimp", options(nomem, nostack));
    }
}
