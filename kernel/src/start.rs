// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::BOOT_STACK_SIZE;
use core::arch::naked_asm;
use riscv::{save_gp, xlen_bytes};

#[repr(C, align(16))]
struct BootStack([u8; BOOT_STACK_SIZE]);

/// The stack `kmain` and later the idle thread run on.
#[unsafe(link_section = ".bss.uninit")]
static mut BOOT_STACK: BootStack = BootStack([0; BOOT_STACK_SIZE]);

/// Kernel entry point. OpenSBI jumps here in S-mode with `a0` = hart id and `a1` = device tree.
#[unsafe(link_section = ".text.boot")]
#[unsafe(no_mangle)]
#[unsafe(naked)]
unsafe extern "C" fn _start() -> ! {
    naked_asm! {
        // Clear return address and frame pointer so backtraces terminate here
        "mv ra, zero",
        "mv s0, zero",
        "mv gp, zero",

        // Mask all interrupts in case the previous stage left them on.
        "csrc sstatus, 1 << 1",
        "csrw sie, zero",

        // Zero the .bss section, the boot stack included.
        "la t0, __bss_start",
        "la t1, __bss_end",
        "1:",
        "   bgeu t0, t1, 2f",
        save_gp!(zero => t0[0]),
        concat!("   addi t0, t0, ", xlen_bytes!()),
        "   j 1b",
        "2:",

        // Setup the stack pointer
        "la   t0, {boot_stack_start}",
        "li   t1, {boot_stack_size}",
        "add  sp, t0, t1",

        "call {kmain}",

        // Loop forever.
        // `kmain` never returns, but in case it does prevent the hart from executing random code
        "3:",
        "   wfi",
        "   j 3b",

        boot_stack_start = sym BOOT_STACK,
        boot_stack_size = const BOOT_STACK_SIZE,
        kmain = sym crate::kmain,
    }
}
