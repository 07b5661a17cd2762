// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Architecture-specific context switching.
//!
//! Every backend provides the same three items:
//!
//! - `SwitchFrame`, the typed layout of the save area `switch` pushes onto the outgoing stack,
//! - `SwitchFrame::new(entry)`, the synthetic frame for a thread that has never run,
//! - `switch(prev_sp, next_sp)`, the naked routine that moves between two stacks.

cfg_if::cfg_if! {
    if #[cfg(any(target_arch = "riscv64", target_arch = "riscv32"))] {
        mod riscv;
        pub use riscv::*;
    } else if #[cfg(target_arch = "aarch64")] {
        mod aarch64;
        pub use aarch64::*;
    } else if #[cfg(all(target_arch = "x86_64", not(windows)))] {
        mod x86_64;
        pub use x86_64::*;
    } else {
        compile_error!("Unsupported target architecture");
    }
}

/// Alignment of the initial stack pointer handed to every thread.
pub const STACK_ALIGNMENT: usize = 16;

/// Places the initial [`SwitchFrame`] for `entry` directly below `stack_top` and returns its
/// address, which becomes the thread's saved stack pointer.
///
/// # Safety
///
/// `stack_top` must be the exclusive end of a writable region at least
/// `size_of::<SwitchFrame>()` bytes large, aligned to [`STACK_ALIGNMENT`], that no running code
/// is currently using as its stack.
pub unsafe fn init_frame(stack_top: *mut u8, entry: crate::Entry) -> usize {
    debug_assert_eq!(stack_top.addr() % STACK_ALIGNMENT, 0);

    // Safety: ensured by caller
    unsafe {
        #[allow(
            clippy::cast_ptr_alignment,
            reason = "stack_top is 16-byte aligned and the frame is a whole number of words"
        )]
        let frame = stack_top
            .sub(size_of::<SwitchFrame>())
            .cast::<SwitchFrame>();
        frame.write(SwitchFrame::new(entry));

        frame.expose_provenance()
    }
}
