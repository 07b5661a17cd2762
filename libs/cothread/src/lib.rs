// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Cooperative kernel threads for a single hart.
//!
//! Threads live in a fixed-size [`ThreadTable`], each owning a statically allocated [`Stack`].
//! Nothing preempts a running thread: control only moves when a thread calls
//! [`Scheduler::yield_now`] or [`Scheduler::exit`], at which point the [`Scheduler`] picks the
//! next ready thread in round-robin order and switches stacks to it. When no worker is ready the
//! scheduler falls back to the idle thread, which is the boot context that called
//! [`Scheduler::init`].
//!
//! ```ignore
//! static SCHED: Scheduler<2, 4096> = Scheduler::new();
//!
//! extern "C" fn worker() -> ! {
//!     SCHED.yield_now();
//!     SCHED.exit()
//! }
//!
//! SCHED.init();
//! SCHED.create(worker)?;
//! while !SCHED.all_terminated() {
//!     SCHED.schedule();
//! }
//! ```

#![cfg_attr(not(test), no_std)]

mod arch;
mod error;
mod scheduler;
mod thread;

pub use arch::SwitchFrame;
pub use error::{Error, Result};
pub use scheduler::Scheduler;
pub use thread::{Stack, Status, Thread, ThreadId, ThreadTable};

/// The function a thread starts executing in.
///
/// Entries never return. A thread that is done calls [`Scheduler::exit`] instead.
pub type Entry = extern "C" fn() -> !;

/// Switches from the current context to another one.
///
/// The stack pointer of the current context is stored into `*prev_sp` and the context saved at
/// `*next_sp` is resumed. The call returns when some other context switches back using `prev_sp`.
///
/// # Safety
///
/// See the per-architecture requirements: both pointers must be valid, `*next_sp` must describe a
/// suspended or freshly initialized context, and that context's stack must not be in use.
#[inline]
pub unsafe fn switch(prev_sp: *mut usize, next_sp: *const usize) {
    // Safety: ensured by caller
    unsafe { arch::switch(prev_sp, next_sp) }
}
