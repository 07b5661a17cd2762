// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::thread::{Status, Tcb, ThreadId, ThreadTable};
use crate::{Entry, Result};
use core::cell::Cell;

/// Cooperative round-robin scheduler over a [`ThreadTable`] of `N` threads.
///
/// The context that calls [`Scheduler::init`] becomes the idle thread. It is not part of the
/// ring: it only runs when no worker is ready, and it is the context control returns to once
/// every worker has terminated.
///
/// A `Scheduler` is meant to live in a `static`. It is only sound to use from a single hart with
/// traps that never return into a thread, which is the only environment the kernel runs in.
pub struct Scheduler<const N: usize, const STACK: usize> {
    table: ThreadTable<N, STACK>,
    idle: Tcb,
    current: Cell<ThreadId>,
}

// Safety: all state is only touched by the one thread that is running on the one hart, and
// control only changes hands inside `schedule`.
unsafe impl<const N: usize, const STACK: usize> Sync for Scheduler<N, STACK> {}

impl<const N: usize, const STACK: usize> Scheduler<N, STACK> {
    pub const fn new() -> Self {
        Self {
            table: ThreadTable::new(),
            idle: Tcb::new(),
            current: Cell::new(ThreadId::IDLE),
        }
    }

    /// Resets the thread table and turns the calling context into the running idle thread.
    pub fn init(&self) {
        self.table.init();

        self.idle.reset();
        self.idle.status.set(Status::Running);
        self.current.set(ThreadId::IDLE);
    }

    /// Creates a worker thread, see [`ThreadTable::create`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExhausted`](crate::Error::CapacityExhausted) when the table is
    /// full.
    pub fn create(&self, entry: Entry) -> Result<ThreadId> {
        self.table.create(entry)
    }

    pub fn all_terminated(&self) -> bool {
        self.table.all_terminated()
    }

    /// The identity of the running thread.
    pub fn current(&self) -> ThreadId {
        self.current.get()
    }

    pub fn status(&self, id: ThreadId) -> Option<Status> {
        self.tcb(id).map(|tcb| tcb.status.get())
    }

    pub fn saved_sp(&self, id: ThreadId) -> Option<usize> {
        self.tcb(id).map(|tcb| tcb.sp.get())
    }

    /// Stack high-water mark of a worker, `None` for the idle thread or unknown identities.
    pub fn stack_usage(&self, id: ThreadId) -> Option<usize> {
        self.table.get(id).map(|thread| thread.stack_usage())
    }

    pub fn table(&self) -> &ThreadTable<N, STACK> {
        &self.table
    }

    /// Picks the next thread to run and switches to it.
    ///
    /// The ring is scanned starting at the slot after the current thread and the first ready
    /// worker wins. When no worker is ready the idle thread runs. The previous thread goes back
    /// to [`Status::Ready`] unless it has already left the running state by itself.
    ///
    /// Returns once some later `schedule` call switches back to the caller.
    pub fn schedule(&self) {
        let prev_id = self.current.get();
        let next_id = self.pick_next(prev_id);

        let prev = self.tcb_unchecked(prev_id);
        let next = self.tcb_unchecked(next_id);

        if prev_id == next_id {
            // only the idle thread can pick itself: it never leaves the running state
            next.status.set(Status::Running);
            return;
        }

        if prev.status.get() == Status::Running {
            prev.status.set(Status::Ready);
        }
        next.status.set(Status::Running);
        self.current.set(next_id);

        log::trace!(
            "switch {prev_id} ({}) -> {next_id} (sp={:#x})",
            prev.status.get(),
            next.sp.get()
        );

        // Safety: both slots live as long as `self`. The next thread is either suspended inside
        // `schedule` or has a frame synthesized by `create`, and since it is not running nobody
        // else uses its stack.
        unsafe {
            crate::switch(prev.sp.as_ptr(), next.sp.as_ptr().cast_const());
        }
    }

    /// Gives up the processor to the next ready thread.
    pub fn yield_now(&self) {
        self.schedule();
    }

    /// Terminates the calling thread and switches away for good.
    ///
    /// The slot keeps its identity until `create` reuses it.
    ///
    /// # Panics
    ///
    /// Panics when called from the idle thread, which has nowhere to return to.
    pub fn exit(&self) -> ! {
        let id = self.current.get();
        assert!(!id.is_idle(), "the idle thread cannot exit");

        self.tcb_unchecked(id).status.set(Status::Terminated);
        log::debug!("thread {id} exited");

        self.schedule();
        unreachable!("terminated thread {id} was resumed");
    }

    fn pick_next(&self, current: ThreadId) -> ThreadId {
        let start = current.as_usize();

        (0..N)
            .map(|i| self.table.slot((start + i) % N))
            .find(|thread| !thread.id().is_idle() && thread.status() == Status::Ready)
            .map_or(ThreadId::IDLE, |thread| thread.id())
    }

    fn tcb(&self, id: ThreadId) -> Option<&Tcb> {
        if id.is_idle() {
            Some(&self.idle)
        } else {
            self.table.get(id).map(|thread| thread.tcb())
        }
    }

    fn tcb_unchecked(&self, id: ThreadId) -> &Tcb {
        match id.slot() {
            None => &self.idle,
            Some(slot) => self.table.slot(slot).tcb(),
        }
    }
}

impl<const N: usize, const STACK: usize> Default for Scheduler<N, STACK> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Mutex;

    const HOST_STACK: usize = 64 * 1024;

    // Worker bodies run on their own stacks and must not panic, since a panic cannot unwind out
    // of an `extern "C"` entry. They record what they observe and the test asserts afterwards.

    mod two_workers {
        use super::*;

        pub static SCHED: Scheduler<8, HOST_STACK> = Scheduler::new();
        pub static TRACE: Mutex<Vec<(usize, usize)>> = Mutex::new(Vec::new());

        fn record(step: usize) {
            TRACE
                .lock()
                .unwrap()
                .push((SCHED.current().as_usize(), step));
        }

        pub extern "C" fn worker() -> ! {
            for step in 0..2 {
                record(step);
                SCHED.yield_now();
            }
            record(2);
            SCHED.exit()
        }
    }

    #[test_log::test]
    fn two_workers_interleave_until_done() {
        use two_workers::*;

        SCHED.init();
        let a = SCHED.create(worker).unwrap();
        let b = SCHED.create(worker).unwrap();
        assert_eq!((a.as_usize(), b.as_usize()), (1, 2));

        let mut rounds = 0;
        while !SCHED.all_terminated() {
            SCHED.schedule();
            rounds += 1;
        }

        // everything ran on worker stacks without going back to idle in between
        assert_eq!(rounds, 1);
        assert_eq!(
            *TRACE.lock().unwrap(),
            [(1, 0), (2, 0), (1, 1), (2, 1), (1, 2), (2, 2)]
        );
        assert_eq!(SCHED.current(), ThreadId::IDLE);
        assert_eq!(SCHED.status(ThreadId::IDLE), Some(Status::Running));
        assert_eq!(SCHED.status(a), Some(Status::Terminated));
        assert_eq!(SCHED.status(b), Some(Status::Terminated));

        // identities survive termination until the slot is reused
        assert_eq!(SCHED.table().get(a).unwrap().id(), a);
        assert!(SCHED.stack_usage(a).unwrap() > 0);
        assert!(SCHED.stack_usage(a).unwrap() <= HOST_STACK);
    }

    mod round_robin {
        use super::*;

        pub static SCHED: Scheduler<4, HOST_STACK> = Scheduler::new();
        pub static ORDER: Mutex<Vec<usize>> = Mutex::new(Vec::new());

        pub extern "C" fn worker() -> ! {
            for _ in 0..3 {
                ORDER.lock().unwrap().push(SCHED.current().as_usize());
                SCHED.yield_now();
            }
            SCHED.exit()
        }
    }

    #[test_log::test]
    fn round_robin_wraps_around_the_ring() {
        use round_robin::*;

        SCHED.init();
        for _ in 0..4 {
            SCHED.create(worker).unwrap();
        }
        assert_eq!(
            SCHED.create(worker),
            Err(Error::CapacityExhausted { capacity: 4 })
        );

        while !SCHED.all_terminated() {
            SCHED.schedule();
        }

        assert_eq!(
            *ORDER.lock().unwrap(),
            [1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]
        );
    }

    mod lone_worker {
        use super::*;

        pub static SCHED: Scheduler<8, HOST_STACK> = Scheduler::new();
        pub static SEEN: Mutex<Vec<(usize, Option<Status>)>> = Mutex::new(Vec::new());

        pub extern "C" fn worker() -> ! {
            for _ in 0..3 {
                let idle = SCHED.status(ThreadId::IDLE);
                SEEN.lock().unwrap().push((SCHED.current().as_usize(), idle));
                SCHED.yield_now();
            }
            SCHED.exit()
        }
    }

    #[test_log::test]
    fn lone_worker_yields_to_idle() {
        use lone_worker::*;

        SCHED.init();
        let id = SCHED.create(worker).unwrap();

        let mut rounds = 0;
        while !SCHED.all_terminated() {
            // idle is the running thread whenever the loop gets control
            assert_eq!(SCHED.current(), ThreadId::IDLE);
            assert_eq!(SCHED.status(ThreadId::IDLE), Some(Status::Running));
            SCHED.schedule();
            rounds += 1;
        }

        // three yields back to idle plus the final exit
        assert_eq!(rounds, 4);
        assert_eq!(
            *SEEN.lock().unwrap(),
            [
                (1, Some(Status::Ready)),
                (1, Some(Status::Ready)),
                (1, Some(Status::Ready))
            ]
        );
        assert_eq!(SCHED.status(id), Some(Status::Terminated));
    }

    mod parked {
        use super::*;

        pub static SCHED: Scheduler<8, HOST_STACK> = Scheduler::new();

        pub extern "C" fn worker() -> ! {
            SCHED.exit()
        }
    }

    #[test]
    fn idle_fallback_skips_waiting_threads() {
        use parked::*;

        SCHED.init();

        // nothing to run at all
        SCHED.schedule();
        assert_eq!(SCHED.current(), ThreadId::IDLE);
        assert_eq!(SCHED.status(ThreadId::IDLE), Some(Status::Running));

        let id = SCHED.create(worker).unwrap();
        let sp = SCHED.saved_sp(id).unwrap();
        SCHED
            .table()
            .get(id)
            .unwrap()
            .tcb()
            .status
            .set(Status::Waiting);

        SCHED.schedule();
        assert_eq!(SCHED.current(), ThreadId::IDLE);
        assert_eq!(SCHED.status(id), Some(Status::Waiting));
        // the worker never ran
        assert_eq!(SCHED.saved_sp(id), Some(sp));
        assert!(!SCHED.all_terminated());

        // once it is ready again it runs and exits
        SCHED
            .table()
            .get(id)
            .unwrap()
            .tcb()
            .status
            .set(Status::Ready);
        SCHED.schedule();
        assert_eq!(SCHED.status(id), Some(Status::Terminated));
        assert!(SCHED.all_terminated());
        assert_eq!(SCHED.current(), ThreadId::IDLE);
    }

    mod recycle {
        use super::*;

        pub static SCHED: Scheduler<1, HOST_STACK> = Scheduler::new();
        pub static RUNS: Mutex<usize> = Mutex::new(0);

        pub extern "C" fn worker() -> ! {
            *RUNS.lock().unwrap() += 1;
            SCHED.exit()
        }
    }

    #[test]
    fn exited_slot_is_recycled() {
        use recycle::*;

        SCHED.init();
        for _ in 0..3 {
            let id = SCHED.create(worker).unwrap();
            assert_eq!(id, ThreadId::from_slot(0));
            assert_eq!(
                SCHED.create(worker),
                Err(Error::CapacityExhausted { capacity: 1 })
            );

            while !SCHED.all_terminated() {
                SCHED.schedule();
            }
        }

        assert_eq!(*RUNS.lock().unwrap(), 3);
    }

    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
    mod registers {
        use super::*;
        use crate::arch::{PINNED_REGISTERS, call_with_pinned_registers};

        pub static SCHED: Scheduler<8, HOST_STACK> = Scheduler::new();
        pub static RESULTS: Mutex<Vec<(u64, [u64; PINNED_REGISTERS])>> = Mutex::new(Vec::new());

        extern "C" fn yield_now() {
            SCHED.yield_now();
        }

        pub extern "C" fn worker() -> ! {
            // distinct per thread so a restore from the wrong frame shows up too
            let seed = 0xc0de_0000 + SCHED.current().as_usize() as u64 * 0x100;
            for _ in 0..3 {
                let observed = call_with_pinned_registers(seed, yield_now);
                RESULTS.lock().unwrap().push((seed, observed));
            }
            SCHED.exit()
        }
    }

    #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
    #[test_log::test]
    fn callee_saved_registers_survive_switches() {
        use crate::arch::PINNED_REGISTERS;
        use registers::*;

        SCHED.init();
        for _ in 0..3 {
            SCHED.create(worker).unwrap();
        }
        while !SCHED.all_terminated() {
            SCHED.schedule();
        }

        let results = RESULTS.lock().unwrap();
        assert_eq!(results.len(), 9);
        for (seed, observed) in results.iter() {
            let expected: [u64; PINNED_REGISTERS] = core::array::from_fn(|k| seed + k as u64);
            assert_eq!(*observed, expected, "registers pinned to {seed:#x} were clobbered");
        }
    }
}
