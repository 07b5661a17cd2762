// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::arch::{self, STACK_ALIGNMENT, SwitchFrame};
use crate::{Entry, Error, Result};
use core::cell::{Cell, UnsafeCell};
use core::fmt;

/// Lifecycle state of a thread record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Eligible to be picked by the scheduler.
    Ready,
    /// Currently executing. Exactly one record is in this state once scheduling has started.
    Running,
    /// Parked until something marks it ready again. The scheduler never picks it.
    Waiting,
    /// Finished, or never started. A terminated slot may be reused by `create`.
    Terminated,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ready => "ready",
            Status::Running => "running",
            Status::Waiting => "waiting",
            Status::Terminated => "terminated",
        };
        f.pad(s)
    }
}

/// Identity of a thread.
///
/// `0` belongs to the idle thread and marks unused slots. Worker threads are numbered from `1`,
/// the identity of the thread in slot `i` is always `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(usize);

impl ThreadId {
    pub const IDLE: Self = Self(0);

    pub const fn from_slot(slot: usize) -> Self {
        Self(slot + 1)
    }

    /// The ring slot this identity refers to, `None` for the idle thread.
    pub const fn slot(self) -> Option<usize> {
        self.0.checked_sub(1)
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }

    pub const fn is_idle(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Statically allocated stack memory.
///
/// `S` must be a multiple of 16 so that the top of the stack is aligned the way every supported
/// calling convention expects, and large enough to hold the initial [`SwitchFrame`]. Both are
/// checked at compile time:
///
/// ```compile_fail
/// let _ = cothread::Stack::<16>::new();
/// ```
#[repr(C, align(16))]
pub struct Stack<const S: usize>([u8; S]);

impl<const S: usize> Stack<S> {
    pub const SIZE: usize = S;

    pub const fn new() -> Self {
        const {
            assert!(
                S % STACK_ALIGNMENT == 0,
                "stack size must be a multiple of the stack alignment"
            );
            assert!(
                S >= size_of::<SwitchFrame>(),
                "stack is too small for the initial switch frame"
            );
        }
        Self([0; S])
    }
}

impl<const S: usize> Default for Stack<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// The part of a thread record the scheduler works with. The idle thread has only this, it runs
/// on the boot stack.
pub(crate) struct Tcb {
    pub(crate) status: Cell<Status>,
    pub(crate) id: Cell<ThreadId>,
    pub(crate) sp: Cell<usize>,
}

impl Tcb {
    pub(crate) const fn new() -> Self {
        Self {
            status: Cell::new(Status::Terminated),
            id: Cell::new(ThreadId::IDLE),
            sp: Cell::new(0),
        }
    }

    pub(crate) fn reset(&self) {
        self.status.set(Status::Terminated);
        self.id.set(ThreadId::IDLE);
        self.sp.set(0);
    }
}

/// A thread record together with the stack it owns.
pub struct Thread<const STACK: usize> {
    tcb: Tcb,
    stack: UnsafeCell<Stack<STACK>>,
}

impl<const STACK: usize> Thread<STACK> {
    pub const fn new() -> Self {
        Self {
            tcb: Tcb::new(),
            stack: UnsafeCell::new(Stack::new()),
        }
    }

    pub fn status(&self) -> Status {
        self.tcb.status.get()
    }

    pub fn id(&self) -> ThreadId {
        self.tcb.id.get()
    }

    /// The stack pointer `switch` will resume this thread from. Only meaningful while the thread
    /// is not running.
    pub fn saved_sp(&self) -> usize {
        self.tcb.sp.get()
    }

    /// One past the highest address of the thread's stack.
    pub fn stack_top(&self) -> *mut u8 {
        self.stack.get().cast::<u8>().wrapping_add(STACK)
    }

    /// High-water mark of the stack in bytes.
    ///
    /// Stacks start out zeroed and grow downwards, so everything above the lowest nonzero byte
    /// has been touched at some point. Slots are not cleared when they are recycled, so the mark
    /// covers every thread that ever ran in this slot.
    pub fn stack_usage(&self) -> usize {
        let base = self.stack.get().cast::<u8>();

        let untouched = (0..STACK)
            .take_while(|&i| {
                // Safety: `i` is in bounds of the stack allocation. The read is volatile since
                // the memory is written by contexts the compiler cannot see.
                let byte = unsafe { base.add(i).read_volatile() };
                byte == 0
            })
            .count();

        STACK - untouched
    }

    pub(crate) fn tcb(&self) -> &Tcb {
        &self.tcb
    }
}

impl<const STACK: usize> Default for Thread<STACK> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const STACK: usize> fmt::Debug for Thread<STACK> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thread")
            .field("id", &self.id())
            .field("status", &self.status())
            .field("saved_sp", &format_args!("{:#x}", self.saved_sp()))
            .field("stack_top", &self.stack_top())
            .finish_non_exhaustive()
    }
}

/// Fixed-capacity registry of `N` threads, each with a `STACK` byte stack.
///
/// Slot order is the round-robin order used by the scheduler.
pub struct ThreadTable<const N: usize, const STACK: usize> {
    slots: [Thread<STACK>; N],
}

impl<const N: usize, const STACK: usize> ThreadTable<N, STACK> {
    pub const fn new() -> Self {
        Self {
            slots: [const { Thread::new() }; N],
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Marks every slot as free.
    ///
    /// Must not be called while any thread of this table is running or suspended mid-execution.
    pub fn init(&self) {
        for slot in &self.slots {
            slot.tcb.reset();
        }
    }

    /// Sets up a new thread that starts executing `entry` the first time it is scheduled.
    ///
    /// The first terminated slot is used. Its stack receives a synthetic switch frame whose
    /// return address is `entry` and whose other registers are all zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExhausted`] when every slot holds a thread that has not
    /// terminated yet.
    pub fn create(&self, entry: Entry) -> Result<ThreadId> {
        let (slot, thread) = self
            .slots
            .iter()
            .enumerate()
            .find(|(_, thread)| thread.status() == Status::Terminated)
            .ok_or(Error::CapacityExhausted { capacity: N })?;

        let stack_top = thread.stack_top();
        // Safety: the slot is terminated so nothing executes on its stack anymore, and
        // `Stack::new` rejects sizes that are misaligned or smaller than the frame.
        let sp = unsafe { arch::init_frame(stack_top, entry) };

        let id = ThreadId::from_slot(slot);
        thread.tcb.sp.set(sp);
        thread.tcb.id.set(id);
        thread.tcb.status.set(Status::Ready);

        log::debug!("created thread {id}: sp={sp:#x} stack_top={stack_top:p}");

        Ok(id)
    }

    /// Returns `true` when no worker thread is left to run.
    ///
    /// Slots that never held a thread (identity 0) are ignored.
    pub fn all_terminated(&self) -> bool {
        self.slots
            .iter()
            .all(|thread| thread.id().is_idle() || thread.status() == Status::Terminated)
    }

    pub fn get(&self, id: ThreadId) -> Option<&Thread<STACK>> {
        self.slots.get(id.slot()?)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Thread<STACK>> {
        self.slots.iter()
    }

    pub(crate) fn slot(&self, index: usize) -> &Thread<STACK> {
        &self.slots[index]
    }
}

impl<const N: usize, const STACK: usize> Default for ThreadTable<N, STACK> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize, const STACK: usize> IntoIterator for &'a ThreadTable<N, STACK> {
    type Item = &'a Thread<STACK>;
    type IntoIter = core::slice::Iter<'a, Thread<STACK>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SwitchFrame;
    use proptest::prelude::*;

    extern "C" fn never_runs() -> ! {
        unreachable!()
    }

    extern "C" fn never_runs_either() -> ! {
        unreachable!()
    }

    fn frame_of<const STACK: usize>(thread: &Thread<STACK>) -> SwitchFrame {
        // Safety: `create` wrote a frame at the saved stack pointer and the thread never ran
        unsafe { core::ptr::with_exposed_provenance::<SwitchFrame>(thread.saved_sp()).read() }
    }

    #[test]
    fn init_frees_every_slot() {
        let table = ThreadTable::<4, 256>::new();
        table.create(never_runs).unwrap();
        table.create(never_runs).unwrap();

        table.init();

        for thread in &table {
            assert_eq!(thread.id(), ThreadId::IDLE);
            assert_eq!(thread.status(), Status::Terminated);
        }
        assert!(table.all_terminated());
    }

    #[test_log::test]
    fn create_synthesizes_initial_frame() {
        let table = ThreadTable::<8, 1024>::new();
        table.init();

        let a = table.create(never_runs).unwrap();
        let b = table.create(never_runs_either).unwrap();
        assert_eq!(a, ThreadId::from_slot(0));
        assert_eq!(b, ThreadId::from_slot(1));
        assert_eq!(a.as_usize(), 1);
        assert_eq!(b.as_usize(), 2);

        let thread = table.get(a).unwrap();
        assert_eq!(thread.status(), Status::Ready);
        assert_eq!(
            thread.saved_sp(),
            thread.stack_top().addr() - size_of::<SwitchFrame>()
        );
        assert_eq!(thread.saved_sp() % size_of::<usize>(), 0);
        assert_eq!(frame_of(thread), SwitchFrame::new(never_runs));

        let thread = table.get(b).unwrap();
        assert_eq!(frame_of(thread), SwitchFrame::new(never_runs_either));
        assert_ne!(frame_of(thread), SwitchFrame::new(never_runs));
    }

    #[test]
    fn stack_top_is_aligned() {
        let table = ThreadTable::<3, SMALLEST_STACK>::new();
        for thread in &table {
            assert_eq!(thread.stack_top().addr() % STACK_ALIGNMENT, 0);
        }
    }

    const SMALLEST_STACK: usize = size_of::<SwitchFrame>().next_multiple_of(STACK_ALIGNMENT);

    #[test]
    fn smallest_stack_keeps_frames_in_their_own_slot() {
        let table = ThreadTable::<2, SMALLEST_STACK>::new();
        table.init();

        let a = table.create(never_runs).unwrap();
        let b = table.create(never_runs_either).unwrap();

        for id in [a, b] {
            let thread = table.get(id).unwrap();
            let top = thread.stack_top().addr();
            assert_eq!(thread.saved_sp(), top - size_of::<SwitchFrame>());
            assert!(thread.saved_sp() >= top - SMALLEST_STACK);
        }

        // the second frame must not have spilled into the first slot
        assert_eq!(frame_of(table.get(a).unwrap()), SwitchFrame::new(never_runs));
        assert_eq!(
            frame_of(table.get(b).unwrap()),
            SwitchFrame::new(never_runs_either)
        );
    }

    #[test]
    fn capacity_exhausted() {
        let table = ThreadTable::<2, 256>::new();
        table.init();

        table.create(never_runs).unwrap();
        table.create(never_runs).unwrap();
        assert_eq!(
            table.create(never_runs),
            Err(Error::CapacityExhausted { capacity: 2 })
        );
    }

    #[test]
    fn terminated_slot_is_reused() {
        let table = ThreadTable::<2, 256>::new();
        table.init();

        let a = table.create(never_runs).unwrap();
        table.create(never_runs).unwrap();
        table.get(a).unwrap().tcb().status.set(Status::Terminated);

        assert_eq!(table.create(never_runs_either), Ok(a));
        assert_eq!(
            frame_of(table.get(a).unwrap()),
            SwitchFrame::new(never_runs_either)
        );
    }

    #[test]
    fn all_terminated_ignores_unused_slots() {
        let table = ThreadTable::<8, 256>::new();
        table.init();
        assert!(table.all_terminated());

        let a = table.create(never_runs).unwrap();
        let b = table.create(never_runs).unwrap();
        assert!(!table.all_terminated());

        table.get(a).unwrap().tcb().status.set(Status::Terminated);
        assert!(!table.all_terminated());

        table.get(b).unwrap().tcb().status.set(Status::Waiting);
        assert!(!table.all_terminated());

        table.get(b).unwrap().tcb().status.set(Status::Terminated);
        assert!(table.all_terminated());
    }

    #[test]
    fn stack_usage_tracks_high_water_mark() {
        let table = ThreadTable::<1, 512>::new();
        table.init();
        let thread = table.slot(0);
        assert_eq!(thread.stack_usage(), 0);

        let id = table.create(never_runs).unwrap();
        // the synthetic frame is all zeroes except for the entry address
        let usage = table.get(id).unwrap().stack_usage();
        assert!(usage > 0);
        assert!(usage <= size_of::<SwitchFrame>());
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::Ready.to_string(), "ready");
        assert_eq!(Status::Running.to_string(), "running");
        assert_eq!(Status::Waiting.to_string(), "waiting");
        assert_eq!(Status::Terminated.to_string(), "terminated");
        assert_eq!(format!("{:<8}|", Status::Ready), "ready   |");
    }

    #[test]
    fn thread_id_slots() {
        assert_eq!(ThreadId::IDLE.slot(), None);
        assert!(ThreadId::IDLE.is_idle());
        assert_eq!(ThreadId::from_slot(0).slot(), Some(0));
        assert_eq!(ThreadId::from_slot(7).as_usize(), 8);
        assert_eq!(ThreadId::from_slot(2).to_string(), "3");
    }

    proptest! {
        #[test]
        fn create_fills_lowest_free_slots(freed in prop::collection::btree_set(0..8usize, 0..=8)) {
            let table = ThreadTable::<8, 256>::new();
            table.init();
            for _ in 0..8 {
                table.create(never_runs).unwrap();
            }

            for &slot in &freed {
                table.slot(slot).tcb().status.set(Status::Terminated);
            }

            for &slot in &freed {
                prop_assert_eq!(table.create(never_runs), Ok(ThreadId::from_slot(slot)));
            }
            prop_assert_eq!(
                table.create(never_runs),
                Err(Error::CapacityExhausted { capacity: 8 })
            );
            for thread in &table {
                prop_assert_eq!(thread.status(), Status::Ready);
            }
        }
    }
}
