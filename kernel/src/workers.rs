// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::SCHEDULER;

/// How often the demo worker hands control to the other threads before exiting.
const ROUNDS: usize = 2;

/// Demo workload: announce itself, yield, report its stack usage and repeat, then exit.
pub extern "C" fn demo() -> ! {
    let id = SCHEDULER.current();

    for round in 0..ROUNDS {
        riscv::println!(
            "thread_start_{round}(id:{id} sp:{:#010x})",
            SCHEDULER.saved_sp(id).unwrap_or_default()
        );

        SCHEDULER.yield_now();

        log::trace!(
            "thread {id} resumed, {} bytes of stack used",
            SCHEDULER.stack_usage(id).unwrap_or_default()
        );
        riscv::println!("-----------------------------------------");
    }

    SCHEDULER.exit()
}
