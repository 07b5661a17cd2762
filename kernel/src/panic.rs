// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::SCHEDULER;
use core::panic::PanicInfo;

#[panic_handler]
fn begin_panic_handler(info: &PanicInfo<'_>) -> ! {
    let thread = SCHEDULER.current();

    match info.location() {
        Some(location) => riscv::println!(
            "thread {thread} panicked at {location}:\n{}",
            info.message()
        ),
        None => riscv::println!("thread {thread} panicked:\n{}", info.message()),
    }
    log::error!("unrecoverable failure, halting");

    riscv::halt()
}
