// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

#![no_std]
#![no_main]

mod logger;
mod panic;
mod start;
mod trap;
mod workers;

use cothread::Scheduler;
use riscv::sbi;
use static_assertions::const_assert;

/// The log level for the kernel
pub const LOG_LEVEL: log::Level = log::Level::Trace;
/// Capacity of the thread table
pub const THREAD_MAX: usize = 8;
/// The size of every worker thread's stack in bytes
pub const THREAD_STACK_SIZE: usize = 8 * 1024;
/// The size of the boot stack in bytes. `kmain` and the idle thread run on it.
pub const BOOT_STACK_SIZE: usize = 16 * 1024;
/// Number of worker threads the demo starts
pub const DEMO_WORKERS: usize = 2;

const_assert!(DEMO_WORKERS <= THREAD_MAX);
const_assert!(BOOT_STACK_SIZE % 16 == 0);
// per-switch and stack-usage diagnostics are logged at trace
const_assert!(LOG_LEVEL as usize == log::Level::Trace as usize);

pub static SCHEDULER: Scheduler<THREAD_MAX, THREAD_STACK_SIZE> = Scheduler::new();

extern "C" fn kmain() -> ! {
    trap::init();
    logger::init(LOG_LEVEL.to_level_filter());

    riscv::println!("Hello World");
    log::info!(
        "rvkern {} ({} {}, rustc {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_CARGO_TARGET_TRIPLE").unwrap_or("unknown target"),
        option_env!("VERGEN_GIT_SHA").unwrap_or("unknown revision"),
        option_env!("VERGEN_RUSTC_SEMVER").unwrap_or("unknown"),
    );
    print_sbi_info();

    // the console understands the usual format specifiers
    riscv::println!("{:#x}", 0x1234_abcd_u32);
    riscv::println!("{}", 999_999);
    riscv::println!("{}", -999_999);

    SCHEDULER.init();
    for _ in 0..DEMO_WORKERS {
        let id = SCHEDULER
            .create(workers::demo)
            .unwrap_or_else(|err| panic!("failed to create worker thread: {err}"));

        if let Some(thread) = SCHEDULER.table().get(id) {
            riscv::println!("thread(sp:{:#010x}) {:p}", thread.saved_sp(), thread.stack_top());
        }
    }

    riscv::println!("thread start");
    while !SCHEDULER.all_terminated() {
        SCHEDULER.schedule();
    }
    riscv::println!("thread finished");

    #[cfg(feature = "trap-demo")]
    trap::raise_illegal_instruction();

    #[cfg(feature = "exit-on-finish")]
    power_off();

    riscv::halt()
}

fn print_sbi_info() {
    match sbi::base::get_spec_version() {
        Ok(version) => log::info!("SBI specification v{version}"),
        Err(err) => log::warn!("failed to read SBI specification version: {err}"),
    }

    if let Ok(impl_id) = sbi::base::get_impl_id() {
        log::debug!("SBI implementation {impl_id:#x}");
    }

    match sbi::supported_extensions() {
        Ok(extensions) => log::debug!("SBI extensions {extensions:?}"),
        Err(err) => log::warn!("failed to probe SBI extensions: {err}"),
    }
}

#[cfg(feature = "exit-on-finish")]
fn power_off() {
    use sbi::srst::{ResetReason, ResetType, system_reset};

    log::info!("powering off");
    if let Err(err) = system_reset(ResetType::Shutdown, ResetReason::NoReason) {
        log::error!("failed to power off: {err}");
    }
}
