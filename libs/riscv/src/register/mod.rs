// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! RISC-V CSRs

#![allow(clippy::missing_safety_doc)]

pub mod scause;
pub mod sepc;
pub mod stval;
pub mod stvec;

macro_rules! read_csr {
    ($csr_number:literal) => {
        /// Reads the CSR.
        ///
        /// **WARNING**: panics on non-`riscv` targets.
        #[inline]
        unsafe fn _read() -> usize {
            cfg_if::cfg_if! {
                if #[cfg(any(target_arch = "riscv32", target_arch = "riscv64"))] {
                    let r: usize;
                    // Safety: reading a CSR has no side effects
                    unsafe {
                        core::arch::asm!(concat!("csrrs {0}, ", stringify!($csr_number), ", x0"), out(reg) r);
                    }
                    r
                } else {
                    unimplemented!()
                }
            }
        }
    };
}

macro_rules! read_csr_as_usize {
    ($csr_number:literal) => {
        $crate::register::read_csr!($csr_number);

        /// Reads the CSR.
        ///
        /// **WARNING**: panics on non-`riscv` targets.
        #[inline]
        #[must_use]
        pub fn read() -> usize {
            // Safety: see `_read`
            unsafe { _read() }
        }
    };
}

macro_rules! set {
    ($csr_number:literal) => {
        /// Writes the CSR.
        #[inline]
        #[allow(unused_variables, reason = "unused on non-riscv targets")]
        unsafe fn _set(bits: usize) {
            cfg_if::cfg_if! {
                if #[cfg(any(target_arch = "riscv64", target_arch = "riscv32"))] {
                    // Safety: ensured by caller
                    unsafe {
                        core::arch::asm!(concat!("csrrw x0, ", stringify!($csr_number), ", {0}"), in(reg) bits);
                    }
                } else {
                    unimplemented!()
                }
            }
        }
    };
}

pub(crate) use {read_csr, read_csr_as_usize, set};
