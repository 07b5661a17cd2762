// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! SBI (RISC-V Supervisor Binary Interface).
//!
//! SBI is a standard interface for interacting with the "supervisor execution environment" on RISC-V.
//! This environment provided by the previous stage bootloader (most commonly OpenSBI) is responsible for
//! implementing the SBI functions.
//!
//! Every call goes through [`call`]: the extension ID is passed in `a7`, the function ID in `a6`
//! and up to three arguments in `a0`-`a2`. The environment answers with an error code in `a0`
//! and a value in `a1`.

pub mod base;
mod error;
pub mod legacy;
pub mod srst;

const EID_CONSOLE_PUTCHAR: usize = 0x01;
const EID_BASE: usize = 0x10;
const EID_SRST: usize = 0x53525354;
const EID_DBCN: usize = 0x4442434E;

use bitflags::bitflags;
pub use error::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// The raw `(error, value)` pair every SBI call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SbiRet {
    pub error: isize,
    pub value: usize,
}

impl SbiRet {
    /// Converts the raw pair into a `Result`, decoding the standard SBI error codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the `error` field is nonzero.
    pub fn into_result(self) -> Result<usize> {
        match self.error {
            0 => Ok(self.value),
            code => Err(Error::from_code(code)),
        }
    }
}

/// Issues a single `ecall` into the supervisor execution environment.
///
/// This is a pure protocol binding: whatever the selected extension and function do is opaque to
/// this layer. The call either returns immediately or the environment never returns at all.
///
/// **WARNING**: panics on non-`riscv` targets.
#[inline]
#[must_use]
pub fn call(ext: usize, func: usize, arg0: usize, arg1: usize, arg2: usize) -> SbiRet {
    cfg_if::cfg_if! {
        if #[cfg(any(target_arch = "riscv64", target_arch = "riscv32"))] {
            let error: usize;
            let value: usize;

            // Safety: inline assembly
            unsafe {
                ::core::arch::asm!(
                    "ecall",
                    inlateout("a0") arg0 => error,
                    inlateout("a1") arg1 => value,
                    in("a2") arg2,
                    in("a6") func,
                    in("a7") ext,
                    options(nostack)
                );
            }

            SbiRet {
                error: error.cast_signed(),
                value,
            }
        } else {
            let _ = (ext, func, arg0, arg1, arg2);
            unimplemented!()
        }
    }
}

/// Writes one byte to the debug console. The result of the call is ignored.
#[inline]
pub fn write_char(ch: u8) {
    legacy::console_putchar(ch);
}

bitflags! {
    #[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
    pub struct Extension: u8 {
        const BASE = 1 << 0;
        const LEGACY_CONSOLE = 1 << 1;
        const SRST = 1 << 2;
        const DBCN = 1 << 3;
    }
}

/// Probe the SBI implementation for the extensions this kernel knows how to use.
///
/// # Errors
///
/// Returns an error if one of the probing SBI calls fails.
pub fn supported_extensions() -> Result<Extension> {
    let mut supported = Extension::BASE;
    supported.set(
        Extension::LEGACY_CONSOLE,
        base::probe_sbi_extension(EID_CONSOLE_PUTCHAR)?,
    );
    supported.set(Extension::SRST, base::probe_sbi_extension(EID_SRST)?);
    supported.set(Extension::DBCN, base::probe_sbi_extension(EID_DBCN)?);
    Ok(supported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_calls_yield_the_value() {
        let ret = SbiRet {
            error: 0,
            value: 0x42,
        };
        assert_eq!(ret.into_result().unwrap(), 0x42);
    }

    #[test]
    fn standard_error_codes_are_decoded() {
        let ret = SbiRet {
            error: -2,
            value: 0,
        };
        assert!(matches!(ret.into_result(), Err(Error::NotSupported)));

        let ret = SbiRet {
            error: -42,
            value: 0,
        };
        assert!(matches!(ret.into_result(), Err(Error::Other(-42))));
    }
}
