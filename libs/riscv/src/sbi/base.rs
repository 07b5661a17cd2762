// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Base Extension

use core::fmt;

use super::{EID_BASE, call};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SbiVersion {
    pub minor: usize,
    pub major: usize,
}

impl fmt::Display for SbiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Returns the current SBI specification version.
///
/// # Errors
///
/// Returns an error if the SBI call fails.
#[inline]
pub fn get_spec_version() -> super::Result<SbiVersion> {
    let version = call(EID_BASE, 0, 0, 0, 0).into_result()?;

    Ok(SbiVersion {
        minor: version & 0xff_ffff,
        major: (version & 0x7f00_0000) >> 24,
    })
}

/// Returns the current SBI implementation ID, which is different for every SBI implementation.
///
/// It is intended that this implementation ID allows software to probe for SBI implementation quirks.
///
/// # Known Implementation IDs
///
/// | Implementation ID | Name                              |
/// |-------------------|-----------------------------------|
/// | 0                 | Berkeley Boot Loader (BBL)        |
/// | 1                 | `OpenSBI`                           |
/// | 2                 | `Xvisor`                            |
/// | 3                 | `KVM`                               |
/// | 4                 | `RustSBI`                           |
/// | 5                 | `Diosix`                            |
/// | 6                 | `Coffer`                            |
///
/// # Errors
///
/// Returns an error if the SBI call fails.
#[inline]
pub fn get_impl_id() -> super::Result<usize> {
    call(EID_BASE, 1, 0, 0, 0).into_result()
}

/// Returns whether the given SBI extension ID (EID) is available.
///
/// # Errors
///
/// Returns an error if the SBI call fails.
#[inline]
pub fn probe_sbi_extension(ext: usize) -> super::Result<bool> {
    let available = call(EID_BASE, 3, ext, 0, 0).into_result()?;

    Ok(available != 0)
}
