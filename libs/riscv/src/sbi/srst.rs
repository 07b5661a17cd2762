// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! System Reset Extension

use super::{EID_SRST, call};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetType {
    Shutdown = 0,
    ColdReboot = 1,
    WarmReboot = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    NoReason = 0,
    SystemFailure = 1,
}

/// Resets the system. On success this call does not return.
///
/// # Errors
///
/// Returns an error if the SBI implementation refused the request.
pub fn system_reset(kind: ResetType, reason: ResetReason) -> super::Result<()> {
    call(EID_SRST, 0, kind as usize, reason as usize, 0).into_result()?;

    Ok(())
}
