// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Legacy Console Extension

use super::{EID_CONSOLE_PUTCHAR, call};

/// Writes a single byte to the debug console.
///
/// The legacy extension reports nothing useful back, so the returned pair is ignored.
#[inline]
pub fn console_putchar(ch: u8) {
    let _ = call(EID_CONSOLE_PUTCHAR, 0, usize::from(ch), 0, 0);
}
