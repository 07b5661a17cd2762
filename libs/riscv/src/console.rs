// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Debug console output.
//!
//! Characters are pushed one at a time through the SBI legacy console extension. There is no
//! buffering and no locking: the kernel runs on a single hart and the console is also used from
//! the (fatal) trap path, where taking a lock could deadlock.

use core::fmt;
use core::fmt::Write;

use crate::sbi;

/// Zero-sized handle to the SBI debug console.
#[derive(Debug, Default, Clone, Copy)]
pub struct Console;

impl Console {
    /// Writes a single byte to the console.
    #[inline]
    pub fn write_char(&mut self, ch: u8) {
        sbi::write_char(ch);
    }

    /// Writes all bytes of `buf` to the console.
    pub fn write_bytes(&mut self, buf: &[u8]) {
        for &ch in buf {
            self.write_char(ch);
        }
    }
}

impl Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    // writing to the SBI console cannot fail
    let _ = Console.write_fmt(args);
}

/// Prints to the SBI debug console.
#[macro_export]
macro_rules! print {
    ($($tt:tt)*) => {
        $crate::console::_print(format_args!($($tt)*))
    };
}

/// Prints to the SBI debug console, with a newline.
#[macro_export]
macro_rules! println {
    () => {
        $crate::print!("\n")
    };
    ($($tt:tt)*) => {{
        $crate::console::_print(format_args!($($tt)*));
        $crate::print!("\n");
    }};
}
