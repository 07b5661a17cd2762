// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Fatal trap diagnostics.

use core::fmt;

use crate::scause::Scause;

/// The machine state captured on entry to the trap vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapReport {
    pub scause: Scause,
    pub sepc: usize,
}

impl TrapReport {
    #[must_use]
    pub const fn new(scause: usize, sepc: usize) -> Self {
        Self {
            scause: Scause::from_bits(scause),
            sepc,
        }
    }
}

impl fmt::Display for TrapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trap: scause = 0x{:08x}, sepc = 0x{:08x}",
            self.scause.bits(),
            self.sepc
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scause::{Exception, Trap};

    #[test]
    fn illegal_instruction_report() {
        let report = TrapReport::new(2, 0x8020_0a3c);

        assert_eq!(
            report.to_string(),
            "trap: scause = 0x00000002, sepc = 0x80200a3c"
        );
        assert_eq!(
            report.scause.cause(),
            Some(Trap::Exception(Exception::IllegalInstruction))
        );
    }

    #[test]
    fn breakpoint_report() {
        let report = TrapReport::new(3, 0x10);

        assert_eq!(
            report.to_string(),
            "trap: scause = 0x00000003, sepc = 0x00000010"
        );
    }
}
