// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Supervisor Cause Register

use core::fmt;
use core::fmt::Formatter;

/// scause register
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Scause {
    bits: usize,
}

const INTERRUPT_BIT: usize = 1 << (usize::BITS - 1);

impl Scause {
    /// Wraps a raw `scause` value that was captured elsewhere (e.g. by a trap entry stub).
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: usize) -> Self {
        Self { bits }
    }

    /// Returns the raw register value
    #[inline]
    #[must_use]
    pub const fn bits(&self) -> usize {
        self.bits
    }

    /// Returns the code field
    #[inline]
    #[must_use]
    pub const fn code(&self) -> usize {
        self.bits & !INTERRUPT_BIT
    }

    /// Is trap cause an interrupt.
    #[inline]
    #[must_use]
    pub const fn is_interrupt(&self) -> bool {
        self.bits & INTERRUPT_BIT != 0
    }

    /// Is trap cause an exception.
    #[inline]
    #[must_use]
    pub const fn is_exception(&self) -> bool {
        !self.is_interrupt()
    }

    /// Returns the cause of the trap, or `None` if the code is reserved or platform specific.
    #[inline]
    #[must_use]
    pub fn cause(&self) -> Option<Trap> {
        if self.is_interrupt() {
            Interrupt::try_from(self.code()).ok().map(Trap::Interrupt)
        } else {
            Exception::try_from(self.code()).ok().map(Trap::Exception)
        }
    }
}

/// Decoded trap cause.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Trap {
    Interrupt(Interrupt),
    Exception(Exception),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Interrupt {
    SupervisorSoft = 1,
    VirtualSupervisorSoft = 2,
    SupervisorTimer = 5,
    VirtualSupervisorTimer = 6,
    SupervisorExternal = 9,
    VirtualSupervisorExternal = 10,
    SupervisorGuestExternal = 12,
}

impl TryFrom<usize> for Interrupt {
    type Error = ();

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::SupervisorSoft),
            2 => Ok(Self::VirtualSupervisorSoft),
            5 => Ok(Self::SupervisorTimer),
            6 => Ok(Self::VirtualSupervisorTimer),
            9 => Ok(Self::SupervisorExternal),
            10 => Ok(Self::VirtualSupervisorExternal),
            12 => Ok(Self::SupervisorGuestExternal),
            _ => Err(()),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Exception {
    /// Instruction address misaligned
    InstructionMisaligned = 0,
    /// Instruction access fault
    InstructionFault = 1,
    /// Illegal instruction
    IllegalInstruction = 2,
    /// Breakpoint
    Breakpoint = 3,
    /// Load address misaligned
    LoadMisaligned = 4,
    /// Load access fault
    LoadFault = 5,
    /// Store/AMO address misaligned
    StoreMisaligned = 6,
    /// Store/AMO access fault
    StoreFault = 7,
    /// Environment call from U-mode or VU-mode
    UserEnvCall = 8,
    /// Environment call from HS-mode
    SupervisorEnvCall = 9,
    /// Environment call from VS-mode
    VirtualSupervisorEnvCall = 10,
    /// Environment call from M-mode
    MachineEnvCall = 11,
    /// Instruction page fault
    InstructionPageFault = 12,
    /// Load page fault
    LoadPageFault = 13,
    /// Store/AMO page fault
    StorePageFault = 15,
    /// Software check
    SoftwareCheck = 18,
    /// Hardware error
    HardwareError = 19,
    /// Instruction guest-page fault
    InstructionGuestPageFault = 20,
    /// Load guest-page fault
    LoadGuestPageFault = 21,
    /// Virtual instruction
    VirtualInstruction = 22,
    /// Store/AMO guest-page fault
    StoreGuestPageFault = 23,
}

impl TryFrom<usize> for Exception {
    type Error = ();

    #[inline]
    fn try_from(nr: usize) -> Result<Self, Self::Error> {
        match nr {
            0 => Ok(Self::InstructionMisaligned),
            1 => Ok(Self::InstructionFault),
            2 => Ok(Self::IllegalInstruction),
            3 => Ok(Self::Breakpoint),
            4 => Ok(Self::LoadMisaligned),
            5 => Ok(Self::LoadFault),
            6 => Ok(Self::StoreMisaligned),
            7 => Ok(Self::StoreFault),
            8 => Ok(Self::UserEnvCall),
            9 => Ok(Self::SupervisorEnvCall),
            10 => Ok(Self::VirtualSupervisorEnvCall),
            11 => Ok(Self::MachineEnvCall),
            12 => Ok(Self::InstructionPageFault),
            13 => Ok(Self::LoadPageFault),
            15 => Ok(Self::StorePageFault),
            18 => Ok(Self::SoftwareCheck),
            19 => Ok(Self::HardwareError),
            20 => Ok(Self::InstructionGuestPageFault),
            21 => Ok(Self::LoadGuestPageFault),
            22 => Ok(Self::VirtualInstruction),
            23 => Ok(Self::StoreGuestPageFault),
            _ => Err(()),
        }
    }
}

impl fmt::Debug for Scause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.cause() {
            Some(cause) => f.debug_tuple("Scause").field(&cause).finish(),
            None => f
                .debug_struct("Scause")
                .field("interrupt", &self.is_interrupt())
                .field("code", &self.code())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_exceptions() {
        let scause = Scause::from_bits(2);
        assert!(scause.is_exception());
        assert_eq!(
            scause.cause(),
            Some(Trap::Exception(Exception::IllegalInstruction))
        );
    }

    #[test]
    fn decodes_interrupts() {
        let scause = Scause::from_bits(INTERRUPT_BIT | 5);
        assert!(scause.is_interrupt());
        assert_eq!(scause.code(), 5);
        assert_eq!(
            scause.cause(),
            Some(Trap::Interrupt(Interrupt::SupervisorTimer))
        );
    }

    #[test]
    fn reserved_codes_are_not_decoded() {
        assert_eq!(Scause::from_bits(14).cause(), None);
        assert_eq!(Scause::from_bits(INTERRUPT_BIT | 3).cause(), None);
    }
}
