// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

/// Selects between the RV32 and RV64 flavour of an instruction or constant.
#[cfg(target_pointer_width = "64")]
#[macro_export]
macro_rules! x {
    ($val32:expr, $val64:expr) => {
        $val64
    };
}

/// Selects between the RV32 and RV64 flavour of an instruction or constant.
#[cfg(target_pointer_width = "32")]
#[macro_export]
macro_rules! x {
    ($val32:expr, $val64:expr) => {
        $val32
    };
}

#[macro_export]
macro_rules! xlen_bytes {
    () => {
        $crate::x!("4", "8")
    };
    ($word_offset:expr) => {
        concat!(
            "((",
            stringify!($word_offset),
            ") * ",
            $crate::xlen_bytes!(),
            ")"
        )
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! define_op {
    ($ins:expr, $reg:ident, $pos:expr, $ptr:ident) => {
        concat!(
            $ins,
            " ",
            stringify!($reg),
            ", ",
            $crate::xlen_bytes!(),
            "*",
            $pos,
            '(',
            stringify!($ptr),
            ')'
        )
    };
}

/// Expands to the XLEN-sized load of `$ptr[$pos]` (in words) into `$reg`.
#[macro_export]
macro_rules! load_gp {
    ($ptr:ident[$pos:expr] => $reg:ident) => {
        $crate::define_op!($crate::x!("lw", "ld"), $reg, $pos, $ptr)
    };
}

/// Expands to the XLEN-sized store of `$reg` into `$ptr[$pos]` (in words).
#[macro_export]
macro_rules! save_gp {
    ($reg:ident => $ptr:ident[$pos:expr]) => {
        $crate::define_op!($crate::x!("sw", "sd"), $reg, $pos, $ptr)
    };
}
