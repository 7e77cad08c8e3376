//! Processor bring-up for a bare-metal x86-64 kernel: GDT, TSS with an
//! alternate fault stack, IDT, and the shared fault dispatcher.
//!
//! `no_std` on the target; unit tests build against std on the host and only
//! exercise the table builders and formatting, never the privileged paths.

#![cfg_attr(not(test), no_std)]
#![feature(abi_x86_interrupt)]

pub mod arch;
pub mod config;
pub mod kernel;
pub mod logger;
pub mod screen;
pub mod serial;
