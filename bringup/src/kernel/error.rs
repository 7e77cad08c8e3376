//! Errors detectable in software during bring-up.
//!
//! Anything wrong with the descriptor contents themselves is not in here: the
//! CPU reports it as #GP or a triple fault, never as a return value.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// CR0.PE/PG, CR4.PAE or EFER.LME/LMA is clear
    NotInLongMode,

    /// The `log` facade already has a logger
    LoggerAlreadySet,

    /// The TSS was already moved into its process-wide slot
    TssAlreadyFrozen,

    /// `lgdt`/`ltr` already ran
    ///
    /// Reloading TR would fault: `ltr` marks the TSS descriptor busy.
    GdtAlreadyActive,

    /// `lidt` already ran
    IdtAlreadyActive,
}

impl InitError {
    /// Returns a human-readable description of the error
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotInLongMode => "processor is not in 64-bit long mode",
            Self::LoggerAlreadySet => "a logger is already installed",
            Self::TssAlreadyFrozen => "task-state segment already frozen",
            Self::GdtAlreadyActive => "descriptor table already active",
            Self::IdtAlreadyActive => "interrupt table already active",
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

pub type InitResult<T> = Result<T, InitError>;
