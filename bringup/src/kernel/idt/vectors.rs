//! Architectural exception vectors (0..32).

pub const EXCEPTION_VECTORS: usize = 32;

pub const DIVIDE_ERROR: u8 = 0;
pub const DOUBLE_FAULT: u8 = 8;
pub const GENERAL_PROTECTION: u8 = 13;
pub const PAGE_FAULT: u8 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exception {
    pub mnemonic: &'static str,
    pub name: &'static str,
    /// The CPU pushes an error code before vectoring.
    pub error_code: bool,
}

const fn exc(mnemonic: &'static str, name: &'static str, error_code: bool) -> Exception {
    Exception {
        mnemonic,
        name,
        error_code,
    }
}

const RESERVED: Exception = exc("--", "reserved", false);

pub static EXCEPTIONS: [Exception; EXCEPTION_VECTORS] = [
    exc("#DE", "divide error", false),
    exc("#DB", "debug", false),
    exc("NMI", "non-maskable interrupt", false),
    exc("#BP", "breakpoint", false),
    exc("#OF", "overflow", false),
    exc("#BR", "bound range exceeded", false),
    exc("#UD", "invalid opcode", false),
    exc("#NM", "device not available", false),
    exc("#DF", "double fault", true),
    exc("--", "coprocessor segment overrun", false),
    exc("#TS", "invalid TSS", true),
    exc("#NP", "segment not present", true),
    exc("#SS", "stack-segment fault", true),
    exc("#GP", "general protection", true),
    exc("#PF", "page fault", true),
    RESERVED,
    exc("#MF", "x87 floating-point", false),
    exc("#AC", "alignment check", true),
    exc("#MC", "machine check", false),
    exc("#XM", "SIMD floating-point", false),
    exc("#VE", "virtualization", false),
    exc("#CP", "control protection", true),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    exc("#HV", "hypervisor injection", false),
    exc("#VC", "VMM communication", true),
    exc("#SX", "security", true),
    RESERVED,
];

/// Metadata for `vector`, or `None` above 31.
pub fn exception(vector: u8) -> Option<&'static Exception> {
    EXCEPTIONS.get(vector as usize)
}
