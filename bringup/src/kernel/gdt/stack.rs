//! Statically allocated kernel stacks.
//!
//! Both live in .bss, which the bootloader maps with the kernel image. They
//! are `static mut` because the CPU writes to them behind the compiler's back.

use x86_64::VirtAddr;

use crate::config::{FAULT_STACK_SIZE, KERNEL_STACK_SIZE};

/// 16-byte aligned stack memory. Grows downward from `bottom + N`.
#[repr(align(16))]
pub struct Stack<const N: usize>([u8; N]);

impl<const N: usize> Stack<N> {
    pub const fn new() -> Self {
        Self([0; N])
    }
}

/// Address range of one stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackRegion {
    pub bottom: VirtAddr,
    pub top: VirtAddr,
}

impl StackRegion {
    /// True if `rsp` points into this stack (the top itself included, since
    /// an empty stack has rsp == top).
    pub fn contains(&self, rsp: u64) -> bool {
        self.bottom.as_u64() <= rsp && rsp <= self.top.as_u64()
    }

    pub fn size(&self) -> u64 {
        self.top - self.bottom
    }
}

/// Primary kernel stack, loaded from RSP0 on a ring 3 -> ring 0 transition.
static mut KERNEL_STACK: Stack<KERNEL_STACK_SIZE> = Stack::new();

/// Alternate fault stack (IST1). Never used for normal execution.
static mut FAULT_STACK: Stack<FAULT_STACK_SIZE> = Stack::new();

fn region<const N: usize>(stack: *const Stack<N>) -> StackRegion {
    let bottom = VirtAddr::from_ptr(stack);
    StackRegion {
        bottom,
        top: bottom + N as u64,
    }
}

pub fn kernel_stack() -> StackRegion {
    region(&raw const KERNEL_STACK)
}

pub fn fault_stack() -> StackRegion {
    region(&raw const FAULT_STACK)
}
