//! Per-vector trap entry stubs.
//!
//! Every stub hands its vector number to the shared dispatcher. Vectors
//! without a CPU-pushed error code pass 0 so the dispatcher sees one shape.

use x86_64::structures::idt::InterruptStackFrame;

use super::dispatch::dispatch;
use super::vectors::EXCEPTION_VECTORS;

macro_rules! trap_entry {
    ($name:ident, $vector:expr) => {
        extern "x86-interrupt" fn $name(frame: InterruptStackFrame) -> ! {
            dispatch($vector, 0, &frame)
        }
    };
    ($name:ident, $vector:expr, error_code) => {
        extern "x86-interrupt" fn $name(frame: InterruptStackFrame, error_code: u64) -> ! {
            dispatch($vector, error_code, &frame)
        }
    };
}

trap_entry!(trap_0, 0);
trap_entry!(trap_1, 1);
trap_entry!(trap_2, 2);
trap_entry!(trap_3, 3);
trap_entry!(trap_4, 4);
trap_entry!(trap_5, 5);
trap_entry!(trap_6, 6);
trap_entry!(trap_7, 7);
trap_entry!(trap_8, 8, error_code);
trap_entry!(trap_9, 9);
trap_entry!(trap_10, 10, error_code);
trap_entry!(trap_11, 11, error_code);
trap_entry!(trap_12, 12, error_code);
trap_entry!(trap_13, 13, error_code);
trap_entry!(trap_14, 14, error_code);
trap_entry!(trap_15, 15);
trap_entry!(trap_16, 16);
trap_entry!(trap_17, 17, error_code);
trap_entry!(trap_18, 18);
trap_entry!(trap_19, 19);
trap_entry!(trap_20, 20);
trap_entry!(trap_21, 21, error_code);
trap_entry!(trap_22, 22);
trap_entry!(trap_23, 23);
trap_entry!(trap_24, 24);
trap_entry!(trap_25, 25);
trap_entry!(trap_26, 26);
trap_entry!(trap_27, 27);
trap_entry!(trap_28, 28);
trap_entry!(trap_29, 29, error_code);
trap_entry!(trap_30, 30, error_code);
trap_entry!(trap_31, 31);

/// Entry stub address for each exception vector, indexed by vector.
pub fn entry_points() -> [u64; EXCEPTION_VECTORS] {
    [
        trap_0 as usize as u64,
        trap_1 as usize as u64,
        trap_2 as usize as u64,
        trap_3 as usize as u64,
        trap_4 as usize as u64,
        trap_5 as usize as u64,
        trap_6 as usize as u64,
        trap_7 as usize as u64,
        trap_8 as usize as u64,
        trap_9 as usize as u64,
        trap_10 as usize as u64,
        trap_11 as usize as u64,
        trap_12 as usize as u64,
        trap_13 as usize as u64,
        trap_14 as usize as u64,
        trap_15 as usize as u64,
        trap_16 as usize as u64,
        trap_17 as usize as u64,
        trap_18 as usize as u64,
        trap_19 as usize as u64,
        trap_20 as usize as u64,
        trap_21 as usize as u64,
        trap_22 as usize as u64,
        trap_23 as usize as u64,
        trap_24 as usize as u64,
        trap_25 as usize as u64,
        trap_26 as usize as u64,
        trap_27 as usize as u64,
        trap_28 as usize as u64,
        trap_29 as usize as u64,
        trap_30 as usize as u64,
        trap_31 as usize as u64,
    ]
}
