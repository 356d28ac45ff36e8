//! Buffer I/O with the driver.
//!
//! Only memory mapped streaming is implemented.

pub(crate) mod mmap;
