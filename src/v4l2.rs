//! Low level access to a v4l2 device node.
//!
//! Control requests travel through a [`Backend`]: a sink for raw ioctl payloads plus a source
//! of memory mapped buffers. [`Handle`] sits on top of it and turns typed records into those
//! payloads using the per-architecture [`layout`] tables.

use std::io;

use log::trace;

pub mod api;
pub mod codec;
pub mod layout;
pub mod types;
pub mod vidioc;

#[cfg(test)]
pub(crate) mod mock;

pub use api::Fd;

use codec::{Reader, Record, Writer};
use layout::Layout;
use vidioc::{Codes, _IOC_TYPE};

/// Memory shared with the driver, unmapped when dropped
pub trait Region: Send {
    /// Returns the mapped bytes
    fn bytes(&self) -> &[u8];
}

/// Something that accepts v4l2 control requests
///
/// The production implementation is [`Fd`], an open device node. Anything else implementing
/// this trait (for example a simulated device) can drive a [`crate::Device`] just the same.
/// Backends must be `Send` so devices can move between threads.
pub trait Backend: Send {
    /// Issues the request `code` with `arg` as its in/out payload
    ///
    /// `arg` is exactly as long as the record the code was built for. On failure the OS error
    /// code is reported unchanged.
    fn ioctl(&self, code: _IOC_TYPE, arg: &mut [u8]) -> io::Result<()>;

    /// Maps `length` bytes of driver memory starting at `offset` read only
    fn map(&self, offset: u32, length: usize) -> io::Result<Box<dyn Region>>;
}

/// Control request dispatcher bound to one backend and one layout table
pub struct Handle {
    backend: Box<dyn Backend>,
    layout: &'static Layout,
    codes: Codes,
}

impl Handle {
    /// Returns a dispatcher using the native layout table of the running architecture
    pub fn new(backend: Box<dyn Backend>) -> Self {
        Self::with_layout(backend, Layout::native())
    }

    /// Returns a dispatcher using an explicit layout table
    pub fn with_layout(backend: Box<dyn Backend>, layout: &'static Layout) -> Self {
        Handle {
            backend,
            layout,
            codes: Codes::new(layout),
        }
    }

    /// Returns the request numbers matching this handle's layout
    pub fn codes(&self) -> &Codes {
        &self.codes
    }

    /// Returns the layout table records are encoded with
    pub fn layout(&self) -> &'static Layout {
        self.layout
    }

    /// Issues a control request with `record` as its argument
    ///
    /// The record is encoded into zeroed scratch memory, the request is performed and on
    /// success the scratch memory is decoded back into `record`, so drivers may update it.
    /// On failure `record` is left untouched and the error is passed through.
    pub fn call<R: Record>(&self, code: _IOC_TYPE, record: &mut R) -> io::Result<()> {
        let size = R::size(self.layout);

        // u64 backing storage keeps the scratch memory 8 byte aligned
        let mut scratch = vec![0u64; size.div_ceil(8)];
        let bytes = as_bytes_mut(&mut scratch, size);

        record.encode(self.layout, &mut Writer::new(bytes));
        let res = self.backend.ioctl(code, bytes);
        trace!("ioctl {:#010x} ({} bytes): {:?}", code, size, res);
        res?;

        record.decode(self.layout, &Reader::new(bytes));
        Ok(())
    }

    /// Maps a driver buffer, see [`Backend::map`]
    pub fn map(&self, offset: u32, length: usize) -> io::Result<Box<dyn Region>> {
        self.backend.map(offset, length)
    }
}

fn as_bytes_mut(words: &mut [u64], len: usize) -> &mut [u8] {
    // SAFETY: u8 has no alignment or validity requirements and `len` never exceeds the
    // byte length of `words`.
    unsafe { std::slice::from_raw_parts_mut(words.as_mut_ptr() as *mut u8, len) }
}

/// Whether `err` is EINVAL, which drivers use to end enumerations
pub fn is_invalid(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINVAL)
}

/// Whether `err` is ENOTTY, reported for requests a driver does not implement
pub fn is_unsupported(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ENOTTY)
}

/// Character device major number of all video4linux nodes
pub const VIDEO_MAJOR: u32 = 81;

/// Major number of a device id, as computed by glibc's `gnu_dev_major`
pub fn major(dev: u64) -> u32 {
    (((dev >> 32) & 0xffff_f000) | ((dev >> 8) & 0x0000_0fff)) as u32
}

/// Minor number of a device id, as computed by glibc's `gnu_dev_minor`
pub fn minor(dev: u64) -> u32 {
    (((dev >> 12) & 0xffff_ff00) | (dev & 0x0000_00ff)) as u32
}
