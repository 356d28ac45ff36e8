use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::{io, path::Path, slice};

use log::warn;

use crate::v4l2::vidioc;
use crate::v4l2::{Backend, Region};

mod detail {
    use crate::v4l2::vidioc;

    pub unsafe fn open(path: *const std::os::raw::c_char, flags: i32) -> std::os::raw::c_int {
        libc::open(path, flags)
    }
    pub unsafe fn close(fd: std::os::raw::c_int) -> std::os::raw::c_int {
        libc::close(fd)
    }
    pub unsafe fn fstat(fd: std::os::raw::c_int, buf: *mut libc::stat) -> std::os::raw::c_int {
        libc::fstat(fd, buf)
    }
    pub unsafe fn ioctl(
        fd: std::os::raw::c_int,
        request: vidioc::_IOC_TYPE,
        argp: *mut std::os::raw::c_void,
    ) -> std::os::raw::c_int {
        // libc declares ioctl() with a different request type depending on the target libc,
        // syscall() takes the same arguments everywhere.
        libc::syscall(libc::SYS_ioctl, fd, request, argp) as std::os::raw::c_int
    }
    pub unsafe fn mmap(
        length: usize,
        fd: std::os::raw::c_int,
        offset: libc::off_t,
    ) -> *mut std::os::raw::c_void {
        libc::mmap(
            std::ptr::null_mut(),
            length,
            libc::PROT_READ,
            libc::MAP_SHARED,
            fd,
            offset,
        )
    }
    pub unsafe fn munmap(start: *mut std::os::raw::c_void, length: usize) -> std::os::raw::c_int {
        libc::munmap(start, length)
    }
}

/// An open device node
///
/// The descriptor is closed when the value is dropped.
#[derive(Debug)]
pub struct Fd {
    fd: std::os::raw::c_int,
}

impl Fd {
    /// Opens the node at `path` for reading and writing
    ///
    /// # Example
    ///
    /// ```no_run
    /// use v4lcam::v4l2::Fd;
    ///
    /// let fd = Fd::open("/dev/video0");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let c_path = CString::new(path.as_ref().as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        let fd = unsafe { detail::open(c_path.as_ptr(), libc::O_RDWR | libc::O_CLOEXEC) };
        if fd == -1 {
            Err(io::Error::last_os_error())
        } else {
            Ok(Fd { fd })
        }
    }

    /// Returns the raw file descriptor
    pub fn fd(&self) -> std::os::raw::c_int {
        self.fd
    }

    /// Returns `(st_mode, st_rdev)` of the open node
    pub fn stat(&self) -> io::Result<(u32, u64)> {
        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        if unsafe { detail::fstat(self.fd, &mut stat) } == -1 {
            return Err(io::Error::last_os_error());
        }

        #[allow(clippy::unnecessary_cast)]
        Ok((stat.st_mode as u32, stat.st_rdev as u64))
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        if unsafe { detail::close(self.fd) } == -1 {
            warn!("close({}): {}", self.fd, io::Error::last_os_error());
        }
    }
}

impl Backend for Fd {
    fn ioctl(&self, code: vidioc::_IOC_TYPE, arg: &mut [u8]) -> io::Result<()> {
        let ret = unsafe { detail::ioctl(self.fd, code, arg.as_mut_ptr() as *mut _) };
        if ret == -1 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    fn map(&self, offset: u32, length: usize) -> io::Result<Box<dyn Region>> {
        let ptr = unsafe { detail::mmap(length, self.fd, offset as libc::off_t) };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Box::new(Mapping {
            ptr: ptr as *mut u8,
            len: length,
        }))
    }
}

/// A read only shared mapping of driver memory
struct Mapping {
    ptr: *mut u8,
    len: usize,
}

// SAFETY: the mapping is read only from this side and owned by exactly one `Mapping`, which
// unmaps it once on drop. Moving that ownership to another thread is sound.
unsafe impl Send for Mapping {}

impl Region for Mapping {
    fn bytes(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl Drop for Mapping {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        if unsafe { detail::munmap(self.ptr as *mut _, self.len) } == -1 {
            warn!("munmap({:p}, {}): {}", self.ptr, self.len, io::Error::last_os_error());
        }
    }
}
