use crate::v4l2::layout::Layout;

/// Raw ioctl request number as passed to the kernel
#[allow(non_camel_case_types)]
pub type _IOC_TYPE = std::os::raw::c_ulong;

// linux ioctl.h
const _IOC_NRBITS: u32 = 8;
const _IOC_TYPEBITS: u32 = 8;

const _IOC_NRSHIFT: u32 = 0;
const _IOC_TYPESHIFT: u32 = _IOC_NRSHIFT + _IOC_NRBITS;
const _IOC_SIZESHIFT: u32 = _IOC_TYPESHIFT + _IOC_TYPEBITS;

/// Direction bits and size field width of an architecture's ioctl numbers
///
/// Most architectures use asm-generic/ioctl.h. A few (powerpc, mips, sparc) shrink the size
/// field to 13 bits and use three direction bits with different values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoding {
    pub none: u32,
    pub read: u32,
    pub write: u32,
    pub size_bits: u32,
}

impl Encoding {
    pub const GENERIC: Encoding = Encoding {
        none: 0,
        write: 1,
        read: 2,
        size_bits: 14,
    };

    pub const POWERPC: Encoding = Encoding {
        none: 1,
        read: 2,
        write: 4,
        size_bits: 13,
    };

    const fn dir_shift(&self) -> u32 {
        _IOC_SIZESHIFT + self.size_bits
    }

    const fn ioc(&self, dir: u32, nr: u32, size: usize) -> _IOC_TYPE {
        ((dir as _IOC_TYPE) << self.dir_shift())
            | ((b'V' as _IOC_TYPE) << _IOC_TYPESHIFT)
            | ((nr as _IOC_TYPE) << _IOC_NRSHIFT)
            | ((size as _IOC_TYPE) << _IOC_SIZESHIFT)
    }

    /// `_IOR('V', nr, size)`
    pub const fn ior(&self, nr: u32, size: usize) -> _IOC_TYPE {
        self.ioc(self.read, nr, size)
    }

    /// `_IOW('V', nr, size)`
    pub const fn iow(&self, nr: u32, size: usize) -> _IOC_TYPE {
        self.ioc(self.write, nr, size)
    }

    /// `_IOWR('V', nr, size)`
    pub const fn iowr(&self, nr: u32, size: usize) -> _IOC_TYPE {
        self.ioc(self.read | self.write, nr, size)
    }
}

/// Request numbers of every control request the facade issues
///
/// The numbers encode the payload size, so they are derived from a [`Layout`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_snake_case)]
pub struct Codes {
    pub VIDIOC_QUERYCAP: _IOC_TYPE,
    pub VIDIOC_ENUM_FMT: _IOC_TYPE,
    pub VIDIOC_G_FMT: _IOC_TYPE,
    pub VIDIOC_S_FMT: _IOC_TYPE,
    pub VIDIOC_REQBUFS: _IOC_TYPE,
    pub VIDIOC_QUERYBUF: _IOC_TYPE,
    pub VIDIOC_QBUF: _IOC_TYPE,
    pub VIDIOC_DQBUF: _IOC_TYPE,
    pub VIDIOC_STREAMON: _IOC_TYPE,
    pub VIDIOC_STREAMOFF: _IOC_TYPE,
    pub VIDIOC_G_PARM: _IOC_TYPE,
    pub VIDIOC_S_PARM: _IOC_TYPE,
    pub VIDIOC_ENUMSTD: _IOC_TYPE,
    pub VIDIOC_G_CTRL: _IOC_TYPE,
    pub VIDIOC_S_CTRL: _IOC_TYPE,
    pub VIDIOC_QUERYCTRL: _IOC_TYPE,
    pub VIDIOC_QUERYMENU: _IOC_TYPE,
    pub VIDIOC_CROPCAP: _IOC_TYPE,
    pub VIDIOC_S_CROP: _IOC_TYPE,
    pub VIDIOC_ENUM_FRAMESIZES: _IOC_TYPE,
    pub VIDIOC_ENUM_FRAMEINTERVALS: _IOC_TYPE,
}

impl Codes {
    pub const fn new(l: &Layout) -> Codes {
        let e = l.ioc;
        Codes {
            VIDIOC_QUERYCAP: e.ior(0, l.capability.size),
            VIDIOC_ENUM_FMT: e.iowr(2, l.fmtdesc.size),
            VIDIOC_G_FMT: e.iowr(4, l.format.size),
            VIDIOC_S_FMT: e.iowr(5, l.format.size),
            VIDIOC_REQBUFS: e.iowr(8, l.requestbuffers.size),
            VIDIOC_QUERYBUF: e.iowr(9, l.buffer.size),
            VIDIOC_QBUF: e.iowr(15, l.buffer.size),
            VIDIOC_DQBUF: e.iowr(17, l.buffer.size),
            VIDIOC_STREAMON: e.iow(18, l.int.size),
            VIDIOC_STREAMOFF: e.iow(19, l.int.size),
            VIDIOC_G_PARM: e.iowr(21, l.streamparm.size),
            VIDIOC_S_PARM: e.iowr(22, l.streamparm.size),
            VIDIOC_ENUMSTD: e.iowr(25, l.standard.size),
            VIDIOC_G_CTRL: e.iowr(27, l.control.size),
            VIDIOC_S_CTRL: e.iowr(28, l.control.size),
            VIDIOC_QUERYCTRL: e.iowr(36, l.queryctrl.size),
            VIDIOC_QUERYMENU: e.iowr(37, l.querymenu.size),
            VIDIOC_CROPCAP: e.iowr(58, l.cropcap.size),
            VIDIOC_S_CROP: e.iow(60, l.crop.size),
            VIDIOC_ENUM_FRAMESIZES: e.iowr(74, l.frmsizeenum.size),
            VIDIOC_ENUM_FRAMEINTERVALS: e.iowr(75, l.frmivalenum.size),
        }
    }
}
