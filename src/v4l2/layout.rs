//! Per-architecture binary layout of every v4l2 record this crate exchanges with the kernel.
//!
//! Each record is described by its total size and a table of fields (byte offset plus kind).
//! The numbers mirror what the C compiler produces for `<linux/videodev2.h>` on the given
//! target: most records are plain `__u32` sequences and look the same everywhere, but
//! `v4l2_format`, `v4l2_buffer` and `v4l2_standard` depend on pointer width and on the
//! alignment of 64 bit integers.

use crate::v4l2::vidioc::Encoding;

/// Field kind, which determines the encoded width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    U8,
    U32,
    I32,
    U64,
    I64,
    /// NUL padded text of the given width
    Text(usize),
    /// Raw bytes of the given width
    Bytes(usize),
    /// Nested record (or union) of the given size
    Record(usize),
}

impl Kind {
    /// Number of bytes occupied by a field of this kind
    pub const fn width(self) -> usize {
        match self {
            Kind::U8 => 1,
            Kind::U32 | Kind::I32 => 4,
            Kind::U64 | Kind::I64 => 8,
            Kind::Text(n) | Kind::Bytes(n) | Kind::Record(n) => n,
        }
    }
}

/// A single field of a record layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub offset: usize,
    pub kind: Kind,
}

impl Field {
    pub const fn u8(offset: usize) -> Self {
        Field { offset, kind: Kind::U8 }
    }
    pub const fn u32(offset: usize) -> Self {
        Field { offset, kind: Kind::U32 }
    }
    pub const fn i32(offset: usize) -> Self {
        Field { offset, kind: Kind::I32 }
    }
    pub const fn u64(offset: usize) -> Self {
        Field { offset, kind: Kind::U64 }
    }
    pub const fn i64(offset: usize) -> Self {
        Field { offset, kind: Kind::I64 }
    }
    pub const fn text(offset: usize, width: usize) -> Self {
        Field { offset, kind: Kind::Text(width) }
    }
    pub const fn bytes(offset: usize, width: usize) -> Self {
        Field { offset, kind: Kind::Bytes(width) }
    }
    pub const fn record(offset: usize, size: usize) -> Self {
        Field { offset, kind: Kind::Record(size) }
    }

    /// First byte past the field
    pub const fn end(self) -> usize {
        self.offset + self.kind.width()
    }
}

macro_rules! record_layout {
    ($(#[$meta:meta])* $name:ident { $($field:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            /// Total size of the record in bytes
            pub size: usize,
            $(pub $field: Field,)*
        }

        impl $name {
            /// All fields in declaration order
            pub fn fields(&self) -> Vec<Field> {
                vec![$(self.$field),*]
            }
        }
    };
}

record_layout!(
    /// `struct v4l2_capability`
    Capability { driver, card, bus_info, version, capabilities, device_caps }
);
record_layout!(
    /// `struct v4l2_format` with the `pix` member of its union
    Format { type_, fmt }
);
record_layout!(
    /// `struct v4l2_pix_format`
    PixFormat {
        width, height, pixelformat, field, bytesperline, sizeimage,
        colorspace, priv_, flags, ycbcr_enc, quantization, xfer_func,
    }
);
record_layout!(
    /// `struct v4l2_streamparm` with the `capture` member of its union
    StreamParm { type_, parm }
);
record_layout!(
    /// `struct v4l2_captureparm`
    CaptureParm { capability, capturemode, timeperframe, extendedmode, readbuffers }
);
record_layout!(
    /// `struct v4l2_requestbuffers`
    RequestBuffers { count, type_, memory }
);
record_layout!(
    /// `struct v4l2_buffer`, `m.offset` being the only member of `m` we use
    Buffer {
        index, type_, bytesused, flags, field, timestamp, timecode,
        sequence, memory, offset, length,
    }
);
record_layout!(
    /// `struct v4l2_timecode`
    Timecode { type_, flags, frames, seconds, minutes, hours, userbits }
);
record_layout!(
    /// `struct v4l2_cropcap`
    CropCap { type_, bounds, defrect, pixelaspect }
);
record_layout!(
    /// `struct v4l2_crop`
    Crop { type_, c }
);
record_layout!(
    /// `struct v4l2_rect`
    Rect { left, top, width, height }
);
record_layout!(
    /// `struct v4l2_fract`
    Fract { numerator, denominator }
);
record_layout!(
    /// `struct v4l2_standard`
    Standard { index, id, name, frameperiod, framelines }
);
record_layout!(
    /// `struct v4l2_fmtdesc`
    FmtDesc { index, type_, flags, description, pixelformat }
);
record_layout!(
    /// `struct v4l2_frmsizeenum`, `discrete` and `stepwise` share one offset
    FrmSizeEnum { index, pixel_format, type_, discrete, stepwise }
);
record_layout!(
    /// `struct v4l2_frmsize_discrete`
    FrmSizeDiscrete { width, height }
);
record_layout!(
    /// `struct v4l2_frmsize_stepwise`
    FrmSizeStepwise { min_width, max_width, step_width, min_height, max_height, step_height }
);
record_layout!(
    /// `struct v4l2_frmivalenum`, `discrete` and `stepwise` share one offset
    FrmIvalEnum { index, pixel_format, width, height, type_, discrete, stepwise }
);
record_layout!(
    /// `struct v4l2_frmival_stepwise`
    FrmIvalStepwise { min, max, step }
);
record_layout!(
    /// `struct v4l2_queryctrl`
    QueryCtrl { id, type_, name, minimum, maximum, step, default_value, flags }
);
record_layout!(
    /// `struct v4l2_querymenu` (packed), `name` and `value` share one offset
    QueryMenu { id, index, name, value }
);
record_layout!(
    /// `struct v4l2_control`
    Control { id, value }
);
record_layout!(
    /// A bare `int` argument, as taken by `VIDIOC_STREAMON`/`VIDIOC_STREAMOFF`
    Int { value }
);

/// Complete layout table for one target architecture
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    /// Human readable name of the table
    pub name: &'static str,
    /// How the ioctl request numbers are put together
    pub ioc: Encoding,

    pub capability: Capability,
    pub format: Format,
    pub pix_format: PixFormat,
    pub streamparm: StreamParm,
    pub captureparm: CaptureParm,
    pub requestbuffers: RequestBuffers,
    pub buffer: Buffer,
    pub timecode: Timecode,
    pub cropcap: CropCap,
    pub crop: Crop,
    pub rect: Rect,
    pub fract: Fract,
    pub standard: Standard,
    pub fmtdesc: FmtDesc,
    pub frmsizeenum: FrmSizeEnum,
    pub frmsize_discrete: FrmSizeDiscrete,
    pub frmsize_stepwise: FrmSizeStepwise,
    pub frmivalenum: FrmIvalEnum,
    pub frmival_stepwise: FrmIvalStepwise,
    pub queryctrl: QueryCtrl,
    pub querymenu: QueryMenu,
    pub control: Control,
    pub int: Int,
}

// Records made of 32 bit fields only; identical on every supported target.

const CAPABILITY: Capability = Capability {
    size: 104,
    driver: Field::text(0, 16),
    card: Field::text(16, 32),
    bus_info: Field::text(48, 32),
    version: Field::u32(80),
    capabilities: Field::u32(84),
    device_caps: Field::u32(88),
};

const PIX_FORMAT: PixFormat = PixFormat {
    size: 48,
    width: Field::u32(0),
    height: Field::u32(4),
    pixelformat: Field::u32(8),
    field: Field::u32(12),
    bytesperline: Field::u32(16),
    sizeimage: Field::u32(20),
    colorspace: Field::u32(24),
    priv_: Field::u32(28),
    flags: Field::u32(32),
    ycbcr_enc: Field::u32(36),
    quantization: Field::u32(40),
    xfer_func: Field::u32(44),
};

const STREAMPARM: StreamParm = StreamParm {
    size: 204,
    type_: Field::u32(0),
    parm: Field::record(4, 200),
};

const CAPTUREPARM: CaptureParm = CaptureParm {
    size: 40,
    capability: Field::u32(0),
    capturemode: Field::u32(4),
    timeperframe: Field::record(8, 8),
    extendedmode: Field::u32(16),
    readbuffers: Field::u32(20),
};

const REQUESTBUFFERS: RequestBuffers = RequestBuffers {
    size: 20,
    count: Field::u32(0),
    type_: Field::u32(4),
    memory: Field::u32(8),
};

const TIMECODE: Timecode = Timecode {
    size: 16,
    type_: Field::u32(0),
    flags: Field::u32(4),
    frames: Field::u8(8),
    seconds: Field::u8(9),
    minutes: Field::u8(10),
    hours: Field::u8(11),
    userbits: Field::bytes(12, 4),
};

const CROPCAP: CropCap = CropCap {
    size: 44,
    type_: Field::u32(0),
    bounds: Field::record(4, 16),
    defrect: Field::record(20, 16),
    pixelaspect: Field::record(36, 8),
};

const CROP: Crop = Crop {
    size: 20,
    type_: Field::u32(0),
    c: Field::record(4, 16),
};

const RECT: Rect = Rect {
    size: 16,
    left: Field::i32(0),
    top: Field::i32(4),
    width: Field::u32(8),
    height: Field::u32(12),
};

const FRACT: Fract = Fract {
    size: 8,
    numerator: Field::u32(0),
    denominator: Field::u32(4),
};

const FMTDESC: FmtDesc = FmtDesc {
    size: 64,
    index: Field::u32(0),
    type_: Field::u32(4),
    flags: Field::u32(8),
    description: Field::text(12, 32),
    pixelformat: Field::u32(44),
};

const FRMSIZEENUM: FrmSizeEnum = FrmSizeEnum {
    size: 44,
    index: Field::u32(0),
    pixel_format: Field::u32(4),
    type_: Field::u32(8),
    discrete: Field::record(12, 8),
    stepwise: Field::record(12, 24),
};

const FRMSIZE_DISCRETE: FrmSizeDiscrete = FrmSizeDiscrete {
    size: 8,
    width: Field::u32(0),
    height: Field::u32(4),
};

const FRMSIZE_STEPWISE: FrmSizeStepwise = FrmSizeStepwise {
    size: 24,
    min_width: Field::u32(0),
    max_width: Field::u32(4),
    step_width: Field::u32(8),
    min_height: Field::u32(12),
    max_height: Field::u32(16),
    step_height: Field::u32(20),
};

const FRMIVALENUM: FrmIvalEnum = FrmIvalEnum {
    size: 52,
    index: Field::u32(0),
    pixel_format: Field::u32(4),
    width: Field::u32(8),
    height: Field::u32(12),
    type_: Field::u32(16),
    discrete: Field::record(20, 8),
    stepwise: Field::record(20, 24),
};

const FRMIVAL_STEPWISE: FrmIvalStepwise = FrmIvalStepwise {
    size: 24,
    min: Field::record(0, 8),
    max: Field::record(8, 8),
    step: Field::record(16, 8),
};

const QUERYCTRL: QueryCtrl = QueryCtrl {
    size: 68,
    id: Field::u32(0),
    type_: Field::u32(4),
    name: Field::text(8, 32),
    minimum: Field::i32(40),
    maximum: Field::i32(44),
    step: Field::i32(48),
    default_value: Field::i32(52),
    flags: Field::u32(56),
};

// Declared packed by the kernel, so the 64 bit union member does not move it.
const QUERYMENU: QueryMenu = QueryMenu {
    size: 44,
    id: Field::u32(0),
    index: Field::u32(4),
    name: Field::text(8, 32),
    value: Field::i64(8),
};

const CONTROL: Control = Control {
    size: 8,
    id: Field::u32(0),
    value: Field::i32(4),
};

const INT: Int = Int {
    size: 4,
    value: Field::i32(0),
};

// LP64: the format union holds pointers (v4l2_window) and is 8 byte aligned,
// struct timeval is 16 bytes and m.userptr is an unsigned long.

const LP64_FORMAT: Format = Format {
    size: 208,
    type_: Field::u32(0),
    fmt: Field::record(8, 200),
};

const LP64_BUFFER: Buffer = Buffer {
    size: 88,
    index: Field::u32(0),
    type_: Field::u32(4),
    bytesused: Field::u32(8),
    flags: Field::u32(12),
    field: Field::u32(16),
    timestamp: Field::record(24, 16),
    timecode: Field::record(40, 16),
    sequence: Field::u32(56),
    memory: Field::u32(60),
    offset: Field::u32(64),
    length: Field::u32(72),
};

const ALIGNED_STANDARD: Standard = Standard {
    size: 72,
    index: Field::u32(0),
    id: Field::u64(8),
    name: Field::text(16, 24),
    frameperiod: Field::record(40, 8),
    framelines: Field::u32(48),
};

// ILP32: 4 byte pointers and an 8 byte struct timeval.

const ILP32_FORMAT: Format = Format {
    size: 204,
    type_: Field::u32(0),
    fmt: Field::record(4, 200),
};

const ILP32_BUFFER: Buffer = Buffer {
    size: 68,
    index: Field::u32(0),
    type_: Field::u32(4),
    bytesused: Field::u32(8),
    flags: Field::u32(12),
    field: Field::u32(16),
    timestamp: Field::record(20, 8),
    timecode: Field::record(28, 16),
    sequence: Field::u32(44),
    memory: Field::u32(48),
    offset: Field::u32(52),
    length: Field::u32(56),
};

// i386 aligns 64 bit integers inside structs to 4 bytes only.
const PACKED_STANDARD: Standard = Standard {
    size: 64,
    index: Field::u32(0),
    id: Field::u64(4),
    name: Field::text(12, 24),
    frameperiod: Field::record(36, 8),
    framelines: Field::u32(44),
};

const fn table(
    name: &'static str,
    ioc: Encoding,
    format: Format,
    buffer: Buffer,
    standard: Standard,
) -> Layout {
    Layout {
        name,
        ioc,
        capability: CAPABILITY,
        format,
        pix_format: PIX_FORMAT,
        streamparm: STREAMPARM,
        captureparm: CAPTUREPARM,
        requestbuffers: REQUESTBUFFERS,
        buffer,
        timecode: TIMECODE,
        cropcap: CROPCAP,
        crop: CROP,
        rect: RECT,
        fract: FRACT,
        standard,
        fmtdesc: FMTDESC,
        frmsizeenum: FRMSIZEENUM,
        frmsize_discrete: FRMSIZE_DISCRETE,
        frmsize_stepwise: FRMSIZE_STEPWISE,
        frmivalenum: FRMIVALENUM,
        frmival_stepwise: FRMIVAL_STEPWISE,
        queryctrl: QUERYCTRL,
        querymenu: QUERYMENU,
        control: CONTROL,
        int: INT,
    }
}

/// x86_64
pub const X86_64: Layout = table(
    "x86_64",
    Encoding::GENERIC,
    LP64_FORMAT,
    LP64_BUFFER,
    ALIGNED_STANDARD,
);

/// aarch64
pub const AARCH64: Layout = table(
    "aarch64",
    Encoding::GENERIC,
    LP64_FORMAT,
    LP64_BUFFER,
    ALIGNED_STANDARD,
);

/// riscv64
pub const RISCV64: Layout = table(
    "riscv64",
    Encoding::GENERIC,
    LP64_FORMAT,
    LP64_BUFFER,
    ALIGNED_STANDARD,
);

/// powerpc64 (both endians), which uses its own ioctl direction bits
pub const POWERPC64: Layout = table(
    "powerpc64",
    Encoding::POWERPC,
    LP64_FORMAT,
    LP64_BUFFER,
    ALIGNED_STANDARD,
);

/// 32 bit arm (EABI), where 64 bit integers are 8 byte aligned
pub const ARM: Layout = table(
    "arm",
    Encoding::GENERIC,
    ILP32_FORMAT,
    ILP32_BUFFER,
    ALIGNED_STANDARD,
);

/// 32 bit x86
pub const X86: Layout = table(
    "x86",
    Encoding::GENERIC,
    ILP32_FORMAT,
    ILP32_BUFFER,
    PACKED_STANDARD,
);

#[cfg(target_arch = "x86_64")]
const NATIVE: Layout = X86_64;
#[cfg(target_arch = "aarch64")]
const NATIVE: Layout = AARCH64;
#[cfg(target_arch = "riscv64")]
const NATIVE: Layout = RISCV64;
#[cfg(target_arch = "powerpc64")]
const NATIVE: Layout = POWERPC64;
#[cfg(target_arch = "arm")]
const NATIVE: Layout = ARM;
#[cfg(target_arch = "x86")]
const NATIVE: Layout = X86;

#[cfg(not(any(
    target_arch = "x86_64",
    target_arch = "aarch64",
    target_arch = "riscv64",
    target_arch = "powerpc64",
    target_arch = "arm",
    target_arch = "x86",
)))]
compile_error!("no v4l2 layout table for this target architecture");

impl Layout {
    /// Returns the table of the architecture this crate was compiled for
    pub fn native() -> &'static Layout {
        &NATIVE
    }

    /// Returns every table shipped with the crate
    pub fn all() -> [&'static Layout; 6] {
        [&X86_64, &AARCH64, &RISCV64, &POWERPC64, &ARM, &X86]
    }
}
