//! Rust side representation of the v4l2 records in `<linux/videodev2.h>`.
//!
//! These mirror the C structs field by field (minus reserved padding) and carry no layout of
//! their own: the bytes are produced and consumed by the [`Record`] impls below, driven by the
//! per-architecture [`Layout`] table.
#![allow(non_camel_case_types)]

use crate::v4l2::codec::{Reader, Record, Writer};
use crate::v4l2::layout::Layout;

pub const V4L2_BUF_TYPE_VIDEO_CAPTURE: u32 = 1;
pub const V4L2_MEMORY_MMAP: u32 = 1;
pub const V4L2_FIELD_NONE: u32 = 1;
pub const V4L2_COLORSPACE_DEFAULT: u32 = 0;

pub const V4L2_FRMSIZE_TYPE_DISCRETE: u32 = 1;
pub const V4L2_FRMSIZE_TYPE_CONTINUOUS: u32 = 2;
pub const V4L2_FRMSIZE_TYPE_STEPWISE: u32 = 3;

pub const V4L2_FRMIVAL_TYPE_DISCRETE: u32 = 1;
pub const V4L2_FRMIVAL_TYPE_CONTINUOUS: u32 = 2;
pub const V4L2_FRMIVAL_TYPE_STEPWISE: u32 = 3;

pub const V4L2_CTRL_TYPE_INTEGER: u32 = 1;
pub const V4L2_CTRL_TYPE_BOOLEAN: u32 = 2;
pub const V4L2_CTRL_TYPE_MENU: u32 = 3;
pub const V4L2_CTRL_TYPE_BUTTON: u32 = 4;
pub const V4L2_CTRL_TYPE_STRING: u32 = 7;

pub const V4L2_CID_BASE: u32 = 0x00980900;
pub const V4L2_CID_LASTP1: u32 = 0x0098092b;
pub const V4L2_CID_PRIVATE_BASE: u32 = 0x08000000;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct v4l2_capability {
    pub driver: String,
    pub card: String,
    pub bus_info: String,
    pub version: u32,
    pub capabilities: u32,
    pub device_caps: u32,
}

impl Record for v4l2_capability {
    fn size(l: &Layout) -> usize {
        l.capability.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.capability;
        w.text(t.driver, &self.driver);
        w.text(t.card, &self.card);
        w.text(t.bus_info, &self.bus_info);
        w.u32(t.version, self.version);
        w.u32(t.capabilities, self.capabilities);
        w.u32(t.device_caps, self.device_caps);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.capability;
        self.driver = r.text(t.driver);
        self.card = r.text(t.card);
        self.bus_info = r.text(t.bus_info);
        self.version = r.u32(t.version);
        self.capabilities = r.u32(t.capabilities);
        self.device_caps = r.u32(t.device_caps);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_pix_format {
    pub width: u32,
    pub height: u32,
    pub pixelformat: u32,
    pub field: u32,
    pub bytesperline: u32,
    pub sizeimage: u32,
    pub colorspace: u32,
    pub priv_: u32,
    pub flags: u32,
    pub ycbcr_enc: u32,
    pub quantization: u32,
    pub xfer_func: u32,
}

impl v4l2_pix_format {
    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.pix_format;
        w.u32(t.width, self.width);
        w.u32(t.height, self.height);
        w.u32(t.pixelformat, self.pixelformat);
        w.u32(t.field, self.field);
        w.u32(t.bytesperline, self.bytesperline);
        w.u32(t.sizeimage, self.sizeimage);
        w.u32(t.colorspace, self.colorspace);
        w.u32(t.priv_, self.priv_);
        w.u32(t.flags, self.flags);
        w.u32(t.ycbcr_enc, self.ycbcr_enc);
        w.u32(t.quantization, self.quantization);
        w.u32(t.xfer_func, self.xfer_func);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.pix_format;
        self.width = r.u32(t.width);
        self.height = r.u32(t.height);
        self.pixelformat = r.u32(t.pixelformat);
        self.field = r.u32(t.field);
        self.bytesperline = r.u32(t.bytesperline);
        self.sizeimage = r.u32(t.sizeimage);
        self.colorspace = r.u32(t.colorspace);
        self.priv_ = r.u32(t.priv_);
        self.flags = r.u32(t.flags);
        self.ycbcr_enc = r.u32(t.ycbcr_enc);
        self.quantization = r.u32(t.quantization);
        self.xfer_func = r.u32(t.xfer_func);
    }
}

/// `struct v4l2_format` restricted to the single planar `pix` member
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_format {
    pub type_: u32,
    pub pix: v4l2_pix_format,
}

impl Record for v4l2_format {
    fn size(l: &Layout) -> usize {
        l.format.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        w.u32(l.format.type_, self.type_);
        self.pix.encode(l, &mut w.record(l.format.fmt));
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        self.type_ = r.u32(l.format.type_);
        self.pix.decode(l, &r.record(l.format.fmt));
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_fract {
    pub numerator: u32,
    pub denominator: u32,
}

impl v4l2_fract {
    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        w.u32(l.fract.numerator, self.numerator);
        w.u32(l.fract.denominator, self.denominator);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        self.numerator = r.u32(l.fract.numerator);
        self.denominator = r.u32(l.fract.denominator);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_captureparm {
    pub capability: u32,
    pub capturemode: u32,
    pub timeperframe: v4l2_fract,
    pub extendedmode: u32,
    pub readbuffers: u32,
}

/// `struct v4l2_streamparm` restricted to the `capture` member
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_streamparm {
    pub type_: u32,
    pub capture: v4l2_captureparm,
}

impl Record for v4l2_streamparm {
    fn size(l: &Layout) -> usize {
        l.streamparm.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.captureparm;
        w.u32(l.streamparm.type_, self.type_);
        let mut w = w.record(l.streamparm.parm);
        w.u32(t.capability, self.capture.capability);
        w.u32(t.capturemode, self.capture.capturemode);
        self.capture
            .timeperframe
            .encode(l, &mut w.record(t.timeperframe));
        w.u32(t.extendedmode, self.capture.extendedmode);
        w.u32(t.readbuffers, self.capture.readbuffers);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.captureparm;
        self.type_ = r.u32(l.streamparm.type_);
        let r = r.record(l.streamparm.parm);
        self.capture.capability = r.u32(t.capability);
        self.capture.capturemode = r.u32(t.capturemode);
        self.capture
            .timeperframe
            .decode(l, &r.record(t.timeperframe));
        self.capture.extendedmode = r.u32(t.extendedmode);
        self.capture.readbuffers = r.u32(t.readbuffers);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_requestbuffers {
    pub count: u32,
    pub type_: u32,
    pub memory: u32,
}

impl Record for v4l2_requestbuffers {
    fn size(l: &Layout) -> usize {
        l.requestbuffers.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.requestbuffers;
        w.u32(t.count, self.count);
        w.u32(t.type_, self.type_);
        w.u32(t.memory, self.memory);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.requestbuffers;
        self.count = r.u32(t.count);
        self.type_ = r.u32(t.type_);
        self.memory = r.u32(t.memory);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_timecode {
    pub type_: u32,
    pub flags: u32,
    pub frames: u8,
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub userbits: [u8; 4],
}

impl v4l2_timecode {
    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.timecode;
        w.u32(t.type_, self.type_);
        w.u32(t.flags, self.flags);
        w.u8(t.frames, self.frames);
        w.u8(t.seconds, self.seconds);
        w.u8(t.minutes, self.minutes);
        w.u8(t.hours, self.hours);
        w.bytes(t.userbits, &self.userbits);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.timecode;
        self.type_ = r.u32(t.type_);
        self.flags = r.u32(t.flags);
        self.frames = r.u8(t.frames);
        self.seconds = r.u8(t.seconds);
        self.minutes = r.u8(t.minutes);
        self.hours = r.u8(t.hours);
        self.userbits.copy_from_slice(r.bytes(t.userbits));
    }
}

/// `struct v4l2_buffer` for single planar mmap I/O
///
/// The timestamp is left zeroed on the way in and ignored on the way out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_buffer {
    pub index: u32,
    pub type_: u32,
    pub bytesused: u32,
    pub flags: u32,
    pub field: u32,
    pub timecode: v4l2_timecode,
    pub sequence: u32,
    pub memory: u32,
    pub offset: u32,
    pub length: u32,
}

impl Record for v4l2_buffer {
    fn size(l: &Layout) -> usize {
        l.buffer.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.buffer;
        w.u32(t.index, self.index);
        w.u32(t.type_, self.type_);
        w.u32(t.bytesused, self.bytesused);
        w.u32(t.flags, self.flags);
        w.u32(t.field, self.field);
        self.timecode.encode(l, &mut w.record(t.timecode));
        w.u32(t.sequence, self.sequence);
        w.u32(t.memory, self.memory);
        w.u32(t.offset, self.offset);
        w.u32(t.length, self.length);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.buffer;
        self.index = r.u32(t.index);
        self.type_ = r.u32(t.type_);
        self.bytesused = r.u32(t.bytesused);
        self.flags = r.u32(t.flags);
        self.field = r.u32(t.field);
        self.timecode.decode(l, &r.record(t.timecode));
        self.sequence = r.u32(t.sequence);
        self.memory = r.u32(t.memory);
        self.offset = r.u32(t.offset);
        self.length = r.u32(t.length);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl v4l2_rect {
    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        w.i32(l.rect.left, self.left);
        w.i32(l.rect.top, self.top);
        w.u32(l.rect.width, self.width);
        w.u32(l.rect.height, self.height);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        self.left = r.i32(l.rect.left);
        self.top = r.i32(l.rect.top);
        self.width = r.u32(l.rect.width);
        self.height = r.u32(l.rect.height);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_cropcap {
    pub type_: u32,
    pub bounds: v4l2_rect,
    pub defrect: v4l2_rect,
    pub pixelaspect: v4l2_fract,
}

impl Record for v4l2_cropcap {
    fn size(l: &Layout) -> usize {
        l.cropcap.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.cropcap;
        w.u32(t.type_, self.type_);
        self.bounds.encode(l, &mut w.record(t.bounds));
        self.defrect.encode(l, &mut w.record(t.defrect));
        self.pixelaspect.encode(l, &mut w.record(t.pixelaspect));
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.cropcap;
        self.type_ = r.u32(t.type_);
        self.bounds.decode(l, &r.record(t.bounds));
        self.defrect.decode(l, &r.record(t.defrect));
        self.pixelaspect.decode(l, &r.record(t.pixelaspect));
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_crop {
    pub type_: u32,
    pub c: v4l2_rect,
}

impl Record for v4l2_crop {
    fn size(l: &Layout) -> usize {
        l.crop.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        w.u32(l.crop.type_, self.type_);
        self.c.encode(l, &mut w.record(l.crop.c));
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        self.type_ = r.u32(l.crop.type_);
        self.c.decode(l, &r.record(l.crop.c));
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct v4l2_standard {
    pub index: u32,
    pub id: u64,
    pub name: String,
    pub frameperiod: v4l2_fract,
    pub framelines: u32,
}

impl Record for v4l2_standard {
    fn size(l: &Layout) -> usize {
        l.standard.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.standard;
        w.u32(t.index, self.index);
        w.u64(t.id, self.id);
        w.text(t.name, &self.name);
        self.frameperiod.encode(l, &mut w.record(t.frameperiod));
        w.u32(t.framelines, self.framelines);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.standard;
        self.index = r.u32(t.index);
        self.id = r.u64(t.id);
        self.name = r.text(t.name);
        self.frameperiod.decode(l, &r.record(t.frameperiod));
        self.framelines = r.u32(t.framelines);
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct v4l2_fmtdesc {
    pub index: u32,
    pub type_: u32,
    pub flags: u32,
    pub description: String,
    pub pixelformat: u32,
}

impl Record for v4l2_fmtdesc {
    fn size(l: &Layout) -> usize {
        l.fmtdesc.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.fmtdesc;
        w.u32(t.index, self.index);
        w.u32(t.type_, self.type_);
        w.u32(t.flags, self.flags);
        w.text(t.description, &self.description);
        w.u32(t.pixelformat, self.pixelformat);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.fmtdesc;
        self.index = r.u32(t.index);
        self.type_ = r.u32(t.type_);
        self.flags = r.u32(t.flags);
        self.description = r.text(t.description);
        self.pixelformat = r.u32(t.pixelformat);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_frmsize_discrete {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_frmsize_stepwise {
    pub min_width: u32,
    pub max_width: u32,
    pub step_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    pub step_height: u32,
}

/// `struct v4l2_frmsizeenum`
///
/// `discrete` and `stepwise` overlay each other; `type_` decides which one is encoded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_frmsizeenum {
    pub index: u32,
    pub pixel_format: u32,
    pub type_: u32,
    pub discrete: v4l2_frmsize_discrete,
    pub stepwise: v4l2_frmsize_stepwise,
}

impl Record for v4l2_frmsizeenum {
    fn size(l: &Layout) -> usize {
        l.frmsizeenum.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.frmsizeenum;
        w.u32(t.index, self.index);
        w.u32(t.pixel_format, self.pixel_format);
        w.u32(t.type_, self.type_);
        match self.type_ {
            V4L2_FRMSIZE_TYPE_DISCRETE => {
                let d = &l.frmsize_discrete;
                let mut w = w.record(t.discrete);
                w.u32(d.width, self.discrete.width);
                w.u32(d.height, self.discrete.height);
            }
            V4L2_FRMSIZE_TYPE_CONTINUOUS | V4L2_FRMSIZE_TYPE_STEPWISE => {
                let s = &l.frmsize_stepwise;
                let mut w = w.record(t.stepwise);
                w.u32(s.min_width, self.stepwise.min_width);
                w.u32(s.max_width, self.stepwise.max_width);
                w.u32(s.step_width, self.stepwise.step_width);
                w.u32(s.min_height, self.stepwise.min_height);
                w.u32(s.max_height, self.stepwise.max_height);
                w.u32(s.step_height, self.stepwise.step_height);
            }
            _ => {}
        }
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.frmsizeenum;
        self.index = r.u32(t.index);
        self.pixel_format = r.u32(t.pixel_format);
        self.type_ = r.u32(t.type_);

        let d = &l.frmsize_discrete;
        let dr = r.record(t.discrete);
        self.discrete.width = dr.u32(d.width);
        self.discrete.height = dr.u32(d.height);

        let s = &l.frmsize_stepwise;
        let sr = r.record(t.stepwise);
        self.stepwise.min_width = sr.u32(s.min_width);
        self.stepwise.max_width = sr.u32(s.max_width);
        self.stepwise.step_width = sr.u32(s.step_width);
        self.stepwise.min_height = sr.u32(s.min_height);
        self.stepwise.max_height = sr.u32(s.max_height);
        self.stepwise.step_height = sr.u32(s.step_height);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_frmival_stepwise {
    pub min: v4l2_fract,
    pub max: v4l2_fract,
    pub step: v4l2_fract,
}

/// `struct v4l2_frmivalenum`
///
/// `discrete` and `stepwise` overlay each other; `type_` decides which one is encoded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_frmivalenum {
    pub index: u32,
    pub pixel_format: u32,
    pub width: u32,
    pub height: u32,
    pub type_: u32,
    pub discrete: v4l2_fract,
    pub stepwise: v4l2_frmival_stepwise,
}

impl Record for v4l2_frmivalenum {
    fn size(l: &Layout) -> usize {
        l.frmivalenum.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.frmivalenum;
        w.u32(t.index, self.index);
        w.u32(t.pixel_format, self.pixel_format);
        w.u32(t.width, self.width);
        w.u32(t.height, self.height);
        w.u32(t.type_, self.type_);
        match self.type_ {
            V4L2_FRMIVAL_TYPE_DISCRETE => self.discrete.encode(l, &mut w.record(t.discrete)),
            V4L2_FRMIVAL_TYPE_CONTINUOUS | V4L2_FRMIVAL_TYPE_STEPWISE => {
                let s = &l.frmival_stepwise;
                let mut w = w.record(t.stepwise);
                self.stepwise.min.encode(l, &mut w.record(s.min));
                self.stepwise.max.encode(l, &mut w.record(s.max));
                self.stepwise.step.encode(l, &mut w.record(s.step));
            }
            _ => {}
        }
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.frmivalenum;
        self.index = r.u32(t.index);
        self.pixel_format = r.u32(t.pixel_format);
        self.width = r.u32(t.width);
        self.height = r.u32(t.height);
        self.type_ = r.u32(t.type_);
        self.discrete.decode(l, &r.record(t.discrete));

        let s = &l.frmival_stepwise;
        let sr = r.record(t.stepwise);
        self.stepwise.min.decode(l, &sr.record(s.min));
        self.stepwise.max.decode(l, &sr.record(s.max));
        self.stepwise.step.decode(l, &sr.record(s.step));
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct v4l2_queryctrl {
    pub id: u32,
    pub type_: u32,
    pub name: String,
    pub minimum: i32,
    pub maximum: i32,
    pub step: i32,
    pub default_value: i32,
    pub flags: u32,
}

impl Record for v4l2_queryctrl {
    fn size(l: &Layout) -> usize {
        l.queryctrl.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.queryctrl;
        w.u32(t.id, self.id);
        w.u32(t.type_, self.type_);
        w.text(t.name, &self.name);
        w.i32(t.minimum, self.minimum);
        w.i32(t.maximum, self.maximum);
        w.i32(t.step, self.step);
        w.i32(t.default_value, self.default_value);
        w.u32(t.flags, self.flags);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.queryctrl;
        self.id = r.u32(t.id);
        self.type_ = r.u32(t.type_);
        self.name = r.text(t.name);
        self.minimum = r.i32(t.minimum);
        self.maximum = r.i32(t.maximum);
        self.step = r.i32(t.step);
        self.default_value = r.i32(t.default_value);
        self.flags = r.u32(t.flags);
    }
}

/// `struct v4l2_querymenu`
///
/// `name` and `value` overlay each other; only `name` is encoded since integer menus are
/// not exposed by the facade.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct v4l2_querymenu {
    pub id: u32,
    pub index: u32,
    pub name: String,
    pub value: i64,
}

impl Record for v4l2_querymenu {
    fn size(l: &Layout) -> usize {
        l.querymenu.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        let t = &l.querymenu;
        w.u32(t.id, self.id);
        w.u32(t.index, self.index);
        w.text(t.name, &self.name);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        let t = &l.querymenu;
        self.id = r.u32(t.id);
        self.index = r.u32(t.index);
        self.name = r.text(t.name);
        self.value = r.i64(t.value);
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct v4l2_control {
    pub id: u32,
    pub value: i32,
}

impl Record for v4l2_control {
    fn size(l: &Layout) -> usize {
        l.control.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        w.u32(l.control.id, self.id);
        w.i32(l.control.value, self.value);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        self.id = r.u32(l.control.id);
        self.value = r.i32(l.control.value);
    }
}

/// Plain `int` argument
impl Record for i32 {
    fn size(l: &Layout) -> usize {
        l.int.size
    }

    fn encode(&self, l: &Layout, w: &mut Writer<'_>) {
        w.i32(l.int.value, *self);
    }

    fn decode(&mut self, l: &Layout, r: &Reader<'_>) {
        *self = r.i32(l.int.value);
    }
}
