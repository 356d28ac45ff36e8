//! In-memory stand-in for a v4l2 capture driver.
//!
//! Requests are decoded with the same codec the real dispatcher uses, answered from a scripted
//! [`MockState`] and encoded back, so tests exercise the whole path except the syscall.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::v4l2::codec::{decode, encode, Record};
use crate::v4l2::layout::Layout;
use crate::v4l2::types::*;
use crate::v4l2::vidioc::{Codes, _IOC_TYPE};
use crate::v4l2::{Backend, Handle, Region};

pub const YUYV: u32 = u32::from_le_bytes(*b"YUYV");
pub const MJPG: u32 = u32::from_le_bytes(*b"MJPG");

const NEXT_CTRL: u32 = 0x8000_0000;
const BUFFER_STRIDE: u32 = 0x0010_0000;

pub enum Sizes {
    Discrete(Vec<(u32, u32)>),
    Stepwise(u32, v4l2_frmsize_stepwise),
    Unknown(u32),
}

pub enum Intervals {
    Discrete(Vec<(u32, u32)>),
    Stepwise(u32, v4l2_frmival_stepwise),
    Unknown(u32),
}

pub struct Format {
    pub fourcc: u32,
    pub description: &'static str,
    pub sizes: Sizes,
    pub intervals: Intervals,
}

pub struct Control {
    pub info: v4l2_queryctrl,
    pub menu: Vec<(u32, &'static str)>,
}

pub fn control(id: u32, type_: u32, name: &str, min: i32, max: i32, default: i32) -> Control {
    Control {
        info: v4l2_queryctrl {
            id,
            type_,
            name: name.to_string(),
            minimum: min,
            maximum: max,
            step: 1,
            default_value: default,
            flags: 0,
        },
        menu: Vec::new(),
    }
}

/// Count of live regions, shared with the regions themselves
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn add(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn sub(&self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct MockState {
    pub capability: v4l2_capability,
    pub standards: bool,

    pub format: v4l2_pix_format,
    pub timeperframe: v4l2_fract,
    pub formats: Vec<Format>,

    pub cropcap: Result<v4l2_rect, i32>,
    pub crop: Option<v4l2_rect>,

    pub controls: Vec<Control>,
    pub next_ctrl: bool,
    pub values: HashMap<u32, i32>,

    /// Number of buffers granted by REQBUFS, `None` grants what is requested
    pub grant: Option<u32>,
    pub buffer_len: u32,
    pub bytesused: u32,
    pub buffers: u32,
    pub queued: VecDeque<u32>,
    pub streaming: bool,
    pub sequence: u32,

    /// Errno injected for a request code
    pub fail: HashMap<_IOC_TYPE, i32>,
    /// Every request code issued, in order
    pub calls: Vec<_IOC_TYPE>,
    /// Number of currently mapped regions
    pub mapped: Counter,
}

impl Default for MockState {
    fn default() -> Self {
        MockState {
            capability: v4l2_capability {
                driver: "mock".to_string(),
                card: "Mock Camera".to_string(),
                bus_info: "platform:mock".to_string(),
                version: 0x0005_0f02,
                capabilities: 0x8420_0001,
                device_caps: 0x0420_0001,
            },
            standards: false,
            format: v4l2_pix_format {
                width: 640,
                height: 480,
                pixelformat: YUYV,
                field: V4L2_FIELD_NONE,
                bytesperline: 1280,
                sizeimage: 614400,
                ..Default::default()
            },
            timeperframe: v4l2_fract {
                numerator: 1,
                denominator: 30,
            },
            formats: vec![Format {
                fourcc: YUYV,
                description: "YUYV 4:2:2",
                sizes: Sizes::Discrete(vec![(640, 480), (320, 240)]),
                intervals: Intervals::Discrete(vec![(1, 30), (1, 15)]),
            }],
            cropcap: Err(libc::ENOTTY),
            crop: None,
            controls: Vec::new(),
            next_ctrl: true,
            values: HashMap::new(),
            grant: None,
            buffer_len: 4096,
            bytesused: 4096,
            buffers: 0,
            queued: VecDeque::new(),
            streaming: false,
            sequence: 0,
            fail: HashMap::new(),
            calls: Vec::new(),
            mapped: Counter::default(),
        }
    }
}

/// Shared handle on a scripted device; clones see the same state
#[derive(Clone, Default)]
pub struct Mock {
    state: Arc<Mutex<MockState>>,
}

impl Mock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn codes() -> Codes {
        Codes::new(Layout::native())
    }

    pub fn handle(&self) -> Handle {
        Handle::new(Box::new(self.clone()))
    }

    /// Number of times `code` was issued
    pub fn count(&self, code: _IOC_TYPE) -> usize {
        self.state().calls.iter().filter(|&&c| c == code).count()
    }
}

fn exchange<R, F>(arg: &mut [u8], f: F) -> Result<(), i32>
where
    R: Record + Default,
    F: FnOnce(&mut R) -> Result<(), i32>,
{
    let layout = Layout::native();
    assert_eq!(arg.len(), R::size(layout), "payload size mismatch");
    let mut record: R = decode(layout, arg);
    f(&mut record)?;
    arg.copy_from_slice(&encode(layout, &record));
    Ok(())
}

fn capture_type(type_: u32) -> Result<(), i32> {
    if type_ == V4L2_BUF_TYPE_VIDEO_CAPTURE {
        Ok(())
    } else {
        Err(libc::EINVAL)
    }
}

impl MockState {
    fn dispatch(&mut self, code: _IOC_TYPE, arg: &mut [u8]) -> Result<(), i32> {
        self.calls.push(code);
        if let Some(&errno) = self.fail.get(&code) {
            return Err(errno);
        }

        let c = Mock::codes();
        if code == c.VIDIOC_QUERYCAP {
            exchange(arg, |r: &mut v4l2_capability| {
                *r = self.capability.clone();
                Ok(())
            })
        } else if code == c.VIDIOC_G_FMT {
            exchange(arg, |r: &mut v4l2_format| {
                capture_type(r.type_)?;
                r.pix = self.format;
                Ok(())
            })
        } else if code == c.VIDIOC_S_FMT {
            exchange(arg, |r: &mut v4l2_format| self.s_fmt(r))
        } else if code == c.VIDIOC_G_PARM {
            exchange(arg, |r: &mut v4l2_streamparm| {
                capture_type(r.type_)?;
                r.capture.timeperframe = self.timeperframe;
                Ok(())
            })
        } else if code == c.VIDIOC_S_PARM {
            exchange(arg, |r: &mut v4l2_streamparm| {
                capture_type(r.type_)?;
                if r.capture.timeperframe.denominator != 0 {
                    self.timeperframe = r.capture.timeperframe;
                }
                r.capture.timeperframe = self.timeperframe;
                Ok(())
            })
        } else if code == c.VIDIOC_CROPCAP {
            exchange(arg, |r: &mut v4l2_cropcap| {
                capture_type(r.type_)?;
                r.defrect = self.cropcap?;
                r.bounds = r.defrect;
                Ok(())
            })
        } else if code == c.VIDIOC_S_CROP {
            exchange(arg, |r: &mut v4l2_crop| {
                self.crop = Some(r.c);
                Ok(())
            })
        } else if code == c.VIDIOC_REQBUFS {
            exchange(arg, |r: &mut v4l2_requestbuffers| self.reqbufs(r))
        } else if code == c.VIDIOC_QUERYBUF {
            exchange(arg, |r: &mut v4l2_buffer| {
                if r.index >= self.buffers {
                    return Err(libc::EINVAL);
                }
                r.offset = r.index * BUFFER_STRIDE;
                r.length = self.buffer_len;
                Ok(())
            })
        } else if code == c.VIDIOC_QBUF {
            exchange(arg, |r: &mut v4l2_buffer| {
                if r.index >= self.buffers || self.queued.contains(&r.index) {
                    return Err(libc::EINVAL);
                }
                self.queued.push_back(r.index);
                Ok(())
            })
        } else if code == c.VIDIOC_DQBUF {
            exchange(arg, |r: &mut v4l2_buffer| {
                if !self.streaming {
                    return Err(libc::EINVAL);
                }
                let index = self.queued.pop_front().ok_or(libc::EAGAIN)?;
                r.index = index;
                r.bytesused = self.bytesused.min(self.buffer_len);
                r.sequence = self.sequence;
                r.offset = index * BUFFER_STRIDE;
                r.length = self.buffer_len;
                self.sequence += 1;
                Ok(())
            })
        } else if code == c.VIDIOC_STREAMON {
            exchange(arg, |r: &mut i32| {
                capture_type(*r as u32)?;
                if self.buffers == 0 {
                    return Err(libc::EINVAL);
                }
                self.streaming = true;
                Ok(())
            })
        } else if code == c.VIDIOC_STREAMOFF {
            exchange(arg, |r: &mut i32| {
                capture_type(*r as u32)?;
                self.streaming = false;
                self.queued.clear();
                Ok(())
            })
        } else if code == c.VIDIOC_ENUMSTD {
            exchange(arg, |r: &mut v4l2_standard| {
                if !self.standards || r.index != 0 {
                    return Err(libc::EINVAL);
                }
                r.id = 0xff;
                r.name = "PAL".to_string();
                Ok(())
            })
        } else if code == c.VIDIOC_ENUM_FMT {
            exchange(arg, |r: &mut v4l2_fmtdesc| {
                let fmt = self.formats.get(r.index as usize).ok_or(libc::EINVAL)?;
                r.description = fmt.description.to_string();
                r.pixelformat = fmt.fourcc;
                Ok(())
            })
        } else if code == c.VIDIOC_ENUM_FRAMESIZES {
            exchange(arg, |r: &mut v4l2_frmsizeenum| self.enum_framesizes(r))
        } else if code == c.VIDIOC_ENUM_FRAMEINTERVALS {
            exchange(arg, |r: &mut v4l2_frmivalenum| self.enum_frameintervals(r))
        } else if code == c.VIDIOC_QUERYCTRL {
            exchange(arg, |r: &mut v4l2_queryctrl| self.queryctrl(r))
        } else if code == c.VIDIOC_QUERYMENU {
            exchange(arg, |r: &mut v4l2_querymenu| {
                let ctrl = self.find_control(r.id)?;
                let (_, name) = ctrl
                    .menu
                    .iter()
                    .find(|(index, _)| *index == r.index)
                    .ok_or(libc::EINVAL)?;
                r.name = name.to_string();
                Ok(())
            })
        } else if code == c.VIDIOC_G_CTRL {
            exchange(arg, |r: &mut v4l2_control| {
                let info = self.find_control(r.id)?.info.clone();
                if info.type_ == V4L2_CTRL_TYPE_BUTTON {
                    return Err(libc::EACCES);
                }
                r.value = *self.values.get(&r.id).unwrap_or(&info.default_value);
                Ok(())
            })
        } else if code == c.VIDIOC_S_CTRL {
            exchange(arg, |r: &mut v4l2_control| {
                let info = self.find_control(r.id)?.info.clone();
                if r.value < info.minimum || r.value > info.maximum {
                    return Err(libc::ERANGE);
                }
                self.values.insert(r.id, r.value);
                Ok(())
            })
        } else {
            Err(libc::ENOTTY)
        }
    }

    fn s_fmt(&mut self, r: &mut v4l2_format) -> Result<(), i32> {
        capture_type(r.type_)?;
        if self.streaming || self.buffers > 0 {
            return Err(libc::EBUSY);
        }

        let mut pix = r.pix;
        if !self.formats.iter().any(|f| f.fourcc == pix.pixelformat) {
            pix.pixelformat = self.format.pixelformat;
        }
        if pix.width == 0 || pix.height == 0 {
            pix.width = self.format.width;
            pix.height = self.format.height;
        }
        pix.bytesperline = pix.width * 2;
        pix.sizeimage = pix.bytesperline * pix.height;
        self.format = pix;
        r.pix = pix;
        Ok(())
    }

    fn reqbufs(&mut self, r: &mut v4l2_requestbuffers) -> Result<(), i32> {
        capture_type(r.type_)?;
        if r.memory != V4L2_MEMORY_MMAP {
            return Err(libc::EINVAL);
        }
        if self.streaming {
            return Err(libc::EBUSY);
        }

        self.queued.clear();
        self.buffers = if r.count == 0 {
            0
        } else {
            self.grant.unwrap_or(r.count)
        };
        r.count = self.buffers;
        Ok(())
    }

    fn enum_framesizes(&self, r: &mut v4l2_frmsizeenum) -> Result<(), i32> {
        let fmt = self
            .formats
            .iter()
            .find(|f| f.fourcc == r.pixel_format)
            .ok_or(libc::EINVAL)?;

        match &fmt.sizes {
            Sizes::Discrete(sizes) => {
                let &(width, height) = sizes.get(r.index as usize).ok_or(libc::EINVAL)?;
                r.type_ = V4L2_FRMSIZE_TYPE_DISCRETE;
                r.discrete = v4l2_frmsize_discrete { width, height };
            }
            Sizes::Stepwise(type_, stepwise) => {
                if r.index != 0 {
                    return Err(libc::EINVAL);
                }
                r.type_ = *type_;
                r.stepwise = *stepwise;
            }
            Sizes::Unknown(type_) => r.type_ = *type_,
        }
        Ok(())
    }

    fn enum_frameintervals(&self, r: &mut v4l2_frmivalenum) -> Result<(), i32> {
        let fmt = self
            .formats
            .iter()
            .find(|f| f.fourcc == r.pixel_format)
            .ok_or(libc::EINVAL)?;

        match &fmt.intervals {
            Intervals::Discrete(ivals) => {
                let &(numerator, denominator) =
                    ivals.get(r.index as usize).ok_or(libc::EINVAL)?;
                r.type_ = V4L2_FRMIVAL_TYPE_DISCRETE;
                r.discrete = v4l2_fract {
                    numerator,
                    denominator,
                };
            }
            Intervals::Stepwise(type_, stepwise) => {
                if r.index != 0 {
                    return Err(libc::EINVAL);
                }
                r.type_ = *type_;
                r.stepwise = *stepwise;
            }
            Intervals::Unknown(type_) => r.type_ = *type_,
        }
        Ok(())
    }

    fn find_control(&self, id: u32) -> Result<&Control, i32> {
        self.controls
            .iter()
            .find(|c| c.info.id == id)
            .ok_or(libc::EINVAL)
    }

    fn queryctrl(&self, r: &mut v4l2_queryctrl) -> Result<(), i32> {
        let ctrl = if r.id & NEXT_CTRL != 0 {
            if !self.next_ctrl {
                return Err(libc::EINVAL);
            }
            let after = r.id & !NEXT_CTRL;
            self.controls
                .iter()
                .filter(|c| c.info.id > after)
                .min_by_key(|c| c.info.id)
                .ok_or(libc::EINVAL)?
        } else {
            self.find_control(r.id)?
        };
        *r = ctrl.info.clone();
        Ok(())
    }
}

impl Backend for Mock {
    fn ioctl(&self, code: _IOC_TYPE, arg: &mut [u8]) -> io::Result<()> {
        self.state()
            .dispatch(code, arg)
            .map_err(io::Error::from_raw_os_error)
    }

    fn map(&self, offset: u32, length: usize) -> io::Result<Box<dyn Region>> {
        let state = self.state();
        let index = offset / BUFFER_STRIDE;
        if offset % BUFFER_STRIDE != 0 || index >= state.buffers {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }

        state.mapped.add();
        Ok(Box::new(MockRegion {
            data: (0..length).map(|j| (j as u8).wrapping_add(index as u8)).collect(),
            mapped: state.mapped.clone(),
        }))
    }
}

struct MockRegion {
    data: Vec<u8>,
    mapped: Counter,
}

impl Region for MockRegion {
    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for MockRegion {
    fn drop(&mut self) {
        self.mapped.sub();
    }
}
