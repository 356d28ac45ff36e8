use std::collections::HashSet;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::{fmt, fs};

use log::debug;

use crate::buffer::Buffer;
use crate::capability::{self, Capabilities};
use crate::control::{self, ControlInfo};
use crate::error::{Error, Result};
use crate::fourcc::FourCC;
use crate::fraction::Fraction;
use crate::io::mmap::{self, Stream};
use crate::v4l2;
use crate::v4l2::types::*;
use crate::{frameinterval, framesize};

/// Number of buffers allocated by [`Device::turn_on`]
pub const BUFFER_COUNT: u32 = 4;

/// Capture configuration: pixel format, frame size and frame rate
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceConfig {
    /// Pixel format
    pub format: FourCC,
    /// Frame width (in pixels)
    pub width: u32,
    /// Frame height (in pixels)
    pub height: u32,
    /// Frames per second
    pub fps: Fraction,
}

impl fmt::Display for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} @ {} fps",
            self.format, self.width, self.height, self.fps
        )
    }
}

/// Layout of image data in a capture buffer
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BufferInfo {
    /// Buffer size needed to hold a full frame (in bytes)
    pub size: u32,
    /// Distance between two consecutive image rows (in bytes)
    pub stride: u32,
}

/// Identity of a capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device node path
    pub path: PathBuf,
    /// Card name
    pub name: String,
    /// Bus location, e.g. usb-0000:00:14.0-1
    pub bus: String,
    /// Driver name
    pub driver: String,
    /// Driver version MAJOR.MINOR.PATCH
    pub version: (u8, u8, u8),
    /// Whether the device is a camera, i.e. does not support any analog video standard
    pub camera: bool,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Path    : {}", self.path.display())?;
        writeln!(f, "Name    : {}", self.name)?;
        writeln!(f, "Bus     : {}", self.bus)?;
        writeln!(
            f,
            "Driver  : {} {}.{}.{}",
            self.driver, self.version.0, self.version.1, self.version.2
        )?;
        writeln!(f, "Camera  : {}", self.camera)?;
        Ok(())
    }
}

/// A video capture device
///
/// A device is idle after opening. [`turn_on`](Device::turn_on) starts a capture session,
/// [`capture`](Device::capture) hands out views of the captured frames and
/// [`turn_off`](Device::turn_off) ends the session again. Dropping the device ends a running
/// session and closes the node.
///
/// Devices and their frame views can be moved to other threads. A device does no locking of
/// its own, so callers sharing one between threads wrap it in a `Mutex`.
///
/// # Example
///
/// ```no_run
/// use v4lcam::Device;
///
/// let mut dev = Device::open("/dev/video0").expect("Failed to open device");
/// println!("{}", dev.get_config().expect("Failed to read config"));
///
/// dev.turn_on().expect("Failed to start streaming");
/// for _ in 0..10 {
///     let frame = dev.capture().expect("Failed to capture");
///     println!("frame {}: {} bytes", frame.sequence(), frame.size());
/// }
/// dev.close();
/// ```
pub struct Device {
    path: PathBuf,
    stream: Arc<Mutex<Stream>>,
    handle: v4l2::Handle,
}

impl Device {
    /// Opens the capture device at `path`
    ///
    /// Fails with [`Error::WrongDevice`] if the node is not a video4linux device or does not
    /// support video capture.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let fd = v4l2::Fd::open(path)?;

        let (mode, rdev) = fd.stat()?;
        if mode & libc::S_IFMT != libc::S_IFCHR || v4l2::major(rdev) != v4l2::VIDEO_MAJOR {
            return Err(Error::WrongDevice);
        }

        Self::with_backend(path, Box::new(fd))
    }

    /// Returns a device issuing its requests to `backend`
    ///
    /// `path` is only used to identify the device in [`DeviceInfo`].
    pub fn with_backend<P: AsRef<Path>>(path: P, backend: Box<dyn v4l2::Backend>) -> Result<Self> {
        let handle = v4l2::Handle::new(backend);

        let caps = query_caps(&handle)?;
        if !caps.effective().contains(capability::Flags::VIDEO_CAPTURE) {
            return Err(Error::WrongDevice);
        }

        let path = path.as_ref().to_path_buf();
        debug!(
            "opened {}: {} ({} {}.{}.{})",
            path.display(),
            caps.card,
            caps.driver,
            caps.version.0,
            caps.version.1,
            caps.version.2
        );

        Ok(Device {
            path,
            stream: Arc::new(Mutex::new(Stream::new())),
            handle,
        })
    }

    /// Returns the device node path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the capabilities of the device
    pub fn query_caps(&self) -> Result<Capabilities> {
        Ok(query_caps(&self.handle)?)
    }

    /// Returns name, location and driver of the device
    pub fn device_info(&self) -> Result<DeviceInfo> {
        let caps = query_caps(&self.handle)?;

        // cameras do not enumerate any video standards
        let mut standard = v4l2_standard::default();
        let camera = match self.handle.call(self.handle.codes().VIDIOC_ENUMSTD, &mut standard) {
            Ok(()) => false,
            Err(e) if v4l2::is_invalid(&e) || v4l2::is_unsupported(&e) => true,
            Err(e) => return Err(e.into()),
        };

        Ok(DeviceInfo {
            path: self.path.clone(),
            name: caps.card,
            bus: caps.bus,
            driver: caps.driver,
            version: caps.version,
            camera,
        })
    }

    /// Whether a capture session is running
    pub fn is_on(&self) -> bool {
        mmap::lock(&self.stream).is_active()
    }

    /// Starts a capture session with [`BUFFER_COUNT`] buffers
    ///
    /// The configuration cannot be changed while the session runs. Fails with
    /// [`Error::Unsupported`] if the driver does not offer memory mapped streaming.
    pub fn turn_on(&mut self) -> Result<()> {
        self.turn_on_with_buffers(BUFFER_COUNT)
    }

    /// Starts a capture session asking the driver for `count` buffers
    ///
    /// Does nothing if a session is already running. On failure the device stays idle.
    pub fn turn_on_with_buffers(&mut self, count: u32) -> Result<()> {
        if self.is_on() {
            return Ok(());
        }

        self.progressive()?;
        self.reset_crop()?;
        mmap::lock(&self.stream).start(&self.handle, count)
    }

    /// Ends the capture session, invalidating the last captured frame
    ///
    /// Failures are ignored. Turning off an idle device does no harm.
    pub fn turn_off(&mut self) {
        mmap::lock(&self.stream).stop(&self.handle);
    }

    /// Ends any capture session and closes the device
    pub fn close(mut self) {
        self.turn_off();
    }

    /// Switches to progressive scan and the default colorspace, keeping everything else
    fn progressive(&self) -> Result<()> {
        let mut fmt = v4l2_format {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            ..Default::default()
        };
        self.handle.call(self.handle.codes().VIDIOC_G_FMT, &mut fmt)?;

        fmt.pix.field = V4L2_FIELD_NONE;
        fmt.pix.colorspace = V4L2_COLORSPACE_DEFAULT;
        fmt.pix.priv_ = 0;
        self.handle.call(self.handle.codes().VIDIOC_S_FMT, &mut fmt)?;
        Ok(())
    }

    fn reset_crop(&self) -> Result<()> {
        let codes = self.handle.codes();

        let mut cropcap = v4l2_cropcap {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            ..Default::default()
        };
        match self.handle.call(codes.VIDIOC_CROPCAP, &mut cropcap) {
            Ok(()) => {}
            Err(e) if v4l2::is_unsupported(&e) => {
                debug!("cropping not supported");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        let mut crop = v4l2_crop {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            c: cropcap.defrect,
        };
        match self.handle.call(codes.VIDIOC_S_CROP, &mut crop) {
            Ok(()) => Ok(()),
            Err(e) if v4l2::is_unsupported(&e) || v4l2::is_invalid(&e) => {
                debug!("VIDIOC_S_CROP not supported");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Waits for the next frame and returns a view of it
    ///
    /// The device must be turned on. Views of earlier frames become unavailable. A failed
    /// capture ends the usefulness of the session: turn the device off and on again.
    pub fn capture(&mut self) -> Result<Buffer> {
        let (generation, sequence) = mmap::lock(&self.stream).capture(&self.handle)?;
        Ok(Buffer::new(&self.stream, generation, sequence))
    }

    /// Returns the current configuration
    pub fn get_config(&self) -> Result<DeviceConfig> {
        let codes = self.handle.codes();

        let mut fmt = v4l2_format {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            ..Default::default()
        };
        self.handle.call(codes.VIDIOC_G_FMT, &mut fmt)?;

        let mut parm = v4l2_streamparm {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            ..Default::default()
        };
        self.handle.call(codes.VIDIOC_G_PARM, &mut parm)?;

        let tpf = parm.capture.timeperframe;
        Ok(DeviceConfig {
            format: FourCC::from(fmt.pix.pixelformat),
            width: fmt.pix.width,
            height: fmt.pix.height,
            fps: Fraction::new(tpf.denominator, tpf.numerator),
        })
    }

    /// Applies `cfg`
    ///
    /// Drivers adjust the request to what the hardware supports, read the configuration back
    /// with [`get_config`](Device::get_config) to see what was applied. Fails while the device
    /// is turned on.
    pub fn set_config(&mut self, cfg: DeviceConfig) -> Result<()> {
        let codes = self.handle.codes();

        let mut fmt = v4l2_format {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            pix: v4l2_pix_format {
                width: cfg.width,
                height: cfg.height,
                pixelformat: cfg.format.into(),
                field: V4L2_FIELD_NONE,
                colorspace: V4L2_COLORSPACE_DEFAULT,
                ..Default::default()
            },
        };
        self.handle.call(codes.VIDIOC_S_FMT, &mut fmt)?;

        let fps = cfg.fps.reduce();
        let mut parm = v4l2_streamparm {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            capture: v4l2_captureparm {
                timeperframe: v4l2_fract {
                    numerator: fps.denominator,
                    denominator: fps.numerator,
                },
                ..Default::default()
            },
        };
        self.handle.call(codes.VIDIOC_S_PARM, &mut parm)?;

        debug!("requested {}", cfg);
        Ok(())
    }

    /// Returns how image data is laid out in a buffer with the current configuration
    pub fn buffer_info(&self) -> Result<BufferInfo> {
        let mut fmt = v4l2_format {
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            ..Default::default()
        };
        self.handle.call(self.handle.codes().VIDIOC_G_FMT, &mut fmt)?;

        Ok(BufferInfo {
            size: fmt.pix.sizeimage,
            stride: fmt.pix.bytesperline,
        })
    }

    /// Returns every supported configuration, without duplicates, in driver order
    ///
    /// Drivers describing sizes or intervals as ranges yield a selection of common values
    /// inside those ranges, see [`framesize::Stepwise::candidates`] and
    /// [`frameinterval::Stepwise::candidates`].
    pub fn list_configs(&self) -> Result<Vec<DeviceConfig>> {
        let mut cfgs: Vec<DeviceConfig> = Vec::new();

        for index in 0.. {
            let mut desc = v4l2_fmtdesc {
                index,
                type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
                ..Default::default()
            };
            match self
                .handle
                .call(self.handle.codes().VIDIOC_ENUM_FMT, &mut desc)
            {
                Ok(()) => {}
                Err(e) if v4l2::is_invalid(&e) => break,
                Err(e) => return Err(e.into()),
            }
            debug!("format {}: {}", index, desc.description);

            for size in framesize::enumerate(&self.handle, desc.pixelformat)? {
                let ivals = frameinterval::enumerate(
                    &self.handle,
                    desc.pixelformat,
                    size.width,
                    size.height,
                )?;
                for ival in ivals {
                    let cfg = DeviceConfig {
                        format: FourCC::from(desc.pixelformat),
                        width: size.width,
                        height: size.height,
                        fps: Fraction::new(ival.denominator, ival.numerator).reduce(),
                    };
                    // some drivers report duplicates
                    if !cfgs.contains(&cfg) {
                        cfgs.push(cfg);
                    }
                }
            }
        }

        Ok(cfgs)
    }

    /// Returns every enabled control of a supported type
    pub fn list_controls(&self) -> Result<Vec<ControlInfo>> {
        Ok(control::list(&self.handle)?)
    }

    /// Returns the description of control `id`
    ///
    /// Disabled controls and controls of unsupported types are reported as nonexistent.
    pub fn control_info(&self, id: u32) -> Result<ControlInfo> {
        Ok(control::info(&self.handle, id)?)
    }

    /// Returns the current value of control `id`
    pub fn get_control(&self, id: u32) -> Result<i32> {
        Ok(control::get(&self.handle, id)?)
    }

    /// Sets the value of control `id`
    pub fn set_control(&mut self, id: u32, value: i32) -> Result<()> {
        Ok(control::set(&self.handle, id, value)?)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("path", &self.path)
            .field("on", &self.is_on())
            .finish()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if self.is_on() {
            self.turn_off();
        }
    }
}

fn query_caps(handle: &v4l2::Handle) -> std::io::Result<Capabilities> {
    let mut cap = v4l2_capability::default();
    handle.call(handle.codes().VIDIOC_QUERYCAP, &mut cap)?;
    Ok(Capabilities::from(cap))
}

/// Returns the [`DeviceInfo`] of every capture device in the system
///
/// `/dev` is searched recursively without following symlinks. Only the first node found for
/// a device is reported. Nodes that cannot be opened or are not capture devices are skipped.
///
/// # Example
///
/// ```no_run
/// for info in v4lcam::find_devices() {
///     println!("{}", info);
/// }
/// ```
pub fn find_devices() -> Vec<DeviceInfo> {
    scan(Path::new("/dev"))
}

fn scan(root: &Path) -> Vec<DeviceInfo> {
    let mut seen = HashSet::new();
    let mut infos = Vec::new();

    walk(root, &mut |path: &Path, meta: &fs::Metadata| {
        if !meta.file_type().is_char_device() || v4l2::major(meta.rdev()) != v4l2::VIDEO_MAJOR {
            return;
        }
        let minor = v4l2::minor(meta.rdev());
        if seen.contains(&minor) {
            return;
        }

        match Device::open(path).and_then(|dev| dev.device_info()) {
            Ok(info) => {
                infos.push(info);
                seen.insert(minor);
            }
            Err(e) => debug!("skipping {}: {}", path.display(), e),
        }
    });

    infos
}

/// Visits every non-directory entry below `dir` in lexical order
fn walk(dir: &Path, visit: &mut dyn FnMut(&Path, &fs::Metadata)) {
    let mut entries: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(e) => {
            debug!("cannot read {}: {}", dir.display(), e);
            return;
        }
    };
    entries.sort();

    for path in entries {
        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(_) => continue,
        };
        if meta.is_dir() {
            walk(&path, visit);
        } else {
            visit(&path, &meta);
        }
    }
}
