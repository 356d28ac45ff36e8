//! This crate provides safe access to video4linux capture devices.
//!
//! A [`Device`] negotiates the capture configuration, runs a memory mapped streaming session
//! and hands out [`Buffer`] views of the captured frames. Views never outlive the frame they
//! describe: once a newer frame was captured or streaming was turned off, they report
//! [`Error::BufferGone`] instead of stale or unmapped data.
//!
//! Control requests are encoded with explicit per-architecture layout tables (see [`v4l2`])
//! rather than bindgen generated structs, so the crate has no build time dependency on kernel
//! headers.
//!
//! # Example
//!
//! ```no_run
//! use std::io::Read;
//! use v4lcam::{Device, DeviceConfig, FourCC, Fraction};
//!
//! let mut dev = Device::open("/dev/video0").expect("Failed to open device");
//!
//! dev.set_config(DeviceConfig {
//!     format: FourCC::new(b"YUYV"),
//!     width: 640,
//!     height: 480,
//!     fps: Fraction::new(30, 1),
//! })
//! .expect("Failed to configure device");
//! println!("Active config: {}", dev.get_config().expect("Failed to read config"));
//!
//! dev.turn_on().expect("Failed to start streaming");
//! let mut frame = dev.capture().expect("Failed to capture");
//!
//! let mut data = Vec::new();
//! frame.read_to_end(&mut data).expect("Failed to read frame");
//! println!("Frame {}: {} bytes", frame.sequence(), data.len());
//! ```

pub mod v4l2;

pub mod buffer;
pub use buffer::{Buffer, Chunk};

pub mod capability;
pub use capability::Capabilities;

pub mod control;
pub use control::ControlInfo;

pub mod device;
pub use device::{find_devices, BufferInfo, Device, DeviceConfig, DeviceInfo};

mod error;
pub use error::{Error, Result};

mod fourcc;
pub use fourcc::FourCC;

mod fraction;
pub use fraction::Fraction;

pub mod frameinterval;
pub mod framesize;

mod io;
