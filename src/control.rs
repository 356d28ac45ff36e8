use std::{fmt, io};

use log::debug;

use crate::v4l2;
use crate::v4l2::types::*;

/// Well known control identifiers
///
/// Devices may have other controls than these, including driver specific ones starting at
/// [`PRIVATE_BASE`](id::PRIVATE_BASE).
#[allow(clippy::unreadable_literal)]
pub mod id {
    // Integer controls
    pub const BRIGHTNESS: u32 = 0x00980900;
    pub const CONTRAST: u32 = 0x00980901;
    pub const SATURATION: u32 = 0x00980902;
    pub const HUE: u32 = 0x00980903;
    pub const GAMMA: u32 = 0x00980910;
    pub const EXPOSURE: u32 = 0x00980911;
    pub const GAIN: u32 = 0x00980913;
    pub const WHITE_BALANCE: u32 = 0x0098091a;
    pub const SHARPNESS: u32 = 0x0098091b;
    pub const BACKLIGHT_COMPENSATION: u32 = 0x0098091c;

    // Boolean controls
    pub const HFLIP: u32 = 0x00980914;
    pub const VFLIP: u32 = 0x00980915;
    pub const AUTO_WHITE_BALANCE: u32 = 0x0098090c;
    pub const AUTO_GAIN: u32 = 0x00980912;
    pub const AUTO_HUE: u32 = 0x00980919;
    pub const AUTO_BRIGHTNESS: u32 = 0x00980920;

    // Menus
    pub const POWER_LINE_FREQUENCY: u32 = 0x00980918;

    // Buttons
    pub const DO_WHITE_BALANCE: u32 = 0x0098090d;

    /// First driver specific control
    pub const PRIVATE_BASE: u32 = crate::v4l2::types::V4L2_CID_PRIVATE_BASE;
}

/// Values of the [`id::POWER_LINE_FREQUENCY`] menu
pub mod power_line_frequency {
    pub const DISABLED: i32 = 0;
    pub const HZ_50: i32 = 1;
    pub const HZ_60: i32 = 2;
    pub const AUTO: i32 = 3;
}

/// Control data type
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Any value in `minimum..=maximum` in multiples of `step`
    Integer,
    /// 0 means disabled, 1 means enabled
    Boolean,
    /// One of the values listed in [`ControlInfo::options`]
    Menu,
    /// Performs an action when set to any value, cannot be read
    Button,
}

impl Type {
    /// Maps a raw `V4L2_CTRL_TYPE_*` value, `None` for types not exposed by this crate
    pub fn from_raw(repr: u32) -> Option<Self> {
        match repr {
            V4L2_CTRL_TYPE_INTEGER => Some(Type::Integer),
            V4L2_CTRL_TYPE_BOOLEAN => Some(Type::Boolean),
            V4L2_CTRL_TYPE_MENU => Some(Type::Menu),
            V4L2_CTRL_TYPE_BUTTON => Some(Type::Button),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Type::Integer => "int",
            Type::Boolean => "bool",
            Type::Menu => "enum",
            Type::Button => "button",
        };
        write!(f, "{}", name)
    }
}

bitflags::bitflags! {
    #[derive(PartialEq, Eq, Hash, Debug, Clone, Copy)]
    pub struct Flags: u32 {
        const DISABLED              = 0x0001;
        const GRABBED               = 0x0002;
        const READ_ONLY             = 0x0004;
        const UPDATE                = 0x0008;
        const INACTIVE              = 0x0010;
        const SLIDER                = 0x0020;
        const WRITE_ONLY            = 0x0040;
        const VOLATILE              = 0x0080;

        const NEXT_CTRL             = 0x80000000;
    }
}

impl From<u32> for Flags {
    fn from(flags: u32) -> Self {
        Self::from_bits_retain(flags)
    }
}

impl From<Flags> for u32 {
    fn from(flags: Flags) -> Self {
        flags.bits()
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One valid value of a menu control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub value: i32,
    pub name: String,
}

/// Device control description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlInfo {
    /// Control identifier, e.g. [`id::BRIGHTNESS`]
    pub id: u32,
    /// Name of the control, intended for the user
    pub name: String,
    /// Type of control
    pub typ: Type,
    /// Minimum value, inclusive
    pub minimum: i32,
    /// Maximum value, inclusive
    pub maximum: i32,
    /// Smallest change affecting the hardware
    pub step: i32,
    /// Default value
    pub default: i32,
    /// Valid values of a menu control in ascending order, empty for other types
    pub options: Vec<MenuOption>,
}

impl fmt::Display for ControlInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ID         : {:#010x}", self.id)?;
        writeln!(f, "Type       : {}", self.typ)?;
        writeln!(f, "Name       : {}", self.name)?;
        writeln!(f, "Minimum    : {}", self.minimum)?;
        writeln!(f, "Maximum    : {}", self.maximum)?;
        writeln!(f, "Step       : {}", self.step)?;
        writeln!(f, "Default    : {}", self.default)?;
        if !self.options.is_empty() {
            writeln!(f, "Menu ==>")?;
            for option in &self.options {
                writeln!(f, " * {}: {}", option.value, option.name)?;
            }
        }
        Ok(())
    }
}

/// Result of querying a single control id
enum Query {
    Found(ControlInfo),
    /// Disabled or of a type we do not expose; carries the id the driver answered with
    Skipped(u32),
}

impl Query {
    fn id(&self) -> u32 {
        match self {
            Query::Found(info) => info.id,
            Query::Skipped(id) => *id,
        }
    }
}

/// How the driver wants its controls enumerated, decided by the very first request
enum Probe {
    /// `V4L2_CTRL_FLAG_NEXT_CTRL` works; carries the answer to the first request
    Next(Query),
    /// Only direct id lookups work
    Legacy,
}

fn query(handle: &v4l2::Handle, id: u32) -> io::Result<Query> {
    let mut qc = v4l2_queryctrl {
        id,
        ..Default::default()
    };
    handle.call(handle.codes().VIDIOC_QUERYCTRL, &mut qc)?;

    if Flags::from(qc.flags).contains(Flags::DISABLED) {
        return Ok(Query::Skipped(qc.id));
    }
    let typ = match Type::from_raw(qc.type_) {
        Some(typ) => typ,
        None => return Ok(Query::Skipped(qc.id)),
    };

    let mut options = Vec::new();
    if typ == Type::Menu {
        for index in qc.minimum..=qc.maximum {
            let mut qm = v4l2_querymenu {
                id: qc.id,
                index: index as u32,
                ..Default::default()
            };
            // Drivers may leave holes between minimum and maximum
            match handle.call(handle.codes().VIDIOC_QUERYMENU, &mut qm) {
                Ok(()) => options.push(MenuOption {
                    value: index,
                    name: qm.name,
                }),
                Err(e) if v4l2::is_invalid(&e) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    Ok(Query::Found(ControlInfo {
        id: qc.id,
        name: qc.name,
        typ,
        minimum: qc.minimum,
        maximum: qc.maximum,
        step: qc.step,
        default: qc.default_value,
        options,
    }))
}

fn probe(handle: &v4l2::Handle) -> io::Result<Probe> {
    match query(handle, Flags::NEXT_CTRL.bits()) {
        Ok(first) => Ok(Probe::Next(first)),
        Err(e) if v4l2::is_invalid(&e) => Ok(Probe::Legacy),
        Err(e) => Err(e),
    }
}

fn list_next(handle: &v4l2::Handle, first: Query) -> io::Result<Vec<ControlInfo>> {
    let mut infos = Vec::new();
    let mut cursor = 0;
    let mut next = Some(first);

    while let Some(q) = next.take() {
        let id = q.id();
        if id <= cursor {
            debug!("driver returned control {:#x} after {:#x}, stopping", id, cursor);
            break;
        }
        cursor = id;
        if let Query::Found(info) = q {
            infos.push(info);
        }

        next = match query(handle, cursor | Flags::NEXT_CTRL.bits()) {
            Ok(q) => Some(q),
            Err(e) if v4l2::is_invalid(&e) => None,
            Err(e) => return Err(e),
        };
    }

    Ok(infos)
}

fn list_legacy(handle: &v4l2::Handle) -> io::Result<Vec<ControlInfo>> {
    let mut infos = Vec::new();

    for id in V4L2_CID_BASE..V4L2_CID_LASTP1 {
        match query(handle, id) {
            Ok(Query::Found(info)) => infos.push(info),
            Ok(Query::Skipped(_)) => {}
            Err(e) if v4l2::is_invalid(&e) => {}
            Err(e) => return Err(e),
        }
    }

    for id in V4L2_CID_PRIVATE_BASE.. {
        match query(handle, id) {
            Ok(Query::Found(info)) => infos.push(info),
            Ok(Query::Skipped(_)) => {}
            Err(e) if v4l2::is_invalid(&e) => break,
            Err(e) => return Err(e),
        }
    }

    Ok(infos)
}

/// Returns every enabled control of a supported type
pub(crate) fn list(handle: &v4l2::Handle) -> io::Result<Vec<ControlInfo>> {
    match probe(handle)? {
        Probe::Next(first) => list_next(handle, first),
        Probe::Legacy => {
            debug!("V4L2_CTRL_FLAG_NEXT_CTRL unsupported, scanning control ids");
            list_legacy(handle)
        }
    }
}

/// Returns the description of control `id`
///
/// Disabled controls and controls of unsupported types are reported as nonexistent (EINVAL).
pub(crate) fn info(handle: &v4l2::Handle, id: u32) -> io::Result<ControlInfo> {
    match query(handle, id)? {
        Query::Found(info) => Ok(info),
        Query::Skipped(_) => Err(io::Error::from_raw_os_error(libc::EINVAL)),
    }
}

pub(crate) fn get(handle: &v4l2::Handle, id: u32) -> io::Result<i32> {
    let mut ctrl = v4l2_control {
        id,
        ..Default::default()
    };
    handle.call(handle.codes().VIDIOC_G_CTRL, &mut ctrl)?;
    Ok(ctrl.value)
}

pub(crate) fn set(handle: &v4l2::Handle, id: u32, value: i32) -> io::Result<()> {
    let mut ctrl = v4l2_control { id, value };
    handle.call(handle.codes().VIDIOC_S_CTRL, &mut ctrl)
}
