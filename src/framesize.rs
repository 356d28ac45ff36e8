use std::convert::TryFrom;
use std::{fmt, io};

use log::debug;

use crate::v4l2;
use crate::v4l2::types::*;

/// A frame size as returned by [`VIDIOC_ENUM_FRAMESIZES`](crate::v4l2::vidioc::Codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSizeEnum {
    Discrete(Discrete),
    Stepwise(Stepwise),
}

impl fmt::Display for FrameSizeEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameSizeEnum::Discrete(val) => write!(f, "Discrete({})", val)?,
            FrameSizeEnum::Stepwise(val) => write!(f, "Stepwise({})", val)?,
        }

        Ok(())
    }
}

impl TryFrom<v4l2_frmsizeenum> for FrameSizeEnum {
    type Error = String;

    fn try_from(desc: v4l2_frmsizeenum) -> Result<Self, Self::Error> {
        match desc.type_ {
            V4L2_FRMSIZE_TYPE_DISCRETE => Ok(FrameSizeEnum::Discrete(Discrete {
                width: desc.discrete.width,
                height: desc.discrete.height,
            })),
            V4L2_FRMSIZE_TYPE_STEPWISE | V4L2_FRMSIZE_TYPE_CONTINUOUS => {
                Ok(FrameSizeEnum::Stepwise(Stepwise {
                    min_width: desc.stepwise.min_width,
                    max_width: desc.stepwise.max_width,
                    step_width: desc.stepwise.step_width,
                    min_height: desc.stepwise.min_height,
                    max_height: desc.stepwise.max_height,
                    step_height: desc.stepwise.step_height,
                }))
            }
            typ => Err(format!("Unknown frame size type: {}", typ)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Discrete {
    /// Width of the frame (in pixels).
    pub width: u32,
    /// Height of the frame (in pixels).
    pub height: u32,
}

impl Discrete {
    pub const fn new(width: u32, height: u32) -> Self {
        Discrete { width, height }
    }
}

impl fmt::Display for Discrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stepwise {
    /// Minimum frame width (in pixels).
    pub min_width: u32,
    /// Maximum frame width (in pixels).
    pub max_width: u32,
    /// Frame width step size (in pixels).
    pub step_width: u32,
    /// Minimum frame height (in pixels).
    pub min_height: u32,
    /// Maximum frame height (in pixels).
    pub max_height: u32,
    /// Frame height step size (in pixels).
    pub step_height: u32,
}

fn on_grid(v: u32, min: u32, max: u32, step: u32) -> bool {
    // continuous ranges may report a step of 0
    min <= v && v <= max && (v - min) % step.max(1) == 0
}

impl Stepwise {
    /// Whether `size` lies inside the range and on its step grid
    pub fn contains(&self, size: Discrete) -> bool {
        on_grid(size.width, self.min_width, self.max_width, self.step_width)
            && on_grid(size.height, self.min_height, self.max_height, self.step_height)
    }

    /// Returns the [`DEFAULT_SIZES`] inside the range followed by the largest size
    ///
    /// # Example
    ///
    /// ```
    /// use v4lcam::framesize::{Discrete, Stepwise};
    ///
    /// let range = Stepwise {
    ///     min_width: 320, max_width: 640, step_width: 160,
    ///     min_height: 240, max_height: 480, step_height: 120,
    /// };
    /// assert_eq!(
    ///     range.candidates(),
    ///     vec![Discrete::new(320, 240), Discrete::new(640, 360), Discrete::new(640, 480),
    ///          Discrete::new(640, 480)],
    /// );
    /// ```
    pub fn candidates(&self) -> Vec<Discrete> {
        DEFAULT_SIZES
            .iter()
            .copied()
            .filter(|&size| self.contains(size))
            .chain(std::iter::once(Discrete::new(self.max_width, self.max_height)))
            .collect()
    }
}

impl fmt::Display for Stepwise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} - {}x{} with step {}/{}",
            self.min_width,
            self.min_height,
            self.max_width,
            self.max_height,
            self.step_width,
            self.step_height,
        )?;
        Ok(())
    }
}

/// Common resolutions offered for devices describing their sizes as a range
pub const DEFAULT_SIZES: [Discrete; 16] = [
    Discrete::new(160, 120),
    Discrete::new(176, 144),
    Discrete::new(320, 180),
    Discrete::new(320, 240),
    Discrete::new(352, 288),
    Discrete::new(640, 360),
    Discrete::new(640, 480),
    Discrete::new(800, 600),
    Discrete::new(960, 540),
    Discrete::new(1024, 768),
    Discrete::new(1280, 720),
    Discrete::new(1280, 960),
    Discrete::new(1600, 1200),
    Discrete::new(1920, 1080),
    Discrete::new(3840, 2160),
    Discrete::new(7680, 4320),
];

/// Outcome of one `VIDIOC_ENUM_FRAMESIZES` request
enum Probe {
    Size(FrameSizeEnum),
    /// EINVAL, no more sizes
    End,
    /// A size type this crate does not know
    Unknown(String),
}

fn probe(handle: &v4l2::Handle, fourcc: u32, index: u32) -> io::Result<Probe> {
    let mut fs = v4l2_frmsizeenum {
        index,
        pixel_format: fourcc,
        ..Default::default()
    };
    match handle.call(handle.codes().VIDIOC_ENUM_FRAMESIZES, &mut fs) {
        Ok(()) => Ok(FrameSizeEnum::try_from(fs).map_or_else(Probe::Unknown, Probe::Size)),
        Err(e) if v4l2::is_invalid(&e) => Ok(Probe::End),
        Err(e) => Err(e),
    }
}

/// Returns the frame sizes supported for pixel format `fourcc`
///
/// Drivers describing their sizes as a range get [`Stepwise::candidates`] instead of an
/// exhaustive list. An unknown size type yields no sizes at all.
pub(crate) fn enumerate(handle: &v4l2::Handle, fourcc: u32) -> io::Result<Vec<Discrete>> {
    let mut sizes = Vec::new();

    for index in 0.. {
        match probe(handle, fourcc, index)? {
            Probe::Size(FrameSizeEnum::Discrete(size)) => sizes.push(size),
            Probe::Size(FrameSizeEnum::Stepwise(range)) => {
                debug!("frame sizes of {:#010x} are a range: {}", fourcc, range);
                sizes.extend(range.candidates());
                break;
            }
            Probe::End => break,
            Probe::Unknown(e) => {
                debug!("{:#010x}: {}", fourcc, e);
                return Ok(Vec::new());
            }
        }
    }

    Ok(sizes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: (u32, u32), max: (u32, u32), step: (u32, u32)) -> Stepwise {
        Stepwise {
            min_width: min.0,
            max_width: max.0,
            step_width: step.0,
            min_height: min.1,
            max_height: max.1,
            step_height: step.1,
        }
    }

    #[test]
    fn candidates_respect_step_grid() {
        let r = range((160, 120), (1280, 960), (32, 24));
        let sizes: Vec<String> = r.candidates().iter().map(|s| s.to_string()).collect();
        // 176x144, 320x180 and 960x540 are off the grid
        assert_eq!(
            sizes,
            vec![
                "160x120", "320x240", "352x288", "640x360", "640x480", "800x600", "1024x768",
                "1280x720", "1280x960", "1280x960"
            ]
        );
    }

    #[test]
    fn continuous_range_with_zero_step() {
        let r = range((1, 1), (1920, 1080), (0, 0));
        let sizes = r.candidates();
        assert_eq!(sizes.len(), 14);
        assert_eq!(sizes[11], Discrete::new(1280, 960));
        assert_eq!(sizes[12], Discrete::new(1920, 1080));
        assert_eq!(sizes[13], Discrete::new(1920, 1080));
    }

    #[test]
    fn empty_range_still_offers_maximum() {
        let r = range((10, 10), (20, 20), (1, 1));
        assert_eq!(r.candidates(), vec![Discrete::new(20, 20)]);
    }

    #[test]
    fn unknown_type() {
        let desc = v4l2_frmsizeenum {
            type_: 9,
            ..Default::default()
        };
        assert!(FrameSizeEnum::try_from(desc).is_err());
    }
}
