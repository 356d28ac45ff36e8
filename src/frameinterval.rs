use std::cmp::Ordering;
use std::convert::TryFrom;
use std::{fmt, io};

use log::debug;

use crate::fraction::Fraction;
use crate::v4l2;
use crate::v4l2::types::*;

/// A frame interval as returned by [`VIDIOC_ENUM_FRAMEINTERVALS`](crate::v4l2::vidioc::Codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameIntervalEnum {
    Discrete(Fraction),
    Stepwise(Stepwise),
}

impl fmt::Display for FrameIntervalEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameIntervalEnum::Discrete(val) => write!(f, "Discrete({})", val)?,
            FrameIntervalEnum::Stepwise(val) => write!(f, "Stepwise({})", val)?,
        }

        Ok(())
    }
}

impl TryFrom<v4l2_frmivalenum> for FrameIntervalEnum {
    type Error = String;

    fn try_from(desc: v4l2_frmivalenum) -> Result<Self, Self::Error> {
        match desc.type_ {
            V4L2_FRMIVAL_TYPE_DISCRETE => Ok(FrameIntervalEnum::Discrete(Fraction::from(
                desc.discrete,
            ))),
            V4L2_FRMIVAL_TYPE_CONTINUOUS | V4L2_FRMIVAL_TYPE_STEPWISE => {
                Ok(FrameIntervalEnum::Stepwise(Stepwise {
                    min: Fraction::from(desc.stepwise.min),
                    max: Fraction::from(desc.stepwise.max),
                    step: Fraction::from(desc.stepwise.step),
                }))
            }
            typ => Err(format!("Unknown frame interval type: {}", typ)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stepwise {
    /// Minimum frame interval (in seconds).
    pub min: Fraction,
    /// Maximum frame interval (in seconds).
    pub max: Fraction,
    /// Frame interval step size (in seconds).
    pub step: Fraction,
}

impl Stepwise {
    /// Whether `ival` lies in `min..=max`
    pub fn contains(&self, ival: Fraction) -> bool {
        ival.cmp(&self.min) != Ordering::Less && ival.cmp(&self.max) != Ordering::Greater
    }

    /// Returns the [`DEFAULT_INTERVALS`] inside the range followed by the shortest interval
    ///
    /// # Example
    ///
    /// ```
    /// use v4lcam::Fraction;
    /// use v4lcam::frameinterval::Stepwise;
    ///
    /// let range = Stepwise {
    ///     min: Fraction::new(1, 30),
    ///     max: Fraction::new(1, 1),
    ///     step: Fraction::new(1, 1000),
    /// };
    /// let ivals: Vec<String> = range.candidates().iter().map(|f| f.to_string()).collect();
    /// assert_eq!(ivals, ["1/5", "1/10", "1/15", "1/25", "1/30", "1/30"]);
    /// ```
    pub fn candidates(&self) -> Vec<Fraction> {
        DEFAULT_INTERVALS
            .iter()
            .copied()
            .filter(|&ival| self.contains(ival))
            .chain(std::iter::once(self.min))
            .collect()
    }
}

impl fmt::Display for Stepwise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} with step {}", self.min, self.max, self.step)?;
        Ok(())
    }
}

/// Common frame intervals offered for devices describing their intervals as a range
pub const DEFAULT_INTERVALS: [Fraction; 6] = [
    Fraction::new(1, 5),
    Fraction::new(1, 10),
    Fraction::new(1, 15),
    Fraction::new(1, 25),
    Fraction::new(1, 30),
    Fraction::new(1, 60),
];

/// Outcome of one `VIDIOC_ENUM_FRAMEINTERVALS` request
enum Probe {
    Interval(FrameIntervalEnum),
    /// EINVAL, no more intervals
    End,
    /// An interval type this crate does not know
    Unknown(String),
}

fn probe(
    handle: &v4l2::Handle,
    fourcc: u32,
    width: u32,
    height: u32,
    index: u32,
) -> io::Result<Probe> {
    let mut fi = v4l2_frmivalenum {
        index,
        pixel_format: fourcc,
        width,
        height,
        ..Default::default()
    };
    match handle.call(handle.codes().VIDIOC_ENUM_FRAMEINTERVALS, &mut fi) {
        Ok(()) => Ok(FrameIntervalEnum::try_from(fi).map_or_else(Probe::Unknown, Probe::Interval)),
        Err(e) if v4l2::is_invalid(&e) => Ok(Probe::End),
        Err(e) => Err(e),
    }
}

/// Returns the frame intervals supported for `fourcc` at `width`x`height`
///
/// Drivers describing their intervals as a range get [`Stepwise::candidates`] instead of an
/// exhaustive list. An unknown interval type yields no intervals at all.
pub(crate) fn enumerate(
    handle: &v4l2::Handle,
    fourcc: u32,
    width: u32,
    height: u32,
) -> io::Result<Vec<Fraction>> {
    let mut ivals = Vec::new();

    for index in 0.. {
        match probe(handle, fourcc, width, height, index)? {
            Probe::Interval(FrameIntervalEnum::Discrete(ival)) => ivals.push(ival),
            Probe::Interval(FrameIntervalEnum::Stepwise(range)) => {
                debug!(
                    "frame intervals of {:#010x} {}x{} are a range: {}",
                    fourcc, width, height, range
                );
                ivals.extend(range.candidates());
                break;
            }
            Probe::End => break,
            Probe::Unknown(e) => {
                debug!("{:#010x} {}x{}: {}", fourcc, width, height, e);
                return Ok(Vec::new());
            }
        }
    }

    Ok(ivals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_are_bounded_inclusively() {
        let range = Stepwise {
            min: Fraction::new(1, 25),
            max: Fraction::new(1, 10),
            step: Fraction::new(0, 1),
        };
        assert_eq!(
            range.candidates(),
            vec![
                Fraction::new(1, 10),
                Fraction::new(1, 15),
                Fraction::new(1, 25),
                Fraction::new(1, 25)
            ]
        );
    }

    #[test]
    fn unreduced_bounds_compare_by_value() {
        let range = Stepwise {
            min: Fraction::new(333333, 10000000),
            max: Fraction::new(2, 20),
            step: Fraction::new(1, 10000000),
        };
        // 1/30 is slightly longer than 333333/10000000, 1/60 is far shorter
        let got = range.candidates();
        assert_eq!(
            got,
            vec![
                Fraction::new(1, 10),
                Fraction::new(1, 15),
                Fraction::new(1, 25),
                Fraction::new(1, 30),
                Fraction::new(333333, 10000000)
            ]
        );
    }

    #[test]
    fn unknown_type() {
        let desc = v4l2_frmivalenum {
            type_: 0,
            ..Default::default()
        };
        assert!(FrameIntervalEnum::try_from(desc).is_err());
    }
}
