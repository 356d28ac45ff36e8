use std::{fmt, str};

/// Four character code representing a pixelformat
///
/// The first character lives in the lowest byte of the numeric code.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FourCC {
    pub repr: [u8; 4],
}

impl FourCC {
    /// Returns a pixelformat as four character code
    ///
    /// # Arguments
    ///
    /// * `repr` - Four characters as raw bytes
    ///
    /// # Example
    ///
    /// ```
    /// use v4lcam::FourCC;
    /// let fourcc = FourCC::new(b"YUYV");
    /// assert_eq!(u32::from(fourcc), 0x56595559);
    /// ```
    pub fn new(repr: &[u8; 4]) -> FourCC {
        FourCC { repr: *repr }
    }

    /// Returns the string representation of a four character code
    ///
    /// # Example
    ///
    /// ```
    /// use v4lcam::FourCC;
    /// let fourcc = FourCC::new(b"MJPG");
    /// assert_eq!(fourcc.str(), Ok("MJPG"));
    /// ```
    pub fn str(&self) -> Result<&str, str::Utf8Error> {
        str::from_utf8(&self.repr)
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.str() {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{:#010x}", u32::from(*self)),
        }
    }
}

impl From<u32> for FourCC {
    fn from(code: u32) -> Self {
        FourCC::new(&code.to_le_bytes())
    }
}

impl From<FourCC> for u32 {
    fn from(fourcc: FourCC) -> Self {
        Self::from_le_bytes(fourcc.repr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        let code = u32::from(FourCC::new(b"YUYV"));
        assert_eq!(code, 0x5659_5559);
        assert_eq!(FourCC::from(code), FourCC::new(b"YUYV"));
    }

    #[test]
    fn display() {
        assert_eq!(FourCC::new(b"MJPG").to_string(), "MJPG");
        assert_eq!(FourCC::from(0xffff_ffff).to_string(), "0xffffffff");
    }
}
