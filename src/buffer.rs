use std::fmt;
use std::io::{self, SeekFrom};
use std::sync::{Arc, Mutex, Weak};

use crate::error::{Error, Result};
use crate::io::mmap::{self, Stream};

/// Outcome of a positioned read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Number of bytes copied
    pub len: usize,
    /// Whether the read hit the end of the frame
    pub eof: bool,
}

/// Read-only view of the most recently captured frame
///
/// The view does not own the frame memory. It stays usable until the next capture or until
/// streaming is turned off; after that it behaves as an empty buffer and reads fail with
/// [`Error::BufferGone`].
///
/// # Example
///
/// ```no_run
/// use std::io::Read;
/// use v4lcam::Device;
///
/// let mut dev = Device::open("/dev/video0").expect("Failed to open device");
/// dev.turn_on().expect("Failed to start streaming");
///
/// let mut frame = dev.capture().expect("Failed to capture");
/// let mut data = Vec::new();
/// frame.read_to_end(&mut data).expect("Failed to read frame");
/// println!("frame {} has {} bytes", frame.sequence(), data.len());
/// ```
pub struct Buffer {
    stream: Weak<Mutex<Stream>>,
    generation: u64,
    pos: u64,
    sequence: u32,
}

impl Buffer {
    pub(crate) fn new(stream: &Arc<Mutex<Stream>>, generation: u64, sequence: u32) -> Self {
        Buffer {
            stream: Arc::downgrade(stream),
            generation,
            pos: 0,
            sequence,
        }
    }

    /// Runs `f` on the frame bytes, or returns `None` if they are gone
    fn with_bytes<T, F: FnOnce(&[u8]) -> T>(&self, f: F) -> Option<T> {
        let stream = self.stream.upgrade()?;
        let stream = mmap::lock(&stream);
        stream.bytes(self.generation).map(f)
    }

    /// Returns the number of bytes the driver filled, 0 once the frame is gone
    pub fn size(&self) -> u64 {
        self.with_bytes(|bytes| bytes.len() as u64).unwrap_or(0)
    }

    /// Returns the number of bytes not read yet, 0 once the frame is gone
    pub fn len(&self) -> usize {
        self.with_bytes(|bytes| (bytes.len() as u64).saturating_sub(self.pos) as usize)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the driver's sequence number of this frame
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Copies bytes from the cursor into `dst` and advances the cursor
    ///
    /// Returns `Ok(0)` once the cursor reached the end of the frame.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        let pos = self.pos;
        let n = self
            .with_bytes(|bytes| copy_from(bytes, pos, dst))
            .ok_or(Error::BufferGone)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// Copies bytes starting at `offset` into `dst` without touching the cursor
    ///
    /// A read reaching past the end copies what is available and reports `eof`.
    pub fn read_at(&self, dst: &mut [u8], offset: i64) -> Result<Chunk> {
        let bytes_len = self.size_checked()?;
        if offset < 0 {
            return Err(Error::NegativeOffset);
        }

        let offset = offset as u64;
        if offset >= bytes_len {
            return Ok(Chunk { len: 0, eof: true });
        }

        let len = self
            .with_bytes(|bytes| copy_from(bytes, offset, dst))
            .ok_or(Error::BufferGone)?;
        Ok(Chunk {
            len,
            eof: len < dst.len(),
        })
    }

    /// Reads the byte under the cursor, `None` at the end of the frame
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8];
        match Buffer::read(self, &mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Moves the cursor, clamping positions past the end to the end
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let size = self.size_checked()?;
        let target = match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(size) + i128::from(delta),
        };
        if target < 0 {
            return Err(Error::NegativeOffset);
        }

        self.pos = (target as u64).min(size);
        Ok(self.pos)
    }

    fn size_checked(&self) -> Result<u64> {
        self.with_bytes(|bytes| bytes.len() as u64)
            .ok_or(Error::BufferGone)
    }
}

fn copy_from(bytes: &[u8], pos: u64, dst: &mut [u8]) -> usize {
    let start = (pos as usize).min(bytes.len());
    let src = &bytes[start..];
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("generation", &self.generation)
            .field("sequence", &self.sequence)
            .field("pos", &self.pos)
            .finish()
    }
}

impl io::Read for Buffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(Buffer::read(self, buf)?)
    }
}

impl io::Seek for Buffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(Buffer::seek(self, pos)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v4l2::mock::Mock;
    use rand::{self, Rng};
    use std::io::{Read, Seek};

    /// Starts a stream on a mock whose first frame holds `used` bytes `0, 1, 2, ..`
    fn frame(used: u32) -> (Mock, Arc<Mutex<Stream>>, Buffer) {
        let mock = Mock::new();
        mock.state().bytesused = used;
        let handle = mock.handle();

        let stream = Arc::new(Mutex::new(Stream::new()));
        mmap::lock(&stream).start(&handle, 2).unwrap();
        let (generation, sequence) = mmap::lock(&stream).capture(&handle).unwrap();
        let buf = Buffer::new(&stream, generation, sequence);

        (mock, stream, buf)
    }

    fn expected(used: u32) -> Vec<u8> {
        (0..used).map(|j| j as u8).collect()
    }

    #[test]
    fn sequential_read() {
        let (_mock, _stream, mut buf) = frame(1000);
        assert_eq!(buf.size(), 1000);
        assert_eq!(buf.len(), 1000);

        let mut dst = [0u8; 600];
        assert_eq!(buf.read(&mut dst).unwrap(), 600);
        assert_eq!(buf.len(), 400);
        assert_eq!(buf.read(&mut dst).unwrap(), 400);
        assert_eq!(&dst[..400], &expected(1000)[600..]);
        assert!(buf.is_empty());
        assert_eq!(buf.read(&mut dst).unwrap(), 0);
        assert_eq!(buf.read_byte().unwrap(), None);
    }

    #[test]
    fn seek_then_read_returns_tail() {
        let mut rng = rand::rng();
        let used = rng.random_range(1..4096u32);
        let (_mock, _stream, mut buf) = frame(used);
        let data = expected(used);

        for _ in 0..64 {
            let p = rng.random_range(0..=used as u64);
            assert_eq!(Buffer::seek(&mut buf, SeekFrom::Start(p)).unwrap(), p);

            let mut tail = Vec::new();
            buf.read_to_end(&mut tail).unwrap();
            assert_eq!(tail, &data[p as usize..]);
        }
    }

    #[test]
    fn read_at_bounds() {
        let mut rng = rand::rng();
        let used = rng.random_range(1..4096u32);
        let size = used as i64;
        let (_mock, _stream, buf) = frame(used);
        let data = expected(used);

        for _ in 0..256 {
            let start = rng.random_range(-16..size + 16);
            let len = rng.random_range(0..512usize);
            let mut dst = vec![0u8; len];

            let res = buf.read_at(&mut dst, start);
            if start < 0 {
                assert!(matches!(res, Err(Error::NegativeOffset)));
                continue;
            }

            let chunk = res.unwrap();
            if start >= size {
                assert_eq!(chunk, Chunk { len: 0, eof: true });
            } else if start + len as i64 <= size {
                assert_eq!(chunk, Chunk { len, eof: false });
                assert_eq!(&dst[..], &data[start as usize..start as usize + len]);
            } else {
                let avail = (size - start) as usize;
                assert_eq!(chunk, Chunk { len: avail, eof: true });
                assert_eq!(&dst[..avail], &data[start as usize..]);
            }
        }
        assert_eq!(buf.len(), used as usize);
    }

    #[test]
    fn seek_modes() {
        let (_mock, _stream, mut buf) = frame(100);

        assert_eq!(Buffer::seek(&mut buf, SeekFrom::End(-10)).unwrap(), 90);
        assert_eq!(Buffer::seek(&mut buf, SeekFrom::Current(-40)).unwrap(), 50);
        assert_eq!(buf.read_byte().unwrap(), Some(50));
        assert_eq!(Buffer::seek(&mut buf, SeekFrom::Current(0)).unwrap(), 51);

        // past the end clamps
        assert_eq!(Buffer::seek(&mut buf, SeekFrom::Start(1000)).unwrap(), 100);
        assert_eq!(Buffer::seek(&mut buf, SeekFrom::End(5)).unwrap(), 100);

        assert!(matches!(
            Buffer::seek(&mut buf, SeekFrom::Current(-101)),
            Err(Error::NegativeOffset)
        ));
        // a rejected seek leaves the cursor alone
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn superseded_view_is_gone() {
        let (mock, stream, mut first) = frame(100);
        let handle = mock.handle();
        let (generation, sequence) = mmap::lock(&stream).capture(&handle).unwrap();
        let mut second = Buffer::new(&stream, generation, sequence);

        assert_eq!(first.size(), 0);
        assert_eq!(first.len(), 0);
        assert!(matches!(first.read(&mut [0u8; 4]), Err(Error::BufferGone)));
        assert!(matches!(
            first.read_at(&mut [0u8; 4], 0),
            Err(Error::BufferGone)
        ));
        assert!(matches!(
            Buffer::seek(&mut first, SeekFrom::Start(0)),
            Err(Error::BufferGone)
        ));

        assert_eq!(second.sequence(), 1);
        assert_eq!(second.size(), 100);
        assert_eq!(second.read_byte().unwrap(), Some(1));
    }

    #[test]
    fn stopped_stream_is_gone() {
        let (mock, stream, mut buf) = frame(100);
        mmap::lock(&stream).stop(&mock.handle());

        assert_eq!(buf.size(), 0);
        let err = buf.read_to_end(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);

        drop(stream);
        assert_eq!(buf.size(), 0);
        assert!(matches!(buf.read_byte(), Err(Error::BufferGone)));
    }

    #[test]
    fn view_reads_on_another_thread() {
        let (_mock, _stream, mut buf) = frame(64);
        let data = std::thread::spawn(move || {
            let mut data = Vec::new();
            buf.read_to_end(&mut data).unwrap();
            data
        })
        .join()
        .unwrap();
        assert_eq!(data, expected(64));
    }

    #[test]
    fn io_seek_maps_negative_offset() {
        let (_mock, _stream, mut buf) = frame(10);
        let err = io::Seek::seek(&mut buf, SeekFrom::End(-11)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(buf.stream_position().unwrap(), 0);
    }
}
