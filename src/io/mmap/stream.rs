use std::sync::{Mutex, MutexGuard};

use log::{debug, log, Level};

use crate::error::Result;
use crate::io::mmap::arena::Arena;
use crate::v4l2;
use crate::v4l2::types::V4L2_BUF_TYPE_VIDEO_CAPTURE;

/// Locks a session shared between a device and its frame views
///
/// A panic while the lock was held leaves the session consistent, so poisoning is ignored.
pub(crate) fn lock(stream: &Mutex<Stream>) -> MutexGuard<'_, Stream> {
    stream.lock().unwrap_or_else(|e| e.into_inner())
}

/// Streaming session of mapped buffers
///
/// Holds at most one dequeued slot at a time. Every capture bumps the generation so frame
/// views of earlier captures can tell they have been superseded.
#[derive(Default)]
pub(crate) struct Stream {
    arena: Arena,
    active: bool,
    slot: Option<usize>,
    generation: u64,
}

impl Stream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Allocates `count` buffers and starts streaming, doing nothing if already started
    pub fn start(&mut self, handle: &v4l2::Handle, count: u32) -> Result<()> {
        if self.active {
            return Ok(());
        }

        let granted = self.arena.allocate(handle, count)?;

        let mut typ = V4L2_BUF_TYPE_VIDEO_CAPTURE as i32;
        if let Err(e) = handle.call(handle.codes().VIDIOC_STREAMON, &mut typ) {
            self.arena.release(handle);
            return Err(e.into());
        }

        debug!("streaming with {} buffers", granted);
        self.active = true;
        Ok(())
    }

    /// Stops streaming and releases all buffers
    ///
    /// Never fails. The generation counter is left as is.
    pub fn stop(&mut self, handle: &v4l2::Handle) {
        let mut typ = V4L2_BUF_TYPE_VIDEO_CAPTURE as i32;
        if let Err(e) = handle.call(handle.codes().VIDIOC_STREAMOFF, &mut typ) {
            let level = if self.active {
                Level::Warn
            } else {
                Level::Debug
            };
            log!(level, "failed to stop streaming: {}", e);
        }

        self.arena.release(handle);
        self.slot = None;
        if self.active {
            debug!("streaming stopped");
        }
        self.active = false;
    }

    /// Returns the held slot to the driver and waits for the next filled one
    ///
    /// Returns the new generation and the driver's sequence number of the frame.
    pub fn capture(&mut self, handle: &v4l2::Handle) -> Result<(u64, u32)> {
        self.generation += 1;

        if let Some(index) = self.slot.take() {
            self.arena.queue(handle, index)?;
        }

        let (index, sequence) = self.arena.dequeue(handle)?;
        self.slot = Some(index);

        Ok((self.generation, sequence))
    }

    /// Returns the bytes of the held slot if `generation` is still the current one
    pub fn bytes(&self, generation: u64) -> Option<&[u8]> {
        if generation != self.generation {
            return None;
        }
        self.arena.bytes(self.slot?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::v4l2::mock::Mock;

    #[test]
    fn start_is_idempotent() {
        let mock = Mock::new();
        let handle = mock.handle();
        let mut stream = Stream::new();

        stream.start(&handle, 4).unwrap();
        stream.start(&handle, 4).unwrap();
        assert!(stream.is_active());
        assert_eq!(mock.count(Mock::codes().VIDIOC_REQBUFS), 1);
        assert_eq!(mock.count(Mock::codes().VIDIOC_STREAMON), 1);
        assert_eq!(mock.state().mapped.get(), 4);
    }

    #[test]
    fn failed_streamon_releases_buffers() {
        let mock = Mock::new();
        mock.state()
            .fail
            .insert(Mock::codes().VIDIOC_STREAMON, libc::EIO);
        let handle = mock.handle();
        let mut stream = Stream::new();

        let err = stream.start(&handle, 4).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EIO));
        assert!(!stream.is_active());
        assert_eq!(mock.state().mapped.get(), 0);
        assert_eq!(mock.state().buffers, 0);
    }

    #[test]
    fn capture_requeues_held_slot() {
        let mock = Mock::new();
        let handle = mock.handle();
        let mut stream = Stream::new();
        stream.start(&handle, 2).unwrap();

        assert_eq!(stream.capture(&handle).unwrap(), (1, 0));
        assert_eq!(stream.bytes(1).unwrap()[0], 0);
        assert_eq!(mock.state().queued, vec![1]);

        assert_eq!(stream.capture(&handle).unwrap(), (2, 1));
        assert!(stream.bytes(1).is_none());
        assert_eq!(stream.bytes(2).unwrap()[0], 1);
        assert_eq!(mock.state().queued, vec![0]);
    }

    #[test]
    fn failed_capture_drops_the_slot() {
        let mock = Mock::new();
        let handle = mock.handle();
        let mut stream = Stream::new();
        stream.start(&handle, 2).unwrap();
        stream.capture(&handle).unwrap();

        mock.state()
            .fail
            .insert(Mock::codes().VIDIOC_DQBUF, libc::EIO);
        let err = stream.capture(&handle).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(stream.bytes(1).is_none());
        assert!(stream.bytes(2).is_none());
    }

    #[test]
    fn stop_keeps_generation() {
        let mock = Mock::new();
        let handle = mock.handle();
        let mut stream = Stream::new();
        stream.start(&handle, 2).unwrap();
        stream.capture(&handle).unwrap();

        stream.stop(&handle);
        assert!(!stream.is_active());
        assert!(stream.bytes(1).is_none());
        assert_eq!(mock.state().mapped.get(), 0);

        // stopping an idle stream is harmless
        stream.stop(&handle);

        stream.start(&handle, 2).unwrap();
        assert_eq!(stream.capture(&handle).unwrap().0, 2);
    }
}
