use std::io;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::v4l2;
use crate::v4l2::types::*;
use crate::v4l2::Region;

/// One mapped driver buffer
struct Slot {
    region: Box<dyn Region>,
    /// Bytes filled by the driver during the last dequeue
    used: usize,
}

/// Manage mapped buffers
///
/// Buffers are unmapped when released or when the arena is dropped.
#[derive(Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
}

fn buffer_desc(index: u32) -> v4l2_buffer {
    v4l2_buffer {
        index,
        type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
        memory: V4L2_MEMORY_MMAP,
        ..Default::default()
    }
}

impl Arena {
    fn request(handle: &v4l2::Handle, count: u32) -> io::Result<u32> {
        let mut v4l2_reqbufs = v4l2_requestbuffers {
            count,
            type_: V4L2_BUF_TYPE_VIDEO_CAPTURE,
            memory: V4L2_MEMORY_MMAP,
        };
        handle.call(handle.codes().VIDIOC_REQBUFS, &mut v4l2_reqbufs)?;
        Ok(v4l2_reqbufs.count)
    }

    /// Requests `count` buffers, then maps and queues every buffer the driver grants
    ///
    /// On failure everything allocated so far is released again.
    pub fn allocate(&mut self, handle: &v4l2::Handle, count: u32) -> Result<u32> {
        let granted = match Self::request(handle, count) {
            Ok(granted) => granted,
            // memory mapped I/O unsupported
            Err(e) if v4l2::is_invalid(&e) => return Err(Error::Unsupported),
            Err(e) => return Err(e.into()),
        };
        if granted == 0 {
            return Err(Error::OutOfMemory);
        }
        debug!("requested {} buffers, granted {}", count, granted);

        for index in 0..granted {
            if let Err(e) = self.map_and_queue(handle, index) {
                self.release(handle);
                return Err(e.into());
            }
        }

        Ok(granted)
    }

    fn map_and_queue(&mut self, handle: &v4l2::Handle, index: u32) -> io::Result<()> {
        let mut v4l2_buf = buffer_desc(index);
        handle.call(handle.codes().VIDIOC_QUERYBUF, &mut v4l2_buf)?;

        let region = handle.map(v4l2_buf.offset, v4l2_buf.length as usize)?;
        self.slots.push(Slot { region, used: 0 });

        handle.call(handle.codes().VIDIOC_QBUF, &mut v4l2_buf)
    }

    /// Unmaps every buffer and returns them to the driver
    ///
    /// Failures are logged and otherwise ignored.
    pub fn release(&mut self, handle: &v4l2::Handle) {
        // dropping the regions unmaps them
        self.slots.clear();

        // free all buffers by requesting 0
        if let Err(e) = Self::request(handle, 0) {
            warn!("failed to free buffers: {}", e);
        }
    }

    /// Hands buffer `index` back to the driver to be filled
    pub fn queue(&self, handle: &v4l2::Handle, index: usize) -> io::Result<()> {
        let mut v4l2_buf = buffer_desc(index as u32);
        handle.call(handle.codes().VIDIOC_QBUF, &mut v4l2_buf)
    }

    /// Waits for the driver to fill a buffer and returns its index and sequence number
    pub fn dequeue(&mut self, handle: &v4l2::Handle) -> io::Result<(usize, u32)> {
        let mut v4l2_buf = buffer_desc(0);
        handle.call(handle.codes().VIDIOC_DQBUF, &mut v4l2_buf)?;

        let index = v4l2_buf.index as usize;
        let slot = self.slots.get_mut(index).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("driver returned unknown buffer {}", index),
            )
        })?;
        slot.used = (v4l2_buf.bytesused as usize).min(slot.region.bytes().len());

        Ok((index, v4l2_buf.sequence))
    }

    /// Returns the filled part of buffer `index`
    pub fn bytes(&self, index: usize) -> Option<&[u8]> {
        let slot = self.slots.get(index)?;
        Some(&slot.region.bytes()[..slot.used])
    }
}
