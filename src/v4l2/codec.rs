//! Table driven encoding of v4l2 records into the raw scratch memory handed to the kernel.
//!
//! Numbers are written in native byte order with the width implied by their [`Kind`].
//! Text fields are NUL padded, truncated to their declared width and always keep at least one
//! terminating NUL byte.

use crate::v4l2::layout::{Field, Kind, Layout};

/// A record with a fixed, architecture dependent binary representation
pub trait Record {
    /// Total size of the encoded record
    fn size(layout: &Layout) -> usize;

    /// Writes every field of the record into `w`
    fn encode(&self, layout: &Layout, w: &mut Writer<'_>);

    /// Reads every field of the record from `r`
    fn decode(&mut self, layout: &Layout, r: &Reader<'_>);
}

/// Write access to the bytes of one (possibly nested) record
pub struct Writer<'a> {
    buf: &'a mut [u8],
}

impl<'a> Writer<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Writer { buf }
    }

    fn slot(&mut self, field: Field, kind: Kind) -> &mut [u8] {
        debug_assert_eq!(field.kind, kind, "field kind mismatch at {}", field.offset);
        &mut self.buf[field.offset..field.end()]
    }

    pub fn u8(&mut self, field: Field, value: u8) {
        self.slot(field, Kind::U8)[0] = value;
    }

    pub fn u32(&mut self, field: Field, value: u32) {
        self.slot(field, Kind::U32).copy_from_slice(&value.to_ne_bytes());
    }

    pub fn i32(&mut self, field: Field, value: i32) {
        self.slot(field, Kind::I32).copy_from_slice(&value.to_ne_bytes());
    }

    pub fn u64(&mut self, field: Field, value: u64) {
        self.slot(field, Kind::U64).copy_from_slice(&value.to_ne_bytes());
    }

    pub fn i64(&mut self, field: Field, value: i64) {
        self.slot(field, Kind::I64).copy_from_slice(&value.to_ne_bytes());
    }

    pub fn text(&mut self, field: Field, value: &str) {
        let slot = match field.kind {
            Kind::Text(width) => self.slot(field, Kind::Text(width)),
            kind => panic!("text write to {:?} field at {}", kind, field.offset),
        };
        let len = value.len().min(slot.len().saturating_sub(1));
        slot[..len].copy_from_slice(&value.as_bytes()[..len]);
        slot[len..].fill(0);
    }

    pub fn bytes(&mut self, field: Field, value: &[u8]) {
        let slot = match field.kind {
            Kind::Bytes(width) => self.slot(field, Kind::Bytes(width)),
            kind => panic!("byte write to {:?} field at {}", kind, field.offset),
        };
        let len = value.len().min(slot.len());
        slot[..len].copy_from_slice(&value[..len]);
        slot[len..].fill(0);
    }

    /// Returns a writer for the nested record stored in `field`
    pub fn record(&mut self, field: Field) -> Writer<'_> {
        match field.kind {
            Kind::Record(size) => Writer::new(self.slot(field, Kind::Record(size))),
            kind => panic!("record access to {:?} field at {}", kind, field.offset),
        }
    }
}

/// Read access to the bytes of one (possibly nested) record
pub struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf }
    }

    fn slot(&self, field: Field, kind: Kind) -> &'a [u8] {
        debug_assert_eq!(field.kind, kind, "field kind mismatch at {}", field.offset);
        let buf: &'a [u8] = self.buf;
        &buf[field.offset..field.end()]
    }

    fn array<const N: usize>(&self, field: Field, kind: Kind) -> [u8; N] {
        let mut raw = [0; N];
        raw.copy_from_slice(self.slot(field, kind));
        raw
    }

    pub fn u8(&self, field: Field) -> u8 {
        self.slot(field, Kind::U8)[0]
    }

    pub fn u32(&self, field: Field) -> u32 {
        u32::from_ne_bytes(self.array(field, Kind::U32))
    }

    pub fn i32(&self, field: Field) -> i32 {
        i32::from_ne_bytes(self.array(field, Kind::I32))
    }

    pub fn u64(&self, field: Field) -> u64 {
        u64::from_ne_bytes(self.array(field, Kind::U64))
    }

    pub fn i64(&self, field: Field) -> i64 {
        i64::from_ne_bytes(self.array(field, Kind::I64))
    }

    /// Reads text up to the first NUL byte or the declared width
    pub fn text(&self, field: Field) -> String {
        let raw = match field.kind {
            Kind::Text(width) => self.slot(field, Kind::Text(width)),
            kind => panic!("text read from {:?} field at {}", kind, field.offset),
        };
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).into_owned()
    }

    pub fn bytes(&self, field: Field) -> &'a [u8] {
        match field.kind {
            Kind::Bytes(width) => self.slot(field, Kind::Bytes(width)),
            kind => panic!("byte read from {:?} field at {}", kind, field.offset),
        }
    }

    /// Returns a reader for the nested record stored in `field`
    pub fn record(&self, field: Field) -> Reader<'a> {
        match field.kind {
            Kind::Record(size) => Reader::new(self.slot(field, Kind::Record(size))),
            kind => panic!("record access to {:?} field at {}", kind, field.offset),
        }
    }
}

/// Encodes `record` into a freshly zeroed byte vector of the record's size
pub fn encode<R: Record>(layout: &Layout, record: &R) -> Vec<u8> {
    let mut buf = vec![0; R::size(layout)];
    record.encode(layout, &mut Writer::new(&mut buf));
    buf
}

/// Decodes a record of type `R` from `buf`
pub fn decode<R: Record + Default>(layout: &Layout, buf: &[u8]) -> R {
    let mut record = R::default();
    record.decode(layout, &Reader::new(buf));
    record
}
