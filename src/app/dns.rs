//! Minimal DNS client encoding
//!
//! Builds single-question A/IN queries and locates the address of the first
//! answer in a response. Resource records are not parsed beyond that: the
//! first answer is assumed to be an A record.

use crate::error::{NetError, Result};
use byteorder::{BigEndian, ByteOrder};
use std::net::Ipv4Addr;

pub const DNS_PORT: u16 = 53;
pub const DNS_HEADER_LEN: usize = 12;
pub const MAX_LABEL_LEN: usize = 63;
pub const QTYPE_A: u16 = 1;
pub const QCLASS_IN: u16 = 1;
/// Standard query, recursion desired.
pub const FLAGS_RECURSION_DESIRED: u16 = 0x0100;

/// type(2) class(2) ttl(4) rdlength(2) between an answer's owner name and
/// its data.
const ANSWER_FIXED_LEN: usize = 10;
const COMPRESSION_MASK: u8 = 0xC0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,
    pub flags: u16,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

impl DnsHeader {
    pub fn query(id: u16) -> Self {
        DnsHeader {
            id,
            flags: FLAGS_RECURSION_DESIRED,
            qd_count: 1,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < DNS_HEADER_LEN {
            return None;
        }
        Some(DnsHeader {
            id: BigEndian::read_u16(&data[0..2]),
            flags: BigEndian::read_u16(&data[2..4]),
            qd_count: BigEndian::read_u16(&data[4..6]),
            an_count: BigEndian::read_u16(&data[6..8]),
            ns_count: BigEndian::read_u16(&data[8..10]),
            ar_count: BigEndian::read_u16(&data[10..12]),
        })
    }

    pub fn write_to(&self, out: &mut [u8]) {
        BigEndian::write_u16(&mut out[0..2], self.id);
        BigEndian::write_u16(&mut out[2..4], self.flags);
        BigEndian::write_u16(&mut out[4..6], self.qd_count);
        BigEndian::write_u16(&mut out[6..8], self.an_count);
        BigEndian::write_u16(&mut out[8..10], self.ns_count);
        BigEndian::write_u16(&mut out[10..12], self.ar_count);
    }
}

/// Write `name` as length-prefixed labels ending in a zero label.
///
/// A single trailing dot is accepted. Returns the number of bytes written.
pub fn encode_name(name: &str, out: &mut [u8]) -> Result<usize> {
    let name = name.strip_suffix('.').unwrap_or(name);
    let needed = name.len() + 2;
    if needed > out.len() {
        return Err(NetError::PayloadTooLarge {
            len: needed,
            capacity: out.len(),
        });
    }

    let mut offset = 0;
    for label in name.split('.') {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(NetError::InvalidName);
        }
        out[offset] = label.len() as u8;
        out[offset + 1..offset + 1 + label.len()].copy_from_slice(label.as_bytes());
        offset += 1 + label.len();
    }
    out[offset] = 0;
    Ok(offset + 1)
}

/// Iterator over the labels of an uncompressed encoded name.
///
/// Stops at the zero label, at a compression pointer, or where the data
/// runs out.
pub struct Labels<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Labels<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Labels { data, offset: 0 }
    }
}

impl<'a> Iterator for Labels<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let len = *self.data.get(self.offset)? as usize;
        if len == 0 || len as u8 & COMPRESSION_MASK != 0 {
            return None;
        }
        let label = self.data.get(self.offset + 1..self.offset + 1 + len)?;
        self.offset += 1 + len;
        Some(label)
    }
}

/// Build a one-question A/IN query into `out`, returning its length.
pub fn build_query(id: u16, name: &str, out: &mut [u8]) -> Result<usize> {
    if out.len() < DNS_HEADER_LEN + 4 {
        return Err(NetError::PayloadTooLarge {
            len: DNS_HEADER_LEN + 4,
            capacity: out.len(),
        });
    }
    DnsHeader::query(id).write_to(out);

    let name_end = DNS_HEADER_LEN + encode_name(name, &mut out[DNS_HEADER_LEN..])?;
    let end = name_end + 4;
    if end > out.len() {
        return Err(NetError::PayloadTooLarge {
            len: end,
            capacity: out.len(),
        });
    }
    BigEndian::write_u16(&mut out[name_end..name_end + 2], QTYPE_A);
    BigEndian::write_u16(&mut out[name_end + 2..end], QCLASS_IN);
    Ok(end)
}

/// Offset just past the name starting at `offset`: either its zero label or
/// a two-byte compression pointer.
fn skip_name(message: &[u8], mut offset: usize) -> Result<usize> {
    loop {
        let len = *message.get(offset).ok_or(NetError::SizeMismatch {
            len: offset + 1,
            limit: message.len(),
        })?;
        if len == 0 {
            return Ok(offset + 1);
        }
        if len & COMPRESSION_MASK == COMPRESSION_MASK {
            return Ok(offset + 2);
        }
        offset += 1 + len as usize;
    }
}

/// Offset of the 4-byte address of the first answer in `message`.
///
/// Walks past the echoed question and the first answer's owner name, then
/// skips the fixed type/class/ttl/rdlength block without inspecting it.
pub fn answer_offset(message: &[u8]) -> Result<usize> {
    let question_end = skip_name(message, DNS_HEADER_LEN)? + 4;
    let offset = skip_name(message, question_end)? + ANSWER_FIXED_LEN;
    if offset + 4 > message.len() {
        return Err(NetError::SizeMismatch {
            len: offset + 4,
            limit: message.len(),
        });
    }
    Ok(offset)
}

/// Location of a resolved address inside the interface's frame buffer.
#[derive(Debug, Clone, Copy)]
pub struct DnsAnswer<'a> {
    frame: &'a [u8],
    offset: usize,
}

impl<'a> DnsAnswer<'a> {
    pub(crate) fn new(frame: &'a [u8], offset: usize) -> Self {
        DnsAnswer { frame, offset }
    }

    /// Byte offset of the address within the frame buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The four address bytes, borrowed from the frame buffer.
    pub fn bytes(&self) -> &'a [u8] {
        &self.frame[self.offset..self.offset + 4]
    }

    pub fn address(&self) -> Ipv4Addr {
        let b = self.bytes();
        Ipv4Addr::new(b[0], b[1], b[2], b[3])
    }
}
