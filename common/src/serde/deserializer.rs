use thiserror::Error;

/// Returned when a read runs past the end of the underlying buffer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unexpected end of data: wanted {wanted} bytes at offset {offset}, {available} available")]
pub struct UnexpectedEof {
    pub offset: usize,
    pub wanted: usize,
    pub available: usize,
}

/// Reads little endian values out of a byte slice, failing instead of
/// panicking when the data runs out.
pub struct SliceDeserializer<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> SliceDeserializer<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub fn pos(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    pub fn read_slice(&mut self, length: usize) -> Result<&'a [u8], UnexpectedEof> {
        if self.remaining() < length {
            return Err(UnexpectedEof {
                offset: self.offset,
                wanted: length,
                available: self.remaining(),
            });
        }

        let value = &self.buffer[self.offset..self.offset + length];
        self.offset += length;
        Ok(value)
    }

    pub fn advance_by(&mut self, amount: usize) -> Result<(), UnexpectedEof> {
        self.read_slice(amount).map(|_| ())
    }

    pub fn read_array<const LENGTH: usize>(&mut self) -> Result<[u8; LENGTH], UnexpectedEof> {
        let mut out = [0; LENGTH];
        out.copy_from_slice(self.read_slice(LENGTH)?);
        Ok(out)
    }
}

#[rustfmt::skip]
impl SliceDeserializer<'_> {
    pub fn read_u16_le(&mut self) -> Result<u16, UnexpectedEof> { Ok(u16::from_le_bytes(self.read_array()?)) }
    pub fn read_u32_le(&mut self) -> Result<u32, UnexpectedEof> { Ok(u32::from_le_bytes(self.read_array()?)) }
    pub fn read_f32_le(&mut self) -> Result<f32, UnexpectedEof> { Ok(f32::from_le_bytes(self.read_array()?)) }
}
