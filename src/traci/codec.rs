//! Byte-level encoding of TraCI messages.
//!
//! A message is a 4-byte big-endian length (counting itself) followed by one
//! or more commands. Each command starts with a one-byte length, or a zero
//! byte and a 4-byte length when it does not fit in 255 bytes, then the
//! command id and its content. Integers and doubles are big-endian, strings
//! are a 4-byte length followed by UTF-8 bytes.

use crate::error::{TraciError, TraciResult};

/// Append-only buffer for building command contents and whole messages.
#[derive(Debug, Default, Clone)]
pub struct StorageWriter {
    buf: Vec<u8>,
}

impl StorageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_i32(value.len() as i32);
        self.buf.extend_from_slice(value.as_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes a framed command: length header, id, content.
    pub fn write_command(&mut self, command: u8, content: &[u8]) {
        let len = 2 + content.len();
        if len <= u8::MAX as usize {
            self.write_u8(len as u8);
        } else {
            self.write_u8(0);
            self.write_i32((len + 4) as i32);
        }
        self.write_u8(command);
        self.write_bytes(content);
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Wraps already framed commands into a message with its length prefix.
pub fn frame_message(commands: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(commands.len() + 4);
    message.extend_from_slice(&((commands.len() + 4) as u32).to_be_bytes());
    message.extend_from_slice(commands);
    message
}

/// Cursor over a received message body (everything after the length prefix).
#[derive(Debug, Clone)]
pub struct StorageReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> StorageReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> TraciResult<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(TraciError::Malformed("unexpected end of message"))?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> TraciResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i32(&mut self) -> TraciResult<i32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(i32::from_be_bytes(raw))
    }

    pub fn read_f64(&mut self) -> TraciResult<f64> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(f64::from_be_bytes(raw))
    }

    pub fn read_string(&mut self) -> TraciResult<String> {
        let len = self.read_i32()?;
        let len =
            usize::try_from(len).map_err(|_| TraciError::Malformed("negative string length"))?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| TraciError::Malformed("string is not UTF-8"))
    }

    /// Reads one framed command and returns its id with a reader over its content.
    pub fn read_command(&mut self) -> TraciResult<(u8, StorageReader<'a>)> {
        let start = self.pos;
        let short_len = self.read_u8()?;
        let len = if short_len == 0 {
            let long_len = self.read_i32()?;
            usize::try_from(long_len).map_err(|_| TraciError::Malformed("negative command length"))?
        } else {
            short_len as usize
        };
        let command = self.read_u8()?;
        let header = self.pos - start;
        if len < header {
            return Err(TraciError::Malformed("command length shorter than its header"));
        }
        let content = self.take(len - header)?;
        Ok((command, StorageReader::new(content)))
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_command_uses_single_length_byte() {
        let mut writer = StorageWriter::new();
        writer.write_command(0x02, &[1, 2, 3]);
        assert_eq!(writer.into_inner(), vec![5, 0x02, 1, 2, 3]);
    }

    #[test]
    fn long_command_uses_extended_length() {
        let content = vec![7u8; 300];
        let mut writer = StorageWriter::new();
        writer.write_command(0xC2, &content);
        let bytes = writer.into_inner();
        assert_eq!(bytes[0], 0);
        assert_eq!(i32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]), 306);
        assert_eq!(bytes.len(), 306);

        let mut reader = StorageReader::new(&bytes);
        let (command, body) = reader.read_command().unwrap();
        assert_eq!(command, 0xC2);
        assert_eq!(body.remaining(), 300);
        assert!(reader.is_empty());
    }

    #[test]
    fn frame_prefix_counts_itself() {
        let message = frame_message(&[2, 0x7F]);
        assert_eq!(message, vec![0, 0, 0, 6, 2, 0x7F]);
    }

    #[test]
    fn reads_typed_values_in_order() {
        let mut writer = StorageWriter::new();
        writer.write_string("42442621");
        writer.write_i32(-3);
        writer.write_f64(0.5);
        let bytes = writer.into_inner();

        let mut reader = StorageReader::new(&bytes);
        assert_eq!(reader.read_string().unwrap(), "42442621");
        assert_eq!(reader.read_i32().unwrap(), -3);
        assert_eq!(reader.read_f64().unwrap(), 0.5);
        assert!(reader.is_empty());
    }

    #[test]
    fn truncated_input_is_malformed() {
        let mut reader = StorageReader::new(&[0, 0, 0, 9, b'a']);
        assert!(matches!(reader.read_string(), Err(TraciError::Malformed(_))));

        let mut reader = StorageReader::new(&[10, 0x02, 0]);
        assert!(matches!(reader.read_command(), Err(TraciError::Malformed(_))));
    }

    #[test]
    fn command_length_below_header_is_rejected() {
        let mut reader = StorageReader::new(&[1, 0x02]);
        assert!(matches!(reader.read_command(), Err(TraciError::Malformed(_))));
    }
}
