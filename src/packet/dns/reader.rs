use std::fmt::Write;

use super::DecodeError;

/// Pointer indirections allowed while resolving a single name.
const MAX_POINTER_HOPS: usize = 10;

/// Longest encoded name RFC 1035 allows, root label included.
const MAX_NAME_LEN: usize = 255;

/// Big-endian cursor over a whole DNS message.
///
/// Names are always resolved against the full buffer so compression pointers
/// can reach back into earlier sections.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Moves the cursor to `pos`, which must lie within the buffer.
    pub fn seek(&mut self, pos: usize) -> Result<(), DecodeError> {
        if pos > self.buf.len() {
            return Err(DecodeError::UnexpectedEnd { offset: self.pos });
        }
        self.pos = pos;
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(DecodeError::UnexpectedEnd { offset: self.pos })?;
        let bytes = &self.buf[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a possibly compressed domain name at the cursor.
    ///
    /// The result is fully qualified (`www.example.com.`, root is `.`). The
    /// cursor ends up after the name's in-place bytes, i.e. right after the
    /// first compression pointer if one was followed.
    pub fn read_name(&mut self) -> Result<String, DecodeError> {
        let mut name = String::new();
        let mut cursor = self.pos;
        let mut resume_at = None;
        let mut hops = 0;
        let mut encoded_len = 1; // root label

        loop {
            let len = *self
                .buf
                .get(cursor)
                .ok_or(DecodeError::UnexpectedEnd { offset: cursor })?;

            match len & 0xC0 {
                0x00 => {
                    cursor += 1;
                    if len == 0 {
                        break;
                    }

                    let len = len as usize;
                    let label = self
                        .buf
                        .get(cursor..cursor + len)
                        .ok_or(DecodeError::UnexpectedEnd { offset: cursor })?;

                    encoded_len += len + 1;
                    if encoded_len > MAX_NAME_LEN {
                        return Err(DecodeError::NameTooLong);
                    }

                    push_label(&mut name, label);
                    name.push('.');
                    cursor += len;
                }
                0xC0 => {
                    let low = *self
                        .buf
                        .get(cursor + 1)
                        .ok_or(DecodeError::UnexpectedEnd { offset: cursor + 1 })?;

                    hops += 1;
                    if hops > MAX_POINTER_HOPS {
                        return Err(DecodeError::PointerLoop);
                    }

                    let target = (((len & 0x3F) as usize) << 8) | low as usize;
                    if target >= self.buf.len() {
                        return Err(DecodeError::BadPointer(target));
                    }

                    resume_at.get_or_insert(cursor + 2);
                    cursor = target;
                }
                _ => {
                    return Err(DecodeError::InvalidLabel {
                        kind: len,
                        offset: cursor,
                    });
                }
            }
        }

        self.pos = resume_at.unwrap_or(cursor);

        if name.is_empty() {
            name.push('.');
        }
        Ok(name)
    } // read_name
}

/// Appends a label in presentation format, escaping dots, backslashes and
/// anything outside printable ASCII.
fn push_label(name: &mut String, label: &[u8]) {
    for &b in label {
        match b {
            b'.' | b'\\' => {
                name.push('\\');
                name.push(b as char);
            }
            0x21..=0x7E => name.push(b as char),
            _ => {
                let _ = write!(name, "\\{b:03}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_plain_name_and_advances_past_root() {
        let buf = b"\x03www\x07example\x03com\x00\xff";
        let mut reader = Reader::new(buf);
        assert_eq!(reader.read_name().unwrap(), "www.example.com.");
        assert_eq!(reader.position(), buf.len() - 1);
    }

    #[test]
    fn root_name_renders_as_dot() {
        let mut reader = Reader::new(&[0u8]);
        assert_eq!(reader.read_name().unwrap(), ".");
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn follows_compression_pointer_and_resumes_after_it() {
        // "example.com." at offset 0, then "www" + pointer to 0 at offset 13.
        let mut buf = b"\x07example\x03com\x00".to_vec();
        buf.extend_from_slice(b"\x03www\xc0\x00\x12\x34");

        let mut reader = Reader::new(&buf);
        reader.seek(13).unwrap();
        assert_eq!(reader.read_name().unwrap(), "www.example.com.");
        assert_eq!(reader.position(), 19);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
    }

    #[test]
    fn pointer_cycle_is_rejected() {
        let buf = [0xc0, 0x02, 0xc0, 0x00];
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_name(), Err(DecodeError::PointerLoop));
    }

    #[test]
    fn pointer_past_end_is_rejected() {
        let buf = [0xc0, 0x40];
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_name(), Err(DecodeError::BadPointer(0x40)));
    }

    #[test]
    fn reserved_label_type_is_rejected() {
        let buf = [0x41, b'a'];
        let mut reader = Reader::new(&buf);
        assert_eq!(
            reader.read_name(),
            Err(DecodeError::InvalidLabel { kind: 0x41, offset: 0 })
        );
    }

    #[test]
    fn label_running_off_the_end_is_truncation() {
        let buf = b"\x07exam";
        let mut reader = Reader::new(buf);
        assert_eq!(
            reader.read_name(),
            Err(DecodeError::UnexpectedEnd { offset: 1 })
        );
    }

    #[test]
    fn overlong_name_is_rejected() {
        let mut buf = Vec::new();
        for _ in 0..5 {
            buf.push(63);
            buf.extend_from_slice(&[b'a'; 63]);
        }
        buf.push(0);
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.read_name(), Err(DecodeError::NameTooLong));
    }

    #[test]
    fn escapes_special_bytes_in_labels() {
        let buf = b"\x04a.b\x01\x01\x03\x00";
        let mut reader = Reader::new(buf);
        assert_eq!(reader.read_name().unwrap(), "a\\.b\\001.\\003.");
    }

    #[test]
    fn fixed_width_reads_fail_on_short_input() {
        let mut reader = Reader::new(&[0x00, 0x01, 0x02]);
        assert_eq!(reader.read_u16().unwrap(), 1);
        assert_eq!(
            reader.read_u32(),
            Err(DecodeError::UnexpectedEnd { offset: 2 })
        );
    }
}
