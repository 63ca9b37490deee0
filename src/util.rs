use std::fmt;

/// Lazily formats bytes as hex, grouped by eight, for logs and error output.
pub struct HexBytes<'a>(&'a [u8]);

pub fn fmt_hex(bytes: &[u8]) -> HexBytes<'_> {
    HexBytes(bytes)
}

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(if i % 8 == 0 { "  " } else { " " })?;
            }
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_grouping() {
        assert_eq!(fmt_hex(&[]).to_string(), "");
        assert_eq!(fmt_hex(&[0xce, 0xba]).to_string(), "ce ba");
        assert_eq!(fmt_hex(&[0, 1, 2, 3, 4, 5, 6, 7, 0xff]).to_string(), "00 01 02 03 04 05 06 07  ff");
        assert_eq!(format!("{:?}", fmt_hex(&[0x0a])), "[0a]");
    }
}
