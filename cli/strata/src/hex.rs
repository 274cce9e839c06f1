//! Hex text for byte buffers on the command line.

use anyhow::{bail, Result};

/// Parse hex digits into bytes.
///
/// Whitespace, `:` separators and a leading `0x` are ignored.
pub fn parse(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let digits: Vec<char> = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    if digits.len() % 2 != 0 {
        bail!("odd number of hex digits ({})", digits.len());
    }
    digits
        .chunks(2)
        .map(|pair| {
            let s: String = pair.iter().collect();
            u8::from_str_radix(&s, 16).map_err(|_| anyhow::anyhow!("invalid hex byte `{s}`"))
        })
        .collect()
}

/// Format bytes as contiguous lowercase hex.
pub fn encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_separators() {
        assert_eq!(parse("00 01 ff").unwrap(), vec![0x00, 0x01, 0xff]);
        assert_eq!(parse("0x0001").unwrap(), vec![0x00, 0x01]);
        assert_eq!(parse("de:ad:BE:ef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn parse_rejects_bad_digits() {
        assert!(parse("0").is_err());
        assert!(parse("zz").is_err());
    }

    #[test]
    fn encode_is_lowercase() {
        assert_eq!(encode(&[0x00, 0xAB, 0x10]), "00ab10");
    }
}
