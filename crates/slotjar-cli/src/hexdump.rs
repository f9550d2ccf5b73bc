//! Hex + ASCII dump of raw blob bytes, 16 bytes per row:
//!
//! ```text
//! 00000000: 534a 4152 0001 0000 0003 1c2d 3b6e 0302  SJAR.......-;n..
//! ```

const ROW: usize = 16;
/// Width of the hex column: two digits per byte plus a space per pair.
const HEX_WIDTH: usize = ROW * 2 + ROW / 2;

pub fn hex_dump(bytes: &[u8]) -> Vec<String> {
    bytes
        .chunks(ROW)
        .enumerate()
        .map(|(row, chunk)| {
            let mut hex = String::with_capacity(HEX_WIDTH);
            for (i, b) in chunk.iter().enumerate() {
                hex.push_str(&format!("{b:02x}"));
                if i % 2 == 1 {
                    hex.push(' ');
                }
            }
            let ascii: String = chunk.iter().map(|&b| printable(b)).collect();
            format!("{:08x}: {hex:<HEX_WIDTH$} {ascii}", row * ROW)
        })
        .collect()
}

fn printable(byte: u8) -> char {
    if (b' '..=b'~').contains(&byte) {
        byte as char
    } else {
        '.'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert!(hex_dump(&[]).is_empty());
    }

    #[test]
    fn full_row() {
        let lines = hex_dump(b"SJAR\x00\x01abcdefghij");
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0],
            "00000000: 534a 4152 0001 6162 6364 6566 6768 696a  SJAR..abcdefghij"
        );
    }

    #[test]
    fn partial_row_is_padded() {
        let bytes: Vec<u8> = (0u8..19).collect();
        let lines = hex_dump(&bytes);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("00000010: 1011 12"));
        // ASCII column lines up with the full row above.
        assert_eq!(lines[0].find("................"), lines[1].find("..."));
    }
}
