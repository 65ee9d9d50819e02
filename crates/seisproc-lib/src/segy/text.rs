//! Textual (card image) header: 3200 bytes, usually EBCDIC, 40 cards of 80 columns.

pub const TEXT_HEADER_LEN: usize = 3200;
const CARD_WIDTH: usize = 80;

/// Decode a raw textual header into 40 newline-separated cards.
///
/// The encoding is guessed from the byte distribution; trailing blanks on each
/// card are dropped and unprintable bytes become U+FFFD.
pub fn decode_text_header(raw: &[u8]) -> String {
    let ebcdic = looks_like_ebcdic(raw);
    raw.chunks(CARD_WIDTH)
        .map(|card| {
            let line: String = card
                .iter()
                .map(|&b| if ebcdic { ebcdic_to_char(b) } else { ascii_to_char(b) })
                .collect();
            line.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build an ASCII header from card lines, padded/truncated to 80 columns and 40 cards.
pub fn ascii_text_header(lines: &[&str]) -> Vec<u8> {
    let mut out = vec![b' '; TEXT_HEADER_LEN];
    for (i, line) in lines.iter().take(TEXT_HEADER_LEN / CARD_WIDTH).enumerate() {
        let start = i * CARD_WIDTH;
        for (j, b) in line.bytes().take(CARD_WIDTH).enumerate() {
            out[start + j] = if b.is_ascii_graphic() || b == b' ' { b } else { b'?' };
        }
    }
    out
}

fn looks_like_ebcdic(raw: &[u8]) -> bool {
    let ascii = raw
        .iter()
        .filter(|&&b| b.is_ascii_alphanumeric() || b == b' ')
        .count();
    let ebcdic = raw
        .iter()
        .filter(|&&b| {
            matches!(b, 0x40 | 0x81..=0x89 | 0x91..=0x99 | 0xA2..=0xA9 | 0xC1..=0xC9 | 0xD1..=0xD9 | 0xE2..=0xE9 | 0xF0..=0xF9)
        })
        .count();
    ebcdic > ascii
}

fn ascii_to_char(b: u8) -> char {
    match b {
        0x00 => ' ',
        0x20..=0x7e => b as char,
        _ => char::REPLACEMENT_CHARACTER,
    }
}

/// Code page 037 subset covering the characters that show up in SEG-Y cards.
fn ebcdic_to_char(b: u8) -> char {
    const LOWER_A_I: &[u8; 9] = b"abcdefghi";
    const LOWER_J_R: &[u8; 9] = b"jklmnopqr";
    const LOWER_S_Z: &[u8; 8] = b"stuvwxyz";
    const UPPER_A_I: &[u8; 9] = b"ABCDEFGHI";
    const UPPER_J_R: &[u8; 9] = b"JKLMNOPQR";
    const UPPER_S_Z: &[u8; 8] = b"STUVWXYZ";

    match b {
        0x00 | 0x40 => ' ',
        0x4a => '[',
        0x4b => '.',
        0x4c => '<',
        0x4d => '(',
        0x4e => '+',
        0x4f => '|',
        0x50 => '&',
        0x5a => '!',
        0x5b => '$',
        0x5c => '*',
        0x5d => ')',
        0x5e => ';',
        0x5f => '^',
        0x60 => '-',
        0x61 => '/',
        0x6a => '|',
        0x6b => ',',
        0x6c => '%',
        0x6d => '_',
        0x6e => '>',
        0x6f => '?',
        0x79 => '`',
        0x7a => ':',
        0x7b => '#',
        0x7c => '@',
        0x7d => '\'',
        0x7e => '=',
        0x7f => '"',
        0x81..=0x89 => LOWER_A_I[(b - 0x81) as usize] as char,
        0x91..=0x99 => LOWER_J_R[(b - 0x91) as usize] as char,
        0xa1 => '~',
        0xa2..=0xa9 => LOWER_S_Z[(b - 0xa2) as usize] as char,
        0xba => '[',
        0xbb => ']',
        0xc0 => '{',
        0xc1..=0xc9 => UPPER_A_I[(b - 0xc1) as usize] as char,
        0xd0 => '}',
        0xd1..=0xd9 => UPPER_J_R[(b - 0xd1) as usize] as char,
        0xe0 => '\\',
        0xe2..=0xe9 => UPPER_S_Z[(b - 0xe2) as usize] as char,
        0xf0..=0xf9 => (b'0' + (b - 0xf0)) as char,
        _ => char::REPLACEMENT_CHARACTER,
    }
}
