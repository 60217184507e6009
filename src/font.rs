//! # Bitmap Font
//!
//! A proportional 1-bit font sized for 8-pixel text rows on the LED matrix.
//!
//! Every glyph is exactly [`FONT_HEIGHT`] rows tall and between one and six
//! columns wide. Each row is stored as a bit pattern whose most significant
//! used bit is the glyph's leftmost column:
//!
//! ```text
//! width 4, row 0b1001  =>  #..#
//! ```
//!
//! Row 0 carries umlaut dots, rows 1-6 hold capitals and ascenders, rows 3-6
//! the x-height, and row 7 the descenders.
//!
//! Upper-case letters and digits also exist in a bold weight (one column
//! wider, every stroke doubled to the right). Bold lookups fall back to the
//! regular weight for anything without a bold glyph.

/// Number of pixel rows in every glyph.
pub const FONT_HEIGHT: usize = 8;

/// A single 1-bit glyph.
#[derive(Debug, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    /// Advance in columns, without any inter-glyph spacing.
    pub width: u8,
    pub rows: [u8; FONT_HEIGHT],
}

impl Glyph {
    /// True if the pixel at (`col`, `row`) is lit.
    pub fn lit(&self, col: u8, row: usize) -> bool {
        col < self.width && self.rows[row] & (1 << (self.width - 1 - col)) != 0
    }

    /// True if the leftmost column is lit in `row`.
    pub fn leading(&self, row: usize) -> bool {
        self.rows[row] >> (self.width - 1) & 1 == 1
    }

    /// True if the rightmost column is lit in `row`.
    pub fn trailing(&self, row: usize) -> bool {
        self.rows[row] & 1 == 1
    }
}

const fn glyph(ch: char, width: u8, rows: [u8; FONT_HEIGHT]) -> Glyph {
    Glyph { ch, width, rows }
}

/// Look up the glyph for `ch`, preferring the bold weight when requested.
///
/// Returns `None` for characters the font does not cover; callers skip them.
pub fn lookup(ch: char, bold: bool) -> Option<&'static Glyph> {
    if bold {
        if let Some(glyph) = find(&BOLD, ch) {
            return Some(glyph);
        }
    }
    find(&REGULAR, ch)
}

fn find(table: &'static [Glyph], ch: char) -> Option<&'static Glyph> {
    table
        .binary_search_by_key(&ch, |glyph| glyph.ch)
        .ok()
        .map(|index| &table[index])
}

// Tables are sorted by code point for binary search.
static REGULAR: [Glyph; 82] = [
    glyph(' ', 2, [0b00, 0b00, 0b00, 0b00, 0b00, 0b00, 0b00, 0b00]),
    glyph('!', 1, [0b0, 0b1, 0b1, 0b1, 0b1, 0b0, 0b1, 0b0]),
    glyph('&', 4, [0b0000, 0b0100, 0b1010, 0b0100, 0b1010, 0b1001, 0b0110, 0b0000]),
    glyph('\'', 1, [0b0, 0b1, 0b1, 0b0, 0b0, 0b0, 0b0, 0b0]),
    glyph('(', 2, [0b00, 0b01, 0b10, 0b10, 0b10, 0b10, 0b01, 0b00]),
    glyph(')', 2, [0b00, 0b10, 0b01, 0b01, 0b01, 0b01, 0b10, 0b00]),
    glyph('+', 3, [0b000, 0b000, 0b000, 0b010, 0b111, 0b010, 0b000, 0b000]),
    glyph(',', 1, [0b0, 0b0, 0b0, 0b0, 0b0, 0b0, 0b1, 0b1]),
    glyph('-', 3, [0b000, 0b000, 0b000, 0b000, 0b111, 0b000, 0b000, 0b000]),
    glyph('.', 1, [0b0, 0b0, 0b0, 0b0, 0b0, 0b0, 0b1, 0b0]),
    glyph('/', 4, [0b0000, 0b0001, 0b0010, 0b0010, 0b0100, 0b0100, 0b1000, 0b0000]),
    glyph('0', 4, [0b0000, 0b0110, 0b1001, 0b1001, 0b1001, 0b1001, 0b0110, 0b0000]),
    glyph('1', 3, [0b000, 0b010, 0b110, 0b010, 0b010, 0b010, 0b111, 0b000]),
    glyph('2', 4, [0b0000, 0b0110, 0b1001, 0b0010, 0b0100, 0b1000, 0b1111, 0b0000]),
    glyph('3', 4, [0b0000, 0b1110, 0b0001, 0b0110, 0b0001, 0b0001, 0b1110, 0b0000]),
    glyph('4', 4, [0b0000, 0b1001, 0b1001, 0b1111, 0b0001, 0b0001, 0b0001, 0b0000]),
    glyph('5', 4, [0b0000, 0b1111, 0b1000, 0b1110, 0b0001, 0b0001, 0b1110, 0b0000]),
    glyph('6', 4, [0b0000, 0b0110, 0b1000, 0b1110, 0b1001, 0b1001, 0b0110, 0b0000]),
    glyph('7', 4, [0b0000, 0b1111, 0b0001, 0b0010, 0b0100, 0b0100, 0b0100, 0b0000]),
    glyph('8', 4, [0b0000, 0b0110, 0b1001, 0b0110, 0b1001, 0b1001, 0b0110, 0b0000]),
    glyph('9', 4, [0b0000, 0b0110, 0b1001, 0b1001, 0b0111, 0b0001, 0b0110, 0b0000]),
    glyph(':', 1, [0b0, 0b0, 0b0, 0b1, 0b0, 0b1, 0b0, 0b0]),
    glyph('?', 4, [0b0000, 0b0110, 0b1001, 0b0010, 0b0100, 0b0000, 0b0100, 0b0000]),
    glyph('A', 4, [0b0000, 0b0110, 0b1001, 0b1001, 0b1111, 0b1001, 0b1001, 0b0000]),
    glyph('B', 4, [0b0000, 0b1110, 0b1001, 0b1110, 0b1001, 0b1001, 0b1110, 0b0000]),
    glyph('C', 4, [0b0000, 0b0111, 0b1000, 0b1000, 0b1000, 0b1000, 0b0111, 0b0000]),
    glyph('D', 4, [0b0000, 0b1110, 0b1001, 0b1001, 0b1001, 0b1001, 0b1110, 0b0000]),
    glyph('E', 4, [0b0000, 0b1111, 0b1000, 0b1110, 0b1000, 0b1000, 0b1111, 0b0000]),
    glyph('F', 4, [0b0000, 0b1111, 0b1000, 0b1110, 0b1000, 0b1000, 0b1000, 0b0000]),
    glyph('G', 4, [0b0000, 0b0111, 0b1000, 0b1000, 0b1011, 0b1001, 0b0111, 0b0000]),
    glyph('H', 4, [0b0000, 0b1001, 0b1001, 0b1111, 0b1001, 0b1001, 0b1001, 0b0000]),
    glyph('I', 3, [0b000, 0b111, 0b010, 0b010, 0b010, 0b010, 0b111, 0b000]),
    glyph('J', 4, [0b0000, 0b0001, 0b0001, 0b0001, 0b0001, 0b1001, 0b0110, 0b0000]),
    glyph('K', 4, [0b0000, 0b1001, 0b1010, 0b1100, 0b1010, 0b1001, 0b1001, 0b0000]),
    glyph('L', 4, [0b0000, 0b1000, 0b1000, 0b1000, 0b1000, 0b1000, 0b1111, 0b0000]),
    glyph('M', 5, [0b00000, 0b10001, 0b11011, 0b10101, 0b10001, 0b10001, 0b10001, 0b00000]),
    glyph('N', 5, [0b00000, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b00000]),
    glyph('O', 4, [0b0000, 0b0110, 0b1001, 0b1001, 0b1001, 0b1001, 0b0110, 0b0000]),
    glyph('P', 4, [0b0000, 0b1110, 0b1001, 0b1001, 0b1110, 0b1000, 0b1000, 0b0000]),
    glyph('Q', 4, [0b0000, 0b0110, 0b1001, 0b1001, 0b1001, 0b1010, 0b0101, 0b0000]),
    glyph('R', 4, [0b0000, 0b1110, 0b1001, 0b1001, 0b1110, 0b1010, 0b1001, 0b0000]),
    glyph('S', 4, [0b0000, 0b0111, 0b1000, 0b0110, 0b0001, 0b0001, 0b1110, 0b0000]),
    glyph('T', 3, [0b000, 0b111, 0b010, 0b010, 0b010, 0b010, 0b010, 0b000]),
    glyph('U', 4, [0b0000, 0b1001, 0b1001, 0b1001, 0b1001, 0b1001, 0b0110, 0b0000]),
    glyph('V', 5, [0b00000, 0b10001, 0b10001, 0b10001, 0b01010, 0b01010, 0b00100, 0b00000]),
    glyph('W', 5, [0b00000, 0b10001, 0b10001, 0b10001, 0b10101, 0b11011, 0b10001, 0b00000]),
    glyph('X', 5, [0b00000, 0b10001, 0b01010, 0b00100, 0b00100, 0b01010, 0b10001, 0b00000]),
    glyph('Y', 5, [0b00000, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100, 0b00000]),
    glyph('Z', 4, [0b0000, 0b1111, 0b0001, 0b0010, 0b0100, 0b1000, 0b1111, 0b0000]),
    glyph('a', 4, [0b0000, 0b0000, 0b0000, 0b0111, 0b1001, 0b1001, 0b0111, 0b0000]),
    glyph('b', 4, [0b0000, 0b1000, 0b1000, 0b1110, 0b1001, 0b1001, 0b1110, 0b0000]),
    glyph('c', 3, [0b000, 0b000, 0b000, 0b011, 0b100, 0b100, 0b011, 0b000]),
    glyph('d', 4, [0b0000, 0b0001, 0b0001, 0b0111, 0b1001, 0b1001, 0b0111, 0b0000]),
    glyph('e', 4, [0b0000, 0b0000, 0b0000, 0b0110, 0b1111, 0b1000, 0b0111, 0b0000]),
    glyph('f', 3, [0b000, 0b011, 0b100, 0b111, 0b100, 0b100, 0b100, 0b000]),
    glyph('g', 4, [0b0000, 0b0000, 0b0000, 0b0111, 0b1001, 0b0111, 0b0001, 0b1110]),
    glyph('h', 4, [0b0000, 0b1000, 0b1000, 0b1110, 0b1001, 0b1001, 0b1001, 0b0000]),
    glyph('i', 1, [0b0, 0b1, 0b0, 0b1, 0b1, 0b1, 0b1, 0b0]),
    glyph('j', 2, [0b00, 0b01, 0b00, 0b01, 0b01, 0b01, 0b01, 0b10]),
    glyph('k', 4, [0b0000, 0b1000, 0b1001, 0b1010, 0b1100, 0b1010, 0b1001, 0b0000]),
    glyph('l', 1, [0b0, 0b1, 0b1, 0b1, 0b1, 0b1, 0b1, 0b0]),
    glyph('m', 5, [0b00000, 0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10101, 0b00000]),
    glyph('n', 4, [0b0000, 0b0000, 0b0000, 0b1110, 0b1001, 0b1001, 0b1001, 0b0000]),
    glyph('o', 4, [0b0000, 0b0000, 0b0000, 0b0110, 0b1001, 0b1001, 0b0110, 0b0000]),
    glyph('p', 4, [0b0000, 0b0000, 0b0000, 0b1110, 0b1001, 0b1110, 0b1000, 0b1000]),
    glyph('q', 4, [0b0000, 0b0000, 0b0000, 0b0111, 0b1001, 0b0111, 0b0001, 0b0001]),
    glyph('r', 3, [0b000, 0b000, 0b000, 0b101, 0b110, 0b100, 0b100, 0b000]),
    glyph('s', 4, [0b0000, 0b0000, 0b0000, 0b0111, 0b1100, 0b0011, 0b1110, 0b0000]),
    glyph('t', 3, [0b000, 0b010, 0b010, 0b111, 0b010, 0b010, 0b001, 0b000]),
    glyph('u', 4, [0b0000, 0b0000, 0b0000, 0b1001, 0b1001, 0b1001, 0b0111, 0b0000]),
    glyph('v', 3, [0b000, 0b000, 0b000, 0b101, 0b101, 0b101, 0b010, 0b000]),
    glyph('w', 5, [0b00000, 0b00000, 0b00000, 0b10001, 0b10001, 0b10101, 0b01010, 0b00000]),
    glyph('x', 4, [0b0000, 0b0000, 0b0000, 0b1001, 0b0110, 0b0110, 0b1001, 0b0000]),
    glyph('y', 4, [0b0000, 0b0000, 0b0000, 0b1001, 0b1001, 0b0111, 0b0001, 0b1110]),
    glyph('z', 4, [0b0000, 0b0000, 0b0000, 0b1111, 0b0010, 0b0100, 0b1111, 0b0000]),
    glyph('Ä', 4, [0b1001, 0b0110, 0b1001, 0b1001, 0b1111, 0b1001, 0b1001, 0b0000]),
    glyph('Ö', 4, [0b1001, 0b0110, 0b1001, 0b1001, 0b1001, 0b1001, 0b0110, 0b0000]),
    glyph('Ü', 4, [0b1001, 0b0000, 0b1001, 0b1001, 0b1001, 0b1001, 0b0110, 0b0000]),
    glyph('ß', 4, [0b0000, 0b0110, 0b1001, 0b1010, 0b1001, 0b1001, 0b1010, 0b0000]),
    glyph('ä', 4, [0b0000, 0b0101, 0b0000, 0b0111, 0b1001, 0b1001, 0b0111, 0b0000]),
    glyph('ö', 4, [0b0000, 0b1001, 0b0000, 0b0110, 0b1001, 0b1001, 0b0110, 0b0000]),
    glyph('ü', 4, [0b0000, 0b1001, 0b0000, 0b1001, 0b1001, 0b1001, 0b0111, 0b0000]),
];

static BOLD: [Glyph; 39] = [
    glyph('0', 5, [0b00000, 0b01110, 0b11011, 0b11011, 0b11011, 0b11011, 0b01110, 0b00000]),
    glyph('1', 4, [0b0000, 0b0110, 0b1110, 0b0110, 0b0110, 0b0110, 0b1111, 0b0000]),
    glyph('2', 5, [0b00000, 0b01110, 0b11011, 0b00110, 0b01100, 0b11000, 0b11111, 0b00000]),
    glyph('3', 5, [0b00000, 0b11110, 0b00011, 0b01110, 0b00011, 0b00011, 0b11110, 0b00000]),
    glyph('4', 5, [0b00000, 0b11011, 0b11011, 0b11111, 0b00011, 0b00011, 0b00011, 0b00000]),
    glyph('5', 5, [0b00000, 0b11111, 0b11000, 0b11110, 0b00011, 0b00011, 0b11110, 0b00000]),
    glyph('6', 5, [0b00000, 0b01110, 0b11000, 0b11110, 0b11011, 0b11011, 0b01110, 0b00000]),
    glyph('7', 5, [0b00000, 0b11111, 0b00011, 0b00110, 0b01100, 0b01100, 0b01100, 0b00000]),
    glyph('8', 5, [0b00000, 0b01110, 0b11011, 0b01110, 0b11011, 0b11011, 0b01110, 0b00000]),
    glyph('9', 5, [0b00000, 0b01110, 0b11011, 0b11011, 0b01111, 0b00011, 0b01110, 0b00000]),
    glyph('A', 5, [0b00000, 0b01110, 0b11011, 0b11011, 0b11111, 0b11011, 0b11011, 0b00000]),
    glyph('B', 5, [0b00000, 0b11110, 0b11011, 0b11110, 0b11011, 0b11011, 0b11110, 0b00000]),
    glyph('C', 5, [0b00000, 0b01111, 0b11000, 0b11000, 0b11000, 0b11000, 0b01111, 0b00000]),
    glyph('D', 5, [0b00000, 0b11110, 0b11011, 0b11011, 0b11011, 0b11011, 0b11110, 0b00000]),
    glyph('E', 5, [0b00000, 0b11111, 0b11000, 0b11110, 0b11000, 0b11000, 0b11111, 0b00000]),
    glyph('F', 5, [0b00000, 0b11111, 0b11000, 0b11110, 0b11000, 0b11000, 0b11000, 0b00000]),
    glyph('G', 5, [0b00000, 0b01111, 0b11000, 0b11000, 0b11111, 0b11011, 0b01111, 0b00000]),
    glyph('H', 5, [0b00000, 0b11011, 0b11011, 0b11111, 0b11011, 0b11011, 0b11011, 0b00000]),
    glyph('I', 4, [0b0000, 0b1111, 0b0110, 0b0110, 0b0110, 0b0110, 0b1111, 0b0000]),
    glyph('J', 5, [0b00000, 0b00011, 0b00011, 0b00011, 0b00011, 0b11011, 0b01110, 0b00000]),
    glyph('K', 5, [0b00000, 0b11011, 0b11110, 0b11100, 0b11110, 0b11011, 0b11011, 0b00000]),
    glyph('L', 5, [0b00000, 0b11000, 0b11000, 0b11000, 0b11000, 0b11000, 0b11111, 0b00000]),
    glyph('M', 6, [0b000000, 0b110011, 0b111111, 0b111111, 0b110011, 0b110011, 0b110011, 0b000000]),
    glyph('N', 6, [0b000000, 0b110011, 0b111011, 0b111111, 0b110111, 0b110011, 0b110011, 0b000000]),
    glyph('O', 5, [0b00000, 0b01110, 0b11011, 0b11011, 0b11011, 0b11011, 0b01110, 0b00000]),
    glyph('P', 5, [0b00000, 0b11110, 0b11011, 0b11011, 0b11110, 0b11000, 0b11000, 0b00000]),
    glyph('Q', 5, [0b00000, 0b01110, 0b11011, 0b11011, 0b11011, 0b11110, 0b01111, 0b00000]),
    glyph('R', 5, [0b00000, 0b11110, 0b11011, 0b11011, 0b11110, 0b11110, 0b11011, 0b00000]),
    glyph('S', 5, [0b00000, 0b01111, 0b11000, 0b01110, 0b00011, 0b00011, 0b11110, 0b00000]),
    glyph('T', 4, [0b0000, 0b1111, 0b0110, 0b0110, 0b0110, 0b0110, 0b0110, 0b0000]),
    glyph('U', 5, [0b00000, 0b11011, 0b11011, 0b11011, 0b11011, 0b11011, 0b01110, 0b00000]),
    glyph('V', 6, [0b000000, 0b110011, 0b110011, 0b110011, 0b011110, 0b011110, 0b001100, 0b000000]),
    glyph('W', 6, [0b000000, 0b110011, 0b110011, 0b110011, 0b111111, 0b111111, 0b110011, 0b000000]),
    glyph('X', 6, [0b000000, 0b110011, 0b011110, 0b001100, 0b001100, 0b011110, 0b110011, 0b000000]),
    glyph('Y', 6, [0b000000, 0b110011, 0b011110, 0b001100, 0b001100, 0b001100, 0b001100, 0b000000]),
    glyph('Z', 5, [0b00000, 0b11111, 0b00011, 0b00110, 0b01100, 0b11000, 0b11111, 0b00000]),
    glyph('Ä', 5, [0b11011, 0b01110, 0b11011, 0b11011, 0b11111, 0b11011, 0b11011, 0b00000]),
    glyph('Ö', 5, [0b11011, 0b01110, 0b11011, 0b11011, 0b11011, 0b11011, 0b01110, 0b00000]),
    glyph('Ü', 5, [0b11011, 0b00000, 0b11011, 0b11011, 0b11011, 0b11011, 0b01110, 0b00000]),
];
