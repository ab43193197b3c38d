//! Categorical colour palettes (d3 Category10 / Category20).

/// Category10, used for per-country lines and bars.
pub const CATEGORY10: [(u8, u8, u8); 10] = [
    (0x1f, 0x77, 0xb4),
    (0xff, 0x7f, 0x0e),
    (0x2c, 0xa0, 0x2c),
    (0xd6, 0x27, 0x28),
    (0x94, 0x67, 0xbd),
    (0x8c, 0x56, 0x4b),
    (0xe3, 0x77, 0xc2),
    (0x7f, 0x7f, 0x7f),
    (0xbc, 0xbd, 0x22),
    (0x17, 0xbe, 0xcf),
];

/// The light half of Category20 (its odd entries), paired with [`CATEGORY10`].
pub const CATEGORY20_LIGHT: [(u8, u8, u8); 10] = [
    (0xae, 0xc7, 0xe8),
    (0xff, 0xbb, 0x78),
    (0x98, 0xdf, 0x8a),
    (0xff, 0x98, 0x96),
    (0xc5, 0xb0, 0xd5),
    (0xc4, 0x9c, 0x94),
    (0xf7, 0xb6, 0xd2),
    (0xc7, 0xc7, 0xc7),
    (0xdb, 0xdb, 0x8d),
    (0x9e, 0xda, 0xe5),
];

/// Most countries a single dashboard can colour distinctly.
pub const MAX_SERIES: usize = CATEGORY10.len();

pub fn color(idx: usize) -> (u8, u8, u8) {
    CATEGORY10[idx % CATEGORY10.len()]
}

pub fn light_color(idx: usize) -> (u8, u8, u8) {
    CATEGORY20_LIGHT[idx % CATEGORY20_LIGHT.len()]
}
