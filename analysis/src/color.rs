use serde::{Serialize, Serializer};
use std::fmt::{self, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub const NEUTRAL: Rgb = Rgb(0xd3, 0xd3, 0xd3);

/// Ten-color categorical palette.
pub const CATEGORY10: [Rgb; 10] = [
    Rgb(0x1f, 0x77, 0xb4),
    Rgb(0xff, 0x7f, 0x0e),
    Rgb(0x2c, 0xa0, 0x2c),
    Rgb(0xd6, 0x27, 0x28),
    Rgb(0x94, 0x67, 0xbd),
    Rgb(0x8c, 0x56, 0x4b),
    Rgb(0xe3, 0x77, 0xc2),
    Rgb(0x7f, 0x7f, 0x7f),
    Rgb(0xbc, 0xbd, 0x22),
    Rgb(0x17, 0xbe, 0xcf),
];

pub fn categorical(index: usize) -> Rgb {
    CATEGORY10[index % CATEGORY10.len()]
}

/// Sequential light-to-dark blue scale over `[min, max]`.
pub fn blues(value: f64, min: f64, max: f64) -> Rgb {
    if max <= min {
        return BLUES[2];
    }
    let x = (value - min) / (max - min);
    if x <= 0.5 {
        interpolate(BLUES[0], BLUES[1], 0.0, 0.5, x)
    } else {
        interpolate(BLUES[1], BLUES[2], 0.5, 1.0, x)
    }
}

const BLUES: [Rgb; 3] = [
    Rgb(0xde, 0xeb, 0xf7),
    Rgb(0x6b, 0xae, 0xd6),
    Rgb(0x08, 0x51, 0x9c),
];

fn interpolate(color1: Rgb, color2: Rgb, start: f64, end: f64, value: f64) -> Rgb {
    let x = (value - start) / (end - start);
    if x <= 0.0 {
        color1
    } else if x >= 1.0 {
        color2
    } else {
        Rgb(
            (color1.0 as f64 * (1.0 - x) + color2.0 as f64 * x) as u8,
            (color1.1 as f64 * (1.0 - x) + color2.1 as f64 * x) as u8,
            (color1.2 as f64 * (1.0 - x) + color2.2 as f64 * x) as u8,
        )
    }
}
