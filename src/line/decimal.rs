//! Decimal values in their wire form: a scale and the unscaled integer as
//! minimal big-endian two's complement bytes.

use arrow_buffer::i256;

/// Largest scale the decimal wire type carries.
pub const MAX_DECIMAL_SCALE: u32 = 76;

/// An exact decimal `unscaled * 10^-scale`, ready to be written.
///
/// ```
/// use arrow_ilp::line::Decimal;
///
/// let price = Decimal::from_i128(-12345, 2);
/// assert_eq!(price.scale(), 2);
/// assert_eq!(price.unscaled_be(), &[0xcf, 0xc7]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    scale: u32,
    bytes: [u8; 32],
    start: usize,
}

impl Decimal {
    /// Decimal from a 128-bit unscaled value.
    pub fn from_i128(unscaled: i128, scale: u32) -> Self {
        Self::from_i256(i256::from_i128(unscaled), scale)
    }

    /// Decimal from a 256-bit unscaled value.
    pub fn from_i256(unscaled: i256, scale: u32) -> Self {
        let bytes = unscaled.to_be_bytes();
        Self {
            scale,
            bytes,
            start: redundant_sign_bytes(&bytes),
        }
    }

    /// Digits after the decimal point.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Unscaled value without redundant sign-extension bytes. Never empty.
    pub fn unscaled_be(&self) -> &[u8] {
        &self.bytes[self.start..]
    }
}

/// Leading bytes that only repeat the sign of the byte after them.
fn redundant_sign_bytes(be: &[u8]) -> usize {
    let pad = if be[0] & 0x80 == 0 { 0x00 } else { 0xff };
    be.windows(2)
        .take_while(|w| w[0] == pad && (w[1] ^ pad) & 0x80 == 0)
        .count()
}

/// Insert the decimal point into the base-10 rendering of an unscaled value.
pub(crate) fn format_decimal(unscaled: &str, scale: u32) -> String {
    let (sign, digits) = match unscaled.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", unscaled),
    };
    let scale = scale as usize;
    if scale == 0 {
        return format!("{sign}{digits}");
    }
    let digits = format!("{digits:0>width$}", width = scale + 1);
    let (int, frac) = digits.split_at(digits.len() - scale);
    format!("{sign}{int}.{frac}")
}
