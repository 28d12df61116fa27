//! 24-bit float packing for flatten heights
//!
//! A height is squeezed into the RGB bytes of an RGBA8 pixel so the alpha byte
//! stays free for coverage. The layout is 1 sign bit, 8 exponent bits (bias 63,
//! only values 0..=127 are ever produced) and 15 mantissa bits:
//!
//! ```text
//! bit 23     | bits 22..15 | bits 14..0
//! sign       | exponent    | mantissa (top 15 bits of the f32 mantissa)
//! ```
//!
//! The mantissa is truncated, not rounded, so the conversion is lossy.

const F32_EXPONENT_BIAS: i32 = 127;
const F24_EXPONENT_BIAS: i32 = 63;

/// Exponent value reserved for the saturated / non-finite pattern.
pub const F24_MAX_EXPONENT: u32 = 127;
/// Mask of the 15 mantissa bits.
pub const F24_MANTISSA_MASK: u32 = 0x7FFF;
/// Encoding emitted for positive values too large for the format.
pub const F24_SATURATED: u32 = (F24_MAX_EXPONENT << 15) | F24_MANTISSA_MASK;

const F32_MANTISSA_MASK: u32 = 0x7F_FFFF;
const MANTISSA_DROPPED_BITS: u32 = 8;

/// Encode an `f32` into the low 24 bits of a `u32`.
pub fn encode_f24(value: f32) -> u32 {
    let bits = value.to_bits();
    let sign = (bits >> 31) & 0x1;
    let mut exponent = ((bits >> 23) & 0xFF) as i32;
    let mut mantissa = bits & F32_MANTISSA_MASK;

    // Zero keeps exponent 0 and only carries its sign
    if value != 0.0 {
        exponent = exponent - F32_EXPONENT_BIAS + F24_EXPONENT_BIAS;
    }

    if exponent > F24_MAX_EXPONENT as i32 {
        exponent = F24_MAX_EXPONENT as i32;
        mantissa = F32_MANTISSA_MASK;
    } else if exponent < 0 {
        // Magnitude below 2^-63 (including f32 denormals) flushes to zero
        exponent = 0;
        mantissa = 0;
    }

    (sign << 23) | ((exponent as u32) << 15) | (mantissa >> MANTISSA_DROPPED_BITS)
}

/// Decode the low 24 bits of `bits` back into an `f32`.
pub fn decode_f24(bits: u32) -> f32 {
    let sign = (bits >> 23) & 0x1;
    let exponent = (bits >> 15) & 0xFF;
    let mut mantissa = (bits & F24_MANTISSA_MASK) << MANTISSA_DROPPED_BITS;

    let f32_bits = if exponent == 0 {
        if mantissa == 0 {
            sign << 31
        } else {
            // Denormal: value = 2^(1 - bias) * 0.mantissa, renormalised for f32
            let mut f32_exponent = 1 - F24_EXPONENT_BIAS + F32_EXPONENT_BIAS;
            while mantissa & 0x80_0000 == 0 {
                mantissa <<= 1;
                f32_exponent -= 1;
            }
            mantissa &= F32_MANTISSA_MASK;
            (sign << 31) | ((f32_exponent as u32) << 23) | mantissa
        }
    } else if exponent == F24_MAX_EXPONENT {
        (sign << 31) | 0x7F80_0000 | mantissa
    } else {
        let f32_exponent = exponent + (F32_EXPONENT_BIAS - F24_EXPONENT_BIAS) as u32;
        (sign << 31) | (f32_exponent << 23) | mantissa
    };

    f32::from_bits(f32_bits)
}

/// Split a 24-bit encoding into big-endian R, G, B bytes.
pub fn f24_to_rgb(bits: u32) -> [u8; 3] {
    [
        ((bits >> 16) & 0xFF) as u8,
        ((bits >> 8) & 0xFF) as u8,
        (bits & 0xFF) as u8,
    ]
}

/// Reassemble R, G, B bytes into a 24-bit encoding.
pub fn rgb_to_f24(rgb: [u8; 3]) -> u32 {
    ((rgb[0] as u32) << 16) | ((rgb[1] as u32) << 8) | rgb[2] as u32
}

/// Encode a height directly into pixel bytes.
pub fn encode_height_rgb(height: f32) -> [u8; 3] {
    f24_to_rgb(encode_f24(height))
}

/// Decode pixel bytes back into a height.
pub fn decode_height_rgb(rgb: [u8; 3]) -> f32 {
    decode_f24(rgb_to_f24(rgb))
}
