//! Sample format codes and big-endian sample decoding.

use serde::{Deserialize, Serialize};

/// Data sample formats from the binary header (bytes 3225-3226).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFormat {
    IbmFloat32,
    Int32,
    Int16,
    IeeeFloat32,
    Int8,
}

impl SampleFormat {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::IbmFloat32),
            2 => Some(Self::Int32),
            3 => Some(Self::Int16),
            5 => Some(Self::IeeeFloat32),
            8 => Some(Self::Int8),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::IbmFloat32 => 1,
            Self::Int32 => 2,
            Self::Int16 => 3,
            Self::IeeeFloat32 => 5,
            Self::Int8 => 8,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::IbmFloat32 | Self::Int32 | Self::IeeeFloat32 => 4,
            Self::Int16 => 2,
            Self::Int8 => 1,
        }
    }

    /// Decode big-endian `raw` into `out`; `raw.len()` must equal
    /// `out.len() * bytes_per_sample()`.
    pub fn decode(self, raw: &[u8], out: &mut [f32]) {
        let width = self.bytes_per_sample();
        for (dst, b) in out.iter_mut().zip(raw.chunks_exact(width)) {
            *dst = match self {
                Self::IbmFloat32 => ibm_to_f32(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
                Self::Int32 => i32::from_be_bytes([b[0], b[1], b[2], b[3]]) as f32,
                Self::Int16 => i16::from_be_bytes([b[0], b[1]]) as f32,
                Self::IeeeFloat32 => f32::from_be_bytes([b[0], b[1], b[2], b[3]]),
                Self::Int8 => b[0] as i8 as f32,
            };
        }
    }
}

/// IBM System/360 single precision: sign bit, base-16 excess-64 exponent,
/// 24-bit fraction.
pub fn ibm_to_f32(bits: u32) -> f32 {
    let fraction = bits & 0x00ff_ffff;
    if fraction == 0 {
        return 0.0;
    }
    let sign = if bits >> 31 == 0 { 1.0 } else { -1.0 };
    let exponent = ((bits >> 24) & 0x7f) as i32 - 64;
    let value = fraction as f64 / 16_777_216.0 * 16f64.powi(exponent);
    (sign * value) as f32
}

/// Inverse of [`ibm_to_f32`], rounding the fraction to nearest.
pub fn f32_to_ibm(value: f32) -> u32 {
    if value == 0.0 || !value.is_finite() {
        return 0;
    }
    let sign = if value.is_sign_negative() { 0x8000_0000 } else { 0 };
    let mut v = (value as f64).abs();
    let mut exponent = 64i32;
    while v >= 1.0 {
        v /= 16.0;
        exponent += 1;
    }
    while v < 1.0 / 16.0 {
        v *= 16.0;
        exponent -= 1;
    }
    let mut fraction = (v * 16_777_216.0).round() as u32;
    if fraction >= 1 << 24 {
        fraction >>= 4;
        exponent += 1;
    }
    if exponent < 0 {
        return sign;
    }
    let exponent = exponent.min(127) as u32;
    sign | (exponent << 24) | fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ibm_reference_value() {
        // Classic example: -118.625 is 0xC276A000 in IBM single precision.
        assert_eq!(ibm_to_f32(0xC276_A000), -118.625);
        assert_eq!(f32_to_ibm(-118.625), 0xC276_A000);
    }

    #[test]
    fn ibm_roundtrip_is_close() {
        for v in [1.0f32, 0.15625, 3.5e-3, 12345.678, -0.001, 1.0e6] {
            let back = ibm_to_f32(f32_to_ibm(v));
            assert!(
                ((back - v) / v).abs() < 1e-6,
                "{v} came back as {back}"
            );
        }
        assert_eq!(ibm_to_f32(f32_to_ibm(0.0)), 0.0);
    }

    #[test]
    fn decodes_integer_formats() {
        let mut out = [0.0f32; 2];
        SampleFormat::Int16.decode(&[0xff, 0xfe, 0x00, 0x07], &mut out);
        assert_eq!(out, [-2.0, 7.0]);
        SampleFormat::Int8.decode(&[0x80, 0x05], &mut out);
        assert_eq!(out, [-128.0, 5.0]);
    }

    #[test]
    fn unknown_codes_are_rejected() {
        assert_eq!(SampleFormat::from_code(4), None);
        assert_eq!(SampleFormat::from_code(5), Some(SampleFormat::IeeeFloat32));
    }
}
