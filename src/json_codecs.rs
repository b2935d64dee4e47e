//! The beacon REST API encodes every integer wider than a few bits as
//! a JSON string so clients don't have to worry about 64-bit overflow
//! in loosely-typed JSON parsers. These helpers turn those decimal
//! strings back into the numeric types we actually want to do
//! arithmetic with.
use serde::{de, Deserialize, Deserializer};
use std::{fmt::Display, str::FromStr};

use crate::units::GweiNewtype;

pub fn i32_from_string<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<i32>().map_err(de::Error::custom)
}

pub fn u64_from_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<u64>().map_err(de::Error::custom)
}

/// Deserializes a decimal-string gwei amount straight into our
/// arbitrary-precision newtype, so callers never round-trip through a
/// 64-bit integer that could truncate a large aggregate reward.
pub fn gwei_from_string<'de, D>(deserializer: D) -> Result<GweiNewtype, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<GweiNewtype>().map_err(de::Error::custom)
}

pub fn opt_gwei_from_string<'de, D>(deserializer: D) -> Result<Option<GweiNewtype>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    s.map(|s| s.parse::<GweiNewtype>().map_err(de::Error::custom))
        .transpose()
}

/// A little-endian bit vector over SSZ-encoded `aggregation_bits`
/// hex strings, e.g. `"0xffdf01"`. Bit `i` (LSB-first within the byte
/// stream) corresponds to committee position `i`.
pub fn aggregation_bits_from_hex<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    decode_aggregation_bits(&s).map_err(de::Error::custom)
}

impl Display for DecodeBitsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug)]
pub struct DecodeBitsError(String);

/// Decodes SSZ `Bitlist[N]` hex into a vector of booleans indexed by
/// committee position, dropping the trailing sentinel bit SSZ uses to
/// mark the list's true length.
pub fn decode_aggregation_bits(hex: &str) -> Result<Vec<bool>, DecodeBitsError> {
    let hex = hex
        .strip_prefix("0x")
        .ok_or_else(|| DecodeBitsError(format!("missing 0x prefix: {hex}")))?;

    let bytes = (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(hex.get(i..i + 2).unwrap_or(""), 16)
                .map_err(|_| DecodeBitsError(format!("invalid hex in {hex}")))
        })
        .collect::<Result<Vec<u8>, _>>()?;

    let mut bits: Vec<bool> = bytes
        .iter()
        .flat_map(|byte| (0..8).map(move |i| (byte >> i) & 1 == 1))
        .collect();

    // SSZ bitlists terminate with a sentinel `1` bit marking the
    // list's logical length; everything from there on (including the
    // sentinel itself) is padding, not committee positions.
    if let Some(last_set) = bits.iter().rposition(|&b| b) {
        bits.truncate(last_set);
    } else {
        bits.clear();
    }

    Ok(bits)
}

pub fn parse_decimal<T: FromStr>(s: &str) -> Result<T, T::Err> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_aggregation_bits_test() {
        // byte 0x05 = 0b0000_0101 -> bits 0 and 2 set, sentinel at bit 3
        let bits = decode_aggregation_bits("0x0d").unwrap();
        assert_eq!(bits, vec![true, false, true]);
    }

    #[test]
    fn decode_aggregation_bits_missing_prefix_test() {
        assert!(decode_aggregation_bits("0d").is_err());
    }

    #[test]
    fn decode_aggregation_bits_empty_test() {
        let bits = decode_aggregation_bits("0x01").unwrap();
        assert_eq!(bits, Vec::<bool>::new());
    }
}
