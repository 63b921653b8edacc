//! Decoding of structured archive file names.
//!
//! Every voltage product stored in the archive carries its observation id and
//! a time tag in its name, separated by `_`. Each product type has its own
//! grammar, and the recombined product has two historical naming conventions
//! that coexist in the archive:
//!
//! | Product     | Example                                  |
//! |-------------|------------------------------------------|
//! | Raw voltage | `1096952256_1096952256_vcs01_00001.dat`  |
//! | Recombined  | `1070978272_1401856338_ch164.dat`        |
//! | Recombined  | `1070978272_c_ch05_1386943943.dat`       |
//! | ICS only    | `1096952256_1096952256_ics.dat`          |
//! | Combined    | `1096952256_1096952256_combined.tar`     |
//!
//! Recombined names carry a Unix timestamp; every other product carries GPS
//! seconds. [`DecodedName::gps_second`] normalises both to GPS.
//!
//! # Example
//!
//! ```
//! use voltdownload_core::filename::{ProductType, decode_as};
//!
//! let decoded = decode_as(ProductType::IcsOnly, "1096952256_1096952300_ics.dat").unwrap();
//! assert_eq!(decoded.observation_id(), 1_096_952_256);
//! assert_eq!(decoded.gps_second(), 1_096_952_300);
//! ```

mod error;
pub mod gps;

use serde::{Deserialize, Serialize};

pub use error::{FilenameError, MalformedReason};
pub use gps::{GPS_EPOCH_OFFSET_SECS, gps_now, gps_to_unix, unix_to_gps};

/// Field delimiter used by every archive naming convention.
const DELIMITER: char = '_';

/// Archive product type, as declared by the manifest's numeric `filetype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum ProductType {
    /// Raw voltage capture (`11`).
    RawVoltage,
    /// Recombined voltage product (`12`).
    Recombined,
    /// Incoherent-sum-only product (`15`).
    IcsOnly,
    /// Combined tar archive (`16`).
    Combined,
    /// Any other archive product, e.g. visibilities.
    Other(u32),
}

impl ProductType {
    /// Returns the archive's numeric code for this type.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::RawVoltage => 11,
            Self::Recombined => 12,
            Self::IcsOnly => 15,
            Self::Combined => 16,
            Self::Other(code) => code,
        }
    }

    /// Returns a short label for logs and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::RawVoltage => "voltage data",
            Self::Recombined => "voltage recombined product",
            Self::IcsOnly => "ics",
            Self::Combined => "combined",
            Self::Other(_) => "unknown product",
        }
    }
}

impl From<u32> for ProductType {
    fn from(code: u32) -> Self {
        match code {
            11 => Self::RawVoltage,
            12 => Self::Recombined,
            15 => Self::IcsOnly,
            16 => Self::Combined,
            other => Self::Other(other),
        }
    }
}

impl From<ProductType> for u32 {
    fn from(product: ProductType) -> Self {
        product.code()
    }
}

/// Time tag embedded in a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeTag {
    /// Seconds since the GPS epoch.
    Gps(i64),
    /// Seconds since the Unix epoch.
    Unix(i64),
}

impl TimeTag {
    /// Returns the tag in GPS seconds.
    #[must_use]
    pub const fn gps_second(self) -> i64 {
        match self {
            Self::Gps(secs) => secs,
            Self::Unix(secs) => unix_to_gps(secs),
        }
    }
}

/// Fields decoded from an archive file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedName {
    /// `<obsid>_<gps>_<vcsNN>_<part>.dat`
    RawVoltage {
        observation_id: u64,
        gps_time: i64,
        /// Capture box tag, e.g. `vcs01`.
        vcs: String,
        part: u32,
    },
    /// `<obsid>_<unix>_<chNNN>.dat` or `<obsid>_<x>_<chNN>_<unix>.dat`
    Recombined {
        observation_id: u64,
        unix_time: i64,
        /// Coarse channel tag, e.g. `ch164`.
        channel: String,
    },
    /// `<obsid>_<gps>_ics.dat`
    Ics { observation_id: u64, gps_time: i64 },
    /// `<obsid>_<gps>_combined.tar`
    Combined { observation_id: u64, gps_time: i64 },
}

impl DecodedName {
    /// Returns the observation id encoded in the name.
    #[must_use]
    pub const fn observation_id(&self) -> u64 {
        match self {
            Self::RawVoltage { observation_id, .. }
            | Self::Recombined { observation_id, .. }
            | Self::Ics { observation_id, .. }
            | Self::Combined { observation_id, .. } => *observation_id,
        }
    }

    /// Returns the time tag encoded in the name.
    #[must_use]
    pub const fn time_tag(&self) -> TimeTag {
        match self {
            Self::Recombined { unix_time, .. } => TimeTag::Unix(*unix_time),
            Self::RawVoltage { gps_time, .. }
            | Self::Ics { gps_time, .. }
            | Self::Combined { gps_time, .. } => TimeTag::Gps(*gps_time),
        }
    }

    /// Returns the time tag in GPS seconds, for comparison against a window.
    #[must_use]
    pub const fn gps_second(&self) -> i64 {
        self.time_tag().gps_second()
    }
}

/// Decodes `name` with the grammar of the declared `product` type.
///
/// The grammar is chosen by the type the manifest declares, never guessed from
/// the name, so an ICS entry listed for a combined selection is still decoded
/// with the ICS grammar.
///
/// # Errors
///
/// Returns [`FilenameError::Malformed`] when the name does not follow the
/// product's grammar, or [`FilenameError::UnsupportedProduct`] for product
/// types without a name grammar.
pub fn decode_as(product: ProductType, name: &str) -> Result<DecodedName, FilenameError> {
    match product {
        ProductType::RawVoltage => decode_raw_voltage(name),
        ProductType::Recombined => decode_recombined(name),
        ProductType::IcsOnly => decode_ics(name),
        ProductType::Combined => decode_combined(name),
        ProductType::Other(code) => Err(FilenameError::unsupported(name, code)),
    }
}

/// Decodes a raw voltage name: `<obsid>_<gps>_<vcsNN>_<part>.dat`.
///
/// # Errors
///
/// Returns [`FilenameError::Malformed`] if the name does not match.
pub fn decode_raw_voltage(name: &str) -> Result<DecodedName, FilenameError> {
    let product = ProductType::RawVoltage.label();
    let fields = split_checked(name, product, ".dat", "vcs")?;
    let malformed = |reason| FilenameError::malformed(base_name(name), product, reason);

    let observation_id = parse_field(fields.first().copied(), "observation id").map_err(malformed)?;
    let gps_time = parse_field(fields.get(1).copied(), "time").map_err(malformed)?;
    let part = parse_field(fields.get(3).map(|f| strip_suffix(f)), "part").map_err(malformed)?;

    Ok(DecodedName::RawVoltage {
        observation_id,
        gps_time,
        vcs: fields[2].to_string(),
        part,
    })
}

type RecombinedMatcher = fn(&[&str]) -> Option<(i64, String)>;

/// Recombined grammars in the order they are tried; the first match wins.
const RECOMBINED_MATCHERS: &[RecombinedMatcher] =
    &[recombined_time_then_channel, recombined_channel_then_time];

/// `1070978272_1401856338_ch164.dat`
fn recombined_time_then_channel(fields: &[&str]) -> Option<(i64, String)> {
    let unix_time = fields.get(1)?.parse().ok()?;
    let channel = strip_suffix(fields.get(2)?);
    Some((unix_time, channel.to_string()))
}

/// `1070978272_c_ch05_1386943943.dat`
fn recombined_channel_then_time(fields: &[&str]) -> Option<(i64, String)> {
    let unix_time = strip_suffix(fields.get(3)?).parse().ok()?;
    Some((unix_time, fields.get(2)?.to_string()))
}

/// Decodes a recombined product name, trying both historical conventions.
///
/// # Errors
///
/// Returns [`FilenameError::Malformed`] if neither convention matches.
pub fn decode_recombined(name: &str) -> Result<DecodedName, FilenameError> {
    let product = ProductType::Recombined.label();
    let fields = split_checked(name, product, ".dat", "ch")?;
    let malformed = |reason| FilenameError::malformed(base_name(name), product, reason);

    let observation_id = parse_field(fields.first().copied(), "observation id").map_err(malformed)?;
    let (unix_time, channel) = RECOMBINED_MATCHERS
        .iter()
        .find_map(|matcher| matcher(&fields))
        .ok_or_else(|| malformed(MalformedReason::NonNumeric("time")))?;

    Ok(DecodedName::Recombined {
        observation_id,
        unix_time,
        channel,
    })
}

/// Decodes an ICS-only name: `<obsid>_<gps>_ics.dat`.
///
/// # Errors
///
/// Returns [`FilenameError::Malformed`] if the name does not match.
pub fn decode_ics(name: &str) -> Result<DecodedName, FilenameError> {
    let (observation_id, gps_time) =
        decode_obs_and_time(name, ProductType::IcsOnly.label(), ".dat", "ics")?;
    Ok(DecodedName::Ics {
        observation_id,
        gps_time,
    })
}

/// Decodes a combined archive name: `<obsid>_<gps>_combined.tar`.
///
/// # Errors
///
/// Returns [`FilenameError::Malformed`] if the name does not match.
pub fn decode_combined(name: &str) -> Result<DecodedName, FilenameError> {
    let (observation_id, gps_time) =
        decode_obs_and_time(name, ProductType::Combined.label(), ".tar", "combined")?;
    Ok(DecodedName::Combined {
        observation_id,
        gps_time,
    })
}

fn decode_obs_and_time(
    name: &str,
    product: &'static str,
    extension: &'static str,
    token: &'static str,
) -> Result<(u64, i64), FilenameError> {
    let fields = split_checked(name, product, extension, token)?;
    let malformed = |reason| FilenameError::malformed(base_name(name), product, reason);

    let observation_id = parse_field(fields.first().copied(), "observation id").map_err(malformed)?;
    let gps_time = parse_field(fields.get(1).copied(), "time").map_err(malformed)?;
    Ok((observation_id, gps_time))
}

/// Splits the base name on the delimiter after checking the extension and the
/// product token in the third field.
fn split_checked<'a>(
    name: &'a str,
    product: &'static str,
    extension: &'static str,
    token: &'static str,
) -> Result<Vec<&'a str>, FilenameError> {
    let file = base_name(name);
    if !file.contains(extension) {
        return Err(FilenameError::malformed(
            file,
            product,
            MalformedReason::MissingExtension(extension),
        ));
    }

    let fields: Vec<&str> = file.split(DELIMITER).collect();
    if !fields.get(2).is_some_and(|field| field.contains(token)) {
        return Err(FilenameError::malformed(
            file,
            product,
            MalformedReason::MissingToken(token),
        ));
    }
    Ok(fields)
}

fn parse_field<T: std::str::FromStr>(
    field: Option<&str>,
    what: &'static str,
) -> Result<T, MalformedReason> {
    field
        .and_then(|value| value.parse().ok())
        .ok_or(MalformedReason::NonNumeric(what))
}

/// Drops everything from the first `.` (the extension).
fn strip_suffix(field: &str) -> &str {
    field.split('.').next().unwrap_or(field)
}

fn base_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== Product Type Tests ====================

    #[test]
    fn test_product_type_from_code_known_types() {
        assert_eq!(ProductType::from(11), ProductType::RawVoltage);
        assert_eq!(ProductType::from(12), ProductType::Recombined);
        assert_eq!(ProductType::from(15), ProductType::IcsOnly);
        assert_eq!(ProductType::from(16), ProductType::Combined);
        assert_eq!(ProductType::from(8), ProductType::Other(8));
    }

    #[test]
    fn test_product_type_code_inverts_from_code() {
        for code in [8, 11, 12, 15, 16] {
            assert_eq!(ProductType::from(code).code(), code);
        }
    }

    #[test]
    fn test_product_type_deserializes_from_number() {
        let product: ProductType = serde_json::from_str("15").unwrap();
        assert_eq!(product, ProductType::IcsOnly);
    }

    // ==================== Raw Voltage Tests ====================

    #[test]
    fn test_decode_raw_voltage_extracts_all_fields() {
        let decoded = decode_raw_voltage("1096952256_1096952260_vcs07_00012.dat").unwrap();
        assert_eq!(
            decoded,
            DecodedName::RawVoltage {
                observation_id: 1_096_952_256,
                gps_time: 1_096_952_260,
                vcs: "vcs07".to_string(),
                part: 12,
            }
        );
        assert_eq!(decoded.gps_second(), 1_096_952_260);
    }

    #[test]
    fn test_decode_raw_voltage_missing_vcs_token_fails() {
        let err = decode_raw_voltage("1096952256_1096952260_ics.dat").unwrap_err();
        assert!(matches!(
            err,
            FilenameError::Malformed {
                reason: MalformedReason::MissingToken("vcs"),
                ..
            }
        ));
    }

    #[test]
    fn test_decode_raw_voltage_missing_part_fails() {
        let err = decode_raw_voltage("1096952256_1096952260_vcs07.dat").unwrap_err();
        assert!(matches!(
            err,
            FilenameError::Malformed {
                reason: MalformedReason::NonNumeric("part"),
                ..
            }
        ));
    }

    // ==================== Recombined Tests ====================

    #[test]
    fn test_decode_recombined_time_then_channel() {
        let decoded = decode_recombined("1070978272_1401856338_ch164.dat").unwrap();
        assert_eq!(
            decoded,
            DecodedName::Recombined {
                observation_id: 1_070_978_272,
                unix_time: 1_401_856_338,
                channel: "ch164".to_string(),
            }
        );
        assert_eq!(decoded.gps_second(), unix_to_gps(1_401_856_338));
    }

    #[test]
    fn test_decode_recombined_channel_then_time_fallback() {
        let decoded = decode_recombined("1070978272_c_ch05_1386943943.dat").unwrap();
        assert_eq!(
            decoded,
            DecodedName::Recombined {
                observation_id: 1_070_978_272,
                unix_time: 1_386_943_943,
                channel: "ch05".to_string(),
            }
        );
        assert_eq!(decoded.time_tag(), TimeTag::Unix(1_386_943_943));
    }

    #[test]
    fn test_decode_recombined_neither_convention_fails() {
        let err = decode_recombined("1070978272_c_ch05_abc.dat").unwrap_err();
        assert!(matches!(
            err,
            FilenameError::Malformed {
                reason: MalformedReason::NonNumeric("time"),
                ..
            }
        ));
    }

    #[test]
    fn test_decode_recombined_strips_leading_path() {
        let decoded = decode_recombined("some/dir/1070978272_1401856338_ch164.dat").unwrap();
        assert_eq!(decoded.observation_id(), 1_070_978_272);
    }

    #[test]
    fn test_decode_recombined_extreme_time_saturates() {
        let decoded = decode_recombined("1_-9223372036854775808_ch1.dat").unwrap();
        assert_eq!(decoded.gps_second(), i64::MIN);
    }

    // ==================== ICS / Combined Tests ====================

    #[test]
    fn test_decode_ics() {
        let decoded = decode_ics("1096952256_1096952300_ics.dat").unwrap();
        assert_eq!(
            decoded,
            DecodedName::Ics {
                observation_id: 1_096_952_256,
                gps_time: 1_096_952_300,
            }
        );
    }

    #[test]
    fn test_decode_ics_missing_extension_fails() {
        let err = decode_ics("1096952256_1096952300_ics.tar").unwrap_err();
        assert!(matches!(
            err,
            FilenameError::Malformed {
                reason: MalformedReason::MissingExtension(".dat"),
                ..
            }
        ));
    }

    #[test]
    fn test_decode_combined() {
        let decoded = decode_combined("1096952256_1096952400_combined.tar").unwrap();
        assert_eq!(decoded.observation_id(), 1_096_952_256);
        assert_eq!(decoded.time_tag(), TimeTag::Gps(1_096_952_400));
    }

    #[test]
    fn test_decode_combined_non_numeric_observation_fails() {
        let err = decode_combined("obs_1096952400_combined.tar").unwrap_err();
        assert!(matches!(
            err,
            FilenameError::Malformed {
                reason: MalformedReason::NonNumeric("observation id"),
                ..
            }
        ));
    }

    #[test]
    fn test_decode_arbitrary_string_without_token_fails_for_every_product() {
        for product in [
            ProductType::RawVoltage,
            ProductType::Recombined,
            ProductType::IcsOnly,
            ProductType::Combined,
        ] {
            let result = decode_as(product, "readme.dat.tar");
            assert!(
                matches!(result, Err(FilenameError::Malformed { .. })),
                "{product:?} accepted an arbitrary name: {result:?}"
            );
        }
    }

    #[test]
    fn test_decode_as_dispatches_by_declared_type() {
        // An ICS name decoded as combined fails even though the numbers parse.
        assert!(decode_as(ProductType::Combined, "1096952256_1096952300_ics.dat").is_err());
        assert!(decode_as(ProductType::IcsOnly, "1096952256_1096952300_ics.dat").is_ok());
    }

    #[test]
    fn test_decode_as_other_product_is_unsupported() {
        let err = decode_as(ProductType::Other(8), "1096952256_gpubox01_00.fits").unwrap_err();
        assert_eq!(err, FilenameError::unsupported("1096952256_gpubox01_00.fits", 8));
    }
}
