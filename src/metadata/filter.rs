//! Product and time-window selection over a fetched manifest.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::filename::{FilenameError, ProductType, decode_as};

/// The product set a run asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSelector {
    /// Raw voltage captures only.
    RawVoltage,
    /// Recombined products only.
    Recombined,
    /// ICS-only products.
    IcsOnly,
    /// Combined archives together with their ICS products.
    #[default]
    Combined,
}

impl ProductSelector {
    /// Returns whether an entry of the declared type belongs to this selection.
    #[must_use]
    pub const fn accepts(self, product: ProductType) -> bool {
        matches!(
            (self, product),
            (Self::RawVoltage, ProductType::RawVoltage)
                | (Self::Recombined, ProductType::Recombined)
                | (Self::IcsOnly | Self::Combined, ProductType::IcsOnly)
                | (Self::Combined, ProductType::Combined)
        )
    }

    /// Returns the legacy numeric selector code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::RawVoltage => 11,
            Self::Recombined => 12,
            Self::IcsOnly => 15,
            Self::Combined => 16,
        }
    }

    /// Returns the selector's name as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RawVoltage => "raw",
            Self::Recombined => "recombined",
            Self::IcsOnly => "ics",
            Self::Combined => "combined",
        }
    }
}

impl fmt::Display for ProductSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}

/// Error returned when a product selector string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unknown product type '{0}': expected raw (11), recombined (12), ics (15) or combined (16)"
)]
pub struct ParseSelectorError(String);

impl FromStr for ProductSelector {
    type Err = ParseSelectorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "raw" | "11" => Ok(Self::RawVoltage),
            "recombined" | "12" => Ok(Self::Recombined),
            "ics" | "15" => Ok(Self::IcsOnly),
            "combined" | "16" => Ok(Self::Combined),
            _ => Err(ParseSelectorError(value.to_string())),
        }
    }
}

/// Closed GPS time interval `[from, from + duration]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    from: i64,
    duration: u64,
}

impl TimeWindow {
    /// Creates a window starting at `from` GPS seconds.
    #[must_use]
    pub const fn new(from: i64, duration: u64) -> Self {
        Self { from, duration }
    }

    /// Returns the first GPS second in the window.
    #[must_use]
    pub const fn start(&self) -> i64 {
        self.from
    }

    /// Returns the last GPS second in the window (inclusive).
    #[must_use]
    pub fn end(&self) -> i64 {
        self.from
            .saturating_add(i64::try_from(self.duration).unwrap_or(i64::MAX))
    }

    /// Returns whether `gps_second` lies inside the window, both ends inclusive.
    #[must_use]
    pub fn contains(&self, gps_second: i64) -> bool {
        (self.from..=self.end()).contains(&gps_second)
    }
}

/// One manifest entry as served by the metadata endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ManifestEntry {
    /// Declared product type.
    pub filetype: ProductType,
    /// Declared size in bytes.
    pub size: u64,
}

/// The file listing of one observation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ObservationManifest {
    /// File name to entry; names are unique within an observation.
    pub files: BTreeMap<String, ManifestEntry>,
}

/// A remote file selected for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Archive file name (unique per observation).
    pub name: String,
    /// Declared size in bytes.
    pub size: u64,
    /// Declared product type.
    pub product_type: ProductType,
    /// GPS second decoded from the name, when the name was decoded.
    pub time_tag: Option<i64>,
}

/// Selects the manifest entries matching `selector` and, if given, `window`.
///
/// Without a window no name is decoded. With a window every type-matching
/// entry is decoded with the grammar of its declared type, and a name that
/// cannot be decoded fails the whole selection.
///
/// The result is sorted by file name. Every selected name must be a bare file
/// name, since it becomes the local file name inside the output directory.
///
/// # Errors
///
/// Returns [`FilenameError::NotAFileName`] for a type-matching entry whose name
/// has directory parts, and [`FilenameError`] for the first type-matching entry
/// whose name does not decode while a window is active.
pub fn filter_manifest(
    manifest: &ObservationManifest,
    selector: ProductSelector,
    window: Option<TimeWindow>,
) -> Result<Vec<RemoteFile>, FilenameError> {
    let mut selected = Vec::new();

    for (name, entry) in &manifest.files {
        if !selector.accepts(entry.filetype) {
            continue;
        }
        if !is_bare_file_name(name) {
            return Err(FilenameError::not_a_file_name(name));
        }

        let time_tag = match window {
            Some(window) => {
                let gps_second = decode_as(entry.filetype, name)?.gps_second();
                if !window.contains(gps_second) {
                    continue;
                }
                Some(gps_second)
            }
            None => None,
        };

        selected.push(RemoteFile {
            name: name.clone(),
            size: entry.size,
            product_type: entry.filetype,
            time_tag,
        });
    }

    Ok(selected)
}

fn is_bare_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::filename::unix_to_gps;

    fn manifest(entries: &[(&str, u32, u64)]) -> ObservationManifest {
        ObservationManifest {
            files: entries
                .iter()
                .map(|(name, filetype, size)| {
                    (
                        (*name).to_string(),
                        ManifestEntry {
                            filetype: ProductType::from(*filetype),
                            size: *size,
                        },
                    )
                })
                .collect(),
        }
    }

    fn names(files: &[RemoteFile]) -> Vec<&str> {
        files.iter().map(|file| file.name.as_str()).collect()
    }

    // ==================== Selector Tests ====================

    #[test]
    fn test_selector_combined_accepts_combined_and_ics() {
        let selector = ProductSelector::Combined;
        assert!(selector.accepts(ProductType::Combined));
        assert!(selector.accepts(ProductType::IcsOnly));
        assert!(!selector.accepts(ProductType::RawVoltage));
        assert!(!selector.accepts(ProductType::Recombined));
        assert!(!selector.accepts(ProductType::Other(8)));
    }

    #[test]
    fn test_selector_single_types_accept_only_themselves() {
        assert!(ProductSelector::RawVoltage.accepts(ProductType::RawVoltage));
        assert!(!ProductSelector::RawVoltage.accepts(ProductType::Combined));
        assert!(ProductSelector::Recombined.accepts(ProductType::Recombined));
        assert!(!ProductSelector::Recombined.accepts(ProductType::IcsOnly));
        assert!(ProductSelector::IcsOnly.accepts(ProductType::IcsOnly));
        assert!(!ProductSelector::IcsOnly.accepts(ProductType::Combined));
    }

    #[test]
    fn test_selector_from_str_accepts_names_and_codes() {
        assert_eq!("raw".parse(), Ok(ProductSelector::RawVoltage));
        assert_eq!("11".parse(), Ok(ProductSelector::RawVoltage));
        assert_eq!("Recombined".parse(), Ok(ProductSelector::Recombined));
        assert_eq!("15".parse(), Ok(ProductSelector::IcsOnly));
        assert_eq!("16".parse(), Ok(ProductSelector::Combined));
        assert!("8".parse::<ProductSelector>().is_err());
    }

    #[test]
    fn test_selector_default_is_combined() {
        assert_eq!(ProductSelector::default(), ProductSelector::Combined);
    }

    // ==================== Window Tests ====================

    #[test]
    fn test_window_is_inclusive_on_both_ends() {
        let window = TimeWindow::new(100, 10);
        assert!(!window.contains(99));
        assert!(window.contains(100));
        assert!(window.contains(110));
        assert!(!window.contains(111));
    }

    #[test]
    fn test_window_zero_duration_contains_only_start() {
        let window = TimeWindow::new(100, 0);
        assert!(window.contains(100));
        assert!(!window.contains(101));
    }

    // ==================== Filter Tests ====================

    #[test]
    fn test_filter_without_window_keeps_matching_types_without_decoding() {
        let manifest = manifest(&[
            ("not-a-valid-name.tar", 16, 10),
            ("1096952256_1096952256_ics.dat", 15, 20),
            ("1096952256_1096952256_vcs01_00001.dat", 11, 30),
            ("1096952256_gpubox01_00.fits", 8, 40),
        ]);

        let selected = filter_manifest(&manifest, ProductSelector::Combined, None).unwrap();

        assert_eq!(
            names(&selected),
            vec!["1096952256_1096952256_ics.dat", "not-a-valid-name.tar"]
        );
        assert!(selected.iter().all(|file| file.time_tag.is_none()));
    }

    #[test]
    fn test_filter_with_window_keeps_only_files_inside_window() {
        let manifest = manifest(&[
            ("1096952256_1096952199_combined.tar", 16, 1),
            ("1096952256_1096952200_combined.tar", 16, 2),
            ("1096952256_1096952250_ics.dat", 15, 3),
            ("1096952256_1096952300_combined.tar", 16, 4),
            ("1096952256_1096952301_combined.tar", 16, 5),
        ]);
        let window = TimeWindow::new(1_096_952_200, 100);

        let selected = filter_manifest(&manifest, ProductSelector::Combined, Some(window)).unwrap();

        assert_eq!(
            names(&selected),
            vec![
                "1096952256_1096952200_combined.tar",
                "1096952256_1096952250_ics.dat",
                "1096952256_1096952300_combined.tar",
            ]
        );
        assert_eq!(selected[1].time_tag, Some(1_096_952_250));
        assert_eq!(selected[1].size, 3);
    }

    #[test]
    fn test_filter_recombined_window_compares_in_gps_seconds() {
        let unix_time = 1_401_856_338;
        let gps = unix_to_gps(unix_time);
        let manifest = manifest(&[
            ("1070978272_1401856338_ch164.dat", 12, 7),
            ("1070978272_c_ch05_1401856400.dat", 12, 8),
        ]);

        let selected =
            filter_manifest(&manifest, ProductSelector::Recombined, Some(TimeWindow::new(gps, 0)))
                .unwrap();

        assert_eq!(names(&selected), vec!["1070978272_1401856338_ch164.dat"]);
        assert_eq!(selected[0].time_tag, Some(gps));
    }

    #[test]
    fn test_filter_with_window_fails_on_malformed_matching_entry() {
        let manifest = manifest(&[
            ("1096952256_1096952200_combined.tar", 16, 1),
            ("broken_name.tar", 16, 2),
        ]);

        let result =
            filter_manifest(&manifest, ProductSelector::Combined, Some(TimeWindow::new(0, 10)));

        assert!(matches!(result, Err(FilenameError::Malformed { .. })));
    }

    #[test]
    fn test_filter_with_window_ignores_malformed_non_matching_entry() {
        let manifest = manifest(&[
            ("1096952256_1096952200_combined.tar", 16, 1),
            ("broken_name.fits", 8, 2),
        ]);

        let selected = filter_manifest(
            &manifest,
            ProductSelector::Combined,
            Some(TimeWindow::new(1_096_952_200, 0)),
        )
        .unwrap();

        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_filter_rejects_names_with_directory_parts() {
        for bad in ["../escape.dat", "/tmp/abs.dat", "sub/a.dat", "..", "."] {
            let manifest = manifest(&[("ok.dat", 16, 1), (bad, 16, 2)]);
            let result = filter_manifest(&manifest, ProductSelector::Combined, None);
            assert_eq!(
                result,
                Err(FilenameError::not_a_file_name(bad)),
                "name: {bad}"
            );
        }
    }

    #[test]
    fn test_filter_ignores_unsafe_names_of_other_types() {
        let manifest = manifest(&[("ok.dat", 16, 1), ("../other.fits", 8, 2)]);
        let selected = filter_manifest(&manifest, ProductSelector::Combined, None).unwrap();
        assert_eq!(names(&selected), vec!["ok.dat"]);
    }

    #[test]
    fn test_manifest_without_files_key_is_rejected() {
        let result = serde_json::from_str::<ObservationManifest>(r#"{"error": "obs not found"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_manifest_deserializes_and_ignores_extra_fields() {
        let body = r#"{
            "obsid": 1096952256,
            "files": {
                "1096952256_1096952256_ics.dat": {"filetype": 15, "size": 1024, "host": "ngas01"}
            }
        }"#;

        let manifest: ObservationManifest = serde_json::from_str(body).unwrap();
        let entry = manifest.files["1096952256_1096952256_ics.dat"];
        assert_eq!(entry.filetype, ProductType::IcsOnly);
        assert_eq!(entry.size, 1024);
    }
}
