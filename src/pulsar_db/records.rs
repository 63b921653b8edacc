//! Request records for the pulsar database's create, update and upload calls.
//!
//! Each record flattens into `(field, value)` pairs. Unset optional fields are
//! omitted and booleans are sent as `True`/`False`, which is what the server
//! parses.

/// Form-encodable request record.
pub trait FormFields {
    /// Returns the record as ordered `(field, value)` pairs.
    fn form_fields(&self) -> Vec<(&'static str, String)>;
}

fn flag(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

fn push_opt<T: ToString>(fields: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<T>) {
    if let Some(value) = value {
        fields.push((key, value.to_string()));
    }
}

/// A calibrator to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCalibrator {
    /// Observation id of the calibrator.
    pub observation_id: u64,
    /// Calibrator type id.
    pub caltype: u32,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl FormFields for NewCalibrator {
    fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("observationid", self.observation_id.to_string()),
            ("caltype", self.caltype.to_string()),
        ];
        push_opt(&mut fields, "notes", self.notes.as_deref());
        fields
    }
}

/// A pulsar to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPulsar {
    /// Pulsar name (e.g. `J0437-4715`).
    pub name: String,
    /// Right ascension.
    pub ra: String,
    /// Declination.
    pub dec: String,
}

impl FormFields for NewPulsar {
    fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("name", self.name.clone()),
            ("ra", self.ra.clone()),
            ("dec", self.dec.clone()),
        ]
    }
}

/// Observation layout of a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationType {
    /// Contiguous coarse channels.
    Contiguous,
    /// Picket-fence channel selection.
    PicketFence,
}

impl ObservationType {
    /// Numeric id used by the database.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Contiguous => 1,
            Self::PicketFence => 2,
        }
    }
}

/// A pulsar detection, created or updated as one record.
///
/// `observation_id`, `pulsar`, `subband` and `coherent` identify the detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Observation id.
    pub observation_id: u64,
    /// Pulsar name.
    pub pulsar: String,
    /// Subband of the detection.
    pub subband: u32,
    /// Coherent (`true`) or incoherent (`false`) beam.
    pub coherent: bool,
    /// Observation layout.
    pub observation_type: ObservationType,
    /// Calibrator id.
    pub calibrator: Option<u64>,
    /// First coarse channel.
    pub start_cchan: Option<u32>,
    /// Last coarse channel.
    pub stop_cchan: Option<u32>,
    /// Flux density (mJy).
    pub flux: Option<f64>,
    /// Flux density error (mJy).
    pub flux_error: Option<f64>,
    /// Pulse width (ms).
    pub width: Option<f64>,
    /// Pulse width error (ms).
    pub width_error: Option<f64>,
    /// Scattering time (s).
    pub scattering: Option<f64>,
    /// Scattering time error (s).
    pub scattering_error: Option<f64>,
    /// Dispersion measure (pc/cm³).
    pub dm: Option<f64>,
    /// Dispersion measure error (pc/cm³).
    pub dm_error: Option<f64>,
    /// Client script version.
    pub version: u32,
}

impl Detection {
    /// Creates a detection with only the identifying fields set.
    #[must_use]
    pub fn new(observation_id: u64, pulsar: impl Into<String>, subband: u32, coherent: bool) -> Self {
        Self {
            observation_id,
            pulsar: pulsar.into(),
            subband,
            coherent,
            observation_type: ObservationType::Contiguous,
            calibrator: None,
            start_cchan: None,
            stop_cchan: None,
            flux: None,
            flux_error: None,
            width: None,
            width_error: None,
            scattering: None,
            scattering_error: None,
            dm: None,
            dm_error: None,
            version: 1,
        }
    }
}

impl FormFields for Detection {
    fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("observationid", self.observation_id.to_string()),
            ("pulsar", self.pulsar.clone()),
            ("subband", self.subband.to_string()),
            ("coherent", flag(self.coherent)),
            ("observation_type", self.observation_type.code().to_string()),
        ];
        push_opt(&mut fields, "calibrator", self.calibrator);
        push_opt(&mut fields, "startcchan", self.start_cchan);
        push_opt(&mut fields, "stopcchan", self.stop_cchan);
        push_opt(&mut fields, "flux", self.flux);
        push_opt(&mut fields, "flux_error", self.flux_error);
        push_opt(&mut fields, "width", self.width);
        push_opt(&mut fields, "width_error", self.width_error);
        push_opt(&mut fields, "scattering", self.scattering);
        push_opt(&mut fields, "scattering_error", self.scattering_error);
        push_opt(&mut fields, "dm", self.dm);
        push_opt(&mut fields, "dm_error", self.dm_error);
        fields.push(("version", self.version.to_string()));
        fields
    }
}

/// Kind of file attached to a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionFileType {
    /// Folded archive.
    Archive,
    /// Time series.
    Timeseries,
    /// Diagnostic plots.
    Diagnostics,
    /// Calibration solution.
    CalibrationSolution,
}

impl DetectionFileType {
    /// Numeric id used by the database.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Archive => 1,
            Self::Timeseries => 2,
            Self::Diagnostics => 3,
            Self::CalibrationSolution => 4,
        }
    }
}

/// Identifies the detection an uploaded file belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionFile {
    /// Observation id.
    pub observation_id: u64,
    /// Pulsar name.
    pub pulsar: String,
    /// Subband of the detection.
    pub subband: u32,
    /// Coherent beam.
    pub coherent: bool,
    /// Kind of file.
    pub filetype: DetectionFileType,
}

impl FormFields for DetectionFile {
    fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("observationid", self.observation_id.to_string()),
            ("pulsar", self.pulsar.clone()),
            ("subband", self.subband.to_string()),
            ("coherent", flag(self.coherent)),
            ("filetype", self.filetype.code().to_string()),
        ]
    }
}

/// Identifies the calibrator an uploaded file belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibratorFile {
    /// Observation id of the calibrator.
    pub observation_id: u64,
    /// Calibrator type id.
    pub caltype: u32,
}

impl FormFields for CalibratorFile {
    fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("observationid", self.observation_id.to_string()),
            ("caltype", self.caltype.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_omits_unset_fields() {
        let detection = Detection::new(1_096_952_256, "J0437-4715", 3, true);
        let fields = detection.form_fields();
        let keys: Vec<&str> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["observationid", "pulsar", "subband", "coherent", "observation_type", "version"]
        );
        assert!(fields.contains(&("coherent", "True".to_string())));
        assert!(fields.contains(&("version", "1".to_string())));
    }

    #[test]
    fn test_detection_includes_measurements() {
        let mut detection = Detection::new(1, "J0534+2200", 1, false);
        detection.dm = Some(56.77);
        detection.calibrator = Some(9);
        detection.observation_type = ObservationType::PicketFence;
        let fields = detection.form_fields();
        assert!(fields.contains(&("dm", "56.77".to_string())));
        assert!(fields.contains(&("calibrator", "9".to_string())));
        assert!(fields.contains(&("coherent", "False".to_string())));
        assert!(fields.contains(&("observation_type", "2".to_string())));
    }

    #[test]
    fn test_new_calibrator_notes_optional() {
        let calibrator = NewCalibrator {
            observation_id: 5,
            caltype: 2,
            notes: None,
        };
        assert_eq!(calibrator.form_fields().len(), 2);
    }

    #[test]
    fn test_detection_file_type_codes() {
        assert_eq!(DetectionFileType::Archive.code(), 1);
        assert_eq!(DetectionFileType::CalibrationSolution.code(), 4);
    }
}
