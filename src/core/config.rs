//! Filter parameters for one masking pass.
//!
//! A [`FilterConfig`] is an immutable record of 15 bounded integers. The JSON
//! form uses the same field names the parameter files have always used
//! (`hMin`, `sAdd`, `clahe`, ...), so files written by older tooling load
//! unchanged.
//!
//! Bounds are checked when a record is loaded, but `min <= max` is not: a
//! degenerate range is legal and simply produces an empty mask.

use crate::core::error::{ConfigError, FieldViolation, Violation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// File name used when dumping the parameters of an interactive session.
pub const PARAMETER_DUMP_FILE: &str = "hsv_parameters_from_GUI.json";

/// Largest hue value in the 8-bit HSV representation.
pub const HUE_MAX: i64 = 179;

/// Largest strength level for blur and close.
pub const STRENGTH_MAX: i64 = 20;

/// Largest object/hole area threshold, in pixels.
pub const AREA_MAX: i64 = 25_000;

/// Field name and inclusive bounds, in schema order.
pub const FIELD_BOUNDS: [(&str, i64, i64); 15] = [
    ("hMin", 0, HUE_MAX),
    ("sMin", 0, 255),
    ("vMin", 0, 255),
    ("hMax", 0, HUE_MAX),
    ("sMax", 0, 255),
    ("vMax", 0, 255),
    ("sAdd", 0, 255),
    ("sSub", 0, 255),
    ("vAdd", 0, 255),
    ("vSub", 0, 255),
    ("clahe", 0, 1),
    ("blur", 0, STRENGTH_MAX),
    ("close", 0, STRENGTH_MAX),
    ("object", 0, AREA_MAX),
    ("hole", 0, AREA_MAX),
];

/// Parameters of one masking pass.
///
/// Built once per export run, or once per displayed frame when parameters
/// are being tuned interactively. Never mutated while a pipeline uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    /// Lower hue bound, [0, 179]
    pub h_min: u8,
    /// Lower saturation bound
    pub s_min: u8,
    /// Lower value bound
    pub v_min: u8,
    /// Upper hue bound, [0, 179]
    pub h_max: u8,
    /// Upper saturation bound
    pub s_max: u8,
    /// Upper value bound
    pub v_max: u8,
    /// Amount added to saturation before thresholding
    pub s_add: u8,
    /// Amount subtracted from saturation, and also from value
    pub s_sub: u8,
    /// Amount added to value before thresholding
    pub v_add: u8,
    /// Carried for round-tripping; the value channel subtracts `s_sub`.
    pub v_sub: u8,
    /// 1 enables CLAHE before thresholding
    pub clahe: u8,
    /// Gaussian blur strength, [0, 20]
    pub blur: u8,
    /// Morphological close strength, [0, 20]
    pub close: u8,
    /// Regions smaller than this many pixels are removed
    pub object: u32,
    /// Holes smaller than this many pixels are filled
    pub hole: u32,
}

impl Default for FilterConfig {
    /// Full HSV range with every adjustment disabled.
    fn default() -> Self {
        Self {
            h_min: 0,
            s_min: 0,
            v_min: 0,
            h_max: HUE_MAX as u8,
            s_max: 255,
            v_max: 255,
            s_add: 0,
            s_sub: 0,
            v_add: 0,
            v_sub: 0,
            clahe: 0,
            blur: 0,
            close: 0,
            object: 0,
            hole: 0,
        }
    }
}

impl FilterConfig {
    /// Starting point for interactive tuning.
    pub fn gui_defaults() -> Self {
        Self {
            h_min: 96,
            s_min: 169,
            blur: 10,
            object: 20_000,
            hole: 300,
            ..Self::default()
        }
    }

    /// Whether CLAHE is switched on.
    pub fn clahe_enabled(&self) -> bool {
        self.clahe != 0
    }

    /// Load and validate a parameter file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&text)?;
        log::debug!("Loaded filter parameters from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(&value)
    }

    /// Validate a JSON value against the field bounds, then convert it.
    ///
    /// All violations are collected before failing so the caller can report
    /// them together.
    pub fn from_json_value(value: &Value) -> Result<Self, ConfigError> {
        let object = value.as_object().ok_or(ConfigError::NotAnObject)?;

        let mut fields = serde_json::Map::new();
        let mut violations = Vec::new();
        for &(field, min, max) in FIELD_BOUNDS.iter() {
            let problem = match object.get(field) {
                None => Violation::Missing,
                Some(v) => match integer_value(v) {
                    Some(n) if (min..=max).contains(&n) => {
                        fields.insert(field.to_string(), Value::from(n));
                        continue;
                    }
                    Some(n) => Violation::OutOfRange(n),
                    None => Violation::NotInteger(v.to_string()),
                },
            };
            violations.push(FieldViolation {
                field: field.to_string(),
                problem,
                min,
                max,
            });
        }

        if !violations.is_empty() {
            return Err(ConfigError::Invalid(violations));
        }

        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    /// Check a record built in code (e.g. from command-line overrides).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let value = serde_json::to_value(self)?;
        Self::from_json_value(&value).map(|_| ())
    }

    /// Serialize to pretty JSON using the parameter-file field names.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the parameters to [`PARAMETER_DUMP_FILE`] inside `dir`.
    pub fn save_to_dir(&self, dir: &Path) -> Result<PathBuf, ConfigError> {
        let path = dir.join(PARAMETER_DUMP_FILE);
        let json = self.to_json_string()?;
        std::fs::write(&path, json).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        log::info!("Filter parameters exported to {}", path.display());
        Ok(path)
    }
}

/// Integer value of a JSON number, accepting floats with no fractional part
/// (`3.0`) the way JSON Schema's `integer` type does.
fn integer_value(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64).then(|| f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_record() -> Value {
        json!({
            "hMin": 10, "sMin": 20, "vMin": 30, "hMax": 170, "sMax": 250, "vMax": 240,
            "sAdd": 1, "sSub": 2, "vAdd": 3, "vSub": 4,
            "clahe": 1, "blur": 5, "close": 6, "object": 700, "hole": 80
        })
    }

    #[test]
    fn test_load_valid_record() {
        let config = FilterConfig::from_json_value(&full_record()).unwrap();
        assert_eq!(config.h_min, 10);
        assert_eq!(config.v_sub, 4);
        assert!(config.clahe_enabled());
        assert_eq!(config.object, 700);
        assert_eq!(config.hole, 80);
    }

    #[test]
    fn test_degenerate_range_is_accepted() {
        let mut record = full_record();
        record["hMin"] = json!(150);
        record["hMax"] = json!(20);
        let config = FilterConfig::from_json_value(&record).unwrap();
        assert!(config.h_min > config.h_max);
    }

    #[test]
    fn test_collects_all_violations_in_field_order() {
        let mut record = full_record();
        record["hMax"] = json!(180);
        record["object"] = json!(-1);
        record["blur"] = json!("soft");
        record.as_object_mut().unwrap().remove("hole");

        let err = FilterConfig::from_json_value(&record).unwrap_err();
        let fields: Vec<&str> = err.violations().iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["hMax", "blur", "object", "hole"]);
        assert_eq!(err.violations()[0].problem, Violation::OutOfRange(180));
        assert_eq!(err.violations()[3].problem, Violation::Missing);
        assert!(matches!(err.violations()[1].problem, Violation::NotInteger(_)));
    }

    #[test]
    fn test_rejects_non_object() {
        let err = FilterConfig::from_json_str("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ConfigError::NotAnObject));

        let err = FilterConfig::from_json_str("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_float_is_not_an_integer() {
        let mut record = full_record();
        record["sAdd"] = json!(1.5);
        let err = FilterConfig::from_json_value(&record).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].field, "sAdd");
    }

    #[test]
    fn test_integral_float_is_an_integer() {
        let mut record = full_record();
        record["blur"] = json!(5.0);
        record["object"] = json!(7e2);
        let config = FilterConfig::from_json_value(&record).unwrap();
        assert_eq!(config.blur, 5);
        assert_eq!(config.object, 700);

        record["hMax"] = json!(180.0);
        let err = FilterConfig::from_json_value(&record).unwrap_err();
        assert_eq!(err.violations()[0].problem, Violation::OutOfRange(180));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let mut record = full_record();
        record["comment"] = json!("tuned on clip 3");
        assert!(FilterConfig::from_json_value(&record).is_ok());
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(FilterConfig::default()).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), FIELD_BOUNDS.len());
        for (field, _, _) in FIELD_BOUNDS {
            assert!(object.contains_key(field), "missing {}", field);
        }
    }

    #[test]
    fn test_validate_in_code_record() {
        assert!(FilterConfig::default().validate().is_ok());
        assert!(FilterConfig::gui_defaults().validate().is_ok());

        let config = FilterConfig {
            h_max: 200,
            blur: 21,
            ..FilterConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_save_and_load_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = FilterConfig::gui_defaults();

        let path = config.save_to_dir(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), PARAMETER_DUMP_FILE);

        let loaded = FilterConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FilterConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
