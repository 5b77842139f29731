//! Export Settings
//!
//! One raster format for the whole run.

use serde::{Deserialize, Serialize};

pub const DEFAULT_JPEG_QUALITY: u8 = 10;
pub const MAX_JPEG_QUALITY: u8 = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default)]
    pub format: ExportFormat,
    /// Host JPEG quality scale, 0..=12. Ignored for PNG.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

fn default_jpeg_quality() -> u8 { DEFAULT_JPEG_QUALITY }

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ExportSettings {
    pub fn png() -> Self {
        Self::default()
    }

    /// JPEG with validated quality
    pub fn jpeg(quality: u8) -> Result<Self, &'static str> {
        let settings = Self {
            format: ExportFormat::Jpeg,
            jpeg_quality: quality,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.jpeg_quality > MAX_JPEG_QUALITY {
            return Err("JPEG quality must be between 0 and 12");
        }
        Ok(())
    }

    /// `name` plus this format's extension
    pub fn file_name(&self, name: &str) -> String {
        format!("{}.{}", name, self.format.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_quality_bounds() {
        assert!(ExportSettings::jpeg(12).is_ok());
        assert!(ExportSettings::jpeg(13).is_err());
    }

    #[test]
    fn test_file_name() {
        assert_eq!(ExportSettings::png().file_name("a_mockup"), "a_mockup.png");
        assert_eq!(ExportSettings::jpeg(8).unwrap().file_name("a_mockup_v2"), "a_mockup_v2.jpg");
    }

    #[test]
    fn test_deserialize_defaults() {
        let settings: ExportSettings = serde_json::from_str(r#"{"format": "jpeg"}"#).unwrap();
        assert_eq!(settings.format, ExportFormat::Jpeg);
        assert_eq!(settings.jpeg_quality, DEFAULT_JPEG_QUALITY);
    }
}
