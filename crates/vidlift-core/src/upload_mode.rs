use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::ConfigError;

/// Upload destination selected once at startup.
///
/// `viam-cloud` sends files to the device's managed ingestion endpoint;
/// `gcp-project` writes them to a Google Cloud Storage bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum UploadMode {
    #[serde(rename = "viam-cloud")]
    ViamCloud,
    #[serde(rename = "gcp-project")]
    GcpProject,
}

impl FromStr for UploadMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "viam-cloud" => Ok(UploadMode::ViamCloud),
            "gcp-project" => Ok(UploadMode::GcpProject),
            _ => Err(ConfigError::InvalidValue {
                field: "upload",
                reason: "'upload' must be 'viam-cloud' or 'gcp-project'".to_string(),
            }),
        }
    }
}

impl Display for UploadMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadMode::ViamCloud => write!(f, "viam-cloud"),
            UploadMode::GcpProject => write!(f, "gcp-project"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_modes() {
        assert_eq!("viam-cloud".parse::<UploadMode>().unwrap(), UploadMode::ViamCloud);
        assert_eq!(" GCP-Project ".parse::<UploadMode>().unwrap(), UploadMode::GcpProject);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = "s3".parse::<UploadMode>().unwrap_err();
        assert!(err.to_string().contains("viam-cloud"));
    }

    #[test]
    fn display_matches_config_spelling() {
        assert_eq!(UploadMode::GcpProject.to_string(), "gcp-project");
        assert_eq!(UploadMode::ViamCloud.to_string(), "viam-cloud");
    }
}
