use manifest_gate::GateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("{0}")]
    Usage(String),
}

pub type CliResult<T> = std::result::Result<T, CliError>;

impl CliError {
    /// 1 when the manifest or upgrade was rejected, 2 when the input could not be used at all.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Gate(GateError::Validation(_)) | Self::Gate(GateError::Upgrade(_)) => 1,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifest_gate::{ManifestError, UpgradeError, ValidationError};

    #[test]
    fn test_exit_codes() {
        let rejected: CliError = GateError::from(ValidationError::range("KtlLogger", "PeriodicFlushTime", "x")).into();
        assert_eq!(rejected.exit_code(), 1);

        let immutable: CliError = GateError::from(UpgradeError::ImmutableSetting {
            section: "Setup".to_string(),
            parameter: "FabricDataRoot".to_string(),
            reason: "immutable".to_string(),
        })
        .into();
        assert_eq!(immutable.exit_code(), 1);

        let unreadable: CliError = GateError::from(ManifestError::Invalid {
            message: "empty".to_string(),
        })
        .into();
        assert_eq!(unreadable.exit_code(), 2);
        assert_eq!(CliError::Usage("no keys".to_string()).exit_code(), 2);
    }
}
