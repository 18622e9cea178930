use crate::bot::PortError;
use thiserror::Error;

/// A specialized `Result` type for ADB operations.
pub type AdbResult<T> = Result<T, AdbError>;

/// The error type for all ADB-related operations.
#[derive(Debug, Error)]
pub enum AdbError {
    #[error(
        "'adb' binary not found in PATH. Install Android Platform Tools (https://developer.android.com/tools/adb) or add 'adb' to PATH."
    )]
    AdbNotFound,

    #[error("Failed to invoke 'adb {command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'adb {command}' failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("No devices available. Connect a device and authorize USB debugging.")]
    NoDevices,

    #[error("Device '{serial}' not found")]
    DeviceNotFound { serial: String },

    #[error("Could not parse screen size from 'wm size' output.")]
    ScreenSizeParseFailed,

    #[error("Failed to decode screenshot: {description}")]
    Decode { description: String },

    #[error("Tap coordinates are out of bounds: x={x}, y={y}")]
    TapOutOfBounds { x: u32, y: u32 },
}

impl From<AdbError> for PortError {
    fn from(err: AdbError) -> Self {
        match err {
            AdbError::CommandFailed { .. } | AdbError::TapOutOfBounds { .. } => {
                PortError::Rejected(err.to_string())
            }
            AdbError::DeviceNotFound { .. } => PortError::NotFound(err.to_string()),
            _ => PortError::Unavailable(err.to_string()),
        }
    }
}
