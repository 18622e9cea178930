use super::error::{AdbError, AdbResult};
use super::types::Device;
use crate::bot::{ActionPort, CapturePort, PortError};
use crate::template_matching::Image;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::process::Command;

/// Duration of the synthetic tap stroke, in milliseconds
pub const TAP_STROKE_MS: u32 = 100;
/// Length of the post-tap vibration, in milliseconds
pub const FEEDBACK_VIBRATE_MS: u32 = 80;

pub struct AdbShell {
    device: Device,
    screen_x: u32,
    screen_y: u32,
    /// Size of the last decoded screenshot, `width << 32 | height`; 0 until the first capture
    capture_size: AtomicU64,
}

impl AdbShell {
    async fn ensure_adb_available() -> AdbResult<()> {
        match Command::new("adb").arg("version").output().await {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(AdbError::CommandFailed {
                command: "version".to_string(),
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AdbError::AdbNotFound),
            Err(source) => Err(AdbError::Io {
                command: "version".to_string(),
                source,
            }),
        }
    }

    /// Attach to the device with the given serial, or the first available one
    pub async fn connect(serial: Option<&str>) -> AdbResult<Self> {
        let devices = Self::list_devices().await?;
        if devices.is_empty() {
            return Err(AdbError::NoDevices);
        }
        let device = match serial {
            Some(serial) => devices
                .into_iter()
                .find(|d| d.name == serial || d.transport_id.as_deref() == Some(serial))
                .ok_or_else(|| AdbError::DeviceNotFound {
                    serial: serial.to_string(),
                })?,
            None => devices.into_iter().next().ok_or(AdbError::NoDevices)?,
        };

        let mut shell = Self {
            device,
            screen_x: 0,
            screen_y: 0,
            capture_size: AtomicU64::new(0),
        };
        let stdout = shell.run(&["shell", "wm", "size"]).await?;
        let (screen_x, screen_y) = Self::parse_screen_size(&String::from_utf8_lossy(&stdout))?;
        shell.screen_x = screen_x;
        shell.screen_y = screen_y;
        log::info!(
            "📱 Connected to {} ({}x{})",
            shell.device.label(),
            screen_x,
            screen_y
        );
        Ok(shell)
    }

    /// Extract the effective display size from `wm size` output
    ///
    /// An `Override size` wins over the `Physical size` because screenshots and
    /// input both use the overridden resolution.
    pub fn parse_screen_size(stdout: &str) -> AdbResult<(u32, u32)> {
        let parse = |prefix: &str| {
            stdout.lines().find_map(|line| {
                let (x, y) = line.trim().strip_prefix(prefix)?.trim().split_once('x')?;
                Some((x.parse::<u32>().ok()?, y.parse::<u32>().ok()?))
            })
        };
        parse("Override size:")
            .or_else(|| parse("Physical size:"))
            .ok_or(AdbError::ScreenSizeParseFailed)
    }

    pub fn parse_devices(output: &str) -> Vec<Device> {
        output
            .lines()
            .skip(1)
            .filter_map(|line| {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 2 && parts[1] == "device" {
                    let field = |key: &str| {
                        parts[2..]
                            .iter()
                            .find_map(|part| part.strip_prefix(key).map(str::to_string))
                    };
                    Some(Device {
                        name: parts[0].to_string(),
                        transport_id: field("transport_id:"),
                        model: field("model:"),
                    })
                } else {
                    None
                }
            })
            .collect()
    }

    pub async fn list_devices() -> AdbResult<Vec<Device>> {
        Self::ensure_adb_available().await?;
        let output = Self::output(Command::new("adb").args(["devices", "-l"]), "devices -l").await?;
        Ok(Self::parse_devices(&String::from_utf8_lossy(&output)))
    }

    /// Run `adb -s <serial> <args>` and return stdout
    ///
    /// The child is killed if the returned future is dropped, so a caller-side
    /// timeout never leaves a stuck `adb` process behind.
    async fn run(&self, args: &[&str]) -> AdbResult<Vec<u8>> {
        let mut cmd = Command::new("adb");
        cmd.arg("-s").arg(&self.device.name).args(args).kill_on_drop(true);
        Self::output(&mut cmd, &args.join(" ")).await
    }

    async fn output(cmd: &mut Command, description: &str) -> AdbResult<Vec<u8>> {
        log::debug!("adb {description}");
        let output = cmd.output().await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                AdbError::AdbNotFound
            } else {
                AdbError::Io {
                    command: description.to_string(),
                    source,
                }
            }
        })?;
        if !output.status.success() {
            return Err(AdbError::CommandFailed {
                command: description.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }

    /// Raw PNG bytes of the current screen
    pub async fn screencap_png(&self) -> AdbResult<Vec<u8>> {
        let bytes = self.run(&["exec-out", "screencap", "-p"]).await?;
        if bytes.is_empty() {
            return Err(AdbError::Decode {
                description: "screencap returned no data".to_string(),
            });
        }
        Ok(bytes)
    }

    pub async fn screenshot(&self) -> AdbResult<Image> {
        let bytes = self.screencap_png().await?;
        let image = tokio::task::spawn_blocking(move || Image::decode(&bytes))
            .await
            .map_err(|e| AdbError::Decode {
                description: e.to_string(),
            })?
            .map_err(|e| AdbError::Decode {
                description: e.to_string(),
            })?;
        self.record_capture_size(image.width(), image.height());
        Ok(image)
    }

    /// Remember the frame size taps will be expressed in; follows rotation
    pub fn record_capture_size(&self, width: u32, height: u32) {
        let packed = (u64::from(width) << 32) | u64::from(height);
        self.capture_size.store(packed, Ordering::Relaxed);
    }

    /// Press and release at `(x, y)` as a short stationary swipe
    pub async fn tap(&self, x: u32, y: u32) -> AdbResult<()> {
        if !self.in_bounds(x, y) {
            return Err(AdbError::TapOutOfBounds { x, y });
        }
        let (x, y, stroke) = (x.to_string(), y.to_string(), TAP_STROKE_MS.to_string());
        self.run(&["shell", "input", "swipe", &x, &y, &x, &y, &stroke])
            .await
            .map(|_| ())
    }

    pub async fn vibrate(&self, millis: u32) -> AdbResult<()> {
        let millis = millis.to_string();
        self.run(&["shell", "cmd", "vibrator", "vibrate", &millis])
            .await
            .map(|_| ())
    }

    /// Taps are in screenshot coordinates, so the last capture's size bounds them.
    /// Before any capture the `wm size` reading is used.
    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        let (w, h) = self.tap_area();
        x < w && y < h
    }

    fn tap_area(&self) -> (u32, u32) {
        match self.capture_size.load(Ordering::Relaxed) {
            0 => (self.screen_x, self.screen_y),
            packed => ((packed >> 32) as u32, packed as u32),
        }
    }

    /// Display size reported by `wm size` at connect time
    pub fn screen_dimensions(&self) -> (u32, u32) {
        (self.screen_x, self.screen_y)
    }

    pub fn device_name(&self) -> &str {
        &self.device.name
    }
}

impl CapturePort for AdbShell {
    async fn capture(&self, _timeout: Duration) -> Result<Image, PortError> {
        Ok(self.screenshot().await?)
    }
}

impl ActionPort for AdbShell {
    async fn tap(&self, x: u32, y: u32) -> Result<(), PortError> {
        Ok(AdbShell::tap(self, x, y).await?)
    }

    async fn feedback(&self) -> Result<(), PortError> {
        Ok(self.vibrate(FEEDBACK_VIBRATE_MS).await?)
    }
}

#[cfg(test)]
impl AdbShell {
    pub(crate) fn offline(name: &str, screen_x: u32, screen_y: u32) -> Self {
        Self {
            device: Device {
                name: name.to_string(),
                transport_id: None,
                model: None,
            },
            screen_x,
            screen_y,
            capture_size: AtomicU64::new(0),
        }
    }
}
