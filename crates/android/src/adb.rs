//! adb device handling
//!
//! Parses `adb devices -l` and picks the device a step should target.

use deploid_core::{Error, ErrorCode, Result};
use serde::{Deserialize, Serialize};

/// Connection state reported by adb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceState {
    Online,
    Offline,
    Unauthorized,
    Other(String),
}

impl DeviceState {
    fn parse(state: &str) -> Self {
        match state {
            "device" => DeviceState::Online,
            "offline" => DeviceState::Offline,
            "unauthorized" => DeviceState::Unauthorized,
            other => DeviceState::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeviceState::Online => "device",
            DeviceState::Offline => "offline",
            DeviceState::Unauthorized => "unauthorized",
            DeviceState::Other(state) => state,
        }
    }
}

/// One line of `adb devices -l`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub serial: String,
    pub state: DeviceState,
    pub model: Option<String>,
    pub product: Option<String>,
}

impl Device {
    pub fn is_online(&self) -> bool {
        self.state == DeviceState::Online
    }

    pub fn is_emulator(&self) -> bool {
        self.serial.starts_with("emulator-")
    }

    /// `model`, falling back to `product`, then `-`
    pub fn label(&self) -> &str {
        self.model
            .as_deref()
            .or(self.product.as_deref())
            .unwrap_or("-")
    }
}

/// Parse `adb devices -l` output
pub fn parse_devices(output: &str) -> Vec<Device> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("List of devices") && !line.starts_with('*'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let serial = fields.next()?.to_string();
            let state = DeviceState::parse(fields.next()?);
            let mut device = Device {
                serial,
                state,
                model: None,
                product: None,
            };
            for field in fields {
                if let Some(model) = field.strip_prefix("model:") {
                    device.model = Some(model.replace('_', " "));
                } else if let Some(product) = field.strip_prefix("product:") {
                    device.product = Some(product.to_string());
                }
            }
            Some(device)
        })
        .collect()
}

/// Pick the target serial
///
/// An explicit request wins, then the configured default; otherwise the one
/// online device. Zero or several online devices without a choice is an error.
pub fn select_device(
    requested: Option<&str>,
    configured: Option<&str>,
    devices: &[Device],
) -> Result<String> {
    if let Some(serial) = requested.or(configured) {
        return match devices.iter().find(|d| d.serial == serial) {
            Some(device) if device.is_online() => Ok(device.serial.clone()),
            Some(device) => Err(device_error(format!(
                "Device {} is {}",
                serial,
                device.state.as_str()
            ))
            .with_suggestion(match device.state {
                DeviceState::Unauthorized => "Accept the USB debugging prompt on the device",
                _ => "Reconnect the device and check `deploid devices`",
            })),
            None => Err(device_error(format!("Device {} is not attached", serial))
                .with_context(attached_summary(devices))
                .with_suggestion("Check `deploid devices` for available serials")),
        };
    }

    let online: Vec<&Device> = devices.iter().filter(|d| d.is_online()).collect();
    match online.as_slice() {
        [device] => Ok(device.serial.clone()),
        [] => Err(device_error("No Android device connected")
            .with_context(attached_summary(devices))
            .with_suggestion("Connect a device with USB debugging enabled or start an emulator")),
        _ => Err(device_error(format!("{} devices connected", online.len()))
            .with_context(attached_summary(devices))
            .with_suggestion("Choose one with --device <serial> or set android.device")),
    }
}

fn device_error(message: impl Into<String>) -> Error {
    Error::native(ErrorCode::DeviceNotFound, message)
}

fn attached_summary(devices: &[Device]) -> String {
    if devices.is_empty() {
        return "adb reports no devices".to_string();
    }
    devices
        .iter()
        .map(|d| format!("{} ({}, {})", d.serial, d.state.as_str(), d.label()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First PID from `pidof` output
pub fn parse_pid(output: &str) -> Option<u32> {
    output.split_whitespace().next()?.parse().ok()
}

/// Whether `adb uninstall` output means the package was absent
pub fn is_not_installed(output: &str) -> bool {
    output.contains("DELETE_FAILED_INTERNAL_ERROR")
        || output.contains("Unknown package")
        || output.contains("not installed")
}
