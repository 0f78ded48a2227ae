use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adb::parse::{
    parse_battery_dump, parse_device_list, parse_package_list, parse_physical_size, BoolCoercion,
    Resolution,
};
use crate::adb::runner::AdbRunner;
use crate::config::{resolve_adb_program, validate_adb_program};
use crate::error::BridgeError;
use crate::ui_dump::{node_at_point, parse_dump_nodes, UiDump, UiNode};

/// One facade method per device capability. Operations are independent and
/// hold no cross-call state; transient screenshot/dump files are written
/// under `work_dir` and removed before the operation returns.
#[derive(Debug, Clone)]
pub struct DeviceBridge {
    runner: AdbRunner,
    work_dir: PathBuf,
    bool_coercion: BoolCoercion,
}

fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}

/// UTC ISO timestamp with punctuation stripped, e.g. `20260823T101112345Z`.
/// Qualifies artifact filenames so concurrent calls for different devices
/// cannot collide.
fn timestamp_stamp() -> String {
    Utc::now().format("%Y%m%dT%H%M%S%3fZ").to_string()
}

fn ensure_non_empty(value: &str, field: &str, trace_id: &str) -> Result<(), BridgeError> {
    if value.trim().is_empty() {
        return Err(BridgeError::precondition(
            format!("{field} is required"),
            trace_id,
        ));
    }
    Ok(())
}

/// Removes a pulled artifact. Janitorial only: failure is logged, never
/// escalated, and a file that was never produced is not worth a warning.
async fn remove_local_artifact(path: &Path, trace_id: &str) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            warn!(trace_id = %trace_id, path = %path.display(), error = %err, "failed to remove local artifact");
        }
    }
}

impl Default for DeviceBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceBridge {
    pub fn new() -> Self {
        Self::with_program(resolve_adb_program(""))
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            runner: AdbRunner::new(program),
            work_dir: PathBuf::from("."),
            bool_coercion: BoolCoercion::default(),
        }
    }

    /// Builds a bridge from a configured adb path, validating that the
    /// executable exists before any operation runs.
    pub fn from_config(configured_path: &str) -> Result<Self, BridgeError> {
        let trace_id = new_trace_id();
        let program = resolve_adb_program(configured_path);
        validate_adb_program(&program)
            .map_err(|message| BridgeError::precondition(message, &trace_id))?;
        Ok(Self::with_program(program))
    }

    /// Directory for transient screenshot/dump files. Defaults to the
    /// working directory.
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Selects how battery boolean literals are interpreted; see
    /// [`BoolCoercion`].
    pub fn bool_coercion(mut self, coercion: BoolCoercion) -> Self {
        self.bool_coercion = coercion;
        self
    }

    pub fn adb_program(&self) -> &str {
        self.runner.program()
    }

    pub async fn tap(&self, x: i64, y: i64, device: &str) -> Result<(), BridgeError> {
        let trace_id = new_trace_id();
        info!(trace_id = %trace_id, device = %device, x, y, "tap");
        let (x, y) = (x.to_string(), y.to_string());
        self.runner
            .run(&["shell", "input", "tap", &x, &y], device, &trace_id)
            .await?;
        Ok(())
    }

    pub async fn swipe(
        &self,
        x1: i64,
        y1: i64,
        x2: i64,
        y2: i64,
        duration_ms: u64,
        device: &str,
    ) -> Result<(), BridgeError> {
        let trace_id = new_trace_id();
        info!(trace_id = %trace_id, device = %device, x1, y1, x2, y2, duration_ms, "swipe");
        let (x1, y1, x2, y2, duration) = (
            x1.to_string(),
            y1.to_string(),
            x2.to_string(),
            y2.to_string(),
            duration_ms.to_string(),
        );
        self.runner
            .run(
                &["shell", "input", "swipe", &x1, &y1, &x2, &y2, &duration],
                device,
                &trace_id,
            )
            .await?;
        Ok(())
    }

    /// Types `text` on the device. The text is inserted into the command
    /// line verbatim; callers own escaping and validation, this layer
    /// accepts pre-validated arguments only.
    pub async fn input_text(&self, text: &str, device: &str) -> Result<(), BridgeError> {
        let trace_id = new_trace_id();
        info!(trace_id = %trace_id, device = %device, length = text.len(), "input text");
        self.runner
            .run(&["shell", "input", "text", text], device, &trace_id)
            .await?;
        Ok(())
    }

    /// Captures a screenshot and returns it base64-encoded. The device-side
    /// and local copies are both removed before returning; the device-side
    /// removal is best effort.
    pub async fn screenshot(&self, device: &str) -> Result<String, BridgeError> {
        let trace_id = new_trace_id();
        let file_name = format!("{device}_{}.png", timestamp_stamp());
        let device_path = format!("/sdcard/{file_name}");
        info!(trace_id = %trace_id, device = %device, file = %file_name, "screenshot");

        self.runner
            .run(&["shell", "screencap", "-p", &device_path], device, &trace_id)
            .await?;
        let bytes = self.pull_and_read(&device_path, &file_name, device, &trace_id).await?;
        Ok(STANDARD.encode(bytes))
    }

    /// Retrieves a fresh UI-hierarchy snapshot. The returned [`UiDump`] is
    /// the handle for all subsequent queries; no dump state lingers on disk
    /// or in the bridge.
    pub async fn dump_window_xml(&self, device: &str) -> Result<UiDump, BridgeError> {
        let trace_id = new_trace_id();
        let stamp = timestamp_stamp();
        let file_name = format!("window_dump_{device}_{stamp}.xml");
        let device_path = format!("/sdcard/{file_name}");
        info!(trace_id = %trace_id, device = %device, file = %file_name, "ui dump");

        self.runner
            .run(
                &["shell", "uiautomator", "dump", &device_path],
                device,
                &trace_id,
            )
            .await?;
        let bytes = self.pull_and_read(&device_path, &file_name, device, &trace_id).await?;
        Ok(UiDump {
            device: device.to_string(),
            captured_at: stamp,
            xml: String::from_utf8_lossy(&bytes).to_string(),
        })
    }

    /// Whether `prop="query"` (default prop `text`) occurs anywhere in the
    /// dump. Case-sensitive, independent of line breaks.
    pub fn exists_in_dump(
        &self,
        dump: &UiDump,
        query: &str,
        prop: Option<&str>,
    ) -> Result<bool, BridgeError> {
        let trace_id = new_trace_id();
        ensure_non_empty(query, "query", &trace_id)?;
        Ok(dump.contains_attribute(query, prop))
    }

    pub async fn get_resolution(&self, device: &str) -> Result<Resolution, BridgeError> {
        let trace_id = new_trace_id();
        info!(trace_id = %trace_id, device = %device, "get resolution");
        let output = self
            .runner
            .run(&["shell", "wm", "size"], device, &trace_id)
            .await?;
        parse_physical_size(&output).ok_or_else(|| {
            BridgeError::process(
                format!("unexpected wm size output: {}", output.trim()),
                &trace_id,
            )
        })
    }

    pub async fn list_installed_apps(&self, device: &str) -> Result<Vec<String>, BridgeError> {
        let trace_id = new_trace_id();
        info!(trace_id = %trace_id, device = %device, "list installed apps");
        let output = self
            .runner
            .run(&["shell", "pm", "list", "packages"], device, &trace_id)
            .await?;
        Ok(parse_package_list(&output))
    }

    /// Membership test against the installed package list. Fails before
    /// invoking adb when the package name is blank.
    pub async fn app_exists(&self, package: &str, device: &str) -> Result<bool, BridgeError> {
        let trace_id = new_trace_id();
        ensure_non_empty(package, "package", &trace_id)?;
        let apps = self.list_installed_apps(device).await?;
        Ok(apps.iter().any(|installed| installed == package))
    }

    pub async fn clear_app_cache(&self, package: &str, device: &str) -> Result<(), BridgeError> {
        let trace_id = new_trace_id();
        ensure_non_empty(package, "package", &trace_id)?;
        info!(trace_id = %trace_id, device = %device, package = %package, "clear app cache");
        self.runner
            .run(&["shell", "pm", "clear", package], device, &trace_id)
            .await?;
        Ok(())
    }

    pub async fn open_app(&self, package: &str, device: &str) -> Result<(), BridgeError> {
        let trace_id = new_trace_id();
        ensure_non_empty(package, "package", &trace_id)?;
        info!(trace_id = %trace_id, device = %device, package = %package, "open app");
        self.runner
            .run(
                &[
                    "shell",
                    "monkey",
                    "-p",
                    package,
                    "-c",
                    "android.intent.category.LAUNCHER",
                    "1",
                ],
                device,
                &trace_id,
            )
            .await?;
        Ok(())
    }

    pub async fn install_app(&self, apk_path: &str, device: &str) -> Result<(), BridgeError> {
        let trace_id = new_trace_id();
        ensure_non_empty(apk_path, "apk_path", &trace_id)?;
        info!(trace_id = %trace_id, device = %device, apk_path = %apk_path, "install app");
        self.runner
            .run(&["install", apk_path], device, &trace_id)
            .await?;
        Ok(())
    }

    pub async fn go_to_home(&self, device: &str) -> Result<(), BridgeError> {
        let trace_id = new_trace_id();
        info!(trace_id = %trace_id, device = %device, "go to home");
        self.runner
            .run(
                &["shell", "input", "keyevent", "KEYCODE_HOME"],
                device,
                &trace_id,
            )
            .await?;
        Ok(())
    }

    /// Connects to a device over TCP/IP. Targets by address argument, so no
    /// device-selection flag is applied. Reports whether adb acknowledged
    /// the connection ("connected" anywhere in the output, which also covers
    /// "already connected").
    pub async fn connect_device(&self, address: &str) -> Result<bool, BridgeError> {
        let trace_id = new_trace_id();
        ensure_non_empty(address, "address", &trace_id)?;
        info!(trace_id = %trace_id, address = %address, "connect device");
        let output = self.runner.run(&["connect", address], "", &trace_id).await?;
        Ok(output.contains("connected"))
    }

    /// Pure delay; no process is spawned.
    pub async fn wait_in_milliseconds(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Whether the named system service is registered ("not found" absent
    /// from the `service check` output).
    pub async fn service_check(&self, service: &str, device: &str) -> Result<bool, BridgeError> {
        let trace_id = new_trace_id();
        ensure_non_empty(service, "service", &trace_id)?;
        info!(trace_id = %trace_id, device = %device, service = %service, "service check");
        let output = self
            .runner
            .run(&["shell", "service", "check", service], device, &trace_id)
            .await?;
        Ok(!output.contains("not found"))
    }

    pub async fn battery(&self, device: &str) -> Result<HashMap<String, Value>, BridgeError> {
        let trace_id = new_trace_id();
        info!(trace_id = %trace_id, device = %device, "battery");
        let output = self
            .runner
            .run(&["shell", "dumpsys", "battery"], device, &trace_id)
            .await?;
        Ok(parse_battery_dump(&output, self.bool_coercion))
    }

    pub async fn list_devices(&self) -> Result<Vec<String>, BridgeError> {
        let trace_id = new_trace_id();
        info!(trace_id = %trace_id, "list devices");
        let output = self.runner.run(&["devices"], "", &trace_id).await?;
        Ok(parse_device_list(&output))
    }

    /// Fresh dump composed with the spatial locator: the attributes of the
    /// smallest on-screen element containing the point, or `None`.
    pub async fn find_node_at_coordinates(
        &self,
        x: i64,
        y: i64,
        device: &str,
    ) -> Result<Option<UiNode>, BridgeError> {
        let dump = self.dump_window_xml(device).await?;
        let nodes = parse_dump_nodes(&dump.xml);
        Ok(node_at_point(&nodes, x, y).cloned())
    }

    /// Shared pull-read-cleanup tail of screenshot and dump: pull the
    /// device-side artifact into `work_dir`, read it, then delete the local
    /// copy (even when the read failed) and best-effort remove the
    /// device-side copy.
    async fn pull_and_read(
        &self,
        device_path: &str,
        file_name: &str,
        device: &str,
        trace_id: &str,
    ) -> Result<Vec<u8>, BridgeError> {
        let local_path = self.work_dir.join(file_name);
        let local = local_path.to_string_lossy().to_string();

        let pulled = self
            .runner
            .run(&["pull", device_path, &local], device, trace_id)
            .await;
        let read = match pulled {
            Ok(_) => tokio::fs::read(&local_path).await.map_err(|err| {
                BridgeError::io(format!("failed to read {local}: {err}"), trace_id)
            }),
            Err(err) => Err(err),
        };

        remove_local_artifact(&local_path, trace_id).await;
        if let Err(err) = self
            .runner
            .run(&["shell", "rm", device_path], device, trace_id)
            .await
        {
            warn!(trace_id = %trace_id, path = %device_path, error = %err, "failed to remove device-side artifact");
        }

        read
    }
}
