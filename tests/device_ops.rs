//! Drives the facade end to end against a fake `adb` executable that
//! records its invocations and replays canned device output.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tempfile::TempDir;

use adb_bridge::{DeviceBridge, ErrorKind};

const FAKE_ADB: &str = r#"#!/bin/sh
dir="$(cd "$(dirname "$0")" && pwd)"
echo "$@" >> "$dir/calls.log"
if [ "$1" = "-s" ]; then
  shift 2
fi
case "$1" in
  devices)
    printf 'List of devices attached\nemulator-5554\tdevice\n\n'
    ;;
  connect)
    echo "connected to $2"
    ;;
  install)
    echo "Success"
    ;;
  pull)
    case "$2" in
      *pullfail*)
        echo "remote object does not exist" >&2
        exit 1
        ;;
      *.png)
        printf 'PNGDATA' > "$3"
        ;;
      *.xml)
        cat > "$3" <<'EOF'
<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<hierarchy rotation="0">
<node index="0" text="" class="android.widget.FrameLayout" bounds="[0,0][1080,2280]">
<node index="1" text="Sign in" resource-id="com.example:id/sign_in" clickable="true" bounds="[440,1000][640,1080]"/>
</node>
</hierarchy>
EOF
        ;;
    esac
    ;;
  shell)
    shift
    case "$*" in
      "wm size")
        echo "Physical size: 1080x2280"
        ;;
      "dumpsys battery")
        printf 'Current Battery Service state:\n  AC powered: false\n  USB powered: true\n  level: 87\n  Charge counter: 1234\n'
        ;;
      "pm list packages")
        printf 'package:com.example.app\r\npackage:com.android.settings\n'
        ;;
      "service check power")
        echo "Service power: found"
        ;;
      "service check nosuch")
        echo "Service nosuch: not found"
        ;;
    esac
    ;;
esac
exit 0
"#;

fn write_fake_adb(dir: &Path) -> PathBuf {
    let script = dir.join("adb");
    fs::write(&script, FAKE_ADB).expect("write fake adb");
    let mut perms = fs::metadata(&script).expect("stat fake adb").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script, perms).expect("chmod fake adb");
    script
}

fn bridge_in(dir: &Path) -> DeviceBridge {
    let script = write_fake_adb(dir);
    DeviceBridge::with_program(script.to_string_lossy().to_string()).work_dir(dir)
}

fn recorded_calls(dir: &Path) -> String {
    fs::read_to_string(dir.join("calls.log")).unwrap_or_default()
}

fn leftover_artifacts(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .expect("read work dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".png") || name.ends_with(".xml"))
        .collect()
}

#[tokio::test]
async fn tap_targets_the_selected_device() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    bridge.tap(10, 20, "emulator-5554").await.expect("tap");

    let calls = recorded_calls(dir.path());
    assert!(
        calls.contains("-s emulator-5554 shell input tap 10 20"),
        "calls: {calls}"
    );
}

#[tokio::test]
async fn swipe_passes_five_positional_arguments() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    bridge
        .swipe(0, 1200, 0, 300, 400, "emulator-5554")
        .await
        .expect("swipe");

    let calls = recorded_calls(dir.path());
    assert!(
        calls.contains("shell input swipe 0 1200 0 300 400"),
        "calls: {calls}"
    );
}

#[tokio::test]
async fn list_devices_omits_the_device_flag() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    let devices = bridge.list_devices().await.expect("list devices");

    assert_eq!(devices, vec!["emulator-5554"]);
    let calls = recorded_calls(dir.path());
    assert!(calls.starts_with("devices"), "calls: {calls}");
    assert!(!calls.contains("-s"), "calls: {calls}");
}

#[tokio::test]
async fn resolution_is_parsed_from_wm_size() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    let resolution = bridge
        .get_resolution("emulator-5554")
        .await
        .expect("resolution");

    assert_eq!(resolution.width, 1080);
    assert_eq!(resolution.height, 2280);
}

#[tokio::test]
async fn battery_snapshot_types_values() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    let snapshot = bridge.battery("emulator-5554").await.expect("battery");

    assert_eq!(snapshot.get("acPowered"), Some(&Value::Bool(false)));
    assert_eq!(snapshot.get("usbPowered"), Some(&Value::Bool(true)));
    assert_eq!(snapshot.get("level"), Some(&Value::from(87)));
    assert_eq!(snapshot.get("chargeCounter"), Some(&Value::from(1234)));
}

#[tokio::test]
async fn screenshot_returns_base64_and_cleans_up() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    let encoded = bridge.screenshot("emulator-5554").await.expect("screenshot");

    assert_eq!(encoded, STANDARD.encode("PNGDATA"));
    assert!(
        leftover_artifacts(dir.path()).is_empty(),
        "transient files left behind"
    );
    let calls = recorded_calls(dir.path());
    assert!(calls.contains("shell screencap -p /sdcard/"), "calls: {calls}");
    assert!(calls.contains("shell rm /sdcard/"), "calls: {calls}");
}

#[tokio::test]
async fn failed_pull_surfaces_process_error_without_artifacts() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    // The fake adb rejects pulls for this serial.
    let err = bridge
        .screenshot("pullfail")
        .await
        .expect_err("pull should fail");

    assert_eq!(err.kind, ErrorKind::Process);
    assert!(err.error.contains("STATUS: 1"), "error: {}", err.error);
    assert!(
        err.error.contains("remote object does not exist"),
        "error: {}",
        err.error
    );
    assert!(
        leftover_artifacts(dir.path()).is_empty(),
        "transient files left behind"
    );
}

#[tokio::test]
async fn dump_handle_answers_attribute_queries() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    let dump = bridge.dump_window_xml("emulator-5554").await.expect("dump");

    assert!(bridge.exists_in_dump(&dump, "Sign in", None).expect("query"));
    assert!(bridge
        .exists_in_dump(&dump, "com.example:id/sign_in", Some("resource-id"))
        .expect("query"));
    assert!(!bridge.exists_in_dump(&dump, "sign in", None).expect("query"));

    let err = bridge
        .exists_in_dump(&dump, "   ", None)
        .expect_err("blank query must fail");
    assert_eq!(err.kind, ErrorKind::Precondition);

    assert!(
        leftover_artifacts(dir.path()).is_empty(),
        "transient files left behind"
    );
}

#[tokio::test]
async fn locator_returns_innermost_node_for_point() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    let node = bridge
        .find_node_at_coordinates(500, 1040, "emulator-5554")
        .await
        .expect("lookup")
        .expect("point is inside the button");

    assert_eq!(
        node.attributes.get("resource-id").map(String::as_str),
        Some("com.example:id/sign_in")
    );

    let miss = bridge
        .find_node_at_coordinates(5000, 5000, "emulator-5554")
        .await
        .expect("lookup");
    assert!(miss.is_none());
}

#[tokio::test]
async fn app_exists_checks_membership() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    assert!(bridge
        .app_exists("com.example.app", "emulator-5554")
        .await
        .expect("app exists"));
    assert!(!bridge
        .app_exists("com.missing.app", "emulator-5554")
        .await
        .expect("app exists"));
}

#[tokio::test]
async fn blank_package_fails_before_invoking_adb() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    let err = bridge
        .app_exists("   ", "emulator-5554")
        .await
        .expect_err("blank package must fail");

    assert_eq!(err.kind, ErrorKind::Precondition);
    assert!(!err.is_retryable());
    assert!(
        !dir.path().join("calls.log").exists(),
        "runner must not be invoked"
    );
}

#[tokio::test]
async fn connect_reports_acknowledgement_without_device_flag() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    let connected = bridge
        .connect_device("192.168.0.12:5555")
        .await
        .expect("connect");

    assert!(connected);
    let calls = recorded_calls(dir.path());
    assert!(calls.starts_with("connect 192.168.0.12:5555"), "calls: {calls}");
}

#[tokio::test]
async fn service_check_detects_missing_services() {
    let dir = TempDir::new().expect("tempdir");
    let bridge = bridge_in(dir.path());

    assert!(bridge
        .service_check("power", "emulator-5554")
        .await
        .expect("service check"));
    assert!(!bridge
        .service_check("nosuch", "emulator-5554")
        .await
        .expect("service check"));
}
