use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

/// How battery boolean literals are interpreted. The tool this crate
/// descends from coerced any non-empty value string to `true`, so the
/// literal `false` also came back as `true`. `Literal` is the corrected
/// default; `Legacy` reproduces the old behavior byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoolCoercion {
    #[default]
    Literal,
    Legacy,
}

fn rename_battery_key(raw: &str) -> &str {
    match raw {
        "AC powered" => "acPowered",
        "USB powered" => "usbPowered",
        "Wireless powered" => "wirelessPowered",
        "Max charging current" => "maxChargingCurrent",
        "Max charging voltage" => "maxChargingVoltage",
        "Charge counter" => "chargeCounter",
        other => other,
    }
}

fn coerce_battery_value(raw: &str, coercion: BoolCoercion) -> Value {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if float.is_finite() {
            return Value::from(float);
        }
    }
    if trimmed == "true" || trimmed == "false" {
        return match coercion {
            BoolCoercion::Literal => Value::Bool(trimmed == "true"),
            BoolCoercion::Legacy => Value::Bool(!trimmed.is_empty()),
        };
    }
    Value::String(trimmed.to_string())
}

/// Parses `dumpsys battery` output: the first line is a header, blank lines
/// are skipped, two-space runs are removed, and each remaining line splits at
/// the first colon with one leading space trimmed from the value.
pub fn parse_battery_dump(output: &str, coercion: BoolCoercion) -> HashMap<String, Value> {
    let mut snapshot = HashMap::new();
    for line in output.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let collapsed = line.replace("  ", "");
        let Some((raw_key, raw_value)) = collapsed.split_once(':') else {
            continue;
        };
        let value = raw_value.strip_prefix(' ').unwrap_or(raw_value);
        snapshot.insert(
            rename_battery_key(raw_key).to_string(),
            coerce_battery_value(value, coercion),
        );
    }
    snapshot
}

/// Parses `adb devices` output: header dropped, one serial per line before
/// the tab, blank serials discarded.
pub fn parse_device_list(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let serial = line.split('\t').next().unwrap_or_default().trim();
            if serial.is_empty() {
                None
            } else {
                Some(serial.to_string())
            }
        })
        .collect()
}

/// Parses `pm list packages` output into package names, device order kept.
pub fn parse_package_list(output: &str) -> Vec<String> {
    output
        .replace('\r', "")
        .replace("package:", "")
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Parses `wm size` output (`Physical size: 1080x2280`).
pub fn parse_physical_size(output: &str) -> Option<Resolution> {
    let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    let (width, height) = line.strip_prefix("Physical size: ")?.split_once('x')?;
    Some(Resolution {
        width: width.trim().parse().ok()?,
        height: height.trim().parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_battery_dump_with_literal_booleans() {
        let output = "Current Battery Service state:\n  AC powered: false\n  USB powered: true\n  Charge counter: 1234\n  status: 2\n  temperature: 250\n  technology: Li-ion\n";
        let snapshot = parse_battery_dump(output, BoolCoercion::Literal);
        assert_eq!(snapshot.get("acPowered"), Some(&Value::Bool(false)));
        assert_eq!(snapshot.get("usbPowered"), Some(&Value::Bool(true)));
        assert_eq!(snapshot.get("chargeCounter"), Some(&Value::from(1234)));
        assert_eq!(snapshot.get("status"), Some(&Value::from(2)));
        assert_eq!(
            snapshot.get("technology"),
            Some(&Value::String("Li-ion".to_string()))
        );
    }

    #[test]
    fn legacy_coercion_turns_both_literals_true() {
        let output = "Unused header\n  AC powered: false\n  Charge counter: 1234\n";
        let snapshot = parse_battery_dump(output, BoolCoercion::Legacy);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("acPowered"), Some(&Value::Bool(true)));
        assert_eq!(snapshot.get("chargeCounter"), Some(&Value::from(1234)));
    }

    #[test]
    fn battery_dump_skips_blank_lines_and_header() {
        let output = "header: ignored\n\n  level: 87\n\n";
        let snapshot = parse_battery_dump(output, BoolCoercion::Literal);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("level"), Some(&Value::from(87)));
    }

    #[test]
    fn parses_device_list() {
        let output = "List of devices attached\nemulator-5554\tdevice\n\n";
        assert_eq!(parse_device_list(output), vec!["emulator-5554"]);
    }

    #[test]
    fn device_list_discards_blank_serials() {
        let output = "List of devices attached\n\t\nABC123\tunauthorized\n";
        assert_eq!(parse_device_list(output), vec!["ABC123"]);
    }

    #[test]
    fn parses_package_list() {
        let output = "package:com.android.settings\r\npackage:com.example.app\n";
        assert_eq!(
            parse_package_list(output),
            vec!["com.android.settings", "com.example.app"]
        );
    }

    #[test]
    fn parses_physical_size() {
        let parsed = parse_physical_size("Physical size: 1080x2280\n").expect("should parse");
        assert_eq!(
            parsed,
            Resolution {
                width: 1080,
                height: 2280
            }
        );
    }

    #[test]
    fn physical_size_rejects_garbage() {
        assert_eq!(parse_physical_size("no size here"), None);
        assert_eq!(parse_physical_size(""), None);
    }
}
