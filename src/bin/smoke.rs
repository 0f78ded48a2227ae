use std::collections::HashMap;
use std::process::ExitCode;

use serde::Serialize;
use serde_json::Value;

use adb_bridge::logging::init_logging;
use adb_bridge::{DeviceBridge, Resolution};

/// Host-side smoke tool: exercises the read-only operations against a real
/// device and prints a summary. Usage:
///
///   smoke [--serial <id>] [--json] [--adb <path>]
#[derive(Debug, Default)]
struct Args {
    serial: Option<String>,
    adb: Option<String>,
    json: bool,
}

#[derive(Serialize)]
struct SmokeSummary {
    status: &'static str,
    serial: Option<String>,
    devices: Vec<String>,
    resolution: Option<Resolution>,
    battery: Option<HashMap<String, Value>>,
    power_service: Option<bool>,
    errors: Vec<String>,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut argv = std::env::args().skip(1);
    while let Some(flag) = argv.next() {
        match flag.as_str() {
            "--serial" => args.serial = argv.next(),
            "--adb" => args.adb = argv.next(),
            "--json" => args.json = true,
            other => {
                eprintln!("unknown argument: {other}");
            }
        }
    }
    args
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let args = parse_args();

    let bridge = match DeviceBridge::from_config(args.adb.as_deref().unwrap_or("")) {
        Ok(bridge) => bridge,
        Err(err) => {
            eprintln!("adb configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut summary = SmokeSummary {
        status: "pass",
        serial: None,
        devices: Vec::new(),
        resolution: None,
        battery: None,
        power_service: None,
        errors: Vec::new(),
    };

    match bridge.list_devices().await {
        Ok(devices) => summary.devices = devices,
        Err(err) => summary.errors.push(format!("list_devices: {err}")),
    }

    let serial = args
        .serial
        .or_else(|| summary.devices.first().cloned())
        .unwrap_or_default();
    if serial.is_empty() {
        summary.errors.push("no device attached".to_string());
    } else {
        summary.serial = Some(serial.clone());
        match bridge.get_resolution(&serial).await {
            Ok(resolution) => summary.resolution = Some(resolution),
            Err(err) => summary.errors.push(format!("get_resolution: {err}")),
        }
        match bridge.battery(&serial).await {
            Ok(snapshot) => summary.battery = Some(snapshot),
            Err(err) => summary.errors.push(format!("battery: {err}")),
        }
        match bridge.service_check("power", &serial).await {
            Ok(present) => summary.power_service = Some(present),
            Err(err) => summary.errors.push(format!("service_check: {err}")),
        }
    }

    if !summary.errors.is_empty() {
        summary.status = "fail";
    }

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => eprintln!("failed to render summary: {err}"),
        }
    } else {
        println!("status: {}", summary.status);
        println!("devices: {:?}", summary.devices);
        if let Some(resolution) = summary.resolution {
            println!("resolution: {}x{}", resolution.width, resolution.height);
        }
        if let Some(battery) = &summary.battery {
            println!("battery: {battery:?}");
        }
        for error in &summary.errors {
            println!("error: {error}");
        }
    }

    if summary.status == "pass" {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
