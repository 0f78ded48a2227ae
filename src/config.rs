use std::path::Path;

/// Environment variable consulted when no adb path is configured explicitly.
pub const ADB_PROGRAM_ENV: &str = "ADB_BRIDGE_ADB";

/// Strips surrounding whitespace and one layer of matching quotes, which
/// copy-pasted paths from shell configs tend to carry.
pub fn normalize_command_path(value: &str) -> String {
    let trimmed = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|candidate| candidate.strip_suffix(quote))
        {
            return inner.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Resolution order: explicit configuration, then `ADB_BRIDGE_ADB`, then
/// plain `adb` on PATH.
pub fn resolve_adb_program(configured: &str) -> String {
    let normalized = normalize_command_path(configured);
    if !normalized.is_empty() {
        return normalized;
    }
    if let Ok(from_env) = std::env::var(ADB_PROGRAM_ENV) {
        let normalized = normalize_command_path(&from_env);
        if !normalized.is_empty() {
            return normalized;
        }
    }
    "adb".to_string()
}

pub fn validate_adb_program(program: &str) -> Result<(), String> {
    if program.trim().is_empty() {
        return Err("adb command is empty".to_string());
    }
    if program == "adb" {
        // Bare name is resolved through PATH at spawn time.
        return Ok(());
    }
    let path = Path::new(program);
    if path.is_dir() {
        return Err("adb path must point to an executable file".to_string());
    }
    if !path.exists() {
        return Err("adb executable not found at the configured path".to_string());
    }
    Ok(())
}
