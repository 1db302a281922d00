use std::path::Path;

/// Whether the machine currently runs on battery power.
///
/// Only Linux is probed; other platforms report `false`.
pub fn is_discharging() -> bool {
    if cfg!(target_os = "linux") {
        any_discharging(Path::new("/sys/class/power_supply"))
    } else {
        false
    }
}

/// Scans a `power_supply`-style directory for a supply reporting `Discharging`.
pub fn any_discharging(root: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(root) else {
        return false;
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| std::fs::read_to_string(entry.path().join("status")).ok())
        .any(|status| status.trim().eq_ignore_ascii_case("discharging"))
}
