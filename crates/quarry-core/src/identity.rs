// Worker identity (VPID)
// Decision: computed at most once per process and never persisted; the tracker
// uses it as the owner claim on checked-out jobs

use std::sync::OnceLock;

use chrono::Local;
use gethostname::gethostname;

static VPID: OnceLock<String> = OnceLock::new();

/// The identity this process claims jobs under.
///
/// Composed from date, hostname, executable basename, time and pid, so a
/// fleet operator can read provenance straight out of the tracker's owner
/// column. Stable for the process lifetime.
pub fn vpid() -> &'static str {
    VPID.get_or_init(|| {
        let now = Local::now();
        let host = gethostname().to_string_lossy().into_owned();
        let exe = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "worker".to_string());
        compose(
            &now.format("%Y%m%d").to_string(),
            &host,
            &exe,
            &now.format("%H%M%S").to_string(),
            std::process::id(),
        )
    })
}

fn compose(date: &str, host: &str, exe: &str, time: &str, pid: u32) -> String {
    format!("{date}-{host}-{exe}-{time}-{pid}")
}
