//! Quota accounting and byte formatting.

use super::DEFAULT_QUOTA_BYTES;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Storage quota settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    /// Byte budget for everything under the root.
    pub limit_bytes: u64,
    /// Reject stores that would exceed the budget.
    pub enforce: bool,
}

impl Quota {
    /// Advisory quota: reported, never enforced.
    pub fn advisory(limit_bytes: u64) -> Self {
        Self {
            limit_bytes,
            enforce: false,
        }
    }

    /// Enforced quota.
    pub fn enforced(limit_bytes: u64) -> Self {
        Self {
            limit_bytes,
            enforce: true,
        }
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self::advisory(DEFAULT_QUOTA_BYTES)
    }
}

/// Snapshot of root usage against the quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageUsage {
    /// Recursive size of the root.
    pub used_bytes: u64,
    /// Configured quota.
    pub quota_bytes: u64,
    /// Whether the quota is enforced on store.
    pub enforced: bool,
}

impl StorageUsage {
    /// Used share of the quota in percent; may exceed 100.
    pub fn percentage(&self) -> f64 {
        if self.quota_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.quota_bytes as f64 * 100.0
    }

    /// Percentage rendered as `12.34%`.
    pub fn percentage_display(&self) -> String {
        format!("{:.2}%", self.percentage())
    }
}

/// Format a byte count using the largest unit that keeps the value below 1024.
///
/// ```
/// assert_eq!(homedrive::format_bytes(1536), "1.50 KB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}
