//! Self-healing for historically corrupted access rows
//!
//! Two corruption patterns shipped in old exports and are repaired on every
//! load, without user intervention:
//!
//! - Pattern A: the host ended up blank and an IP address sits in the port
//!   column. The IP moves back to `host` and the port resets to the kind's
//!   default.
//! - Pattern B: the host column holds a bare port number. The number moves
//!   to `port` and the host is blanked — the original host is gone, so the
//!   row is left for manual correction rather than guessed at.
//!
//! Both repairs are idempotent: a healed row never matches either pattern
//! again.

use crate::model::{is_likely_ip_address, sanitize_path, sanitize_port, sanitize_scheme, AccessEntry, AccessKind};

/// Per-row repair flags, aggregated into a [`MigrationSummary`].
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct HealOutcome {
    pub swapped_ip: bool,
    pub numeric_host: bool,
}

impl HealOutcome {
    pub fn repaired(self) -> bool {
        self.swapped_ip || self.numeric_host
    }
}

/// Counts of repairs applied across one load of the access table.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationSummary {
    pub swapped_ip: usize,
    pub numeric_host: usize,
}

impl MigrationSummary {
    pub fn repaired_rows(&self) -> usize {
        self.swapped_ip + self.numeric_host
    }

    pub(super) fn record(&mut self, outcome: HealOutcome) {
        if outcome.swapped_ip {
            self.swapped_ip += 1;
        }
        if outcome.numeric_host {
            self.numeric_host += 1;
        }
    }
}

/// Repair one freshly parsed row. `raw_port_text` is the port cell exactly
/// as stored, needed because an IP swapped into the port column does not
/// survive numeric parsing.
pub(super) fn heal_row(entry: &mut AccessEntry, raw_port_text: &str) -> HealOutcome {
    let mut outcome = HealOutcome::default();

    // Pattern A: empty host, IP-looking text in the port column.
    if entry.host.trim().is_empty() && is_likely_ip_address(raw_port_text) {
        entry.host = raw_port_text.trim().to_string();
        entry.port = entry.kind.default_port(&entry.scheme);
        outcome.swapped_ip = true;
    }

    // Pattern B: host is a bare in-range integer, so it is a misplaced port.
    // Anything with a dot or colon is an address, not a port.
    let host_trimmed = entry.host.trim();
    if !entry.host.contains('.') && !entry.host.contains(':') {
        if let Ok(h) = host_trimmed.parse::<i64>() {
            if (1..=65535).contains(&h) {
                entry.port = sanitize_port(h, entry.kind.default_port(&entry.scheme));
                entry.host = String::new();
                outcome.numeric_host = true;
            }
        }
    }

    // Unconditional re-sanitation, repair or not.
    if entry.kind == AccessKind::Url {
        entry.path = sanitize_path(&entry.path);
        entry.scheme = sanitize_scheme(&entry.scheme);
    }
    entry.port = sanitize_port(entry.port as i64, entry.kind.default_port(&entry.scheme));

    outcome
}
