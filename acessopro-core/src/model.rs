//! Domain model: clients, access entries, audit events
//!
//! Sanitizers here are the single source of truth for the invariants the
//! store re-applies on every load and save: ports stay in 1..=65535 (kind
//! fallback otherwise), URL paths always start with `/`, schemes are
//! lowercase and default to `http`.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a network access entry. Unknown tokens cause the row to be
/// skipped on load, never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessKind {
    #[default]
    Ssh,
    Rdp,
    Url,
    Mtk,
}

impl AccessKind {
    /// Parse the stored `Tipo` token (uppercase on disk, case-insensitive here).
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "SSH" => Some(Self::Ssh),
            "RDP" => Some(Self::Rdp),
            "URL" => Some(Self::Url),
            "MTK" => Some(Self::Mtk),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ssh => "SSH",
            Self::Rdp => "RDP",
            Self::Url => "URL",
            Self::Mtk => "MTK",
        }
    }

    /// Fallback port used whenever a stored port is missing or out of range.
    /// For URL entries the fallback follows the scheme.
    pub fn default_port(self, scheme: &str) -> u32 {
        match self {
            Self::Ssh => 22,
            Self::Rdp => 3389,
            Self::Mtk => 8291,
            Self::Url => scheme_default_port(scheme),
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn scheme_default_port(scheme: &str) -> u32 {
    match scheme.trim().to_ascii_lowercase().as_str() {
        "http" => 80,
        _ => 443,
    }
}

/// A client record. Identity is the `id`, matched case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub tags: String,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Unified access row covering SSH, RDP, URL and MTK entries. The UI layers
/// specialize this into per-kind views; the store always works on the full row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessEntry {
    pub id: String,
    pub client_id: String,
    pub kind: AccessKind,
    pub alias: String,
    pub name: String,
    pub host: String,
    pub port: u32,
    pub user: String,
    pub domain: String,
    pub rdp_ignore_cert: bool,
    pub rdp_full_screen: bool,
    pub rdp_dynamic_resolution: bool,
    pub rdp_width: Option<u32>,
    pub rdp_height: Option<u32>,
    /// URL kind only; always starts with `/`.
    pub path: String,
    /// URL kind only; lowercase, `http` when unset.
    pub scheme: String,
    pub tags: String,
    pub notes: String,
    pub is_favorite: bool,
    pub open_count: u32,
    pub last_opened_at: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One appended audit line. Never mutated; the file is rotated wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp_utc: String,
    pub action: String,
    pub entity_type: String,
    pub entity_name: String,
    pub details: String,
}

/// Clamp a port into 1..=65535, replacing anything else with `fallback`.
pub fn sanitize_port(port: i64, fallback: u32) -> u32 {
    if (1..=65535).contains(&port) {
        port as u32
    } else {
        fallback
    }
}

/// URL paths always begin with `/`; empty normalizes to `/`.
pub fn sanitize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Schemes are lowercase; empty normalizes to `http`.
pub fn sanitize_scheme(scheme: &str) -> String {
    let trimmed = scheme.trim();
    if trimmed.is_empty() {
        "http".to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

/// Accepts the historical truthy spellings found in old files.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "sim" | "yes"
    )
}

/// Parse a stored port cell: plain integer first, then a digits-only salvage
/// for cells polluted with stray characters. Returns the raw integer before
/// range sanitation, or None when no digits survive.
pub fn parse_port_text(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<i64>() {
        return Some(v);
    }
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<i64>().ok()
}

/// Heuristic used by the self-heal pass: does this text look like an IP
/// address that was swapped into the port column?
pub fn is_likely_ip_address(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return false;
    }
    // IPv4: exactly four octets 0-255.
    let parts: Vec<&str> = trimmed.split('.').collect();
    if parts.len() == 4
        && parts
            .iter()
            .all(|p| p.parse::<u16>().map(|v| v <= 255).unwrap_or(false))
    {
        return true;
    }
    // IPv6-ish: a colon plus nothing but hex digits and colons.
    trimmed.contains(':')
        && trimmed
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == ':')
}

/// Parse a stored `Url` column value into (scheme, host, port, path).
/// A value without `://` is assumed `https`; an unparseable value yields an
/// empty host, which callers treat as "ignore this column".
pub fn parse_url(raw: &str) -> (String, String, u32, String) {
    let value = raw.trim();
    let candidate = if value.contains("://") {
        value.to_string()
    } else {
        format!("https://{value}")
    };

    let (scheme_part, rest) = match candidate.split_once("://") {
        Some(parts) => parts,
        None => return ("https".to_string(), String::new(), 443, "/".to_string()),
    };
    let scheme = sanitize_scheme(scheme_part);

    let (authority, path_part) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };

    let (host, port) = match authority.rsplit_once(':') {
        Some((h, p)) if p.chars().all(|c| c.is_ascii_digit()) && !p.is_empty() => {
            let parsed = p.parse::<i64>().unwrap_or(0);
            (h.to_string(), sanitize_port(parsed, scheme_default_port(&scheme)))
        }
        _ => (authority.to_string(), scheme_default_port(&scheme)),
    };

    (scheme, host, port, sanitize_path(path_part))
}

/// Render the `Url` column for a URL-kind row.
pub fn format_url(scheme: &str, host: &str, port: u32, path: &str) -> String {
    let scheme = sanitize_scheme(scheme);
    let port = sanitize_port(port as i64, scheme_default_port(&scheme));
    format!("{scheme}://{host}:{port}{}", sanitize_path(path))
}

/// Local-time stamp used on client/access records: `MM/dd/yyyy HH:mm:ss`.
pub fn now_local_stamp() -> String {
    Local::now().format("%m/%d/%Y %H:%M:%S").to_string()
}

/// UTC stamp used on event log lines, same layout.
pub fn now_utc_stamp() -> String {
    Utc::now().format("%m/%d/%Y %H:%M:%S").to_string()
}
