//! Per-day connection counts derived from the event log
//!
//! Feeds the "connections per day" chart: only `open` events on `access`
//! entities count, bucketed by day and by the connection kind carried in the
//! details field (`tipo=...`). Events with an unparseable timestamp are
//! skipped.

use crate::csv::{cell, split_line, ColumnMap};
use crate::model::AccessKind;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const EVENT_STAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// One data point: how many times entries of `kind` were opened on `day`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnPoint {
    pub day: NaiveDate,
    pub kind: AccessKind,
    pub count: usize,
}

/// Read the event log and aggregate open counts per day and kind, sorted by
/// day. A missing or unreadable log yields an empty set.
pub fn connection_points(log_path: &Path) -> Vec<ConnPoint> {
    match fs::read_to_string(log_path) {
        Ok(content) => parse_events(&content),
        Err(_) => Vec::new(),
    }
}

fn parse_events(content: &str) -> Vec<ConnPoint> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let header = match lines.next() {
        Some(header) => header,
        None => return Vec::new(),
    };
    let cols = ColumnMap::new(&split_line(header));
    let ts_idx = cols.find_or(&["timestamputc"], 0);
    let action_idx = cols.find_or(&["action"], 1);
    let entity_type_idx = cols.find_or(&["entitytype"], 2);
    let details_idx = cols.find_or(&["details"], 4);

    let mut bucket: HashMap<(NaiveDate, AccessKind), usize> = HashMap::new();
    for line in lines {
        let c = split_line(line);
        if !cell(&c, action_idx).eq_ignore_ascii_case("open") {
            continue;
        }
        if !cell(&c, entity_type_idx).eq_ignore_ascii_case("access") {
            continue;
        }
        let day = match NaiveDateTime::parse_from_str(cell(&c, ts_idx), EVENT_STAMP_FORMAT) {
            Ok(stamp) => stamp.date(),
            Err(_) => continue,
        };
        let kind = kind_from_details(cell(&c, details_idx));
        *bucket.entry((day, kind)).or_insert(0) += 1;
    }

    let mut points: Vec<ConnPoint> = bucket
        .into_iter()
        .map(|((day, kind), count)| ConnPoint { day, kind, count })
        .collect();
    points.sort_by(|a, b| a.day.cmp(&b.day).then(a.kind.as_str().cmp(b.kind.as_str())));
    points
}

/// Connection kind carried in the details field; SSH when unmarked, which
/// matches how legacy logs were written.
fn kind_from_details(details: &str) -> AccessKind {
    let upper = details.to_ascii_uppercase();
    if upper.contains("TIPO=RDP") {
        AccessKind::Rdp
    } else if upper.contains("TIPO=URL") {
        AccessKind::Url
    } else if upper.contains("TIPO=MTK") {
        AccessKind::Mtk
    } else {
        AccessKind::Ssh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "TimestampUtc,Action,EntityType,EntityName,Details";

    fn event(ts: &str, action: &str, entity: &str, details: &str) -> String {
        format!("\"{ts}\",\"{action}\",\"{entity}\",\"x\",\"{details}\"")
    }

    #[test]
    fn test_counts_opens_per_day_and_kind() {
        let content = [
            HEADER.to_string(),
            event("01/05/2026 10:00:00", "open", "access", "tipo=SSH host=a"),
            event("01/05/2026 11:00:00", "open", "access", "tipo=SSH host=b"),
            event("01/05/2026 12:00:00", "open", "access", "tipo=RDP host=c"),
            event("01/06/2026 09:00:00", "open", "access", "tipo=URL host=d"),
        ]
        .join("\n");

        let points = parse_events(&content);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].kind, AccessKind::Rdp);
        assert_eq!(points[0].count, 1);
        assert_eq!(points[1].kind, AccessKind::Ssh);
        assert_eq!(points[1].count, 2);
        assert_eq!(points[2].day, NaiveDate::from_ymd_opt(2026, 1, 6).unwrap());
        assert_eq!(points[2].kind, AccessKind::Url);
    }

    #[test]
    fn test_ignores_non_open_events_and_bad_stamps() {
        let content = [
            HEADER.to_string(),
            event("01/05/2026 10:00:00", "add", "access", "tipo=SSH"),
            event("01/05/2026 10:00:00", "open", "client", ""),
            event("not-a-date", "open", "access", "tipo=SSH"),
            event("01/05/2026 10:00:00", "open", "access", "tipo=MTK"),
        ]
        .join("\n");

        let points = parse_events(&content);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].kind, AccessKind::Mtk);
        assert_eq!(points[0].count, 1);
    }

    #[test]
    fn test_unmarked_details_default_to_ssh() {
        assert_eq!(kind_from_details("host=legacy"), AccessKind::Ssh);
        assert_eq!(kind_from_details("TIPO=RDP"), AccessKind::Rdp);
    }

    #[test]
    fn test_missing_file_yields_empty() {
        let points = connection_points(Path::new("/nonexistent/eventos.csv"));
        assert!(points.is_empty());
    }
}
