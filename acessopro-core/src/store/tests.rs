use super::*;
use crate::model::AccessKind;
use std::fs;
use tempfile::TempDir;

fn ssh_draft(alias: &str, client_id: &str, host: &str, port: u32, user: &str) -> AccessEntry {
    AccessEntry {
        client_id: client_id.to_string(),
        kind: AccessKind::Ssh,
        alias: alias.to_string(),
        host: host.to_string(),
        port,
        user: user.to_string(),
        ..AccessEntry::default()
    }
}

#[test]
fn test_open_initializes_files_with_headers() {
    let tmp = TempDir::new().unwrap();
    let store = CsvStore::open(tmp.path()).unwrap();

    let clients = fs::read_to_string(store.clients_path()).unwrap();
    assert!(clients.starts_with(CLIENTS_HEADER));
    let accesses = fs::read_to_string(store.accesses_path()).unwrap();
    assert!(accesses.starts_with("Id,ClientId,Tipo,"));
    assert!(store.clients().is_empty());
    assert!(store.accesses().is_empty());
}

#[test]
fn test_add_client_and_ssh_access_survive_reload() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();

    store.add_client("c1", "Acme", "", "").unwrap();
    store
        .add_access(ssh_draft("web1", "c1", "10.0.0.5", 22, "root"))
        .unwrap();

    // Fresh store instance reads everything back from disk.
    let store = CsvStore::open(tmp.path()).unwrap();
    assert_eq!(store.clients().len(), 1);
    assert_eq!(store.clients()[0].name, "Acme");

    let scoped = store.accesses_for_client("c1");
    assert_eq!(scoped.len(), 1);
    let entry = scoped[0];
    assert_eq!(entry.kind, AccessKind::Ssh);
    assert_eq!(entry.alias, "web1");
    assert_eq!(entry.host, "10.0.0.5");
    assert_eq!(entry.port, 22);
    assert_eq!(entry.user, "root");
}

#[test]
fn test_add_generates_id_when_empty() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();

    let id = store.add_client("", "NoId", "", "").unwrap();
    assert!(!id.is_empty());
    assert!(store.client(&id).is_some());

    let access_id = store
        .add_access(ssh_draft("a", &id, "h", 22, "u"))
        .unwrap();
    assert!(!access_id.is_empty());
}

#[test]
fn test_add_url_access_sanitizes_out_of_range_port() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();

    let draft = AccessEntry {
        client_id: "c1".to_string(),
        kind: AccessKind::Url,
        alias: "panel".to_string(),
        host: "example.com".to_string(),
        port: 99999,
        scheme: "https".to_string(),
        path: "admin".to_string(),
        ..AccessEntry::default()
    };
    store.add_access(draft).unwrap();

    let store = CsvStore::open(tmp.path()).unwrap();
    let entry = &store.accesses()[0];
    assert_eq!(entry.port, 443);
    assert_eq!(entry.path, "/admin");
    assert_eq!(entry.scheme, "https");
}

#[test]
fn test_url_round_trips_through_url_column() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();

    let draft = AccessEntry {
        client_id: "c1".to_string(),
        alias: "intranet".to_string(),
        kind: AccessKind::Url,
        host: "intranet.local".to_string(),
        port: 8080,
        scheme: "http".to_string(),
        path: "/status".to_string(),
        ..AccessEntry::default()
    };
    store.add_access(draft).unwrap();

    let store = CsvStore::open(tmp.path()).unwrap();
    let entry = &store.accesses()[0];
    assert_eq!(entry.scheme, "http");
    assert_eq!(entry.host, "intranet.local");
    assert_eq!(entry.port, 8080);
    assert_eq!(entry.path, "/status");
}

#[test]
fn test_update_client_and_not_found() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();
    store.add_client("c1", "Old", "", "").unwrap();

    // Case-insensitive id match.
    let mut updated = store.client("C1").unwrap().clone();
    updated.id = "C1".to_string();
    updated.name = "New".to_string();
    store.update_client(&updated).unwrap();
    assert_eq!(store.client("c1").unwrap().name, "New");

    updated.id = "missing".to_string();
    assert!(matches!(
        store.update_client(&updated),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn test_update_access_preserves_bookkeeping() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();
    let id = store
        .add_access(ssh_draft("web1", "c1", "10.0.0.5", 22, "root"))
        .unwrap();
    store.toggle_favorite(AccessKind::Ssh, &id).unwrap();
    store.mark_opened(AccessKind::Ssh, &id).unwrap();

    let mut updated = store.accesses()[0].clone();
    updated.host = "10.0.0.6".to_string();
    updated.user = "admin".to_string();
    store.update_access(&updated).unwrap();

    let entry = &store.accesses()[0];
    assert_eq!(entry.host, "10.0.0.6");
    assert_eq!(entry.user, "admin");
    assert!(entry.is_favorite);
    assert_eq!(entry.open_count, 1);
}

#[test]
fn test_delete_client_cascades_to_accesses() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();
    store.add_client("c1", "Acme", "", "").unwrap();
    store.add_client("c2", "Beta", "", "").unwrap();
    store
        .add_access(ssh_draft("a1", "c1", "h1", 22, "u"))
        .unwrap();
    store
        .add_access(ssh_draft("a2", "C1", "h2", 22, "u"))
        .unwrap();
    store
        .add_access(ssh_draft("b1", "c2", "h3", 22, "u"))
        .unwrap();

    store.delete_client("c1").unwrap();

    assert_eq!(store.clients().len(), 1);
    assert_eq!(store.accesses().len(), 1);
    assert_eq!(store.accesses()[0].client_id, "c2");
}

#[test]
fn test_delete_access_unknown_id_is_noop() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();
    store
        .add_access(ssh_draft("a1", "c1", "h1", 22, "u"))
        .unwrap();
    store.delete_access(AccessKind::Ssh, "nope").unwrap();
    assert_eq!(store.accesses().len(), 1);
}

#[test]
fn test_toggle_favorite_flips_and_persists() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();
    let id = store
        .add_access(ssh_draft("a1", "c1", "h1", 22, "u"))
        .unwrap();

    assert!(store.toggle_favorite(AccessKind::Ssh, &id).unwrap());
    let reloaded = CsvStore::open(tmp.path()).unwrap();
    assert!(reloaded.accesses()[0].is_favorite);

    assert!(!store.toggle_favorite(AccessKind::Ssh, &id).unwrap());
}

#[test]
fn test_mark_opened_increments_counter() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();
    let id = store
        .add_access(ssh_draft("a1", "c1", "h1", 22, "u"))
        .unwrap();

    store.mark_opened(AccessKind::Ssh, &id).unwrap();
    store.mark_opened(AccessKind::Ssh, &id).unwrap();

    let store = CsvStore::open(tmp.path()).unwrap();
    let entry = &store.accesses()[0];
    assert_eq!(entry.open_count, 2);
    assert!(!entry.last_opened_at.is_empty());
}

#[test]
fn test_migration_repairs_ip_in_port_column() {
    let tmp = TempDir::new().unwrap();
    // Legacy table layout without the favorite/open columns.
    let legacy_header = "Id,ClientId,Tipo,Apelido,Host,Porta,Usuario,Dominio,\
RdpIgnoreCert,RdpFullScreen,RdpDynamicResolution,RdpWidth,RdpHeight,Url,Observacoes,\
CriadoEm,AtualizadoEm";
    let row = r#""a1","c1",SSH,"web1","",192.168.1.1,"root","",false,false,false,,,"","","","""#;
    fs::write(
        tmp.path().join(ACCESSES_FILE),
        format!("{legacy_header}\n{row}\n"),
    )
    .unwrap();

    let store = CsvStore::open(tmp.path()).unwrap();
    let entry = &store.accesses()[0];
    assert_eq!(entry.host, "192.168.1.1");
    assert_eq!(entry.port, 22);

    // The repair was persisted and a second pass changes nothing.
    let healed = fs::read_to_string(store.accesses_path()).unwrap();
    let store = CsvStore::open(tmp.path()).unwrap();
    let again = fs::read_to_string(store.accesses_path()).unwrap();
    assert_eq!(healed, again);
}

#[test]
fn test_migration_blanks_numeric_host() {
    let tmp = TempDir::new().unwrap();
    let legacy_header = "Id,ClientId,Tipo,Apelido,Host,Porta,Usuario,Dominio,\
RdpIgnoreCert,RdpFullScreen,RdpDynamicResolution,RdpWidth,RdpHeight,Url,Observacoes,\
CriadoEm,AtualizadoEm";
    let row = r#""a1","c1",RDP,"desk","3390",0,"user","corp",true,false,true,,,"","","","""#;
    fs::write(
        tmp.path().join(ACCESSES_FILE),
        format!("{legacy_header}\n{row}\n"),
    )
    .unwrap();

    let store = CsvStore::open(tmp.path()).unwrap();
    let entry = &store.accesses()[0];
    // Lossy on purpose: the original host is unrecoverable.
    assert_eq!(entry.host, "");
    assert_eq!(entry.port, 3390);
}

#[test]
fn test_unknown_kind_rows_are_skipped_and_counted() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();
    store
        .add_access(ssh_draft("a1", "c1", "h1", 22, "u"))
        .unwrap();

    let mut content = fs::read_to_string(store.accesses_path()).unwrap();
    content.push_str("\"x9\",\"c1\",TELNET,\"old\",\"h\",23,\"u\",\"\",false,false,false,,,\"\",\"\",false,0,\"\",\"\",\"\"\n");
    fs::write(store.accesses_path(), content).unwrap();

    store.reload();
    assert_eq!(store.accesses().len(), 1);
    assert_eq!(store.discarded_rows(), 1);
}

#[test]
fn test_orphaned_access_excluded_from_client_view() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();
    store.add_client("c1", "Acme", "", "").unwrap();
    store
        .add_access(ssh_draft("ok", "c1", "h", 22, "u"))
        .unwrap();
    store
        .add_access(ssh_draft("orphan", "ghost", "h", 22, "u"))
        .unwrap();

    // Orphans are tolerated on disk and in the flat list.
    assert_eq!(store.accesses().len(), 2);
    assert_eq!(store.accesses_for_client("c1").len(), 1);
    assert_eq!(store.accesses_for_client("ghost").len(), 1);
    assert!(store.client("ghost").is_none());
}

#[test]
fn test_export_then_import_round_trip() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();
    store.add_client("c1", "Acme", "", "").unwrap();
    store
        .add_access(ssh_draft("web1", "c1", "10.0.0.5", 22, "root"))
        .unwrap();

    let target = TempDir::new().unwrap();
    store.export(target.path()).unwrap();
    assert!(target.path().join(CLIENTS_FILE).exists());
    assert!(target.path().join(ACCESSES_FILE).exists());
    assert!(target.path().join(EVENTS_FILE).exists());

    // Import the exported snapshot into a fresh store.
    let dest = TempDir::new().unwrap();
    let mut fresh = CsvStore::open(dest.path()).unwrap();
    let files = vec![
        target.path().join(CLIENTS_FILE),
        target.path().join(ACCESSES_FILE),
    ];
    fresh.import(&files).unwrap();
    assert_eq!(fresh.clients().len(), 1);
    assert_eq!(fresh.accesses().len(), 1);
    assert_eq!(fresh.accesses()[0].alias, "web1");
}

#[test]
fn test_import_fails_fast_without_required_files() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();
    store.add_client("keep", "Keep", "", "").unwrap();

    let other = TempDir::new().unwrap();
    fs::write(other.path().join(CLIENTS_FILE), "Id,Nome\n").unwrap();
    let files = vec![other.path().join(CLIENTS_FILE)];

    assert!(matches!(
        store.import(&files),
        Err(StoreError::Import(_))
    ));
    // Nothing was replaced.
    assert_eq!(store.clients().len(), 1);
    assert_eq!(store.clients()[0].id, "keep");
}

#[test]
fn test_every_mutation_appends_one_audit_event() {
    let tmp = TempDir::new().unwrap();
    let mut store = CsvStore::open(tmp.path()).unwrap();

    store.add_client("c1", "Acme", "", "").unwrap();
    let id = store
        .add_access(ssh_draft("web1", "c1", "h", 22, "u"))
        .unwrap();
    let mut updated = store.accesses()[0].clone();
    updated.host = "h2".to_string();
    store.update_access(&updated).unwrap();
    store.toggle_favorite(AccessKind::Ssh, &id).unwrap();
    store.mark_opened(AccessKind::Ssh, &id).unwrap();
    store.delete_access(AccessKind::Ssh, &id).unwrap();
    store.delete_client("c1").unwrap();

    let content = fs::read_to_string(store.events_path()).unwrap();
    let events = content.lines().count() - 1;
    assert_eq!(events, 7);
    assert_eq!(store.verify_events(), VerifyOutcome::Ok);
}
