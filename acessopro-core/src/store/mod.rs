//! CSV-backed record store for clients and access entries
//!
//! Two flat tables on disk (`clientes.csv`, `acessos.csv`), loaded whole,
//! mutated in memory and rewritten whole. Every mutation rewrites the file
//! with a fresh header, reloads the published snapshot from disk (never from
//! the in-memory delta) and appends exactly one audit event. Single-process,
//! single-writer by design.

mod migrate;
#[cfg(test)]
mod tests;

pub use migrate::MigrationSummary;

use crate::csv::{cell, encode_field, split_line, ColumnMap};
use crate::events::{EventLogger, CHAIN_FILE, EVENTS_FILE};
use crate::model::{
    format_url, now_local_stamp, parse_bool, parse_port_text, parse_url, sanitize_path,
    sanitize_port, sanitize_scheme, AccessEntry, AccessKind, Client,
};
use crate::{Result, StoreError, VerifyOutcome};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const CLIENTS_FILE: &str = "clientes.csv";
pub const ACCESSES_FILE: &str = "acessos.csv";

const CLIENTS_HEADER: &str = "Id,Nome,Observacoes,CriadoEm,AtualizadoEm";
const ACCESSES_HEADER: &str = "Id,ClientId,Tipo,Apelido,Host,Porta,Usuario,Dominio,\
RdpIgnoreCert,RdpFullScreen,RdpDynamicResolution,RdpWidth,RdpHeight,Url,Observacoes,\
IsFavorite,OpenCount,LastOpenedAt,CriadoEm,AtualizadoEm";

/// The record store. Owns the authoritative in-memory snapshot; consumers
/// read the published slices and never hold references across a reload.
pub struct CsvStore {
    dir: PathBuf,
    clients_path: PathBuf,
    accesses_path: PathBuf,
    logger: EventLogger,
    clients: Vec<Client>,
    accesses: Vec<AccessEntry>,
    discarded_rows: usize,
}

#[derive(Default)]
struct LoadedAccesses {
    rows: Vec<AccessEntry>,
    summary: MigrationSummary,
    discarded: usize,
}

impl CsvStore {
    /// Open (or initialize) the store in `dir`: ensure both tables exist
    /// with headers, run the self-heal pass, and load the snapshot.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let mut store = Self {
            clients_path: dir.join(CLIENTS_FILE),
            accesses_path: dir.join(ACCESSES_FILE),
            logger: EventLogger::new(&dir),
            clients: Vec::new(),
            accesses: Vec::new(),
            discarded_rows: 0,
            dir,
        };
        store.ensure_file(&store.clients_path, CLIENTS_HEADER)?;
        store.ensure_file(&store.accesses_path, ACCESSES_HEADER)?;
        store.migrate_if_needed();
        store.reload();
        Ok(store)
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn accesses(&self) -> &[AccessEntry] {
        &self.accesses
    }

    /// Accesses referencing `client_id`. Orphaned rows (client id with no
    /// matching client) stay on disk but never show up in these views.
    pub fn accesses_for_client(&self, client_id: &str) -> Vec<&AccessEntry> {
        self.accesses
            .iter()
            .filter(|a| a.client_id.eq_ignore_ascii_case(client_id))
            .collect()
    }

    pub fn accesses_by_kind(&self, kind: AccessKind) -> Vec<&AccessEntry> {
        self.accesses.iter().filter(|a| a.kind == kind).collect()
    }

    pub fn client(&self, id: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.id.eq_ignore_ascii_case(id))
    }

    /// Rows dropped during the last reload (unknown kind, empty client id).
    pub fn discarded_rows(&self) -> usize {
        self.discarded_rows
    }

    pub fn clients_path(&self) -> &Path {
        &self.clients_path
    }

    pub fn accesses_path(&self) -> &Path {
        &self.accesses_path
    }

    pub fn events_path(&self) -> &Path {
        self.logger.log_path()
    }

    /// Check the event log's hash chain against its stored chain state.
    pub fn verify_events(&self) -> VerifyOutcome {
        crate::events::verify(self.logger.log_path())
    }

    /// Refresh the published snapshot from disk.
    pub fn reload(&mut self) {
        let (clients, discarded_clients) = self.load_client_rows();
        let loaded = self.load_access_rows();
        self.discarded_rows = discarded_clients + loaded.discarded;
        if self.discarded_rows > 0 {
            debug!("discarded {} unparseable rows on reload", self.discarded_rows);
        }
        self.clients = clients;
        self.accesses = loaded.rows;
        debug!(
            "loaded {} clients, {} accesses",
            self.clients.len(),
            self.accesses.len()
        );
    }

    // ------------------------------------------------------------------
    // Client operations
    // ------------------------------------------------------------------

    /// Add a client. An empty id gets a generated UUID. Returns the id.
    pub fn add_client(&mut self, id: &str, name: &str, tags: &str, notes: &str) -> Result<String> {
        let mut rows = self.load_client_rows().0;
        let id = if id.trim().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            id.trim().to_string()
        };
        let now = now_local_stamp();
        rows.push(Client {
            id: id.clone(),
            name: name.to_string(),
            tags: tags.to_string(),
            notes: notes.to_string(),
            created_at: now.clone(),
            updated_at: now,
        });
        self.save_client_rows(&rows)?;
        self.reload();
        self.audit("add", "client", name, &format!("id={id}"));
        Ok(id)
    }

    /// Replace the mutable fields of an existing client, matched by
    /// case-insensitive id. Fails with `NotFound` when no row matches.
    pub fn update_client(&mut self, updated: &Client) -> Result<()> {
        let mut rows = self.load_client_rows().0;
        let idx = rows
            .iter()
            .position(|r| r.id.eq_ignore_ascii_case(&updated.id))
            .ok_or_else(|| StoreError::NotFound(format!("client {}", updated.id)))?;
        rows[idx].name = updated.name.clone();
        rows[idx].tags = updated.tags.clone();
        rows[idx].notes = updated.notes.clone();
        rows[idx].updated_at = now_local_stamp();
        self.save_client_rows(&rows)?;
        self.reload();
        self.audit("update", "client", &updated.name, &format!("id={}", updated.id));
        Ok(())
    }

    /// Delete a client and every access entry referencing it. No-op (but
    /// still rewritten and audited) when the id does not match anything.
    pub fn delete_client(&mut self, client_id: &str) -> Result<()> {
        let mut clients = self.load_client_rows().0;
        clients.retain(|c| !c.id.eq_ignore_ascii_case(client_id));
        self.save_client_rows(&clients)?;

        let mut accesses = self.load_access_rows().rows;
        let before = accesses.len();
        accesses.retain(|a| !a.client_id.eq_ignore_ascii_case(client_id));
        let removed = before - accesses.len();
        self.save_access_rows(&accesses)?;

        self.reload();
        self.audit(
            "delete",
            "client",
            client_id,
            &format!("accesses_removed={removed}"),
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Access operations
    // ------------------------------------------------------------------

    /// Add an access entry. Empty id gets a UUID; port, path and scheme are
    /// sanitized for the entry's kind; an empty name falls back to the alias.
    pub fn add_access(&mut self, draft: AccessEntry) -> Result<String> {
        let mut rows = self.load_access_rows().rows;

        let mut entry = draft;
        if entry.id.trim().is_empty() {
            entry.id = Uuid::new_v4().to_string();
        }
        if entry.kind == AccessKind::Url {
            entry.scheme = sanitize_scheme(&entry.scheme);
            entry.path = sanitize_path(&entry.path);
        }
        entry.port = sanitize_port(entry.port as i64, entry.kind.default_port(&entry.scheme));
        if entry.name.trim().is_empty() {
            entry.name = entry.alias.clone();
        }
        let now = now_local_stamp();
        entry.created_at = now.clone();
        entry.updated_at = now;

        let id = entry.id.clone();
        let detail = format!("tipo={} host={}", entry.kind, entry.host);
        let alias = entry.alias.clone();
        rows.push(entry);
        self.save_access_rows(&rows)?;
        self.reload();
        self.audit("add", "access", &alias, &detail);
        Ok(id)
    }

    /// Replace the mutable fields of an access entry, matched by kind plus
    /// case-insensitive id. Favorite/open bookkeeping is left untouched.
    pub fn update_access(&mut self, updated: &AccessEntry) -> Result<()> {
        let mut rows = self.load_access_rows().rows;
        let idx = rows
            .iter()
            .position(|r| r.kind == updated.kind && r.id.eq_ignore_ascii_case(&updated.id))
            .ok_or_else(|| StoreError::NotFound(format!("access {}", updated.id)))?;

        let row = &mut rows[idx];
        row.client_id = updated.client_id.clone();
        row.alias = updated.alias.clone();
        row.name = if updated.name.trim().is_empty() {
            updated.alias.clone()
        } else {
            updated.name.clone()
        };
        row.host = updated.host.clone();
        if row.kind == AccessKind::Url {
            row.scheme = sanitize_scheme(&updated.scheme);
            row.path = sanitize_path(&updated.path);
        }
        row.port = sanitize_port(updated.port as i64, row.kind.default_port(&row.scheme));
        row.user = updated.user.clone();
        row.domain = updated.domain.clone();
        row.rdp_ignore_cert = updated.rdp_ignore_cert;
        row.rdp_full_screen = updated.rdp_full_screen;
        row.rdp_dynamic_resolution = updated.rdp_dynamic_resolution;
        row.rdp_width = updated.rdp_width;
        row.rdp_height = updated.rdp_height;
        row.tags = updated.tags.clone();
        row.notes = updated.notes.clone();
        row.updated_at = now_local_stamp();

        let detail = format!("tipo={} host={}", updated.kind, updated.host);
        self.save_access_rows(&rows)?;
        self.reload();
        self.audit("update", "access", &updated.alias, &detail);
        Ok(())
    }

    /// Delete an access entry. No-op (still rewritten and audited) when the
    /// id does not match anything.
    pub fn delete_access(&mut self, kind: AccessKind, id: &str) -> Result<()> {
        let mut rows = self.load_access_rows().rows;
        let before = rows.len();
        rows.retain(|r| !(r.kind == kind && r.id.eq_ignore_ascii_case(id)));
        let removed = before - rows.len();
        self.save_access_rows(&rows)?;
        self.reload();
        self.audit("delete", "access", id, &format!("tipo={kind} removed={removed}"));
        Ok(())
    }

    /// Flip the favorite flag and return the new state.
    pub fn toggle_favorite(&mut self, kind: AccessKind, id: &str) -> Result<bool> {
        let mut rows = self.load_access_rows().rows;
        let idx = rows
            .iter()
            .position(|r| r.kind == kind && r.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| StoreError::NotFound(format!("access {id}")))?;
        rows[idx].is_favorite = !rows[idx].is_favorite;
        let state = rows[idx].is_favorite;
        let alias = rows[idx].alias.clone();
        self.save_access_rows(&rows)?;
        self.reload();
        self.audit(
            "favorite",
            "access",
            &alias,
            &format!("tipo={kind} favorite={state}"),
        );
        Ok(state)
    }

    /// Record one open of the entry: bump the counter and stamp the time.
    pub fn mark_opened(&mut self, kind: AccessKind, id: &str) -> Result<()> {
        let mut rows = self.load_access_rows().rows;
        let idx = rows
            .iter()
            .position(|r| r.kind == kind && r.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| StoreError::NotFound(format!("access {id}")))?;
        rows[idx].open_count += 1;
        rows[idx].last_opened_at = now_local_stamp();
        let alias = rows[idx].alias.clone();
        let host = rows[idx].host.clone();
        self.save_access_rows(&rows)?;
        self.reload();
        self.audit("open", "access", &alias, &format!("tipo={kind} host={host}"));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Export / import
    // ------------------------------------------------------------------

    /// Copy the backing files into `target_dir`, overwriting stale copies.
    pub fn export<P: AsRef<Path>>(&self, target_dir: P) -> Result<()> {
        let target = target_dir.as_ref();
        fs::create_dir_all(target)?;
        fs::copy(&self.clients_path, target.join(CLIENTS_FILE))?;
        fs::copy(&self.accesses_path, target.join(ACCESSES_FILE))?;
        let events = self.logger.log_path();
        if events.exists() {
            fs::copy(events, target.join(EVENTS_FILE))?;
        }
        self.audit("export", "store", &target.display().to_string(), "");
        Ok(())
    }

    /// Replace the backing files from `files`, matched by fixed lowercase
    /// file name. Requires at minimum `clientes.csv` and `acessos.csv`;
    /// fails before touching any on-disk state otherwise. Re-runs the
    /// self-heal pass and reloads.
    pub fn import(&mut self, files: &[PathBuf]) -> Result<()> {
        let mut clients_src = None;
        let mut accesses_src = None;
        let mut events_src = None;
        let mut chain_src = None;
        for file in files {
            match file
                .file_name()
                .and_then(OsStr::to_str)
                .map(str::to_ascii_lowercase)
                .as_deref()
            {
                Some(CLIENTS_FILE) => clients_src = Some(file),
                Some(ACCESSES_FILE) => accesses_src = Some(file),
                Some(EVENTS_FILE) => events_src = Some(file),
                Some(CHAIN_FILE) => chain_src = Some(file),
                _ => {}
            }
        }

        let (clients_src, accesses_src) = match (clients_src, accesses_src) {
            (Some(c), Some(a)) => (c, a),
            _ => {
                return Err(StoreError::Import(format!(
                    "import requires both {CLIENTS_FILE} and {ACCESSES_FILE} among the given files"
                )))
            }
        };

        fs::copy(clients_src, &self.clients_path)?;
        fs::copy(accesses_src, &self.accesses_path)?;
        if let Some(events) = events_src {
            fs::copy(events, self.dir.join(EVENTS_FILE))?;
            let chain_path = self.dir.join(CHAIN_FILE);
            match chain_src {
                Some(chain) => {
                    fs::copy(chain, &chain_path)?;
                }
                // Imported log without its chain: drop the stale state so
                // verification reports missing instead of a false mismatch.
                None => {
                    let _ = fs::remove_file(&chain_path);
                }
            }
        }

        self.migrate_if_needed();
        self.reload();
        self.audit("import", "store", "", &format!("files={}", files.len()));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn audit(&self, action: &str, entity_type: &str, entity_name: &str, details: &str) {
        if let Err(e) = self.logger.log(action, entity_type, entity_name, details) {
            warn!("audit event dropped ({action} {entity_type}): {e}");
        }
    }

    fn ensure_file(&self, path: &Path, header: &str) -> Result<()> {
        if !path.exists() {
            write_atomic(path, &format!("{header}\n"))?;
        }
        Ok(())
    }

    /// One-shot self-heal of the access table. Rewrites the file only when
    /// something was repaired; a failed rewrite keeps the in-memory repairs
    /// for the session and is logged, not fatal.
    fn migrate_if_needed(&self) {
        let loaded = self.load_access_rows();
        if loaded.summary.repaired_rows() == 0 {
            return;
        }
        info!(
            "access table self-heal: swapped_ip={} numeric_host={}",
            loaded.summary.swapped_ip, loaded.summary.numeric_host
        );
        if let Err(e) = self.save_access_rows(&loaded.rows) {
            warn!("self-heal rewrite failed, keeping in-memory repairs: {e}");
        }
    }

    fn load_client_rows(&self) -> (Vec<Client>, usize) {
        let content = match fs::read_to_string(&self.clients_path) {
            Ok(content) => content,
            Err(_) => return (Vec::new(), 0),
        };
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let header = match lines.next() {
            Some(header) => header,
            None => return (Vec::new(), 0),
        };
        let cols = ColumnMap::new(&split_line(header));
        let id_idx = cols.find_or(&["id"], 0);
        let name_idx = cols.find_or(&["nome", "name", "client_name"], 1);
        let tags_idx = cols.find(&["tags"]);
        let notes_idx = cols.find_or(&["observacoes", "observacao", "notes"], 2);
        let created_idx = cols.find(&["criadoem", "createdat"]);
        let updated_idx = cols.find(&["atualizadoem", "updatedat"]);

        let mut rows = Vec::new();
        let mut discarded = 0;
        for line in lines {
            let c = split_line(line);
            let id = cell(&c, id_idx).to_string();
            let name = cell(&c, name_idx).to_string();
            if id.is_empty() || name.is_empty() {
                discarded += 1;
                continue;
            }
            rows.push(Client {
                id,
                name,
                tags: tags_idx.map(|i| cell(&c, i).to_string()).unwrap_or_default(),
                notes: cell(&c, notes_idx).to_string(),
                created_at: created_idx
                    .map(|i| cell(&c, i).to_string())
                    .unwrap_or_default(),
                updated_at: updated_idx
                    .map(|i| cell(&c, i).to_string())
                    .unwrap_or_default(),
            });
        }
        (rows, discarded)
    }

    fn load_access_rows(&self) -> LoadedAccesses {
        let mut out = LoadedAccesses::default();
        let content = match fs::read_to_string(&self.accesses_path) {
            Ok(content) => content,
            Err(_) => return out,
        };
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let header = match lines.next() {
            Some(header) => header,
            None => return out,
        };
        let cols = ColumnMap::new(&split_line(header));
        let id_idx = cols.find_or(&["id"], 0);
        let client_idx = cols.find_or(&["clientid", "client_id"], 1);
        let kind_idx = cols.find_or(&["tipo", "type"], 2);
        let alias_idx = cols.find_or(&["apelido", "alias"], 3);
        let name_idx = cols.find(&["nome", "name", "server_name"]);
        let host_idx = cols.find_or(&["host"], 4);
        let port_idx = cols.find_or(&["porta", "port"], 5);
        let user_idx = cols.find_or(&["usuario", "user"], 6);
        let domain_idx = cols.find_or(&["dominio", "domain"], 7);
        let ignore_cert_idx = cols.find_or(&["rdpignorecert", "ignore_cert"], 8);
        let full_screen_idx = cols.find_or(&["rdpfullscreen", "full_screen"], 9);
        let dyn_res_idx = cols.find_or(&["rdpdynamicresolution", "dynamic_resolution"], 10);
        let width_idx = cols.find_or(&["rdpwidth", "width"], 11);
        let height_idx = cols.find_or(&["rdpheight", "height"], 12);
        let url_idx = cols.find(&["url"]);
        let path_idx = cols.find(&["path"]);
        let tags_idx = cols.find(&["tags"]);
        let notes_idx = cols.find_or(&["observacoes", "observacao", "notes"], 14);
        let favorite_idx = cols.find(&["isfavorite", "favorite"]);
        let open_count_idx = cols.find(&["opencount"]);
        let last_opened_idx = cols.find(&["lastopenedat"]);
        let created_idx = cols.find(&["criadoem", "createdat"]);
        let updated_idx = cols.find(&["atualizadoem", "updatedat"]);

        for line in lines {
            let c = split_line(line);
            // Unknown kind tokens are skipped silently, never an error.
            let kind = match AccessKind::parse(cell(&c, kind_idx)) {
                Some(kind) => kind,
                None => {
                    out.discarded += 1;
                    continue;
                }
            };

            let mut host = cell(&c, host_idx).to_string();
            let raw_port = cell(&c, port_idx).to_string();
            let mut scheme = String::new();
            let mut port = sanitize_port(
                parse_port_text(&raw_port).unwrap_or(0),
                kind.default_port("https"),
            );
            let mut path = path_idx
                .map(|i| sanitize_path(cell(&c, i)))
                .unwrap_or_else(|| "/".to_string());

            // URL rows round-trip host/port/path/scheme through the Url column.
            if kind == AccessKind::Url {
                let url_value = url_idx.map(|i| cell(&c, i)).unwrap_or("");
                if !url_value.is_empty() {
                    let (s, h, p, pa) = parse_url(url_value);
                    if h.trim().is_empty() {
                        debug!("ignored Url column with empty host: {url_value}");
                    } else {
                        scheme = s;
                        host = h;
                        port = p;
                        path = pa;
                    }
                }
            }

            let alias = cell(&c, alias_idx).to_string();
            let name = name_idx
                .map(|i| cell(&c, i).to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| alias.clone());

            let mut entry = AccessEntry {
                id: cell(&c, id_idx).to_string(),
                client_id: cell(&c, client_idx).to_string(),
                kind,
                alias,
                name,
                host,
                port,
                user: cell(&c, user_idx).to_string(),
                domain: cell(&c, domain_idx).to_string(),
                rdp_ignore_cert: parse_bool(cell(&c, ignore_cert_idx)),
                rdp_full_screen: parse_bool(cell(&c, full_screen_idx)),
                rdp_dynamic_resolution: parse_bool(cell(&c, dyn_res_idx)),
                rdp_width: cell(&c, width_idx).parse().ok(),
                rdp_height: cell(&c, height_idx).parse().ok(),
                path,
                scheme,
                tags: tags_idx.map(|i| cell(&c, i).to_string()).unwrap_or_default(),
                notes: cell(&c, notes_idx).to_string(),
                is_favorite: favorite_idx.map(|i| parse_bool(cell(&c, i))).unwrap_or(false),
                open_count: open_count_idx
                    .and_then(|i| cell(&c, i).parse().ok())
                    .unwrap_or(0),
                last_opened_at: last_opened_idx
                    .map(|i| cell(&c, i).to_string())
                    .unwrap_or_default(),
                created_at: created_idx
                    .map(|i| cell(&c, i).to_string())
                    .unwrap_or_default(),
                updated_at: updated_idx
                    .map(|i| cell(&c, i).to_string())
                    .unwrap_or_default(),
            };

            out.summary.record(migrate::heal_row(&mut entry, &raw_port));
            out.rows.push(entry);
        }
        out
    }

    fn save_client_rows(&self, rows: &[Client]) -> Result<()> {
        let mut content = String::new();
        content.push_str(CLIENTS_HEADER);
        content.push('\n');
        for row in rows {
            let created = if row.created_at.trim().is_empty() {
                now_local_stamp()
            } else {
                row.created_at.clone()
            };
            content.push_str(&format!(
                "{},{},{},{},{}\n",
                encode_field(&row.id),
                encode_field(&row.name),
                encode_field(&row.notes),
                encode_field(&created),
                encode_field(&row.updated_at),
            ));
        }
        write_atomic(&self.clients_path, &content)
    }

    fn save_access_rows(&self, rows: &[AccessEntry]) -> Result<()> {
        let mut content = String::new();
        content.push_str(ACCESSES_HEADER);
        content.push('\n');
        for row in rows {
            let width = row.rdp_width.map(|v| v.to_string()).unwrap_or_default();
            let height = row.rdp_height.map(|v| v.to_string()).unwrap_or_default();
            let url = if row.kind == AccessKind::Url {
                format_url(&row.scheme, &row.host, row.port, &row.path)
            } else {
                String::new()
            };
            let created = if row.created_at.trim().is_empty() {
                now_local_stamp()
            } else {
                row.created_at.clone()
            };
            let port = sanitize_port(row.port as i64, row.kind.default_port(&row.scheme));
            content.push_str(&format!(
                "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
                encode_field(&row.id),
                encode_field(&row.client_id),
                row.kind,
                encode_field(&row.alias),
                encode_field(&row.host),
                port,
                encode_field(&row.user),
                encode_field(&row.domain),
                row.rdp_ignore_cert,
                row.rdp_full_screen,
                row.rdp_dynamic_resolution,
                width,
                height,
                encode_field(&url),
                encode_field(&row.notes),
                row.is_favorite,
                row.open_count,
                encode_field(&row.last_opened_at),
                encode_field(&created),
                encode_field(&row.updated_at),
            ));
        }
        write_atomic(&self.accesses_path, &content)
    }
}

/// Whole-file write via a sibling temp file plus rename, so a crash never
/// leaves a truncated table behind.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
