//! Platform-specific data directory resolution

use std::path::PathBuf;

/// Directory holding `clientes.csv`, `acessos.csv` and the event log pair.
///
/// Returns:
/// - Windows: %APPDATA%\acessopro
/// - macOS: ~/Library/Application Support/acessopro
/// - Linux/Other: ~/.config/acessopro
pub fn data_dir() -> PathBuf {
    let base = dirs::config_dir()
        .or_else(dirs::data_dir)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));

    base.join("acessopro")
}

/// Ensure the data directory exists, creating it if necessary.
pub fn ensure_data_dir() -> std::io::Result<PathBuf> {
    let dir = data_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
