//! CSV line codec and header-driven column resolution
//!
//! Quoting rules: fields are always written quoted, with `""` as an escaped
//! quote. On read, commas inside quotes are not separators and a doubled
//! quote inside a quoted field is a literal quote.

use std::collections::HashMap;

/// Split one CSV line into its fields, honoring double-quoted fields.
pub fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes {
                    // Doubled quote is a literal quote, consume both.
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    fields.push(current);
    fields
}

/// Encode one field for writing. Always quoted, internal quotes doubled.
pub fn encode_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Fetch a cell by index, trimmed; out-of-range indexes read as empty.
pub fn cell(fields: &[String], index: usize) -> &str {
    fields.get(index).map(|s| s.trim()).unwrap_or("")
}

/// Header-name normalization: lowercase, fold common Latin diacritics, and
/// strip spaces and underscores, so `Observações`, `observacoes` and
/// `OBSERVACOES` all resolve to the same column.
fn normalize_header(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| {
            let folded = fold_diacritic(c);
            match folded {
                ' ' | '_' => None,
                _ => Some(folded.to_ascii_lowercase()),
            }
        })
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ç' | 'Ç' => 'c',
        'ñ' | 'Ñ' => 'n',
        _ => c,
    }
}

/// Normalized header name -> index map, built once per load from the header
/// row. Lookups take a list of accepted aliases plus a positional fallback
/// for legacy files written without a header.
pub struct ColumnMap {
    indexes: HashMap<String, usize>,
}

impl ColumnMap {
    pub fn new(header_fields: &[String]) -> Self {
        let mut indexes = HashMap::new();
        for (index, raw) in header_fields.iter().enumerate() {
            indexes.insert(normalize_header(raw), index);
        }
        Self { indexes }
    }

    /// Resolve the first matching alias, if any column carries it.
    pub fn find(&self, aliases: &[&str]) -> Option<usize> {
        aliases
            .iter()
            .find_map(|alias| self.indexes.get(&normalize_header(alias)).copied())
    }

    /// Resolve with a fixed positional fallback for header-less files.
    pub fn find_or(&self, aliases: &[&str], fallback: usize) -> usize {
        self.find(aliases).unwrap_or(fallback)
    }
}
