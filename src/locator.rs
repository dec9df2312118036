//! Part discovery for numbered multi-part archives.
//!
//! Parts follow the `<base>.partN.rar` convention. The number may be zero-padded
//! (`part01`, `part001`) and matching ignores ASCII case. Parts are ordered by
//! their parsed number, so `part9` sorts before `part10` whether or not the
//! names are padded.

use crate::config::{BASE_PLACEHOLDER, ExtractionConfig};
use crate::error::{Error, Result};
use crate::types::{ArchivePart, ArchiveSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Split a part file name into its base name and sequence number.
///
/// `movie.part01.rar` → `("movie", 1)`. Returns `None` for names that do not
/// follow the numbered-part convention, for an empty base, and for part 0.
pub fn parse_part_name(file_name: &str) -> Option<(&str, u32)> {
    let lower = file_name.to_ascii_lowercase();
    let stem = lower.strip_suffix(".rar")?;
    let part_idx = stem.rfind(".part")?;
    if part_idx == 0 {
        return None;
    }

    let num_str = &stem[part_idx + 5..]; // after ".part"
    if num_str.is_empty() || !num_str.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let number: u32 = num_str.parse().ok()?;
    if number == 0 {
        return None;
    }

    // ASCII lowercasing keeps byte offsets, so the index is valid in the original
    Some((&file_name[..part_idx], number))
}

/// Glob matching supporting `*` and `?` wildcards, ignoring ASCII case.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` seen and the text index it is currently covering up to
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, t));
                p += 1;
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(c) if c.eq_ignore_ascii_case(&text[t]) => {
                p += 1;
                t += 1;
            }
            _ => match star {
                // Let the last star swallow one more character and retry
                Some((star_p, star_t)) => {
                    star = Some((star_p, star_t + 1));
                    p = star_p + 1;
                    t = star_t + 1;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Build the concrete discovery glob for one base name
fn pattern_for(config: &ExtractionConfig, base_name: &str) -> String {
    config.part_file_pattern.replace(BASE_PLACEHOLDER, base_name)
}

/// Find every part of the archive that `representative` belongs to.
///
/// `representative` must be an existing part file, normally part 1. Siblings
/// are looked up in the same directory using `part_file_pattern` and must
/// share the representative's base name.
///
/// # Errors
///
/// - [`Error::ArchiveNotFound`] if `representative` is not an existing file
/// - [`Error::InvalidPartName`] if its name is not `<base>.partN.rar`
/// - [`Error::NoPartsFound`] if nothing in the directory matches
pub fn locate(representative: &Path, config: &ExtractionConfig) -> Result<ArchiveSet> {
    debug!(?representative, "locating archive parts");

    let is_file = std::fs::metadata(representative)
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(Error::ArchiveNotFound {
            path: representative.to_path_buf(),
        });
    }

    let representative = std::path::absolute(representative)?;
    let file_name = representative
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::InvalidPartName {
            path: representative.clone(),
        })?;
    let (base_name, number) = parse_part_name(file_name).ok_or_else(|| Error::InvalidPartName {
        path: representative.clone(),
    })?;
    let base_name = base_name.to_string();

    if number != 1 {
        debug!(number, "representative is not the first part");
    }

    let directory = representative
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let pattern = pattern_for(config, &base_name);

    let mut parts = scan_directory(&directory, &pattern, &base_name)?;
    if parts.is_empty() {
        return Err(Error::NoPartsFound {
            directory,
            base_name,
        });
    }

    parts.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.path.cmp(&b.path)));
    parts.dedup_by(|later, kept| {
        let duplicate = later.number == kept.number;
        if duplicate {
            warn!(
                part = later.number,
                kept = ?kept.path,
                ignored = ?later.path,
                "duplicate part number, ignoring second file"
            );
        }
        duplicate
    });

    if let Some(first) = parts.first()
        && first.number != 1
    {
        warn!(
            first = first.number,
            "part 1 was not found; extraction will start from the lowest part present"
        );
    }

    info!(
        base_name = %base_name,
        count = parts.len(),
        ?directory,
        "found archive parts"
    );

    Ok(ArchiveSet {
        base_name,
        directory,
        parts,
    })
}

/// Collect the files in `directory` that match `pattern` and share `base_name`
fn scan_directory(directory: &Path, pattern: &str, base_name: &str) -> Result<Vec<ArchivePart>> {
    let mut parts = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let file_type = match entry.file_type() {
            Ok(ft) => ft,
            Err(_) => continue,
        };
        if !file_type.is_file() {
            continue;
        }

        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !glob_match(pattern, name) {
            continue;
        }

        match parse_part_name(name) {
            Some((base, number)) if base.eq_ignore_ascii_case(base_name) => {
                let size_bytes = entry.metadata().map(|m| m.len()).unwrap_or(0);
                parts.push(ArchivePart {
                    number,
                    path: entry.path(),
                    size_bytes,
                });
            }
            _ => {
                debug!(name, "matches pattern but is not a part of this archive");
            }
        }
    }

    Ok(parts)
}
