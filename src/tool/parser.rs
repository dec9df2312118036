//! Parser for the archive tool's progress output
//!
//! The tool reports which volume it is reading only through free-form text,
//! so everything here is a best-effort heuristic. A line that cannot be parsed
//! is "no signal", never an error.
//!
//! # Marker contract, version 1
//!
//! A volume marker is a line containing `Extracting from <path>` (any ASCII
//! case), where the file name of `<path>` follows the `<base>.partN.rar`
//! convention. This is what `unrar` 3.x through 7.x prints each time it opens
//! the next volume. Backspace and other control characters that the tool uses
//! to redraw its percentage counter are ignored. Per-file lines such as
//! `Extracting  movie.mkv` never match because they lack `from`.

use crate::locator::parse_part_name;

/// Version of the marker contract implemented by [`parse_volume_marker`]
pub const MARKER_CONTRACT_VERSION: u32 = 1;

const MARKER: &str = "extracting from";

/// A "now reading part N" signal found in the tool's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMarker {
    /// File name of the volume, without directories
    pub file_name: String,
    /// Base name parsed from the file name
    pub base_name: String,
    /// Sequence number parsed from the file name
    pub part: u32,
}

/// Look for a volume marker in one line of tool output
pub fn parse_volume_marker(line: &str) -> Option<VolumeMarker> {
    let cleaned: String = line
        .chars()
        .filter(|c| !c.is_control() || *c == '\t')
        .collect();
    let lower = cleaned.to_ascii_lowercase();
    let idx = lower.find(MARKER)?;

    let path = cleaned[idx + MARKER.len()..].trim();
    if path.is_empty() {
        return None;
    }

    // The tool echoes whatever path it was given, with either separator
    let file_name = path.rsplit(['/', '\\']).next()?.trim();
    let (base_name, part) = parse_part_name(file_name)?;

    Some(VolumeMarker {
        file_name: file_name.to_string(),
        base_name: base_name.to_string(),
        part,
    })
}

/// Lines of integrity-test output that indicate damage, kept for diagnostics
pub fn is_damage_line(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    ["checksum error", "crc failed", "corrupt", "unexpected end of archive", "cannot find volume"]
        .iter()
        .any(|needle| lower.contains(needle))
}
