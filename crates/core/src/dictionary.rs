use crate::ScanError;
use std::fs;
use std::path::Path;

const BUNDLED_DICTIONARY: &str = include_str!("../assets/dict.txt");

/// Trimmed, non-empty lines. Duplicates are kept.
pub fn parse_keywords(source: &str) -> Vec<String> {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn load_keywords(path: &Path) -> Result<Vec<String>, ScanError> {
    let source = fs::read_to_string(path).map_err(|error| ScanError::Dictionary {
        path: path.display().to_string(),
        reason: error.to_string(),
    })?;
    Ok(parse_keywords(&source))
}

pub fn bundled_keywords() -> Vec<String> {
    parse_keywords(BUNDLED_DICTIONARY)
}
