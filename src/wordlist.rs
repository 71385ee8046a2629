//! Candidate list assembly: defaults, keyword files, and transforms.

use anyhow::{Context, Result};
use std::path::Path;

/// Built-in candidate list used when no codes are given.
pub const DEFAULT_CODES: &[&str] = &[
    "Dipper",
    "Mabel",
    "Stan",
    "Ford",
    "Soos",
    "Wendy",
    "Bill",
    "Mystery",
    "Waddles",
    "Weirdmageddon",
    "Journal",
    "Pacifica",
    "Gideon",
    "Gnomes",
    "Summerween",
    "Bottomless",
    "TimeBaby",
    "Shmebulock",
    "Pines",
    "Cipher",
    "Multibear",
    "Manotaurs",
    "Pterodactyl",
    "Gobblewonker",
    "Robbie",
    "Susan",
    "Toby",
    "McGucket",
    "Blendin",
    "Rumble",
    "Candy",
    "Grenda",
    "Axolotl",
    "Tad",
    "Shacktron",
    "Dungeons",
    "Smile",
    "Northwest",
    "Mermando",
    "Chutzpar",
    "Quentin",
    "Woodpecker",
    "Trembley",
    "Dip",
    "Grunkle",
    "Corduroy",
    "Ramirez",
    "Gleeful",
    "Valentino",
    "Determined",
    "Blandin",
    "Strange",
    "Dip",
];

/// Reverse a candidate string.
pub fn flip(code: &str) -> String {
    code.chars().rev().collect()
}

/// Load candidates from a file, one per line. Blank lines are skipped;
/// interior whitespace is preserved (codes are whitespace-sensitive).
pub fn load_file(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read codes file: {}", path.display()))?;
    Ok(raw
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Thorough expansion: each candidate, its flipped form, and (for
/// multi-word candidates) each whitespace-split fragment. First-seen order
/// is preserved and repeats are dropped.
pub fn expand_thorough(codes: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut push = |candidate: String, out: &mut Vec<String>| {
        if seen.insert(candidate.clone()) {
            out.push(candidate);
        }
    };

    for code in codes {
        push(code.clone(), &mut out);
        push(flip(code), &mut out);
        if code.split_whitespace().nth(1).is_some() {
            for fragment in code.split_whitespace() {
                push(fragment.to_string(), &mut out);
            }
        }
    }
    out
}

/// Assemble the final candidate list from CLI inputs.
///
/// Explicit codes come first, then file entries; with neither, the built-in
/// list is used. `--flip` replaces each candidate with its reversed form;
/// `--thorough` expands the list with variants.
pub fn assemble(
    explicit: &[String],
    codes_file: Option<&Path>,
    flip_all: bool,
    thorough: bool,
) -> Result<Vec<String>> {
    let mut codes: Vec<String> = explicit.to_vec();
    if let Some(path) = codes_file {
        codes.extend(load_file(path)?);
    }
    if codes.is_empty() {
        codes = DEFAULT_CODES.iter().map(|s| s.to_string()).collect();
    }

    if flip_all {
        codes = codes.iter().map(|c| flip(c)).collect();
    }
    if thorough {
        codes = expand_thorough(&codes);
    }
    Ok(codes)
}
