use std::fmt;
use std::path::{Path, PathBuf};

// CJK symbols and punctuation, CJK unified ideographs, halfwidth and fullwidth forms.
const DISALLOWED_RANGES: [(char, char); 3] = [
    ('\u{3000}', '\u{303f}'),
    ('\u{4e00}', '\u{9fff}'),
    ('\u{ff00}', '\u{ffef}'),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IllegalPath {
    pub path: PathBuf,
    pub offending: Vec<char>,
}

impl fmt::Display for IllegalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chars: String = self.offending.iter().collect();
        write!(
            f,
            "bundle path contains unsupported characters ({chars}): {}",
            self.path.display()
        )
    }
}

pub fn is_disallowed(ch: char) -> bool {
    DISALLOWED_RANGES
        .iter()
        .any(|(start, end)| (*start..=*end).contains(&ch))
}

pub fn check_path_legal(path: &Path) -> Result<(), IllegalPath> {
    let rendered = path.to_string_lossy();
    let mut offending = Vec::new();
    for ch in rendered.chars().filter(|ch| is_disallowed(*ch)) {
        if !offending.contains(&ch) {
            offending.push(ch);
        }
    }
    if offending.is_empty() {
        Ok(())
    } else {
        Err(IllegalPath {
            path: path.to_path_buf(),
            offending,
        })
    }
}

pub fn remediation_hint() -> &'static str {
    "Move the bundle into a directory whose path has no CJK or fullwidth characters, then start it again."
}
