//! Persist high scores to disk (XDG config or ~/.config/stackem).
//!
//! Line-oriented format, one `name,score` record per line, unique by name.
//! Recording a score is a read-modify-write merge keeping the higher score
//! per name; a missing or unreadable file is an empty leaderboard.

use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const FILENAME: &str = "highscores";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighScoreEntry {
    pub name: String,
    pub score: u32,
}

/// Returns the path to the high scores file (config dir / stackem / highscores).
fn config_path() -> Result<PathBuf> {
    let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if xdg.is_empty() {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".config")
        } else {
            PathBuf::from(xdg)
        }
    } else {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    Ok(base.join("stackem").join(FILENAME))
}

fn parse_line(line: &str) -> Option<HighScoreEntry> {
    let (name, score) = line.trim().rsplit_once(',')?;
    let score = score.trim().parse().ok()?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some(HighScoreEntry {
        name: name.to_string(),
        score,
    })
}

fn parse_file(content: &str) -> Vec<HighScoreEntry> {
    content.lines().filter_map(parse_line).collect()
}

/// Merge a finished game into the stored entries: keep the higher of the
/// existing and new score for the player's name.
fn merge(mut entries: Vec<HighScoreEntry>, name: &str, score: u32) -> Vec<HighScoreEntry> {
    match entries.iter_mut().find(|e| e.name == name) {
        Some(existing) => existing.score = existing.score.max(score),
        None => entries.push(HighScoreEntry {
            name: name.to_string(),
            score,
        }),
    }
    entries
}

/// Leaderboard view: descending by score, name as tie-break.
fn sorted(mut entries: Vec<HighScoreEntry>) -> Vec<HighScoreEntry> {
    entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));
    entries
}

fn load_from(path: &Path) -> Vec<HighScoreEntry> {
    match fs::read_to_string(path) {
        Ok(content) => sorted(parse_file(&content)),
        Err(_) => Vec::new(),
    }
}

/// Load the sorted leaderboard. Missing/unreadable file is empty, never an
/// error.
pub fn load() -> Vec<HighScoreEntry> {
    match config_path() {
        Ok(path) => load_from(&path),
        Err(_) => Vec::new(),
    }
}

fn save_to(path: &Path, entries: &[HighScoreEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    for e in entries {
        writeln!(f, "{},{}", e.name, e.score)?;
    }
    Ok(())
}

/// Record a finished game for `name`, keeping the higher of existing and
/// new score, and return the updated leaderboard.
pub fn record(name: &str, score: u32) -> Result<Vec<HighScoreEntry>> {
    let path = config_path()?;
    let merged = sorted(merge(load_from(&path), name, score));
    save_to(&path, &merged)?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, score: u32) -> HighScoreEntry {
        HighScoreEntry {
            name: name.to_string(),
            score,
        }
    }

    #[test]
    fn parse_round_trip() {
        let parsed = parse_file("alice,12\nbob,3\n");
        assert_eq!(parsed, vec![entry("alice", 12), entry("bob", 3)]);
    }

    #[test]
    fn parse_skips_garbage_lines() {
        let parsed = parse_file("alice,12\n\nnot a record\n,7\nbob,x\n");
        assert_eq!(parsed, vec![entry("alice", 12)]);
    }

    #[test]
    fn name_may_contain_commas() {
        // rsplit on the last comma, so only the score field is numeric
        let parsed = parse_file("smith, jr,9\n");
        assert_eq!(parsed, vec![entry("smith, jr", 9)]);
    }

    #[test]
    fn merge_keeps_higher_existing_score() {
        let merged = merge(vec![entry("alice", 12)], "alice", 5);
        assert_eq!(merged, vec![entry("alice", 12)]);
    }

    #[test]
    fn merge_takes_higher_new_score() {
        let merged = merge(vec![entry("alice", 12)], "alice", 20);
        assert_eq!(merged, vec![entry("alice", 20)]);
    }

    #[test]
    fn merge_appends_new_name() {
        let merged = merge(vec![entry("alice", 12)], "bob", 4);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn leaderboard_sorted_descending() {
        let s = sorted(vec![entry("alice", 3), entry("bob", 9), entry("carol", 9)]);
        assert_eq!(s[0].score, 9);
        assert_eq!(s[0].name, "bob");
        assert_eq!(s[2].name, "alice");
    }
}
