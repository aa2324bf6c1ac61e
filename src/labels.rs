//! Class index -> display name.
//!
//! The label file is plain text, one entry per line, either `"<index>: <name>"`
//! or just `<name>`. Anything missing, unreadable or purely numeric falls back
//! to the built-in table, so startup never fails because of labels.

use std::path::Path;
use tracing::{info, warn};

/// Output cardinality of the bundled doodle model.
pub const DEFAULT_CLASS_COUNT: usize = 365;

const BUILTIN_LABELS: [&str; 100] = [
    "airplane", "alarm clock", "ambulance", "angel", "ant", "apple", "backpack", "banana", "basketball", "bat",
    "bear", "bicycle", "bird", "book", "bowtie", "bread", "butterfly", "cactus", "cake", "calculator",
    "camel", "camera", "candle", "car", "carrot", "castle", "cat", "chair", "church", "circle",
    "clock", "cloud", "coffee cup", "computer", "cookie", "cow", "crab", "crocodile", "cup", "diamond",
    "dog", "dolphin", "donut", "door", "dragon", "duck", "ear", "elephant", "eye", "face",
    "fan", "feather", "fire", "fish", "flower", "frog", "giraffe", "guitar", "hammer", "hat",
    "heart", "hedgehog", "helicopter", "horse", "house", "ice cream", "kangaroo", "key", "knife", "ladder",
    "laptop", "leaf", "lightning", "lion", "lobster", "lollipop", "microphone", "monkey", "moon", "mountain",
    "mouse", "mushroom", "octopus", "owl", "paintbrush", "palm tree", "panda", "penguin", "piano", "pig",
    "pizza", "rabbit", "rainbow", "rhinoceros", "rifle", "river", "sailboat", "sandwich", "saw", "scissors",
];

/// Built-in name for a class position; `"Object <index>"` past the table.
pub fn default_label(index: usize) -> String {
    BUILTIN_LABELS
        .get(index)
        .map(|s| (*s).to_string())
        .unwrap_or_else(|| format!("Object {index}"))
}

/// The complete fallback table, `count` entries long.
pub fn default_labels(count: usize) -> Vec<String> {
    (0..count).map(default_label).collect()
}

/// Turn the label source into exactly `count` names.
///
/// Non-empty lines are numbered in order; a line's number is its position.
/// `None` (source unavailable) or a source with no usable lines yields the
/// full default table.
pub fn resolve(source: Option<&str>, count: usize) -> Vec<String> {
    let Some(text) = source else {
        return default_labels(count);
    };

    let mut names: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(position, line)| parse_line(line, position))
        .collect();

    if names.is_empty() {
        return default_labels(count);
    }

    names.truncate(count);
    while names.len() < count {
        names.push(default_label(names.len()));
    }
    names
}

fn parse_line(line: &str, position: usize) -> String {
    if let Some((_, name)) = line.split_once(": ") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        return default_label(position);
    }
    if line.chars().all(|c| c.is_ascii_digit()) {
        return default_label(position);
    }
    line.to_string()
}

/// Read the label file and resolve it. Never fails: a missing or unreadable
/// file is logged and replaced by the built-in table.
pub async fn load_labels(path: &Path, count: usize) -> Vec<String> {
    info!("loading class names from {}", path.display());
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            let names = resolve(Some(&text), count);
            info!(
                "loaded {} class names (sample: {:?})",
                names.len(),
                &names[..names.len().min(5)]
            );
            names
        }
        Err(e) => {
            warn!("could not read class names from {}: {e}; using defaults", path.display());
            default_labels(count)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_formats_resolve_by_position() {
        let names = resolve(Some("0: cat\ndog\n7\n"), DEFAULT_CLASS_COUNT);
        assert_eq!(names.len(), DEFAULT_CLASS_COUNT);
        assert_eq!(names[0], "cat");
        assert_eq!(names[1], "dog");
        // Purely numeric line -> default for its own position.
        assert_eq!(names[2], "ambulance");
        // Past the source, defaults fill in.
        assert_eq!(names[7], "banana");
        assert_eq!(names[57], "guitar");
    }

    #[test]
    fn empty_source_uses_full_default_table() {
        assert_eq!(resolve(Some(""), 365), default_labels(365));
        assert_eq!(resolve(Some("\n  \n\t\n"), 365), default_labels(365));
        assert_eq!(resolve(None, 365), default_labels(365));
    }

    #[test]
    fn defaults_run_past_the_builtin_table() {
        assert_eq!(default_label(0), "airplane");
        assert_eq!(default_label(99), "scissors");
        assert_eq!(default_label(100), "Object 100");
        assert_eq!(default_labels(365).len(), 365);
    }

    #[test]
    fn blank_lines_do_not_consume_positions() {
        let names = resolve(Some("cat\n\n\n42\n"), 5);
        assert_eq!(names, vec!["cat", "alarm clock", "ambulance", "angel", "ant"]);
    }

    #[test]
    fn colon_name_is_trimmed_and_longer_sources_truncate() {
        let names = resolve(Some("  3:   palm_tree  \nbee\nwasp"), 2);
        assert_eq!(names, vec!["palm_tree", "bee"]);
    }

    #[test]
    fn colon_without_space_is_a_plain_name() {
        assert_eq!(resolve(Some("12:owl"), 1), vec!["12:owl"]);
    }
}
