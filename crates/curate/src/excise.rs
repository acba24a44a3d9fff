use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;

/// Race and sex vocabulary stripped from captions before LoRA training.
pub const DEFAULT_EXCISED_WORDS: &[&str] = &[
    "male",
    "female",
    "white",
    "White",
    "Black",
    "Asian",
    "Hispanic",
    "Native",
    "American",
    "Middle",
    "Eastern",
    "Jewish",
    "Pacific",
    "Islander",
    "South",
    "African",
    "Caribbean",
    "Latin",
    "Southeast",
    "East",
    "Central",
    "Indigenous",
    "Australian",
    "North",
    "European",
];

/// Drop every single-space separated word found in `words`.
/// Matching is exact, so punctuation attached to a word keeps it.
pub fn excise_line(line: &str, words: &[&str]) -> String {
    line.split(' ')
        .filter(|word| !words.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rewrite every `.txt` caption directly inside `dir`. Each line is written
/// back followed by a newline. Returns the number of files rewritten.
pub fn excise_captions(dir: &Path, words: &[&str]) -> Result<usize> {
    let mut rewritten = 0;

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "txt") {
            continue;
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let mut output = String::with_capacity(content.len());
        for line in content.lines() {
            output.push_str(&excise_line(line, words));
            output.push('\n');
        }

        fs::write(path, output).with_context(|| format!("failed to write {}", path.display()))?;
        rewritten += 1;
    }

    info!(dir = %dir.display(), files = rewritten, "Excised captions");
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excise_demographic_prompt() {
        let line = excise_line("An individual female white nurse.", DEFAULT_EXCISED_WORDS);
        assert_eq!(line, "An individual nurse.");
    }

    #[test]
    fn test_multi_word_race_removed() {
        let line = excise_line(
            "Generate an image of a singular Middle Eastern teacher.",
            DEFAULT_EXCISED_WORDS,
        );
        assert_eq!(line, "Generate an image of a singular teacher.");
    }

    #[test]
    fn test_attached_punctuation_is_kept() {
        assert_eq!(excise_line("an Asian, male", &["Asian", "male"]), "an Asian,");
    }

    #[test]
    fn test_captions_rewritten_in_place() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1.txt"), "An individual male Black doctor.").unwrap();
        fs::write(dir.path().join("2.txt"), "line one female\nline two").unwrap();
        fs::write(dir.path().join("1.png"), [0u8, 1, 2]).unwrap();

        let count = excise_captions(dir.path(), DEFAULT_EXCISED_WORDS).unwrap();
        assert_eq!(count, 2);

        assert_eq!(
            fs::read_to_string(dir.path().join("1.txt")).unwrap(),
            "An individual doctor.\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("2.txt")).unwrap(),
            "line one\nline two\n"
        );
        assert_eq!(fs::read(dir.path().join("1.png")).unwrap(), vec![0, 1, 2]);
    }
}
