use bench_core::{PromptConfig, PromptMode};
use prompts::{LabelReader, PromptSynthesizer, load_prompts};
use std::io::Write;

fn label_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn nurse_teacher_with_two_races() {
    let file = label_file("nurse,teacher");
    let labels = LabelReader::read_labels(file.path()).await.unwrap();
    let races = vec!["white".to_string(), "Asian".to_string()];

    let by_race = PromptSynthesizer::new(PromptMode::RaceDesignation)
        .with_races(races.clone())
        .synthesize(&labels);
    assert_eq!(by_race.len(), 4);

    let demographic = PromptSynthesizer::new(PromptMode::Demographic)
        .with_races(races)
        .synthesize(&labels);
    assert_eq!(demographic.len(), 8);
    assert!(demographic.iter().any(|p| p == "An individual female white nurse."));
}

#[tokio::test]
async fn n_entries_give_n_labels() {
    for n in [1usize, 2, 7, 40] {
        let entries: Vec<String> = (0..n).map(|i| format!("role{i}")).collect();
        let file = label_file(&entries.join(","));
        let labels = LabelReader::read_labels(file.path()).await.unwrap();
        assert_eq!(labels, entries);
    }
}

#[tokio::test]
async fn load_prompts_uses_configured_mode() {
    let file = label_file("pilot,chef\n");
    let config = PromptConfig {
        label_file: file.path().to_path_buf(),
        mode: PromptMode::Demographic,
    };

    let prompts = load_prompts(&config).await.unwrap();
    assert_eq!(prompts.len(), prompts::DEFAULT_RACES.len() * 2 * 2);
    assert_eq!(prompts[0], "An individual male white pilot.");
}
