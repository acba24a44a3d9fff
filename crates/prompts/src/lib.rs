pub mod reader;
pub mod synth;

pub use reader::{LabelReader, parse_labels};
pub use synth::{DEFAULT_RACES, PromptSynthesizer, SEXES};

use bench_core::{PromptConfig, Result};

/// Load the label file and expand it into prompts for the configured mode.
pub async fn load_prompts(config: &PromptConfig) -> Result<Vec<String>> {
    let labels = LabelReader::read_labels(&config.label_file).await?;
    let synthesizer = PromptSynthesizer::new(config.mode);
    let prompts = synthesizer.synthesize(&labels);

    tracing::info!(
        labels = labels.len(),
        prompts = prompts.len(),
        mode = ?config.mode,
        "Synthesized prompts"
    );
    Ok(prompts)
}
