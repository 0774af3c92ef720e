pub mod generate;
pub mod settings;

pub use generate::{extract_json_block, OpenAiGenerator, TextGenerator};
pub use settings::LlmSettings;
