pub mod error;
pub mod openai;
pub mod traits;
pub mod util;

pub use error::AiError;
pub use openai::{OpenAi, OpenAiOutputBuilder, OpenAiPromptBuilder, StructuredOutput};
pub use traits::{OutputBuilder, PromptBuilder};
pub use util::{collapse_whitespace, strip_code_blocks, truncate_to_char_boundary};
