pub mod ollama;
pub mod schema;
pub mod traits;
pub mod util;

pub use ollama::Ollama;
pub use schema::StructuredOutput;
pub use traits::{Message, MessageRole, StructuredChat};
pub use util::{strip_code_blocks, truncate_to_char_boundary};
