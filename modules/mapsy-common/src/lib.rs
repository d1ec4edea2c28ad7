pub mod callback;
pub mod config;
pub mod error;
pub mod types;

pub use callback::{CallbackPayload, ExtractionStatistics, SnsInfo};
pub use config::AppConfig;
pub use error::{ClassifyError, GeocodeError, ResolveError, ScrapeError};
pub use types::*;
