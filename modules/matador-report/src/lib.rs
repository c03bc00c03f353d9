pub mod competitors;
pub mod fetcher;
pub mod generator;
pub mod personas;
pub mod prompts;
pub mod render;
pub mod request;
pub mod store;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use generator::{GenerationContext, PersonaSection, ReportDeps, ReportGenerator, ReportOutput};
pub use request::{parse_zip_codes, ReportForm, ReportRequest};
pub use store::{MemoryReportStore, PgReportStore, ReportStore};
