//! Section segmentation, field parsing, the two extraction strategies, and
//! the orchestrator that arbitrates between them.

mod fields;
mod geometric;
mod orchestrator;
mod section;
mod textual;
mod validate;

pub use fields::{parse_amount, parse_date, trailing_amount};
pub use geometric::{GeometricExtractor, GeometricOutput, Stage};
pub use orchestrator::{extract_statement, ExtractionOutcome, Orchestrator};
pub use section::{Section, SectionSegmenter};
pub use textual::TextualExtractor;
pub use validate::validate;
