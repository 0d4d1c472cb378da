pub mod decoder;
pub mod errors;
pub mod model;
pub mod reader;
pub mod selector;

pub use decoder::decode_payload;
pub use errors::ReadError;
pub use model::{DecodedRow, RawLog, RawRow, RowOutcome, SkipCounts, SkipReason};
pub use reader::{read_log, read_log_from};
pub use selector::{select_topic, summarize_topics, TopicSummary};
