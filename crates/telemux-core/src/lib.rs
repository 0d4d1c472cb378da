pub mod calibration;
pub mod channels;
pub mod config;
pub mod error;
pub mod frame;
pub mod outputs;
pub mod pipeline;
pub mod timestamp;
pub mod transform;

pub use channels::{all_channel_descriptors, Channel, ChannelDescriptor};
pub use config::PipelineConfig;
pub use error::{ConfigError, PipelineError, Result};
pub use pipeline::{
    discover_inputs, process_file, run_batch, BatchReport, ChannelReport, FileReport, FileStatus,
};

#[cfg(feature = "runtime")]
pub use pipeline::run_batch_concurrent;
