// Engine module - stream inference, time attribution, report aggregation
// This layer sits between the event store and CLI presentation

mod attribution;
mod error;
mod infer;
mod report;

pub use attribution::{AttributionConfig, StreamTotals, attribute_window, calculate_time};
pub use error::{Error, Result};
pub use infer::{Cluster, InferenceConfig, cluster_events, normalize_cwd, run_inference, stream_name};
pub use report::{Report, StreamSlice, TagGroup, build_report};
