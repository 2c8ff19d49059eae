pub mod action;
pub mod affinity;
pub mod anneal;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod model;
pub mod partition;
pub mod planner;
pub mod weighted;

pub use affinity::{compute_weights, cooccurrence_info, CooccurrenceInfo};
pub use anneal::{AnnealObserver, AnnealStep, AnnealSummary, CancelFlag, StopReason};
pub use config::{AffinityParams, AnnealParams, Method, OptimizerConfig, PlannerConfig};
pub use error::{ConfigError, HistoryError, RecordError};
pub use history::parse_history;
pub use model::condition::{PairWeights, Score};
pub use model::entity::Id;
pub use model::group::{Group, Table};
pub use model::history::AssignmentRecord;
pub use partition::{partition, partition_with, sizes_for, total_cost, PartitionOutcome};
pub use planner::{Plan, Planner};
