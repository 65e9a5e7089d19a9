// =============================================================================
// Signals Module
// =============================================================================
//
// Signal collection and fusion:
// - Registry of contract-checked signals with recorded drop reasons
// - Weighted confidence scoring with direction-dispersion risk
// - The `SignalSource` seam and the reference indicator sources

pub mod registry;
pub mod scorer;
pub mod sources;

pub use registry::{DroppedSource, Signal, SignalRegistry};
pub use scorer::{confidence_label, ConfidenceScorer, ScoreOutcome, SignalContribution};
pub use sources::{builtin_sources, SignalSource, BUILTIN_SOURCE_NAMES};
