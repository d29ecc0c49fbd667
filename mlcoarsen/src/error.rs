use thiserror::Error;

pub type CoarsenResult<T> = Result<T, CoarsenError>;

#[derive(Debug, Error)]
pub enum CoarsenError {
    #[error("self-loop on node `{node}`")]
    SelfLoop { node: String },

    #[error("edge `{source_node}`-`{target_node}` has invalid weight {weight} (must be finite and non-negative)")]
    InvalidWeight {
        source_node: String,
        target_node: String,
        weight: f64,
    },

    #[error("edge references unknown node `{node}`")]
    UnknownNode { node: String },

    #[error("expected {expected} edge labels, found {found}")]
    LabelCountMismatch { expected: usize, found: usize },

    #[error("groups do not partition the {node_count} nodes of the graph")]
    InvalidMatching { node_count: usize },

    #[error("solver returned {found} values for a QUBO of dimension {expected}")]
    SolutionLength { expected: usize, found: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
