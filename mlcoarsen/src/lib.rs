pub mod matching;
pub mod scoring;

mod assignment;
pub use self::assignment::Assignment;

mod coarsen_graph;
pub use self::coarsen_graph::{
    CoarseLabel, CoarsenGraph, CoarsenGraphInput, CoarsenGraphOutput, ContractionMap,
};

mod config;
pub use self::config::{MatchingPolicy, PipelineConfig};

mod error;
pub use self::error::{CoarsenError, CoarsenResult};

mod features;
pub use self::features::{extract_edge_features, EdgeFeatureTable, EdgeFeatures, NUM_EDGE_FEATURES};

mod graph;
pub use self::graph::{EdgeRef, Graph, GraphBuilder, NodeId, DEFAULT_EDGE_WEIGHT};

mod pipeline;
pub use self::pipeline::{
    coarsen, solve_multilevel, CoarseLevel, Coarsener, Hierarchy, MultilevelOutcome,
    MultilevelPipeline, QuboSolver,
};

mod qubo;
pub use self::qubo::{maxcut_to_qubo, QuboMatrix};

mod refinement;
pub use self::refinement::{lift_solution, LocalRefiner, RefineConfig, RefineOutcome};
