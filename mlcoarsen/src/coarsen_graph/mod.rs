mod contraction_map;
pub use self::contraction_map::{CoarseLabel, ContractionMap};

mod coarsen_graph;
pub use self::coarsen_graph::{CoarsenGraph, CoarsenGraphInput, CoarsenGraphOutput};
