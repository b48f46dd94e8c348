pub mod ids;
pub mod model;
pub mod text;

pub use model::{
    EdgeType, ExtractedEdge, ExtractedNode, GenerationMetadata, GenerationStats, InferenceMethod,
    Link, NodeData, NodeType, ParseResult,
};
