pub mod conv;
pub mod entity_graph;
pub mod output;
pub mod properties;
pub mod util;

pub use entity_graph::*;
pub use output::*;

pub const KEY_TARGETNAME: &str = "targetname";
