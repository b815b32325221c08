use shipyard::EntityId;
use tracing::debug;

use crate::EntityGraph;

/// log_entity
///
/// Helper function to dump an entity, with its keyvalues and connections
pub fn log_entity(graph: &EntityGraph, id: EntityId) {
    match graph.to_def(id) {
        None => debug!("logging entity: {id:?} (removed)"),
        Some(def) => {
            let mut keys: Vec<_> = def.keys.iter().collect();
            keys.sort();
            debug!(
                "logging entity: {id:?}\n -- classname: {}\n -- keys: {keys:?}\n -- outputs: {}",
                def.classname,
                def.outputs.len()
            );
            for output in &def.outputs {
                debug!(
                    " ---- {} -> {}.{}({}) delay={} times={}",
                    output.output,
                    output.target,
                    output.input,
                    output.params,
                    output.delay,
                    output.times
                );
            }
        }
    }
}
