use std::collections::HashMap;

use tracing::{debug, trace, warn};
use vmf::{EntityGraph, Output};

use crate::IoRemap;

#[derive(Clone, Debug)]
pub struct ContextOptions {
    // How many times a single connection may be rerouted before giving up.
    // Loops are caught separately, this only bounds long chains.
    pub max_remap_depth: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            max_remap_depth: 64,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemapEntry {
    pub outputs: Vec<Output>,
    pub remove: bool,
}

type RemapKey = (String, String);

// Entity names may contain non-ASCII characters, so keys use full Unicode lowercasing
fn remap_key(name: &str, input: &str) -> RemapKey {
    (name.to_lowercase(), input.to_lowercase())
}

///
/// Context
///
/// The entity graph shared by all transforms, plus the connection remaps they have
/// asked for. Remaps are only collected while transforms run, and applied in one
/// pass by `apply_io_remaps`.
pub struct Context {
    graph: EntityGraph,
    io_remaps: HashMap<RemapKey, RemapEntry>,
    options: ContextOptions,
}

impl Context {
    pub fn new(graph: EntityGraph) -> Context {
        Context::with_options(graph, ContextOptions::default())
    }

    pub fn with_options(graph: EntityGraph, options: ContextOptions) -> Context {
        Context {
            graph,
            io_remaps: HashMap::new(),
            options,
        }
    }

    pub fn graph(&self) -> &EntityGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut EntityGraph {
        &mut self.graph
    }

    ///
    /// add_io_remap
    ///
    /// Connections invoking `output.output` on `name` get rerouted to the target of `output`.
    /// Registering the same name + input again adds another destination.
    pub fn add_io_remap(&mut self, name: &str, output: Output, remove: bool) {
        let key = remap_key(name, &output.output);
        trace!(
            "io remap: {}.{} -> {}.{} (remove={})",
            name,
            output.output,
            output.target,
            output.input,
            remove
        );

        match self.io_remaps.get_mut(&key) {
            Some(entry) => {
                entry.outputs.push(output);
                entry.remove = entry.remove && remove;
            }
            None => {
                self.io_remaps.insert(
                    key,
                    RemapEntry {
                        outputs: vec![output],
                        remove,
                    },
                );
            }
        }
    }

    ///
    /// add_io_remap_removal
    ///
    /// Connections invoking `input` on `name` are deleted, unless something was already
    /// remapped there.
    pub fn add_io_remap_removal(&mut self, name: &str, input: &str) {
        trace!("io remap removal: {}.{}", name, input);
        self.io_remaps
            .entry(remap_key(name, input))
            .or_insert_with(|| RemapEntry {
                outputs: Vec::new(),
                remove: true,
            });
    }

    pub fn register(&mut self, remap: IoRemap) {
        match remap {
            IoRemap::Rewire {
                name,
                output,
                remove,
            } => self.add_io_remap(&name, output, remove),
            IoRemap::Remove { name, input } => self.add_io_remap_removal(&name, &input),
        }
    }

    pub fn io_remap(&self, name: &str, input: &str) -> Option<&RemapEntry> {
        self.io_remaps.get(&remap_key(name, input))
    }

    pub fn io_remaps(&self) -> impl Iterator<Item = (&RemapKey, &RemapEntry)> {
        self.io_remaps.iter()
    }

    pub fn io_remap_count(&self) -> usize {
        self.io_remaps.len()
    }

    ///
    /// apply_io_remaps
    ///
    /// Rewrites every connection in the graph that hits a registered remap, and returns
    /// how many were rewritten. Rerouted connections are looked up again, so chains of
    /// relays collapse into a single hop.
    pub fn apply_io_remaps(&mut self) -> usize {
        if self.io_remaps.is_empty() {
            return 0;
        }

        let mut rewritten = 0;
        for entity_id in self.graph.entity_ids() {
            let outputs = self.graph.outputs(entity_id);
            if outputs.is_empty() {
                continue;
            }

            let mut changed = false;
            let mut result = Vec::with_capacity(outputs.len());
            // Each pending connection carries the remap keys it already went through
            let mut todo: Vec<(Output, Vec<RemapKey>)> = outputs
                .into_iter()
                .rev()
                .map(|out| (out, Vec::new()))
                .collect();

            while let Some((output, path)) = todo.pop() {
                let key = remap_key(&output.target, &output.input);
                let Some(entry) = self.io_remaps.get(&key) else {
                    result.push(output);
                    continue;
                };

                if path.contains(&key) {
                    warn!(
                        "Connection {} -> {}.{} loops back through its own remap, leaving it as-is",
                        output.output, output.target, output.input
                    );
                    result.push(output);
                    continue;
                }

                if path.len() >= self.options.max_remap_depth {
                    warn!(
                        "Connection {} -> {}.{} was remapped {} times, leaving it as-is",
                        output.output,
                        output.target,
                        output.input,
                        path.len()
                    );
                    result.push(output);
                    continue;
                }

                changed = true;
                rewritten += 1;

                let mut next_path = path;
                next_path.push(key);
                for remap in entry.outputs.iter().rev() {
                    todo.push((route(&output, remap), next_path.clone()));
                }

                if !entry.remove {
                    result.push(output);
                }
            }

            if changed {
                self.graph.set_outputs(entity_id, result);
            }
        }

        debug!(
            "applied {} io remaps, rewrote {} connections",
            self.io_remaps.len(),
            rewritten
        );
        self.io_remaps.clear();
        rewritten
    }
}

// `original` fired into a remapped input, send it straight to the remap's destination
fn route(original: &Output, remap: &Output) -> Output {
    let params = if remap.params.is_empty() {
        original.params.clone()
    } else {
        remap.params.clone()
    };

    Output {
        output: original.output.clone(),
        target: remap.target.clone(),
        input: remap.input.clone(),
        params,
        delay: original.delay + remap.delay,
        times: Output::combine_times(original.times, remap.times),
    }
}

#[cfg(test)]
mod tests {
    use vmf::EntityDef;

    use super::*;

    fn button_firing(target: &str, input: &str) -> EntityGraph {
        EntityGraph::from_defs(vec![EntityDef::new("func_button")
            .with_key("targetname", "button")
            .with_output(Output::new("OnPressed", target, input).with_delay(0.5))])
    }

    fn button_outputs(ctx: &Context) -> Vec<Output> {
        let button = ctx.graph().by_target("button")[0];
        ctx.graph().outputs(button)
    }

    #[test]
    fn test_rewire_replaces_connection() {
        let mut ctx = Context::new(button_firing("R1", "Trigger"));
        ctx.add_io_remap(
            "r1",
            Output::new("trigger", "door1", "Open").with_delay(3.0),
            true,
        );

        assert_eq!(ctx.apply_io_remaps(), 1);
        assert_eq!(
            button_outputs(&ctx),
            vec![Output::new("OnPressed", "door1", "Open").with_delay(3.5)]
        );
        assert_eq!(ctx.io_remap_count(), 0);
    }

    #[test]
    fn test_rewire_keeps_original_without_remove() {
        let mut ctx = Context::new(button_firing("shared", "Trigger"));
        ctx.add_io_remap("shared", Output::new("trigger", "door1", "Open"), false);

        ctx.apply_io_remaps();
        let outputs = button_outputs(&ctx);
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].target, "shared");
        assert_eq!(outputs[1].target, "door1");
    }

    #[test]
    fn test_multiple_destinations_keep_order() {
        let mut ctx = Context::new(button_firing("R1", "Trigger"));
        ctx.add_io_remap("R1", Output::new("trigger", "a", "Open"), true);
        ctx.add_io_remap("R1", Output::new("trigger", "b", "Close"), true);

        ctx.apply_io_remaps();
        let targets: Vec<String> = button_outputs(&ctx).into_iter().map(|o| o.target).collect();
        assert_eq!(targets, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn test_removal_deletes_connection() {
        let mut ctx = Context::new(button_firing("R2", "Trigger"));
        ctx.add_io_remap_removal("R2", "trigger");

        assert_eq!(ctx.apply_io_remaps(), 1);
        assert!(button_outputs(&ctx).is_empty());
    }

    #[test]
    fn test_removal_does_not_override_rewire() {
        let mut ctx = Context::new(EntityGraph::new());
        ctx.add_io_remap("R1", Output::new("trigger", "door1", "Open"), true);
        ctx.add_io_remap_removal("R1", "Trigger");

        let entry = ctx.io_remap("r1", "TRIGGER").unwrap();
        assert_eq!(entry.outputs.len(), 1);
        assert!(entry.remove);
    }

    #[test]
    fn test_remove_flag_is_conservative() {
        let mut ctx = Context::new(EntityGraph::new());
        ctx.register(IoRemap::Rewire {
            name: "R1".to_owned(),
            output: Output::new("trigger", "a", "Open"),
            remove: true,
        });
        ctx.register(IoRemap::Rewire {
            name: "R1".to_owned(),
            output: Output::new("trigger", "b", "Open"),
            remove: false,
        });

        assert!(!ctx.io_remap("R1", "trigger").unwrap().remove);
    }

    #[test]
    fn test_chained_remaps_collapse() {
        let mut ctx = Context::new(button_firing("R1", "Trigger"));
        ctx.add_io_remap(
            "R1",
            Output::new("trigger", "R2", "Trigger").with_delay(1.0),
            true,
        );
        ctx.add_io_remap(
            "R2",
            Output::new("trigger", "door1", "Open")
                .with_delay(2.0)
                .with_times(1),
            true,
        );

        assert_eq!(ctx.apply_io_remaps(), 2);
        assert_eq!(
            button_outputs(&ctx),
            vec![Output::new("OnPressed", "door1", "Open")
                .with_delay(3.5)
                .with_times(1)]
        );
    }

    #[test]
    fn test_params_fall_back_to_original() {
        let graph = EntityGraph::from_defs(vec![EntityDef::new("func_button")
            .with_key("targetname", "button")
            .with_output(Output::new("OnPressed", "R1", "Trigger").with_params("5"))]);
        let mut ctx = Context::new(graph);
        ctx.add_io_remap("R1", Output::new("trigger", "counter", "Add"), true);
        ctx.add_io_remap(
            "R1",
            Output::new("trigger", "counter", "Subtract").with_params("2"),
            true,
        );

        ctx.apply_io_remaps();
        let outputs = button_outputs(&ctx);
        assert_eq!(outputs[0].params, "5");
        assert_eq!(outputs[1].params, "2");
    }

    #[test]
    fn test_remap_chain_stops_at_max_depth() {
        let mut ctx = Context::with_options(
            button_firing("a", "Trigger"),
            ContextOptions { max_remap_depth: 2 },
        );
        ctx.add_io_remap("a", Output::new("trigger", "b", "Trigger"), true);
        ctx.add_io_remap("b", Output::new("trigger", "c", "Trigger"), true);
        ctx.add_io_remap("c", Output::new("trigger", "d", "Trigger"), true);

        assert_eq!(ctx.apply_io_remaps(), 2);
        let outputs = button_outputs(&ctx);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].target, "c");
    }

    #[test]
    fn test_remap_self_loop_is_kept() {
        let mut ctx = Context::new(button_firing("loop", "Trigger"));
        ctx.add_io_remap("loop", Output::new("trigger", "loop", "Trigger"), true);

        assert_eq!(ctx.apply_io_remaps(), 1);
        let outputs = button_outputs(&ctx);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].target, "loop");
    }

    #[test]
    fn test_remap_loop_with_fan_out_terminates() {
        let mut ctx = Context::new(button_firing("r", "Trigger"));
        ctx.add_io_remap("r", Output::new("trigger", "r", "Trigger"), true);
        ctx.add_io_remap("r", Output::new("trigger", "r", "Trigger"), true);

        assert_eq!(ctx.apply_io_remaps(), 1);
        let outputs = button_outputs(&ctx);
        assert_eq!(outputs.len(), 2);
        assert!(outputs.iter().all(|out| out.target == "r"));
    }

    #[test]
    fn test_two_relay_loop_with_fan_out_terminates() {
        let mut ctx = Context::new(button_firing("a", "Trigger"));
        for _ in 0..2 {
            ctx.add_io_remap("a", Output::new("trigger", "b", "Trigger"), true);
            ctx.add_io_remap("b", Output::new("trigger", "a", "Trigger"), true);
        }

        // a -> 2x b -> 4x a, which is where the loop is cut
        assert_eq!(ctx.apply_io_remaps(), 3);
        let outputs = button_outputs(&ctx);
        assert_eq!(outputs.len(), 4);
        assert!(outputs.iter().all(|out| out.target == "a"));
    }

    #[test]
    fn test_remap_keys_ignore_unicode_case() {
        let mut ctx = Context::new(button_firing("TÜR_RELAY", "Trigger"));
        ctx.add_io_remap("tür_relay", Output::new("trigger", "door1", "Open"), true);

        assert_eq!(ctx.apply_io_remaps(), 1);
        assert_eq!(button_outputs(&ctx)[0].target, "door1");
    }

    #[test]
    fn test_unrelated_connections_untouched() {
        let mut ctx = Context::new(button_firing("door9", "Open"));
        ctx.add_io_remap("R1", Output::new("trigger", "door1", "Open"), true);

        assert_eq!(ctx.apply_io_remaps(), 0);
        assert_eq!(
            button_outputs(&ctx),
            vec![Output::new("OnPressed", "door9", "Open").with_delay(0.5)]
        );
    }
}
