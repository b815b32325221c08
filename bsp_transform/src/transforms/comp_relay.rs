use std::collections::HashMap;

use once_cell::sync::Lazy;
use shipyard::EntityId;
use tracing::{debug, warn};
use vmf::{
    conv::{conv_bool, conv_float},
    EntityGraph,
};

use crate::{Context, IoRemap};

use super::Transform;

pub const COMP_RELAY: &str = "comp_relay";

// Relay output -> the input that fires it
static RELAY_OUTPUT_TO_INPUT: Lazy<HashMap<String, String>> = Lazy::new(|| {
    let mut map = HashMap::new();
    map.insert("ontrigger".to_owned(), "trigger".to_owned());
    map.insert("onturnedon".to_owned(), "turnon".to_owned());
    map.insert("onturnedoff".to_owned(), "turnoff".to_owned());
    for i in 1..=8 {
        map.insert(format!("onuser{i}"), format!("fireuser{i}"));
    }
    map
});

pub fn relay_input_for_output(output: &str) -> Option<&'static str> {
    RELAY_OUTPUT_TO_INPUT
        .get(&output.to_ascii_lowercase())
        .map(|input| input.as_str())
}

///
/// is_relay_enabled
///
/// With ctrl_type 0, ctrl_value must be 1 for the relay to pass events along.
/// With ctrl_type 1 it is inverted, and ctrl_value must be 0.
pub fn is_relay_enabled(ctrl_type: Option<&str>, ctrl_value: Option<&str>) -> bool {
    match ctrl_type {
        Some(ctrl_type) => conv_bool(Some(ctrl_type), false) != conv_bool(ctrl_value, true),
        None => conv_bool(ctrl_value, true),
    }
}

// Inputs aimed at the relay's name can only be dropped if nothing else shares that name
pub fn can_remove_inputs(graph: &EntityGraph, name: &str) -> bool {
    graph
        .by_target(name)
        .into_iter()
        .all(|id| graph.classname(id).eq_ignore_ascii_case(COMP_RELAY))
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelaySummary {
    pub name: String,
    pub enabled: bool,
    pub extra_delay: f64,
    pub should_remove: bool,
    pub remaps: Vec<IoRemap>,
    // Output names with no matching relay input
    pub discarded: Vec<String>,
}

///
/// collapse_relay
///
/// Works out how callers of a relay should be rewired, without touching the graph
pub fn collapse_relay(graph: &EntityGraph, relay: EntityId) -> RelaySummary {
    let name = graph.targetname(relay);
    let should_remove = can_remove_inputs(graph, &name);

    let ctrl_type = graph.get_key(relay, "ctrl_type");
    let ctrl_value = graph.get_key(relay, "ctrl_value");
    let enabled = is_relay_enabled(ctrl_type.as_deref(), ctrl_value.as_deref());

    let extra_delay = conv_float(graph.get_key(relay, "delay").as_deref(), 0.0);

    let outputs = graph.outputs(relay);
    debug!(
        "relay \"{}\", enabled={}, delay={}, remove={}, {} outputs",
        name,
        enabled,
        extra_delay,
        should_remove,
        outputs.len()
    );

    let mut remaps = Vec::new();
    let mut discarded = Vec::new();
    for mut out in outputs {
        let Some(input) = relay_input_for_output(&out.output) else {
            warn!(
                "Unknown output \"{}\" on {} \"{}\", discarding it",
                out.output, COMP_RELAY, name
            );
            discarded.push(out.output);
            continue;
        };

        if enabled {
            out.output = input.to_owned();
            out.delay += extra_delay;
            remaps.push(IoRemap::Rewire {
                name: name.clone(),
                output: out,
                remove: should_remove,
            });
        } else if should_remove {
            // A disabled relay swallows the event, so callers can go too
            remaps.push(IoRemap::Remove {
                name: name.clone(),
                input: input.to_owned(),
            });
        }
        // Disabled and sharing a name: the callers keep firing at the other entity
    }

    RelaySummary {
        name,
        enabled,
        extra_delay,
        should_remove,
        remaps,
        discarded,
    }
}

pub fn collapse_relays(ctx: &mut Context) -> Vec<RelaySummary> {
    let mut summaries = Vec::new();
    for relay in ctx.graph().by_class(COMP_RELAY) {
        let summary = collapse_relay(ctx.graph(), relay);
        for remap in summary.remaps.iter().cloned() {
            ctx.register(remap);
        }
        ctx.graph_mut().remove_entity(relay);
        summaries.push(summary);
    }
    summaries
}

///
/// CompRelay
///
/// Zero-cost relays: every comp_relay is folded into the connections that call it,
/// then removed from the map.
pub struct CompRelay {}
impl CompRelay {
    pub fn new() -> CompRelay {
        CompRelay {}
    }
}

impl Transform for CompRelay {
    fn name(&self) -> &'static str {
        COMP_RELAY
    }

    fn priority(&self) -> i32 {
        10
    }

    fn run(&self, ctx: &mut Context) {
        let summaries = collapse_relays(ctx);
        if !summaries.is_empty() {
            debug!("collapsed {} relays", summaries.len());
        }
    }
}
