use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use shipyard::{EntityId, Get, IntoIter, IntoWithId, View, World};
use tracing::trace;

use crate::{
    properties::{Outputs, PropClassName, PropKeyValues, PropTargetName},
    Output, KEY_TARGETNAME,
};

///
/// EntityDef
///
/// Plain description of an entity, used to populate the graph and to dump it back out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDef {
    pub classname: String,
    #[serde(default)]
    pub keys: HashMap<String, String>,
    #[serde(default)]
    pub outputs: Vec<Output>,
}

impl EntityDef {
    pub fn new(classname: &str) -> EntityDef {
        EntityDef {
            classname: classname.to_owned(),
            keys: HashMap::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_key(mut self, key: &str, value: &str) -> EntityDef {
        self.keys.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn with_output(mut self, output: Output) -> EntityDef {
        self.outputs.push(output);
        self
    }
}

///
/// EntityGraph
///
/// All entities of a map, stored in an ECS world. Names are not unique, so lookups by
/// name or by class always return every match.
pub struct EntityGraph {
    world: World,
    // Insertion order, so transforms visit entities the same way on every run
    order: Vec<EntityId>,
}

impl Default for EntityGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityGraph {
    pub fn new() -> EntityGraph {
        EntityGraph {
            world: World::new(),
            order: Vec::new(),
        }
    }

    pub fn from_defs(defs: Vec<EntityDef>) -> EntityGraph {
        let mut graph = EntityGraph::new();
        for def in defs {
            graph.add_entity(def);
        }
        graph
    }

    pub fn from_json(json: &str) -> Result<EntityGraph, serde_json::Error> {
        let defs: Vec<EntityDef> = serde_json::from_str(json)?;
        Ok(EntityGraph::from_defs(defs))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_defs())
    }

    pub fn add_entity(&mut self, def: EntityDef) -> EntityId {
        let keys = PropKeyValues::from_map(&def.keys);
        let targetname = keys.get(KEY_TARGETNAME).unwrap_or("").to_owned();

        let entity = self.world.add_entity((
            PropClassName(def.classname),
            PropTargetName(targetname),
            keys,
            Outputs {
                outputs: def.outputs,
            },
        ));
        self.order.push(entity);
        entity
    }

    pub fn remove_entity(&mut self, entity_id: EntityId) -> bool {
        trace!("removing entity: {:?}", entity_id);
        self.order.retain(|id| *id != entity_id);
        self.world.delete_entity(entity_id)
    }

    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.order.contains(&entity_id)
    }

    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn by_class(&self, classname: &str) -> Vec<EntityId> {
        self.world.run(|v_classname: View<PropClassName>| {
            self.order
                .iter()
                .copied()
                .filter(|id| {
                    v_classname
                        .get(*id)
                        .map(|class| class.is(classname))
                        .unwrap_or(false)
                })
                .collect()
        })
    }

    pub fn by_target(&self, name: &str) -> Vec<EntityId> {
        let mut matches = Vec::new();
        self.world.run(|v_targetname: View<PropTargetName>| {
            for (id, targetname) in v_targetname.iter().with_id() {
                if targetname.matches(name) {
                    matches.push(id);
                }
            }
        });
        matches
    }

    pub fn classname(&self, entity_id: EntityId) -> String {
        self.world.run(|v_classname: View<PropClassName>| {
            v_classname
                .get(entity_id)
                .map(|class| class.0.clone())
                .unwrap_or_default()
        })
    }

    pub fn targetname(&self, entity_id: EntityId) -> String {
        self.world.run(|v_targetname: View<PropTargetName>| {
            v_targetname
                .get(entity_id)
                .map(|name| name.0.clone())
                .unwrap_or_default()
        })
    }

    pub fn get_key(&self, entity_id: EntityId, key: &str) -> Option<String> {
        self.world.run(|v_keys: View<PropKeyValues>| {
            v_keys
                .get(entity_id)
                .ok()
                .and_then(|keys| keys.get(key).map(|v| v.to_owned()))
        })
    }

    pub fn has_key(&self, entity_id: EntityId, key: &str) -> bool {
        self.world.run(|v_keys: View<PropKeyValues>| {
            v_keys
                .get(entity_id)
                .map(|keys| keys.contains(key))
                .unwrap_or(false)
        })
    }

    pub fn set_key(&mut self, entity_id: EntityId, key: &str, value: &str) {
        if !self.contains(entity_id) {
            return;
        }

        let mut keys = self.world.run(|v_keys: View<PropKeyValues>| {
            v_keys.get(entity_id).cloned().unwrap_or_default()
        });
        keys.set(key, value);
        self.world.add_component(entity_id, keys);

        if key.eq_ignore_ascii_case(KEY_TARGETNAME) {
            self.world
                .add_component(entity_id, PropTargetName(value.to_owned()));
        }
    }

    pub fn outputs(&self, entity_id: EntityId) -> Vec<Output> {
        self.world.run(|v_outputs: View<Outputs>| {
            v_outputs
                .get(entity_id)
                .map(|o| o.outputs.clone())
                .unwrap_or_default()
        })
    }

    pub fn set_outputs(&mut self, entity_id: EntityId, outputs: Vec<Output>) {
        if !self.contains(entity_id) {
            return;
        }
        self.world.add_component(entity_id, Outputs { outputs });
    }

    pub fn to_def(&self, entity_id: EntityId) -> Option<EntityDef> {
        if !self.contains(entity_id) {
            return None;
        }

        let keys = self.world.run(|v_keys: View<PropKeyValues>| {
            v_keys
                .get(entity_id)
                .map(|keys| keys.to_map())
                .unwrap_or_default()
        });

        Some(EntityDef {
            classname: self.classname(entity_id),
            keys,
            outputs: self.outputs(entity_id),
        })
    }

    pub fn to_defs(&self) -> Vec<EntityDef> {
        self.order
            .iter()
            .filter_map(|id| self.to_def(*id))
            .collect()
    }
}
