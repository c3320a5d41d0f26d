//! The host-store collaborator boundary.
//!
//! The merge engine and the export serializer never talk to a design
//! tool directly; they go through [`VariableStore`]. Implementations
//! adapt a real host's variable/collection/style storage. Calls are made
//! strictly sequentially and none is assumed atomic with any other.
//! [`InMemoryStore`] is a complete reference implementation used by the
//! crate's own tests and benchmarks.

use std::collections::HashMap;

use thiserror::Error;

use crate::codec::{DropShadow, Rgba};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    #[error("unknown collection id {0:?}")]
    UnknownCollection(CollectionId),

    #[error("unknown variable id {0:?}")]
    UnknownVariable(VariableId),

    #[error("unknown style id {0:?}")]
    UnknownStyle(StyleId),

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollectionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleId(pub u64);

/// One destination bucket in the host store, with its default mode.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionHandle {
    pub id: CollectionId,
    pub name: String,
    pub default_mode: ModeId,
}

/// The host's resolved data type for a variable.
///
/// `Dimension` and `Float` are both numeric; the distinction matters only
/// on export, where dimensions are re-serialized with a `px` suffix and
/// pure floats stay bare numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableType {
    Color,
    Float,
    Dimension,
    String,
}

/// A value stored in a variable mode slot. `Alias` references another
/// variable; the export serializer skips aliases rather than
/// dereferencing them.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Color(Rgba),
    Number(f64),
    Text(String),
    Alias(VariableId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub id: VariableId,
    pub name: String,
    pub variable_type: VariableType,
    pub value: Option<HostValue>,
    pub description: Option<String>,
}

/// An effect attached to a style. Only visible drop shadows are
/// exportable; the other variants exist so filtering is observable.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    DropShadow(DropShadow),
    InnerShadow(DropShadow),
    LayerBlur { radius: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectStyleRecord {
    pub id: StyleId,
    pub name: String,
    pub effects: Vec<Effect>,
    pub description: Option<String>,
}

/// The operations the import and export pipelines need from a host.
pub trait VariableStore {
    fn collections(&self) -> Result<Vec<CollectionHandle>, HostError>;

    /// Creates a collection with one default mode.
    fn create_collection(&mut self, name: &str) -> Result<CollectionHandle, HostError>;

    fn rename_mode(
        &mut self,
        collection: CollectionId,
        mode: ModeId,
        name: &str,
    ) -> Result<(), HostError>;

    /// Finds a variable by name, scoped to one collection.
    fn find_variable(
        &self,
        collection: CollectionId,
        name: &str,
    ) -> Result<Option<VariableId>, HostError>;

    fn create_variable(
        &mut self,
        collection: CollectionId,
        name: &str,
        variable_type: VariableType,
    ) -> Result<VariableId, HostError>;

    fn set_variable_value(
        &mut self,
        variable: VariableId,
        mode: ModeId,
        value: HostValue,
    ) -> Result<(), HostError>;

    /// All variables in a collection, for the default mode, in creation
    /// order.
    fn variables_in(&self, collection: CollectionId) -> Result<Vec<VariableRecord>, HostError>;

    fn effect_styles(&self) -> Result<Vec<EffectStyleRecord>, HostError>;

    fn find_effect_style(&self, name: &str) -> Result<Option<StyleId>, HostError>;

    fn create_effect_style(
        &mut self,
        name: &str,
        effects: Vec<Effect>,
    ) -> Result<StyleId, HostError>;

    fn set_style_effects(&mut self, style: StyleId, effects: Vec<Effect>)
        -> Result<(), HostError>;
}

#[derive(Debug)]
struct StoredCollection {
    name: String,
    default_mode: ModeId,
    mode_names: HashMap<ModeId, String>,
    variables: Vec<VariableId>,
}

#[derive(Debug)]
struct StoredVariable {
    name: String,
    variable_type: VariableType,
    values: HashMap<ModeId, HostValue>,
    description: Option<String>,
}

/// In-memory [`VariableStore`] with the same observable behavior a real
/// host adapter is expected to have.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    next_id: u64,
    collections: Vec<(CollectionId, StoredCollection)>,
    variables: HashMap<VariableId, StoredVariable>,
    styles: Vec<(StyleId, EffectStyleRecord)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn collection_mut(&mut self, id: CollectionId) -> Result<&mut StoredCollection, HostError> {
        self.collections
            .iter_mut()
            .find(|(cid, _)| *cid == id)
            .map(|(_, c)| c)
            .ok_or(HostError::UnknownCollection(id))
    }

    fn collection(&self, id: CollectionId) -> Result<&StoredCollection, HostError> {
        self.collections
            .iter()
            .find(|(cid, _)| *cid == id)
            .map(|(_, c)| c)
            .ok_or(HostError::UnknownCollection(id))
    }

    /// Test/setup helper: seeds a variable with a description, the way a
    /// user-authored document in the host would carry one.
    pub fn set_variable_description(
        &mut self,
        variable: VariableId,
        description: &str,
    ) -> Result<(), HostError> {
        let stored = self
            .variables
            .get_mut(&variable)
            .ok_or(HostError::UnknownVariable(variable))?;
        stored.description = Some(description.to_string());
        Ok(())
    }

    pub fn set_style_description(
        &mut self,
        style: StyleId,
        description: &str,
    ) -> Result<(), HostError> {
        let record = self
            .styles
            .iter_mut()
            .find(|(sid, _)| *sid == style)
            .map(|(_, s)| s)
            .ok_or(HostError::UnknownStyle(style))?;
        record.description = Some(description.to_string());
        Ok(())
    }
}

impl VariableStore for InMemoryStore {
    fn collections(&self) -> Result<Vec<CollectionHandle>, HostError> {
        Ok(self
            .collections
            .iter()
            .map(|(id, c)| CollectionHandle {
                id: *id,
                name: c.name.clone(),
                default_mode: c.default_mode,
            })
            .collect())
    }

    fn create_collection(&mut self, name: &str) -> Result<CollectionHandle, HostError> {
        let id = CollectionId(self.next_id());
        let default_mode = ModeId(self.next_id());
        let mut mode_names = HashMap::new();
        mode_names.insert(default_mode, "Mode 1".to_string());
        self.collections.push((
            id,
            StoredCollection {
                name: name.to_string(),
                default_mode,
                mode_names,
                variables: Vec::new(),
            },
        ));
        Ok(CollectionHandle {
            id,
            name: name.to_string(),
            default_mode,
        })
    }

    fn rename_mode(
        &mut self,
        collection: CollectionId,
        mode: ModeId,
        name: &str,
    ) -> Result<(), HostError> {
        let stored = self.collection_mut(collection)?;
        stored.mode_names.insert(mode, name.to_string());
        Ok(())
    }

    fn find_variable(
        &self,
        collection: CollectionId,
        name: &str,
    ) -> Result<Option<VariableId>, HostError> {
        let stored = self.collection(collection)?;
        for id in &stored.variables {
            if let Some(v) = self.variables.get(id) {
                if v.name == name {
                    return Ok(Some(*id));
                }
            }
        }
        Ok(None)
    }

    fn create_variable(
        &mut self,
        collection: CollectionId,
        name: &str,
        variable_type: VariableType,
    ) -> Result<VariableId, HostError> {
        let id = VariableId(self.next_id());
        self.collection_mut(collection)?.variables.push(id);
        self.variables.insert(
            id,
            StoredVariable {
                name: name.to_string(),
                variable_type,
                values: HashMap::new(),
                description: None,
            },
        );
        Ok(id)
    }

    fn set_variable_value(
        &mut self,
        variable: VariableId,
        mode: ModeId,
        value: HostValue,
    ) -> Result<(), HostError> {
        let stored = self
            .variables
            .get_mut(&variable)
            .ok_or(HostError::UnknownVariable(variable))?;
        stored.values.insert(mode, value);
        Ok(())
    }

    fn variables_in(&self, collection: CollectionId) -> Result<Vec<VariableRecord>, HostError> {
        let stored = self.collection(collection)?;
        let mode = stored.default_mode;
        let mut records = Vec::new();
        for id in &stored.variables {
            let v = self
                .variables
                .get(id)
                .ok_or(HostError::UnknownVariable(*id))?;
            records.push(VariableRecord {
                id: *id,
                name: v.name.clone(),
                variable_type: v.variable_type,
                value: v.values.get(&mode).cloned(),
                description: v.description.clone(),
            });
        }
        Ok(records)
    }

    fn effect_styles(&self) -> Result<Vec<EffectStyleRecord>, HostError> {
        Ok(self.styles.iter().map(|(_, s)| s.clone()).collect())
    }

    fn find_effect_style(&self, name: &str) -> Result<Option<StyleId>, HostError> {
        Ok(self
            .styles
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| *id))
    }

    fn create_effect_style(
        &mut self,
        name: &str,
        effects: Vec<Effect>,
    ) -> Result<StyleId, HostError> {
        let id = StyleId(self.next_id());
        self.styles.push((
            id,
            EffectStyleRecord {
                id,
                name: name.to_string(),
                effects,
                description: None,
            },
        ));
        Ok(id)
    }

    fn set_style_effects(
        &mut self,
        style: StyleId,
        effects: Vec<Effect>,
    ) -> Result<(), HostError> {
        let record = self
            .styles
            .iter_mut()
            .find(|(sid, _)| *sid == style)
            .map(|(_, s)| s)
            .ok_or(HostError::UnknownStyle(style))?;
        record.effects = effects;
        Ok(())
    }
}
