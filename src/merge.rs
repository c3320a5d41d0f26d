//! The import merge engine: reconciles flattened tokens against existing
//! host state, one token at a time, in traversal order.
//!
//! Conflict resolution is modeled as an explicit step function instead of
//! a callback held across an await point. [`VariableMerge::run`] (and the
//! effect twin) processes tokens until it either finishes or parks on a
//! name collision that has no sticky decision yet; the caller relays the
//! user's [`ConflictAction`] through `resolve` and calls `run` again.
//! One engine instance serves exactly one import run.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::codec::{self, ConvertError, DropShadow};
use crate::document::{Scalar, TokenValue};
use crate::flatten::{Category, ParsedToken, CATEGORY_ORDER};
use crate::host::{
    CollectionHandle, Effect, HostError, HostValue, ModeId, StyleId, VariableId, VariableStore,
    VariableType,
};

/// Which kind of host entity a conflict is about. Sticky decisions never
/// cross kinds: an `override-all` granted for variables does not apply
/// to effect styles, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictKind {
    Variable,
    Effect,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConflictKind::Variable => f.write_str("variable"),
            ConflictKind::Effect => f.write_str("effect"),
        }
    }
}

/// A user's answer to one conflict prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictAction {
    OverrideOnce,
    OverrideAll,
    IgnoreOnce,
    IgnoreAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sticky {
    Override,
    Ignore,
}

/// Counters and warnings for one merge pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

/// Aggregate result of a whole import, in the wire shape the UI expects.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub collections: usize,
    pub variables: usize,
    pub variables_updated: usize,
    pub variables_skipped: usize,
    pub effect_styles: usize,
    pub effect_styles_updated: usize,
    pub effect_styles_skipped: usize,
    pub warnings: Vec<String>,
}

impl ImportSummary {
    pub fn from_passes(
        collections: usize,
        variables: MergeSummary,
        effects: MergeSummary,
    ) -> Self {
        let mut warnings = variables.warnings;
        warnings.extend(effects.warnings);
        ImportSummary {
            collections,
            variables: variables.created,
            variables_updated: variables.updated,
            variables_skipped: variables.skipped,
            effect_styles: effects.created,
            effect_styles_updated: effects.updated,
            effect_styles_skipped: effects.skipped,
            warnings,
        }
    }
}

/// What a call to `run` came back with.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeStep {
    /// The pass is parked on a name collision and needs a
    /// [`ConflictAction`] before it can continue.
    Conflict { name: String, kind: ConflictKind },
    /// The pass consumed every token.
    Complete(MergeSummary),
}

/// Looks up or creates one collection per used category, walking
/// [`CATEGORY_ORDER`] so creation order is deterministic. A freshly
/// created collection gets its default mode renamed to `Default`.
pub fn ensure_collections<S: VariableStore + ?Sized>(
    store: &mut S,
    used: &HashSet<Category>,
    progress: &mut dyn FnMut(&str),
) -> Result<HashMap<Category, CollectionHandle>, HostError> {
    let mut collections = HashMap::new();

    for category in CATEGORY_ORDER {
        if !used.contains(&category) {
            continue;
        }

        let existing = store
            .collections()?
            .into_iter()
            .find(|c| c.name == category.as_str());

        match existing {
            Some(handle) => {
                progress(&format!("Using existing collection: {category}"));
                collections.insert(category, handle);
            }
            None => {
                progress(&format!("Creating collection: {category}"));
                let handle = store.create_collection(category.as_str())?;
                store.rename_mode(handle.id, handle.default_mode, "Default")?;
                collections.insert(category, handle);
            }
        }
    }

    Ok(collections)
}

/// Converts a token's value into the host representation dictated by its
/// resolved type.
pub fn convert_value(token: &ParsedToken) -> Result<HostValue, ConvertError> {
    let value = &token.value;
    match token.token_type.as_str() {
        "color" => match value {
            TokenValue::Text(s) => codec::parse_color(s)
                .map(HostValue::Color)
                .ok_or_else(|| ConvertError::InvalidColor(s.clone())),
            _ => Err(ConvertError::Unrepresentable),
        },
        "fontFamily" => match value {
            TokenValue::FontStack(stack) => stack
                .first()
                .cloned()
                .map(HostValue::Text)
                .ok_or(ConvertError::Unrepresentable),
            TokenValue::Text(s) => Ok(HostValue::Text(s.clone())),
            _ => Err(ConvertError::Unrepresentable),
        },
        "fontWeight" | "number" => match value {
            TokenValue::Number(n) => Ok(HostValue::Number(*n)),
            TokenValue::Text(s) => Ok(HostValue::Number(codec::leading_float(s).unwrap_or(0.0))),
            _ => Err(ConvertError::Unrepresentable),
        },
        "dimension" => match value {
            TokenValue::Number(n) => Ok(HostValue::Number(codec::parse_dimension(
                &Scalar::Number(*n),
            ))),
            TokenValue::Text(s) => Ok(HostValue::Number(codec::parse_dimension(&Scalar::Text(
                s.clone(),
            )))),
            _ => Err(ConvertError::Unrepresentable),
        },
        "duration" => match value {
            TokenValue::Number(n) => Ok(HostValue::Number(codec::parse_duration(
                &Scalar::Number(*n),
            ))),
            TokenValue::Text(s) => Ok(HostValue::Number(codec::parse_duration(&Scalar::Text(
                s.clone(),
            )))),
            _ => Err(ConvertError::Unrepresentable),
        },
        _ => match value {
            TokenValue::Number(n) => Ok(HostValue::Number(*n)),
            TokenValue::Text(s) => match codec::leading_float(s) {
                Some(n) => Ok(HostValue::Number(n)),
                None => Ok(HostValue::Text(s.clone())),
            },
            _ => Err(ConvertError::Unrepresentable),
        },
    }
}

/// Host data type for a converted value. `dimension` and `duration`
/// tokens become `Dimension` variables so export can restore the `px`
/// suffix; other numerics are pure floats and export bare.
pub fn variable_type_for(token_type: &str, value: &HostValue) -> VariableType {
    match token_type {
        "color" => VariableType::Color,
        "fontFamily" => VariableType::String,
        "dimension" | "duration" => VariableType::Dimension,
        "fontWeight" | "number" => VariableType::Float,
        _ => match value {
            HostValue::Text(_) => VariableType::String,
            _ => VariableType::Float,
        },
    }
}

struct PendingVariable {
    name: String,
    variable: VariableId,
    mode: ModeId,
    value: HostValue,
}

/// Merge pass over the variable-bearing token subset.
pub struct VariableMerge {
    tokens: Vec<ParsedToken>,
    collections: HashMap<Category, CollectionHandle>,
    index: usize,
    seen: HashSet<(Category, String)>,
    sticky: Option<Sticky>,
    pending: Option<PendingVariable>,
    decision: Option<ConflictAction>,
    summary: MergeSummary,
}

impl VariableMerge {
    pub fn new(tokens: Vec<ParsedToken>, collections: HashMap<Category, CollectionHandle>) -> Self {
        VariableMerge {
            tokens,
            collections,
            index: 0,
            seen: HashSet::new(),
            sticky: None,
            pending: None,
            decision: None,
            summary: MergeSummary::default(),
        }
    }

    /// `(processed, total)` for progress reporting.
    pub fn progress(&self) -> (usize, usize) {
        (self.index, self.tokens.len())
    }

    /// Records the decision for the currently parked conflict. The next
    /// `run` applies it. Without a parked conflict this is a no-op.
    pub fn resolve(&mut self, action: ConflictAction) {
        if self.pending.is_some() {
            self.decision = Some(action);
        }
    }

    /// Processes tokens in order until the pass completes or parks on an
    /// unresolved conflict. Calling `run` again while parked re-returns
    /// the same conflict.
    pub fn run<S: VariableStore + ?Sized>(
        &mut self,
        store: &mut S,
        progress: &mut dyn FnMut(usize, usize),
    ) -> MergeStep {
        if let Some(pending) = self.pending.take() {
            match self.decision.take() {
                Some(action) => {
                    self.apply(store, pending, action);
                    self.index += 1;
                }
                None => {
                    let step = MergeStep::Conflict {
                        name: pending.name.clone(),
                        kind: ConflictKind::Variable,
                    };
                    self.pending = Some(pending);
                    return step;
                }
            }
        }

        let total = self.tokens.len();
        while self.index < total {
            progress(self.index + 1, total);
            let token = self.tokens[self.index].clone();
            if let Some(conflict) = self.step(store, token) {
                return conflict;
            }
            self.index += 1;
        }

        MergeStep::Complete(std::mem::take(&mut self.summary))
    }

    fn step<S: VariableStore + ?Sized>(
        &mut self,
        store: &mut S,
        token: ParsedToken,
    ) -> Option<MergeStep> {
        let Some(collection) = self.collections.get(&token.category).cloned() else {
            self.warn(format!("No collection for category: {}", token.category));
            return None;
        };

        let key = (token.category, token.name.clone());
        if self.seen.contains(&key) {
            self.warn(format!("Duplicate token skipped: {}", token.name));
            return None;
        }

        let value = match convert_value(&token) {
            Ok(value) => value,
            Err(e) => {
                self.warn(format!("Could not convert value for {}: {e}", token.name));
                return None;
            }
        };

        match store.find_variable(collection.id, &token.name) {
            Err(e) => {
                self.warn(format!("Failed to process {}: {e}", token.name));
                None
            }
            Ok(None) => {
                let variable_type = variable_type_for(&token.token_type, &value);
                let created = store
                    .create_variable(collection.id, &token.name, variable_type)
                    .and_then(|id| {
                        store.set_variable_value(id, collection.default_mode, value)
                    });
                match created {
                    Ok(()) => {
                        self.seen.insert(key);
                        self.summary.created += 1;
                    }
                    Err(e) => self.warn(format!("Failed to create {}: {e}", token.name)),
                }
                None
            }
            Ok(Some(existing)) => {
                self.seen.insert(key);
                match self.sticky {
                    Some(Sticky::Override) => {
                        self.override_value(
                            store,
                            &token.name,
                            existing,
                            collection.default_mode,
                            value,
                        );
                        None
                    }
                    Some(Sticky::Ignore) => {
                        self.summary.skipped += 1;
                        None
                    }
                    None => {
                        debug!("variable conflict, awaiting decision: {}", token.name);
                        self.pending = Some(PendingVariable {
                            name: token.name.clone(),
                            variable: existing,
                            mode: collection.default_mode,
                            value,
                        });
                        Some(MergeStep::Conflict {
                            name: token.name,
                            kind: ConflictKind::Variable,
                        })
                    }
                }
            }
        }
    }

    fn apply<S: VariableStore + ?Sized>(
        &mut self,
        store: &mut S,
        pending: PendingVariable,
        action: ConflictAction,
    ) {
        let PendingVariable {
            name,
            variable,
            mode,
            value,
        } = pending;
        match action {
            ConflictAction::OverrideAll => {
                self.sticky = Some(Sticky::Override);
                self.override_value(store, &name, variable, mode, value);
            }
            ConflictAction::OverrideOnce => {
                self.override_value(store, &name, variable, mode, value);
            }
            ConflictAction::IgnoreAll => {
                self.sticky = Some(Sticky::Ignore);
                self.summary.skipped += 1;
            }
            ConflictAction::IgnoreOnce => {
                self.summary.skipped += 1;
            }
        }
    }

    fn override_value<S: VariableStore + ?Sized>(
        &mut self,
        store: &mut S,
        name: &str,
        variable: VariableId,
        mode: ModeId,
        value: HostValue,
    ) {
        match store.set_variable_value(variable, mode, value) {
            Ok(()) => self.summary.updated += 1,
            Err(e) => self.warn(format!("Failed to update {name}: {e}")),
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.summary.warnings.push(message);
    }
}

struct PendingEffect {
    name: String,
    style: StyleId,
    shadow: DropShadow,
}

/// Merge pass over the shadow-bearing token subset, targeting effect
/// styles. Same protocol as [`VariableMerge`], with its own independent
/// sticky state.
pub struct EffectMerge {
    tokens: Vec<ParsedToken>,
    index: usize,
    seen: HashSet<String>,
    sticky: Option<Sticky>,
    pending: Option<PendingEffect>,
    decision: Option<ConflictAction>,
    summary: MergeSummary,
}

impl EffectMerge {
    pub fn new(tokens: Vec<ParsedToken>) -> Self {
        EffectMerge {
            tokens,
            index: 0,
            seen: HashSet::new(),
            sticky: None,
            pending: None,
            decision: None,
            summary: MergeSummary::default(),
        }
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.index, self.tokens.len())
    }

    pub fn resolve(&mut self, action: ConflictAction) {
        if self.pending.is_some() {
            self.decision = Some(action);
        }
    }

    pub fn run<S: VariableStore + ?Sized>(
        &mut self,
        store: &mut S,
        progress: &mut dyn FnMut(usize, usize),
    ) -> MergeStep {
        if let Some(pending) = self.pending.take() {
            match self.decision.take() {
                Some(action) => {
                    self.apply(store, pending, action);
                    self.index += 1;
                }
                None => {
                    let step = MergeStep::Conflict {
                        name: pending.name.clone(),
                        kind: ConflictKind::Effect,
                    };
                    self.pending = Some(pending);
                    return step;
                }
            }
        }

        let total = self.tokens.len();
        while self.index < total {
            progress(self.index + 1, total);
            let token = self.tokens[self.index].clone();
            if let Some(conflict) = self.step(store, token) {
                return conflict;
            }
            self.index += 1;
        }

        MergeStep::Complete(std::mem::take(&mut self.summary))
    }

    fn step<S: VariableStore + ?Sized>(
        &mut self,
        store: &mut S,
        token: ParsedToken,
    ) -> Option<MergeStep> {
        if self.seen.contains(&token.name) {
            self.warn(format!("Duplicate shadow skipped: {}", token.name));
            return None;
        }

        // Shape first, values second: a value that is not shadow-shaped
        // at all warns differently from a shadow whose fields are bad.
        let TokenValue::Shadow(shadow_value) = &token.value else {
            self.warn(format!("Not a shadow value: {}", token.name));
            return None;
        };

        let shadow = match codec::parse_shadow(shadow_value) {
            Ok(shadow) => shadow,
            Err(e) => {
                self.warn(format!("Invalid shadow value for {}: {e}", token.name));
                return None;
            }
        };

        match store.find_effect_style(&token.name) {
            Err(e) => {
                self.warn(format!("Failed to process {}: {e}", token.name));
                None
            }
            Ok(None) => {
                match store.create_effect_style(&token.name, vec![Effect::DropShadow(shadow)]) {
                    Ok(_) => {
                        self.seen.insert(token.name);
                        self.summary.created += 1;
                    }
                    Err(e) => self.warn(format!("Failed to create shadow {}: {e}", token.name)),
                }
                None
            }
            Ok(Some(existing)) => {
                self.seen.insert(token.name.clone());
                match self.sticky {
                    Some(Sticky::Override) => {
                        self.override_effects(store, &token.name, existing, shadow);
                        None
                    }
                    Some(Sticky::Ignore) => {
                        self.summary.skipped += 1;
                        None
                    }
                    None => {
                        debug!("effect conflict, awaiting decision: {}", token.name);
                        self.pending = Some(PendingEffect {
                            name: token.name.clone(),
                            style: existing,
                            shadow,
                        });
                        Some(MergeStep::Conflict {
                            name: token.name,
                            kind: ConflictKind::Effect,
                        })
                    }
                }
            }
        }
    }

    fn apply<S: VariableStore + ?Sized>(
        &mut self,
        store: &mut S,
        pending: PendingEffect,
        action: ConflictAction,
    ) {
        let PendingEffect { name, style, shadow } = pending;
        match action {
            ConflictAction::OverrideAll => {
                self.sticky = Some(Sticky::Override);
                self.override_effects(store, &name, style, shadow);
            }
            ConflictAction::OverrideOnce => {
                self.override_effects(store, &name, style, shadow);
            }
            ConflictAction::IgnoreAll => {
                self.sticky = Some(Sticky::Ignore);
                self.summary.skipped += 1;
            }
            ConflictAction::IgnoreOnce => {
                self.summary.skipped += 1;
            }
        }
    }

    fn override_effects<S: VariableStore + ?Sized>(
        &mut self,
        store: &mut S,
        name: &str,
        style: StyleId,
        shadow: DropShadow,
    ) {
        match store.set_style_effects(style, vec![Effect::DropShadow(shadow)]) {
            Ok(()) => self.summary.updated += 1,
            Err(e) => self.warn(format!("Failed to update shadow {name}: {e}")),
        }
    }

    fn warn(&mut self, message: String) {
        warn!("{message}");
        self.summary.warnings.push(message);
    }
}
