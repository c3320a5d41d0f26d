//! Request/response frames exchanged with the surrounding UI, and the
//! [`Session`] that drives the import/export pipelines against them.
//!
//! Frames are tagged JSON objects. Exactly one `conflict` frame can be
//! outstanding at a time: the sequential merge loop parks until the
//! matching `conflict-response` arrives.

use serde::{Deserialize, Serialize};

use crate::export::export_document;
use crate::flatten::{flatten, split_shadow_tokens, used_categories, ParsedToken};
use crate::merge::{
    ensure_collections, ConflictAction, ConflictKind, EffectMerge, ImportSummary, MergeStep,
    MergeSummary, VariableMerge,
};
use crate::host::VariableStore;
use crate::parser::parse_document;

/// Frames from the UI to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiRequest {
    /// Start an import of the given document text.
    Import { json: String },
    /// Serialize current host state back into a document.
    Export,
    /// Resolve the one pending conflict suspension.
    ConflictResponse { action: ConflictAction },
}

/// Frames from the engine to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiEvent {
    Progress {
        stage: String,
        current: usize,
        total: usize,
    },
    Complete {
        summary: ImportSummary,
    },
    ExportComplete {
        json: String,
        summary: ExportSummary,
    },
    Error {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Conflict {
        name: String,
        item_type: ConflictKind,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub variables: usize,
    pub effect_styles: usize,
}

enum Phase {
    Variables(VariableMerge),
    Effects(EffectMerge),
}

struct ImportRun {
    phase: Phase,
    shadow_tokens: Vec<ParsedToken>,
    collections: usize,
    variable_summary: Option<MergeSummary>,
}

/// One UI-facing session over a host store. Owns at most one import run
/// at a time; a run survives across `handle` calls while it waits for a
/// conflict decision.
pub struct Session<S: VariableStore> {
    store: S,
    active: Option<ImportRun>,
}

impl<S: VariableStore> Session<S> {
    pub fn new(store: S) -> Self {
        Session {
            store,
            active: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Whether an import is parked on an unresolved conflict.
    pub fn awaiting_conflict(&self) -> bool {
        self.active.is_some()
    }

    /// Processes one inbound frame, emitting any number of outbound
    /// frames through `emit`.
    pub fn handle(&mut self, request: UiRequest, emit: &mut dyn FnMut(UiEvent)) {
        match request {
            UiRequest::Import { json } => {
                if self.active.is_some() {
                    emit(UiEvent::Error {
                        message: "an import is already awaiting a conflict decision".to_string(),
                    });
                    return;
                }
                self.start_import(&json, emit);
            }
            UiRequest::ConflictResponse { action } => {
                let Some(run) = self.active.as_mut() else {
                    emit(UiEvent::Error {
                        message: "no conflict is awaiting a decision".to_string(),
                    });
                    return;
                };
                match &mut run.phase {
                    Phase::Variables(merge) => merge.resolve(action),
                    Phase::Effects(merge) => merge.resolve(action),
                }
                self.advance(emit);
            }
            UiRequest::Export => {
                emit(UiEvent::Progress {
                    stage: "Exporting tokens...".to_string(),
                    current: 0,
                    total: 1,
                });
                let result = export_document(&self.store, &mut |stage| {
                    emit(UiEvent::Progress {
                        stage: stage.to_string(),
                        current: 0,
                        total: 1,
                    })
                });
                match result.map_err(|e| e.to_string()).and_then(|output| {
                    let json = output.to_json().map_err(|e| e.to_string())?;
                    Ok((json, output))
                }) {
                    Ok((json, output)) => emit(UiEvent::ExportComplete {
                        json,
                        summary: ExportSummary {
                            variables: output.variable_count,
                            effect_styles: output.effect_count,
                        },
                    }),
                    Err(message) => emit(UiEvent::Error {
                        message: format!("Export failed: {message}"),
                    }),
                }
            }
        }
    }

    fn start_import(&mut self, json: &str, emit: &mut dyn FnMut(UiEvent)) {
        let stage = |stage: &str| UiEvent::Progress {
            stage: stage.to_string(),
            current: 0,
            total: 1,
        };

        emit(stage("Parsing JSON..."));
        let document = match parse_document(json) {
            Ok(document) => document,
            Err(e) => {
                emit(UiEvent::Error {
                    message: e.to_string(),
                });
                return;
            }
        };

        emit(stage("Analyzing tokens..."));
        let tokens = flatten(&document);
        if tokens.is_empty() {
            emit(UiEvent::Error {
                message: "No valid tokens found".to_string(),
            });
            return;
        }
        let (variables, shadows) = split_shadow_tokens(tokens);

        emit(stage("Creating collections..."));
        let used = used_categories(&variables);
        let collections =
            match ensure_collections(&mut self.store, &used, &mut |msg| emit(stage(msg))) {
                Ok(collections) => collections,
                Err(e) => {
                    emit(UiEvent::Error {
                        message: format!("Import failed: {e}"),
                    });
                    return;
                }
            };

        self.active = Some(ImportRun {
            collections: collections.len(),
            phase: Phase::Variables(VariableMerge::new(variables, collections)),
            shadow_tokens: shadows,
            variable_summary: None,
        });
        self.advance(emit);
    }

    /// Drives the active run until it completes or parks on a conflict.
    fn advance(&mut self, emit: &mut dyn FnMut(UiEvent)) {
        let Some(run) = self.active.as_mut() else {
            return;
        };

        loop {
            let step = match &mut run.phase {
                Phase::Variables(merge) => merge.run(&mut self.store, &mut |current, total| {
                    emit(UiEvent::Progress {
                        stage: format!("Creating variables... ({current}/{total})"),
                        current,
                        total,
                    })
                }),
                Phase::Effects(merge) => merge.run(&mut self.store, &mut |current, total| {
                    emit(UiEvent::Progress {
                        stage: format!("Creating effect styles... ({current}/{total})"),
                        current,
                        total,
                    })
                }),
            };

            match step {
                MergeStep::Conflict { name, kind } => {
                    emit(UiEvent::Conflict {
                        name,
                        item_type: kind,
                    });
                    return;
                }
                MergeStep::Complete(summary) => match &run.phase {
                    Phase::Variables(_) => {
                        run.variable_summary = Some(summary);
                        if run.shadow_tokens.is_empty() {
                            let variables = run.variable_summary.take().unwrap_or_default();
                            let import_summary = ImportSummary::from_passes(
                                run.collections,
                                variables,
                                MergeSummary::default(),
                            );
                            self.active = None;
                            emit(UiEvent::Complete {
                                summary: import_summary,
                            });
                            return;
                        }
                        let shadows = std::mem::take(&mut run.shadow_tokens);
                        run.phase = Phase::Effects(EffectMerge::new(shadows));
                    }
                    Phase::Effects(_) => {
                        let variables = run.variable_summary.take().unwrap_or_default();
                        let import_summary =
                            ImportSummary::from_passes(run.collections, variables, summary);
                        self.active = None;
                        emit(UiEvent::Complete {
                            summary: import_summary,
                        });
                        return;
                    }
                },
            }
        }
    }
}
