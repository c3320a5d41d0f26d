use crate::error::TokenError;
use crate::export::{export_document, ExportOutput};
use crate::flatten::{flatten, split_shadow_tokens, used_categories};
use crate::host::VariableStore;
use crate::merge::{
    ensure_collections, ConflictAction, ConflictKind, EffectMerge, ImportSummary, MergeStep,
    MergeSummary, VariableMerge,
};
use crate::parser::parse_document;

/// Imports a token document into the host store, consulting
/// `on_conflict` whenever an incoming token collides with an existing
/// entity and no sticky decision covers it yet.
///
/// This is the synchronous convenience driver around the step-function
/// merge engines; UI-driven callers that need to suspend across a
/// message channel should use [`crate::protocol::Session`] instead.
///
/// # Errors
///
/// Returns a `TokenError` if the document does not parse, flattens to
/// zero tokens, or collection setup fails against the host. Per-token
/// problems do not error; they land in the summary's warnings.
pub fn import<S, F>(
    store: &mut S,
    source: &str,
    mut on_conflict: F,
) -> Result<ImportSummary, TokenError>
where
    S: VariableStore,
    F: FnMut(&str, ConflictKind) -> ConflictAction,
{
    let document = parse_document(source)?;
    let tokens = flatten(&document);
    if tokens.is_empty() {
        return Err(TokenError::EmptyDocument);
    }

    let (variables, shadows) = split_shadow_tokens(tokens);
    let used = used_categories(&variables);
    let collections = ensure_collections(store, &used, &mut |_| {})?;
    let collection_count = collections.len();

    let mut variable_merge = VariableMerge::new(variables, collections);
    let variable_summary = loop {
        match variable_merge.run(store, &mut |_, _| {}) {
            MergeStep::Conflict { name, kind } => variable_merge.resolve(on_conflict(&name, kind)),
            MergeStep::Complete(summary) => break summary,
        }
    };

    let effect_summary = if shadows.is_empty() {
        MergeSummary::default()
    } else {
        let mut effect_merge = EffectMerge::new(shadows);
        loop {
            match effect_merge.run(store, &mut |_, _| {}) {
                MergeStep::Conflict { name, kind } => {
                    effect_merge.resolve(on_conflict(&name, kind));
                }
                MergeStep::Complete(summary) => break summary,
            }
        }
    };

    Ok(ImportSummary::from_passes(
        collection_count,
        variable_summary,
        effect_summary,
    ))
}

/// Serializes the host store back into a nested token document.
///
/// # Errors
///
/// Returns a `TokenError` if reading the host store fails.
pub fn export<S: VariableStore>(store: &S) -> Result<ExportOutput, TokenError> {
    Ok(export_document(store, &mut |_| {})?)
}
