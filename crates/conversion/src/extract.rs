//! Variable extraction: select messages by strategy and decode them.

use std::collections::HashMap;

use forecast_common::{ExtractionStrategy, VariableSpec};
use grib2_parser::{FieldSource, MessageHeader, MessageIndex};
use tracing::debug;

use crate::error::{ConversionError, Result};

/// Where the field for one step comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Identically zero; nothing is read.
    Zero,
    Message(MessageIndex),
}

/// Select the message for `short_id` under `strategy`.
///
/// - `StepRange`: the message whose step range equals `step`, else the one
///   whose end step equals `step`.
/// - `EndOfAccumulation`: the message whose accumulation ends at `step`.
/// - `Static` (or no step): the first message with the identifier.
///
/// The first match in file order wins.
pub fn select_message(
    headers: &[MessageHeader],
    short_id: &str,
    strategy: ExtractionStrategy,
    step: Option<u32>,
) -> Option<MessageIndex> {
    let candidates: Vec<&MessageHeader> = headers.iter().filter(|h| h.is(short_id)).collect();

    let matches: Vec<&MessageHeader> = match (strategy, step) {
        (ExtractionStrategy::Static, _) | (_, None) => candidates,
        (ExtractionStrategy::EndOfAccumulation, Some(s)) => {
            candidates.into_iter().filter(|h| h.end_step == s).collect()
        }
        (ExtractionStrategy::StepRange, Some(s)) => {
            let wanted = s.to_string();
            let by_range: Vec<&MessageHeader> = candidates
                .iter()
                .copied()
                .filter(|h| h.step_range() == wanted)
                .collect();
            if by_range.is_empty() {
                candidates.into_iter().filter(|h| h.end_step == s).collect()
            } else {
                by_range
            }
        }
    };

    if matches.len() > 1 {
        debug!(
            variable = %short_id,
            step = ?step,
            count = matches.len(),
            "Several messages match, using the first"
        );
    }
    matches.first().map(|h| h.index)
}

/// Resolve every requested step of a variable to a [`Selection`].
///
/// Fails with [`ConversionError::VariableNotFound`] on the first step that
/// has no message.
pub fn plan_variable(
    source: &dyn FieldSource,
    spec: &VariableSpec,
    steps: &[u32],
) -> Result<Vec<Selection>> {
    let strategy = spec.strategy();
    let headers = source.headers();

    let not_found = |step: Option<u32>| ConversionError::VariableNotFound {
        variable: spec.short_id.clone(),
        step,
        file: source.path().to_path_buf(),
    };

    if !strategy.has_steps() {
        return select_message(headers, &spec.short_id, strategy, None)
            .map(|index| vec![Selection::Message(index)])
            .ok_or_else(|| not_found(None));
    }

    steps
        .iter()
        .map(|&step| {
            if step == 0 && strategy.zero_at_initialization() {
                return Ok(Selection::Zero);
            }
            select_message(headers, &spec.short_id, strategy, Some(step))
                .map(Selection::Message)
                .ok_or_else(|| not_found(Some(step)))
        })
        .collect()
}

/// Extract one variable from an open source.
///
/// Returns the values in store order: one `(nlat, nlon)` field per step,
/// concatenated, for forecast variables, or a single field for analysis
/// variables. All messages are decoded in one batch.
pub fn extract_variable(
    source: &dyn FieldSource,
    spec: &VariableSpec,
    steps: &[u32],
) -> Result<Vec<f32>> {
    let plan = plan_variable(source, spec, steps)?;
    let npoints = source.grid().len();

    let mut indices: Vec<MessageIndex> = Vec::new();
    for selection in &plan {
        if let Selection::Message(index) = selection {
            if !indices.contains(index) {
                indices.push(*index);
            }
        }
    }

    let decoded = source.read_many(&indices)?;
    let fields: HashMap<MessageIndex, Vec<f32>> = indices.into_iter().zip(decoded).collect();

    let mut values = Vec::with_capacity(plan.len() * npoints);
    for selection in &plan {
        match selection {
            Selection::Zero => values.resize(values.len() + npoints, 0.0),
            Selection::Message(index) => {
                let field = fields.get(index).map(Vec::as_slice).unwrap_or_default();
                if field.len() != npoints {
                    return Err(ConversionError::FieldSize {
                        variable: spec.short_id.clone(),
                        file: source.path().to_path_buf(),
                        expected: npoints,
                        found: field.len(),
                    });
                }
                values.extend_from_slice(field);
            }
        }
    }

    debug!(
        variable = %spec.short_id,
        fields = plan.len(),
        decoded = fields.len(),
        "Extracted variable"
    );
    Ok(values)
}
