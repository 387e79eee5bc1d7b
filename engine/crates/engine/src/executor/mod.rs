//! Operation pipeline: `Parsed → Validated → Executing → Completed | Failed`.
//!
//! Parsing and validation errors fail the whole operation before any resolver runs and
//! produce a response with `null` data. Once executing, errors are local to the field or list
//! element that failed.

mod coercion;
mod execute;
mod parse;
mod validation;

use std::collections::HashMap;

use async_graphql_parser::{
    types::{FragmentDefinition, OperationDefinition, OperationType},
    Positioned,
};
use async_graphql_value::Name;
use engine_registry::Registry;

pub(crate) use execute::ExecutionContext;

use crate::{Request, Response, ServerError, Variables};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub(crate) enum Phase {
    Parsed,
    Validated,
    Executing,
    Completed,
    Failed,
}

pub(crate) fn enter(phase: Phase) {
    tracing::debug!(%phase, "operation phase");
}

/// An operation that passed validation, with its variables coerced.
pub(crate) struct PreparedOperation {
    pub name: Option<String>,
    pub ty: OperationType,
    pub root_type: String,
    pub definition: OperationDefinition,
    pub fragments: HashMap<Name, Positioned<FragmentDefinition>>,
    pub variables: Variables,
}

/// Parses and validates a request. On failure the returned response carries every error.
pub(crate) fn prepare(registry: &Registry, request: &Request) -> Result<PreparedOperation, Response> {
    let parsed = parse::parse_operation(&request.query, request.operation_name.as_deref()).map_err(|err| {
        let error = ServerError::from(err);
        tracing::debug!(error = %error, "operation could not be parsed");
        enter(Phase::Failed);
        Response::from_errors(vec![error])
    })?;
    enter(Phase::Parsed);

    let prepared = validation::validate(registry, parsed, &request.variables).map_err(|errors| {
        tracing::debug!(errors = errors.len(), "operation is invalid");
        enter(Phase::Failed);
        Response::from_errors(errors)
    })?;
    enter(Phase::Validated);

    Ok(prepared)
}
