use std::collections::HashMap;

use async_graphql_parser::{
    types::{DocumentOperations, FragmentDefinition, OperationDefinition},
    Positioned,
};
use async_graphql_value::Name;

use crate::{ErrorCode, Location, ServerError};

#[derive(thiserror::Error, Debug)]
pub(crate) enum ParseError {
    #[error("Unknown operation named '{0}'.")]
    UnknownOperation(String),
    #[error("Operation name required in request.")]
    MissingOperationName,
    #[error(transparent)]
    ParserError(#[from] async_graphql_parser::Error),
}

impl From<ParseError> for ServerError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::ParserError(err) => {
                let locations = err.positions().map(Location::from).collect();
                ServerError {
                    locations,
                    ..ServerError::new(err.to_string(), ErrorCode::SyntaxError)
                }
            }
            err => ServerError::new(err.to_string(), ErrorCode::ValidationError),
        }
    }
}

pub(crate) struct ParsedOperation {
    pub name: Option<String>,
    pub definition: OperationDefinition,
    pub fragments: HashMap<Name, Positioned<FragmentDefinition>>,
}

/// Parses the operation text and selects the operation to run.
pub(crate) fn parse_operation(query: &str, operation_name: Option<&str>) -> Result<ParsedOperation, ParseError> {
    let document = async_graphql_parser::parse_query(query)?;

    let (name, operation) = if let Some(operation_name) = operation_name {
        match document.operations {
            DocumentOperations::Single(_) => None,
            DocumentOperations::Multiple(mut operations) => operations
                .remove(operation_name)
                .map(|operation| (Some(operation_name.to_string()), operation)),
        }
        .ok_or_else(|| ParseError::UnknownOperation(operation_name.to_string()))?
    } else {
        match document.operations {
            DocumentOperations::Single(operation) => (None, operation),
            DocumentOperations::Multiple(operations) if operations.len() == 1 => operations
                .into_iter()
                .next()
                .map(|(name, operation)| (Some(name.to_string()), operation))
                .ok_or(ParseError::MissingOperationName)?,
            DocumentOperations::Multiple(_) => return Err(ParseError::MissingOperationName),
        }
    };

    Ok(ParsedOperation {
        name,
        definition: operation.node,
        fragments: document.fragments,
    })
}
