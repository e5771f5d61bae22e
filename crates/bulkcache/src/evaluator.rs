// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The expression evaluation boundary.
//!
//! The engine never interprets expressions itself. Gates and identity rules are closures; an
//! [`ExpressionEvaluator`] can be adapted into those closures with
//! [`Gate::expression`](crate::Gate::expression) and
//! [`IdentityRule::expression`](crate::IdentityRule::expression) when the rules come from
//! configuration rather than code.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::Error;

/// Evaluates gate conditions and extracts identities from computed items.
///
/// Implementations receive the bindings as [`Serialize`] values, so any argument type that
/// derives `Serialize` can be inspected without the engine knowing its shape. A malformed
/// expression, or one that does not fit the bindings, is reported as an
/// [`ErrorKind::Evaluation`](crate::ErrorKind::Evaluation) error.
pub trait ExpressionEvaluator {
    /// Evaluates a boolean condition against the invocation arguments.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if the expression cannot be evaluated.
    fn evaluate<A>(&self, expression: &str, args: &A) -> Result<bool, Error>
    where
        A: Serialize + ?Sized;

    /// Extracts the identity of one item returned by the data source.
    ///
    /// # Errors
    ///
    /// Returns an evaluation error if the expression cannot be evaluated or its result cannot be
    /// decoded as `I`.
    fn extract_identity<T, I>(&self, expression: &str, item: &T) -> Result<I, Error>
    where
        T: Serialize + ?Sized,
        I: DeserializeOwned;
}

/// An evaluator whose expressions are RFC 6901 JSON pointers.
///
/// Bindings are serialized to JSON and the pointer is resolved against the result. For gates the
/// resolved value is tested for truthiness: a missing target, `null`, `false`, `0`, `""`, `[]`
/// and `{}` are false, anything else is true. For identities the resolved value is decoded into
/// the identity type; a missing target is an error.
///
/// # Examples
///
/// ```
/// use bulkcache::{ExpressionEvaluator, JsonPointerEvaluator};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Query {
///     tenant: Option<String>,
///     ids: Vec<u64>,
/// }
///
/// let query = Query { tenant: Some("contoso".into()), ids: vec![7, 8] };
///
/// assert!(JsonPointerEvaluator.evaluate("/tenant", &query)?);
/// let first: u64 = JsonPointerEvaluator.extract_identity("/ids/0", &query)?;
/// assert_eq!(first, 7);
/// # Ok::<(), bulkcache::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonPointerEvaluator;

impl JsonPointerEvaluator {
    fn resolve<T>(expression: &str, bindings: &T) -> Result<Option<Value>, Error>
    where
        T: Serialize + ?Sized,
    {
        if !expression.is_empty() && !expression.starts_with('/') {
            return Err(Error::evaluation(format!(
                "'{expression}' is not a JSON pointer: it must be empty or start with '/'"
            )));
        }

        let document = serde_json::to_value(bindings).map_err(Error::evaluation)?;
        Ok(document.pointer(expression).cloned())
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.is_normal() || f.is_subnormal()),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

impl ExpressionEvaluator for JsonPointerEvaluator {
    fn evaluate<A>(&self, expression: &str, args: &A) -> Result<bool, Error>
    where
        A: Serialize + ?Sized,
    {
        Ok(Self::resolve(expression, args)?.as_ref().is_some_and(is_truthy))
    }

    fn extract_identity<T, I>(&self, expression: &str, item: &T) -> Result<I, Error>
    where
        T: Serialize + ?Sized,
        I: DeserializeOwned,
    {
        let value = Self::resolve(expression, item)?
            .ok_or_else(|| Error::evaluation(format!("JSON pointer '{expression}' does not resolve to a value")))?;
        serde_json::from_value(value).map_err(Error::evaluation)
    }
}
