use axum::{
    async_trait,
    extract::{FromRequest, Request},
};
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use crate::{
    error::{
        ApiError, BodyError, ErrorVerbosity, ErrorVerbosityProvider, InternalServerError,
        ValidationError,
    },
    model::{BookUpdate, NewBook},
    schema::{Schema, BOOK_CREATE, BOOK_UPDATE},
};

use super::json::ApiJson;

/// A payload that is checked against a static [`Schema`] before it is deserialized.
pub trait SchemaPayload: DeserializeOwned + Validate + JsonSchema + Send {
    fn schema() -> &'static Schema;
}

impl SchemaPayload for NewBook {
    fn schema() -> &'static Schema {
        &BOOK_CREATE
    }
}

impl SchemaPayload for BookUpdate {
    fn schema() -> &'static Schema {
        &BOOK_UPDATE
    }
}

/// Checks the raw `payload` against `T`'s schema, then deserializes and validates it.
pub fn validate_payload<T: SchemaPayload>(
    verbosity: ErrorVerbosity,
    payload: Value,
) -> Result<T, ApiError> {
    if let Err(violations) = T::schema().validate(&payload) {
        tracing::warn!(?violations, "Schema violations");

        return Err(ValidationError::from_violations(verbosity, violations).into());
    }

    let extracted: T = serde_json::from_value(payload).map_err(|err| {
        tracing::warn!(%err, "Deserialization failed");

        match serde_yaml::to_string(&schema_for!(T)) {
            Ok(schema) => ApiError::from(BodyError::new(verbosity, err.to_string(), schema)),
            Err(err) => InternalServerError::from_generic_error(verbosity, err).into(),
        }
    })?;

    if let Err(errors) = extracted.validate() {
        tracing::warn!(?errors, "Validation errors");

        return Err(ValidationError::from_validation_errors(verbosity, errors).into());
    }

    tracing::trace!("Validated");

    Ok(extracted)
}

/// Extracts the request body as JSON and validates it with [`validate_payload`].
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: SchemaPayload,
    S: Send + Sync + ErrorVerbosityProvider,
{
    type Rejection = ApiError;

    #[tracing::instrument(name = "validated_json_extractor", skip_all)]
    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ApiJson(payload) = ApiJson::<Value>::from_request(req, state).await?;

        validate_payload(state.error_verbosity(), payload).map(ValidatedJson)
    }
}
