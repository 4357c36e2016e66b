//! Parameters of the `/action/{lock_name}` resource.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Optional parameters accepted by an action request, read from the query
/// string or a form-encoded body.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ActionParams {
    /// Battles to seed (`seed-battles` only). Defaults to the configured
    /// seed size.
    #[serde(default)]
    pub number: Option<u64>,
}
