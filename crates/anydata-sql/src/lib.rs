//! Provider-aware SQL placeholder binding.
//!
//! [`SqlBind`] rewrites `[[name]]` and `:name` placeholders into the marker
//! style a driver expects, as described by a [`ConnectionInfo`].

pub mod bind;
pub mod connection;

pub use anydata_error::{AnyDataError, Result};
pub use bind::{BoundSql, DEFAULT_PARAM_MODEL, PARAM_MODEL_KEY, POSITIONAL_DRIVERS, SqlBind};
pub use connection::{ConnectionInfo, ConnectionManagement};
