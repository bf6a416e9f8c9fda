//! Rewriting of driver-agnostic SQL placeholders.
//!
//! Statements name their parameters as `[[name]]` or `:name`. Binding turns
//! each named parameter into the marker style of the target driver and
//! replaces any `[[name]]` left without a value by `null`.

use std::sync::LazyLock;

use anydata_error::{AnyDataError, Result};
use indexmap::IndexMap;
use regex::Regex;
use tracing::debug;

use crate::connection::ConnectionInfo;

/// Extra param that overrides the marker template.
pub const PARAM_MODEL_KEY: &str = "parammodel";

/// Drivers that only understand anonymous `?` markers.
pub const POSITIONAL_DRIVERS: &[&str] = &["sqlrelay"];

/// Template used when nothing more specific applies. `_` stands for the
/// sanitized parameter name.
pub const DEFAULT_PARAM_MODEL: &str = ":_";

static ORPHAN_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]"));

/// Characters that may continue a `:name` parameter.
fn is_param_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn pattern_error(err: &regex::Error) -> AnyDataError {
    AnyDataError::internal(format!("placeholder pattern failed to compile: {err}"))
}

/// SQL text with its surviving parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSql<V> {
    pub sql: String,
    /// `None` when the caller passed no parameters at all.
    pub params: Option<IndexMap<String, V>>,
}

/// Provider-aware placeholder binder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlBind;

impl SqlBind {
    /// Marker template for a connection.
    ///
    /// A non-empty `parammodel` extra param wins; positional drivers get `?`;
    /// everything else gets `:_`.
    pub fn param_model(conn: &(impl ConnectionInfo + ?Sized)) -> String {
        if let Some(model) = conn.extra_param(PARAM_MODEL_KEY).filter(|m| !m.is_empty()) {
            return model.to_owned();
        }
        if POSITIONAL_DRIVERS.contains(&conn.driver()) {
            "?".to_owned()
        } else {
            DEFAULT_PARAM_MODEL.to_owned()
        }
    }

    /// Make a parameter name safe for marker use.
    pub fn key_adj(key: &str) -> String {
        key.replace('.', "_")
    }

    /// Rewrite the placeholders of `sql` for `conn`.
    ///
    /// Every `[[key]]`, and every `:key` not followed by a name character,
    /// becomes the marker for `key` plus one space; a character following
    /// `:key` is kept. Parameters that matched nothing are dropped from the
    /// result. Empty keys never match.
    ///
    /// ```
    /// use anydata_sql::{ConnectionManagement, SqlBind};
    /// use indexmap::IndexMap;
    ///
    /// let conn = ConnectionManagement::new("mysql");
    /// let params = IndexMap::from([("id".to_owned(), 5)]);
    /// let bound = SqlBind::parse_sql(&conn, "select * from t where x = :id", Some(params))?;
    /// assert_eq!(bound.sql, "select * from t where x = :id ");
    /// # Ok::<(), anydata_sql::AnyDataError>(())
    /// ```
    pub fn parse_sql<V>(
        conn: &(impl ConnectionInfo + ?Sized),
        sql: &str,
        params: Option<IndexMap<String, V>>,
    ) -> Result<BoundSql<V>> {
        let Some(params) = params else {
            return Ok(BoundSql {
                sql: sql.to_owned(),
                params: None,
            });
        };

        let model = Self::param_model(conn);
        let mut text = sql.to_owned();
        let mut kept = IndexMap::with_capacity(params.len());
        for (key, value) in params {
            if key.is_empty() {
                continue;
            }
            let marker = format!("{} ", model.replace('_', &Self::key_adj(&key)));
            let pattern = key_pattern(&key)?;
            let (rewritten, count) = replace_placeholders(&text, &pattern, &marker);
            text = rewritten;
            if count == 0 {
                debug!(key = %key, "parameter not referenced, dropping");
            } else {
                kept.insert(key, value);
            }
        }

        let orphans = ORPHAN_PATTERN.as_ref().map_err(pattern_error)?;
        let sql = orphans.replace_all(&text, "null").into_owned();
        debug!(model = %model, params = kept.len(), "bound sql placeholders");
        Ok(BoundSql {
            sql,
            params: Some(kept),
        })
    }
}

fn key_pattern(key: &str) -> Result<Regex> {
    let key = regex::escape(key);
    Regex::new(&format!(r"\[\[{key}\]\]|:{key}")).map_err(|err| pattern_error(&err))
}

/// Replace the matches of `pattern` that are whole placeholders.
fn replace_placeholders(sql: &str, pattern: &Regex, marker: &str) -> (String, usize) {
    let mut out = String::with_capacity(sql.len());
    let mut last = 0;
    let mut count = 0;
    for m in pattern.find_iter(sql) {
        let continues_name = m.as_str().starts_with(':')
            && sql[m.end()..].chars().next().is_some_and(is_param_char);
        if continues_name {
            continue;
        }
        out.push_str(&sql[last..m.start()]);
        out.push_str(marker);
        last = m.end();
        count += 1;
    }
    out.push_str(&sql[last..]);
    (out, count)
}
