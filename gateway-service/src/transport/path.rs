//! Path templating: substitute `{key}` placeholders from scalar parameters
//! and route the leftovers into an ordered, URL-encoded query string.

use super::{ParamValue, Params, BODY_KEY};

/// Resolve a path template against the supplied parameters.
///
/// For every scalar parameter (in insertion order): if the template contains
/// `{key}`, every occurrence is replaced with the stringified value;
/// otherwise the pair is appended to the query string as `key=value` with
/// the value URL-encoded. The reserved `body` key and structured values are
/// never templated or query-encoded.
pub fn resolve(template: &str, params: &Params) -> String {
    let mut path = template.to_string();
    let mut query = String::new();

    for (key, value) in params.iter() {
        if key == BODY_KEY {
            continue;
        }
        let scalar = match value.as_scalar() {
            Some(scalar) => scalar,
            None => continue,
        };
        let placeholder = format!("{{{}}}", key);
        if path.contains(&placeholder) {
            path = path.replace(&placeholder, &scalar);
        } else {
            query.push(if query.is_empty() { '?' } else { '&' });
            query.push_str(key);
            query.push('=');
            query.push_str(&urlencoding::encode(&scalar));
        }
    }

    path.push_str(&query);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_placeholder_and_routes_leftover_to_query() {
        let params = Params::new().with("name", "x").with("fields", "f");
        assert_eq!(resolve("/connections/{name}", &params), "/connections/x?fields=f");
    }

    #[test]
    fn no_params_leaves_path_untouched() {
        assert_eq!(resolve("/connections", &Params::new()), "/connections");
    }

    #[test]
    fn query_order_follows_insertion_order() {
        let params = Params::new()
            .with("fields", "id,name")
            .with("limit", 25i64)
            .with("deleted", false);
        assert_eq!(
            resolve("/dashboards", &params),
            "/dashboards?fields=id%2Cname&limit=25&deleted=false"
        );
    }

    #[test]
    fn repeated_placeholder_is_replaced_everywhere() {
        let params = Params::new().with("id", "7");
        assert_eq!(resolve("/a/{id}/b/{id}", &params), "/a/7/b/7");
    }

    #[test]
    fn body_and_structured_values_are_skipped() {
        let params = Params::new()
            .with("name", "conn")
            .with(BODY_KEY, serde_json::json!({"port": 3306}));
        assert_eq!(resolve("/connections/{name}", &params), "/connections/conn");
    }

    #[test]
    fn query_values_are_url_encoded() {
        let params = Params::new().with("fields", "a b&c");
        assert_eq!(resolve("/looks", &params), "/looks?fields=a%20b%26c");
    }

    #[test]
    fn scalar_variants_stringify() {
        assert_eq!(ParamValue::Int(42).as_scalar().as_deref(), Some("42"));
        assert_eq!(ParamValue::Bool(true).as_scalar().as_deref(), Some("true"));
        assert!(ParamValue::Body(serde_json::json!([])).as_scalar().is_none());
    }
}
