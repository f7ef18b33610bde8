//! Result assembly: per-source outcome → array, whole document, or `null`.

use metrics::counter;
use serde_json::{Map, Value};

use crate::aggregate::{aggregate, FetchOutcome};
use crate::error::{OrchestrationError, ParseError};
use crate::fetch::DynFetcher;
use crate::json_path;
use crate::query::Query;
use crate::registry::SourceRegistry;

/// Source name → array | whole document | null. Keys are unique.
pub type ResultMap = Map<String, Value>;

/// Parse a raw body. Blank bodies count as parse failures.
pub fn parse_body(source_name: &str, body: &str) -> Result<Value, ParseError> {
    if body.trim().is_empty() {
        return Err(ParseError::Empty {
            source_name: source_name.to_string(),
        });
    }
    serde_json::from_str(body).map_err(|source| ParseError::Invalid {
        source_name: source_name.to_string(),
        source,
    })
}

/// Merge outcomes into the response map. Order of `outcomes` is irrelevant for
/// correctness; each source name appears exactly once.
pub fn assemble(outcomes: Vec<FetchOutcome>, registry: &SourceRegistry, query: &Query) -> ResultMap {
    let mut out = ResultMap::new();

    for outcome in outcomes {
        let FetchOutcome { source_name, body } = outcome;

        let Some(body) = body else {
            out.insert(source_name, Value::Null);
            continue;
        };

        let root = match parse_body(&source_name, &body) {
            Ok(v) => v,
            Err(e) => {
                counter!("aggregator_parse_errors_total").increment(1);
                tracing::error!(error = %e, source = %source_name, "error processing source body");
                out.insert(source_name, Value::Null);
                continue;
            }
        };

        let array_path = registry
            .get(&source_name)
            .and_then(|s| s.array_path.as_deref());
        // Arrays get filter + sort; anything else is passed through untouched.
        let value = match json_path::extract(&root, array_path) {
            Some(items) => {
                tracing::info!(source = %source_name, items = items.len(), "filtering and sorting array");
                Value::Array(query.apply(items))
            }
            None => {
                tracing::info!(source = %source_name, "returning full document (no array path)");
                root
            }
        };
        out.insert(source_name, value);
    }

    out
}

/// Full pipeline: fan-out, then assemble.
pub async fn run(
    registry: &SourceRegistry,
    fetcher: DynFetcher,
    query: &Query,
) -> Result<ResultMap, OrchestrationError> {
    let outcomes = aggregate(registry, fetcher).await?;
    Ok(assemble(outcomes, registry, query))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SourceConfig;
    use serde_json::json;

    fn outcome(name: &str, body: Option<&str>) -> FetchOutcome {
        FetchOutcome {
            source_name: name.to_string(),
            body: body.map(str::to_string),
        }
    }

    fn registry() -> SourceRegistry {
        SourceRegistry::from_sources(vec![
            SourceConfig::new("items", "http://a", Some("data.items")),
            SourceConfig::new("doc", "http://b", None),
            SourceConfig::new("broken", "http://c", Some("x")),
            SourceConfig::new("down", "http://d", Some("x")),
        ])
    }

    #[test]
    fn each_outcome_kind_maps_to_its_value() {
        let q = Query {
            sort_by: Some("n".into()),
            ..Query::default()
        };
        let outcomes = vec![
            outcome("down", None),
            outcome("items", Some(r#"{"data":{"items":[{"n":"b"},{"n":"a"}]}}"#)),
            outcome("doc", Some(r#"{"hello":"world"}"#)),
            outcome("broken", Some("{not json")),
        ];
        let map = assemble(outcomes, &registry(), &q);

        assert_eq!(map.len(), 4);
        assert_eq!(map["items"], json!([{"n": "a"}, {"n": "b"}]));
        assert_eq!(map["doc"], json!({"hello": "world"}));
        assert_eq!(map["broken"], Value::Null);
        assert_eq!(map["down"], Value::Null);
    }

    #[test]
    fn unresolvable_path_returns_document_unfiltered() {
        let q = Query {
            filter_by: Some("n".into()),
            filter_value: Some("zzz".into()),
            ..Query::default()
        };
        let body = r#"{"data":{"other":[{"n":"a"}]}}"#;
        let map = assemble(vec![outcome("items", Some(body))], &registry(), &q);
        assert_eq!(map["items"], json!({"data": {"other": [{"n": "a"}]}}));
    }

    #[test]
    fn filter_can_empty_the_array() {
        let q = Query {
            filter_by: Some("n".into()),
            filter_value: Some("zzz".into()),
            ..Query::default()
        };
        let body = r#"{"data":{"items":[{"n":"a"}]}}"#;
        let map = assemble(vec![outcome("items", Some(body))], &registry(), &q);
        assert_eq!(map["items"], json!([]));
    }

    #[test]
    fn blank_body_is_null() {
        let map = assemble(vec![outcome("doc", Some("  "))], &registry(), &Query::default());
        assert_eq!(map["doc"], Value::Null);
        assert!(matches!(parse_body("doc", ""), Err(ParseError::Empty { .. })));
    }

    #[test]
    fn document_key_order_is_preserved() {
        let map = assemble(
            vec![outcome("doc", Some(r#"{"z":1,"a":2}"#))],
            &registry(),
            &Query::default(),
        );
        let keys: Vec<_> = map["doc"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
