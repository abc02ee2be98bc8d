use crate::config::KeyCase;
use crate::model::RawRecord;

/// First candidate whose trimmed value is non-empty, or `""`.
pub fn resolve_key(record: &RawRecord, candidates: &[String]) -> String {
    for field in candidates {
        if let Some(value) = record.get(field) {
            let text = value.as_trimmed();
            if !text.is_empty() {
                return text;
            }
        }
    }
    String::new()
}

/// Apply the join-key policy. Catalog and transaction keys go through the
/// same function so they compare consistently.
pub fn join_key(key: String, case: KeyCase) -> String {
    match case {
        KeyCase::Sensitive => key,
        KeyCase::Fold => key.to_lowercase(),
    }
}
