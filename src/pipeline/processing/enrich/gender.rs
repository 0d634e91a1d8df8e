use serde_json::Value;

use crate::domain::Gender;

/// Map the source gender code onto the three output categories.
///
/// Only the exact codes `"M"` and `"F"` are recognised.
pub fn normalize_gender(raw: Option<&Value>) -> Gender {
    match raw.and_then(Value::as_str) {
        Some("M") => Gender::Male,
        Some("F") => Gender::Female,
        _ => Gender::Others,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_known_codes() {
        assert_eq!(normalize_gender(Some(&json!("M"))), Gender::Male);
        assert_eq!(normalize_gender(Some(&json!("F"))), Gender::Female);
    }

    #[test]
    fn test_everything_else_is_others() {
        for raw in [json!("m"), json!("f"), json!(""), json!("Male"), json!(1), Value::Null] {
            assert_eq!(normalize_gender(Some(&raw)), Gender::Others, "{raw}");
        }
        assert_eq!(normalize_gender(None), Gender::Others);
    }
}
