use std::collections::HashMap;
use std::sync::OnceLock;

use super::normalizer::normalize_header;
use crate::workflows::qualification::AnswerKey;

static HEADER_MAP: OnceLock<HashMap<String, AnswerKey>> = OnceLock::new();

pub(crate) fn answer_key_for_header(header: &str) -> Option<AnswerKey> {
    header_map().get(&normalize_header(header)).copied()
}

fn header_map() -> &'static HashMap<String, AnswerKey> {
    HEADER_MAP.get_or_init(|| {
        let mut map = HashMap::new();
        for key in AnswerKey::ALL {
            map.insert(normalize_header(key.wire_name()), key);
            map.insert(normalize_header(key.as_str()), key);
        }
        // Older exports label the price column with the listing field name.
        map.insert(normalize_header("askingPrice"), AnswerKey::PropertyPrice);
        map
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_and_snake_headers_resolve_to_same_key() {
        assert_eq!(
            answer_key_for_header("grossAnnualIncome"),
            Some(AnswerKey::GrossAnnualIncome)
        );
        assert_eq!(
            answer_key_for_header("gross_annual_income"),
            Some(AnswerKey::GrossAnnualIncome)
        );
        assert_eq!(
            answer_key_for_header("\u{feff}Property Price"),
            Some(AnswerKey::PropertyPrice)
        );
        assert_eq!(answer_key_for_header("qualified"), None);
        assert_eq!(answer_key_for_header("createdAt"), None);
    }
}
