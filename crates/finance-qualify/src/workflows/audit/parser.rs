use std::collections::HashMap;
use std::io::Read;

use super::mapping::answer_key_for_header;
use super::normalizer::normalize_header;
use crate::workflows::qualification::AnswerRecord;

/// One stored qualification rebuilt from an export row.
#[derive(Debug)]
pub(crate) struct StoredQualification {
    pub(crate) record: AnswerRecord,
    pub(crate) qualified: Option<bool>,
    pub(crate) disqualification_reason: Option<String>,
}

pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<StoredQualification>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for row in csv_reader.deserialize::<HashMap<String, String>>() {
        let row = row?;
        let mut record = AnswerRecord::new();
        let mut qualified = None;
        let mut disqualification_reason = None;

        for (header, value) in row {
            if value.trim().is_empty() {
                continue;
            }

            match normalize_header(&header).as_str() {
                "qualified" => qualified = parse_flag(&value),
                "disqualificationreason" => disqualification_reason = Some(value),
                _ => {
                    if let Some(key) = answer_key_for_header(&header) {
                        record.insert(key, value);
                    }
                }
            }
        }

        rows.push(StoredQualification {
            record,
            qualified,
            disqualification_reason,
        });
    }

    Ok(rows)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" => Some(true),
        "false" | "f" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::qualification::AnswerKey;

    #[test]
    fn parse_flag_accepts_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" yes "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn blank_cells_stay_absent() {
        let csv = "propertyPrice,downPayment,qualified\n\"250,000\",,\n";
        let rows = parse_rows(csv.as_bytes()).expect("rows parse");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].qualified, None);
        assert!(!rows[0].record.is_answered(AnswerKey::DownPayment));
        assert!(rows[0].record.is_answered(AnswerKey::PropertyPrice));
    }
}
