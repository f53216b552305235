use serde::{Deserialize, Serialize};

use super::answers::{AnswerKey, AnswerRecord, AnswerValue};
use super::plan::{FinancingPlan, PlanError, PlanTier};

/// Display grouping for the wizard's progress indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
    Property,
    Financial,
    Credit,
    Complete,
}

impl FlowStage {
    pub const fn ordered() -> [Self; 4] {
        [Self::Property, Self::Financial, Self::Credit, Self::Complete]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Property => "Property",
            Self::Financial => "Financial",
            Self::Credit => "Credit",
            Self::Complete => "Complete",
        }
    }
}

/// Employment answers that select an income-verification branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Employed,
    SelfEmployed,
    NotEmployed,
    Retired,
}

impl EmploymentStatus {
    pub const ALL: [Self; 4] = [
        Self::Employed,
        Self::SelfEmployed,
        Self::NotEmployed,
        Self::Retired,
    ];

    /// Branch used when the answer is missing or not one of the offered options.
    pub const FALLBACK: Self = Self::Employed;

    pub fn parse(value: &str) -> Option<Self> {
        match normalize_answer(value).as_str() {
            "employed" => Some(Self::Employed),
            "self-employed" | "self-employed 1099" | "self employed" => Some(Self::SelfEmployed),
            "not employed" | "unemployed" => Some(Self::NotEmployed),
            "retired" => Some(Self::Retired),
            _ => None,
        }
    }

    pub fn from_record(record: &AnswerRecord) -> Option<Self> {
        record
            .text(AnswerKey::EmploymentStatus)
            .and_then(Self::parse)
    }

    /// Branch taken by the flow for the recorded answer.
    pub fn branch_for(record: &AnswerRecord) -> Self {
        Self::from_record(record).unwrap_or(Self::FALLBACK)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Employed => "Employed",
            Self::SelfEmployed => "Self-Employed 1099",
            Self::NotEmployed => "Not Employed",
            Self::Retired => "Retired",
        }
    }
}

/// Self-reported credit score bands offered by the credit score question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditScoreBand {
    Excellent,
    Good,
    Fair,
    BelowAverage,
    Poor,
    Bad,
    NoCredit,
}

impl CreditScoreBand {
    /// Match on the band name so both `"Poor"` and `"Poor (580-619)"` are recognized.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = normalize_answer(value);
        const PREFIXES: [(&str, CreditScoreBand); 7] = [
            ("excellent", CreditScoreBand::Excellent),
            ("good", CreditScoreBand::Good),
            ("fair", CreditScoreBand::Fair),
            ("below average", CreditScoreBand::BelowAverage),
            ("poor", CreditScoreBand::Poor),
            ("bad", CreditScoreBand::Bad),
            ("no credit", CreditScoreBand::NoCredit),
        ];

        PREFIXES
            .iter()
            .find(|(prefix, _)| normalized.starts_with(prefix))
            .map(|(_, band)| *band)
    }

    pub const fn is_disqualifying(self) -> bool {
        matches!(self, Self::BelowAverage | Self::Poor | Self::Bad)
    }
}

/// Household gross annual income bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeBand {
    Under30k,
    From30kTo50k,
    From50kTo75k,
    From75kTo100k,
    From100kTo150k,
    From150kTo200k,
    Over200k,
}

impl IncomeBand {
    pub fn parse(value: &str) -> Option<Self> {
        match normalize_answer(value).as_str() {
            "less than $30,000" => Some(Self::Under30k),
            "$30,000 - $50,000" => Some(Self::From30kTo50k),
            "$50,000 - $75,000" => Some(Self::From50kTo75k),
            "$75,000 - $100,000" => Some(Self::From75kTo100k),
            "$100,000 - $150,000" => Some(Self::From100kTo150k),
            "$150,000 - $200,000" => Some(Self::From150kTo200k),
            "over $200,000" => Some(Self::Over200k),
            _ => None,
        }
    }

    /// The three lowest declared bands.
    pub const fn is_insufficient(self) -> bool {
        matches!(self, Self::Under30k | Self::From30kTo50k | Self::From50kTo75k)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Under30k => "Less than $30,000",
            Self::From30kTo50k => "$30,000 - $50,000",
            Self::From50kTo75k => "$50,000 - $75,000",
            Self::From75kTo100k => "$75,000 - $100,000",
            Self::From100kTo150k => "$100,000 - $150,000",
            Self::From150kTo200k => "$150,000 - $200,000",
            Self::Over200k => "Over $200,000",
        }
    }
}

/// Property details supplied by the listing when a buyer starts the flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyContext {
    pub property_id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub asking_price: Option<AnswerValue>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub financing_available: bool,
    #[serde(default)]
    pub term: Option<u32>,
    #[serde(default)]
    pub tiers: Vec<PlanTier>,
}

impl PropertyContext {
    /// Answers injected before the first question is shown.
    pub fn seed(&self) -> AnswerRecord {
        let mut record = AnswerRecord::new();
        record.insert(AnswerKey::PropertyId, self.property_id.as_str());
        if let Some(owner_id) = &self.owner_id {
            record.insert(AnswerKey::OwnerId, owner_id.as_str());
        }
        if let Some(price) = &self.asking_price {
            record.insert(AnswerKey::PropertyPrice, price.clone());
        }
        record.insert(AnswerKey::PropertyTitle, self.title.as_str());
        record.insert(AnswerKey::PropertyLocation, self.location());
        record.insert(AnswerKey::FinancingAvailable, self.financing_available);
        record.insert(AnswerKey::PropertyAddress, self.street_address.as_str());
        record.insert(AnswerKey::PropertyCity, self.city.as_str());
        record.insert(AnswerKey::PropertyState, self.state.as_str());
        record.insert(AnswerKey::PropertyZip, self.zip.as_str());
        if let Some(term) = self.term {
            record.insert(AnswerKey::Term, term);
        }
        record
    }

    pub fn location(&self) -> String {
        match (self.city.trim(), self.state.trim()) {
            ("", "") => String::new(),
            (city, "") => city.to_string(),
            ("", state) => state.to_string(),
            (city, state) => format!("{city}, {state}"),
        }
    }

    pub fn price(&self) -> Option<f64> {
        self.asking_price.as_ref().and_then(AnswerValue::to_number)
    }

    pub fn tier(&self, label: &str) -> Option<&PlanTier> {
        self.tiers.iter().find(|tier| tier.label == label.trim())
    }

    /// Resolve a tier label into a concrete plan, `Ok(None)` when the label is not offered.
    pub fn plan_for(&self, label: &str) -> Result<Option<FinancingPlan>, PlanError> {
        let Some(tier) = self.tier(label) else {
            return Ok(None);
        };
        let price = self.price().unwrap_or(0.0);
        FinancingPlan::calculate(price, tier).map(Some)
    }
}

/// Collapse whitespace, unify apostrophes and lowercase a free-form answer.
pub(crate) fn normalize_answer(value: &str) -> String {
    let unified = value.replace(['\u{2019}', '\u{2018}'], "'");
    unified
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

pub(crate) fn answer_is(record: &AnswerRecord, key: AnswerKey, expected: &str) -> bool {
    record
        .text(key)
        .map(|value| normalize_answer(value) == expected)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employment_parse_accepts_both_self_employed_labels() {
        assert_eq!(
            EmploymentStatus::parse("Self-Employed 1099"),
            Some(EmploymentStatus::SelfEmployed)
        );
        assert_eq!(
            EmploymentStatus::parse("self-employed"),
            Some(EmploymentStatus::SelfEmployed)
        );
        assert_eq!(
            EmploymentStatus::parse(" Not  Employed "),
            Some(EmploymentStatus::NotEmployed)
        );
        assert_eq!(EmploymentStatus::parse("Contractor"), None);
    }

    #[test]
    fn credit_band_matches_label_prefix() {
        assert_eq!(
            CreditScoreBand::parse("Below average (620-659)"),
            Some(CreditScoreBand::BelowAverage)
        );
        assert_eq!(CreditScoreBand::parse("Bad"), Some(CreditScoreBand::Bad));
        assert!(CreditScoreBand::parse("Poor (580-619)")
            .expect("band")
            .is_disqualifying());
        assert!(!CreditScoreBand::parse("Fair (660-679)")
            .expect("band")
            .is_disqualifying());
        assert_eq!(CreditScoreBand::parse("unknown"), None);
    }

    #[test]
    fn only_three_lowest_income_bands_are_insufficient() {
        let insufficient: Vec<_> = [
            "Less than $30,000",
            "$30,000 - $50,000",
            "$50,000 - $75,000",
            "$75,000 - $100,000",
            "Over $200,000",
        ]
        .iter()
        .filter_map(|label| IncomeBand::parse(label))
        .filter(|band| band.is_insufficient())
        .collect();

        assert_eq!(insufficient.len(), 3);
        assert_eq!(IncomeBand::parse("$100,000+"), None);
    }

    #[test]
    fn context_seed_carries_property_fields() {
        let context = PropertyContext {
            property_id: "prop-17".to_string(),
            owner_id: Some("42".to_string()),
            asking_price: Some(AnswerValue::from("89,900")),
            title: "Five acres near Lake Jackson".to_string(),
            street_address: "12 County Rd".to_string(),
            city: "Jackson".to_string(),
            state: "TX".to_string(),
            zip: "77566".to_string(),
            financing_available: true,
            term: Some(120),
            tiers: Vec::new(),
        };

        let record = context.seed();

        assert_eq!(record.text(AnswerKey::PropertyLocation), Some("Jackson, TX"));
        assert_eq!(record.number(AnswerKey::PropertyPrice), Some(89_900.0));
        assert_eq!(record.number(AnswerKey::Term), Some(120.0));
        assert_eq!(record.text(AnswerKey::OwnerId), Some("42"));
        assert!(!record.is_answered(AnswerKey::Language));
    }
}
