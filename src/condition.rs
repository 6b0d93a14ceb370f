//! Weather condition classification
//!
//! The forecast site describes each day with free Turkish text ("bol güneş
//! ışığı", "çok bulutlu sonrası güneş", "gök gürültülü sağanak"). Search only
//! works on a small fixed vocabulary, so every phrase goes through an ordered
//! list of substitutions and then an ordered list of rules. The first rule
//! that matches decides the label. Phrases no rule understands are passed
//! through as [`StandardCondition::Unmapped`] rather than rejected.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::WeatherTripError;
use crate::text::{normalize, squash_whitespace, turkish_lowercase};

/// The fixed vocabulary a forecast can be searched by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalCondition {
    Sunny,
    PartlyCloudy,
    Cloudy,
    Rainy,
    ThunderstormRain,
    LightRain,
    Snowy,
    MixedRainSnow,
    Foggy,
}

impl CanonicalCondition {
    pub const ALL: [CanonicalCondition; 9] = [
        Self::Sunny,
        Self::PartlyCloudy,
        Self::Cloudy,
        Self::Rainy,
        Self::ThunderstormRain,
        Self::LightRain,
        Self::Snowy,
        Self::MixedRainSnow,
        Self::Foggy,
    ];

    /// Display label as offered to users
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Sunny => "Güneşli",
            Self::PartlyCloudy => "Parçalı Bulutlu",
            Self::Cloudy => "Bulutlu",
            Self::Rainy => "Yağmurlu",
            Self::ThunderstormRain => "Gök Gürültülü Yağışlı",
            Self::LightRain => "Hafif Yağışlı",
            Self::Snowy => "Karlı",
            Self::MixedRainSnow => "Karla Karışık Yağmurlu",
            Self::Foggy => "Sisli",
        }
    }

    /// Case- and diacritic-insensitive lookup by label
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let key = normalize(label);
        Self::ALL
            .into_iter()
            .find(|condition| normalize(condition.label()) == key)
    }
}

impl fmt::Display for CanonicalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CanonicalCondition {
    type Err = WeatherTripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s)
            .ok_or_else(|| WeatherTripError::validation(format!("Unknown weather condition '{s}'")))
    }
}

/// Result of classifying a condition phrase
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StandardCondition {
    Known(CanonicalCondition),
    /// No rule matched; carries the cleaned-up phrase
    Unmapped(String),
}

impl StandardCondition {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Known(condition) => condition.label(),
            Self::Unmapped(text) => text,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

impl From<&str> for StandardCondition {
    fn from(label: &str) -> Self {
        match CanonicalCondition::from_label(label) {
            Some(condition) => Self::Known(condition),
            None => Self::Unmapped(label.to_string()),
        }
    }
}

impl fmt::Display for StandardCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for StandardCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for StandardCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from(label.as_str()))
    }
}

/// Rewrites a synonym phrase into the wording the rules understand
#[derive(Debug, Clone)]
pub struct Substitution {
    pattern: Regex,
    replacement: &'static str,
    /// Skip the rewrite when the phrase already matches this
    unless: Option<Regex>,
}

impl Substitution {
    fn apply(&self, text: &str) -> String {
        if self.unless.as_ref().is_some_and(|guard| guard.is_match(text)) {
            return text.to_string();
        }
        self.pattern.replace_all(text, self.replacement).into_owned()
    }
}

/// One `(pattern, label)` entry of the ordered rule table
#[derive(Debug, Clone)]
pub struct ConditionRule {
    pattern: Regex,
    /// When set, must also match for the rule to apply
    qualifier: Option<Regex>,
    label: CanonicalCondition,
}

impl ConditionRule {
    fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
            && self
                .qualifier
                .as_ref()
                .is_none_or(|qualifier| qualifier.is_match(text))
    }
}

/// Immutable classification tables, built once at startup
#[derive(Debug, Clone)]
pub struct ConditionRules {
    hourly: Regex,
    substitutions: Vec<Substitution>,
    rules: Vec<ConditionRule>,
}

// Patterns below are literals; a failure here is a programming error.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

fn substitution(pattern: &str, replacement: &'static str) -> Substitution {
    Substitution {
        pattern: compile(pattern),
        replacement,
        unless: None,
    }
}

fn substitution_unless(pattern: &str, replacement: &'static str, unless: &str) -> Substitution {
    Substitution {
        unless: Some(compile(unless)),
        ..substitution(pattern, replacement)
    }
}

fn rule(pattern: &str, qualifier: Option<&str>, label: CanonicalCondition) -> ConditionRule {
    ConditionRule {
        pattern: compile(pattern),
        qualifier: qualifier.map(compile),
        label,
    }
}

impl Default for ConditionRules {
    fn default() -> Self {
        use CanonicalCondition::*;

        const SUN: &str = r"güneşli|açık";
        const CLOUD: &str = r"bulutlu";
        const RAIN: &str = r"yağmur|sağanak";
        const THUNDER: &str = r"gök gürültü";
        const SNOW: &str = r"\bkar\b";

        Self {
            hourly: compile(r"saatlik"),
            substitutions: vec![
                substitution(r"^açılıyor$", "güneşli"),
                substitution(r"bol güneş ışığı", "güneşli"),
                substitution(r"parlak güneş ışığı", "güneşli"),
                substitution_unless(
                    r"bulutların arasından (?:\S+ )*?güneş\b",
                    "parçalı bulutlu",
                    r"güneşli",
                ),
                substitution_unless(
                    r"yüksek bulutlar arasından görünen güneş\b",
                    "parçalı bulutlu",
                    r"güneşli",
                ),
                substitution(r"alçak bulutlar", "bulutlu"),
                substitution(r"artan bulutlar", "çok bulutlu"),
                substitution(r"azalan bulutlar", "parçalı bulutlu"),
                substitution(r"çok rüzgarlı", "rüzgarlı"),
                substitution(r"daha s[ıi]cak", "sıcak"),
                substitution(r"daha so[ğg]uk", "soğuk"),
                substitution(r"daha serin", "serin"),
                substitution(r"pek so[ğg]uk de[ğg]il", "ılık"),
                substitution(r"çok so[ğg]uk", "soğuk"),
            ],
            rules: vec![
                rule(SUN, Some(r"parçalı|\baz\b"), PartlyCloudy),
                rule(SUN, None, Sunny),
                rule(CLOUD, Some(r"parçalı"), PartlyCloudy),
                rule(CLOUD, None, Cloudy),
                rule(r"karla karışık|\bkar\b.*\byağmur|\byağmur.*\bkar\b", None, MixedRainSnow),
                rule(RAIN, Some(THUNDER), ThunderstormRain),
                rule(RAIN, Some(r"hafif"), LightRain),
                rule(RAIN, None, Rainy),
                rule(THUNDER, None, ThunderstormRain),
                rule(SNOW, None, Snowy),
                rule(r"sisli|puslu|\bsis\b|\bpus\b", None, Foggy),
            ],
        }
    }
}

impl ConditionRules {
    /// Map a scraped condition phrase onto the canonical vocabulary.
    pub fn standardize(&self, condition_text: &str) -> StandardCondition {
        let lowered = turkish_lowercase(condition_text);
        let mut processed = squash_whitespace(&self.hourly.replace_all(&lowered, " "));

        for sub in &self.substitutions {
            processed = sub.apply(&processed);
        }

        if processed.is_empty() {
            warn!("Condition text has no content: {:?}", condition_text);
            return StandardCondition::Unmapped(condition_text.trim().to_string());
        }

        match self.rules.iter().find(|rule| rule.matches(&processed)) {
            Some(rule) => StandardCondition::Known(rule.label),
            None => {
                warn!("Unmapped weather condition: {:?}", condition_text);
                StandardCondition::Unmapped(processed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn rules() -> ConditionRules {
        ConditionRules::default()
    }

    #[rstest]
    #[case("Güneşli", "Güneşli")]
    #[case("Güneşli Saatlik", "Güneşli")]
    #[case("Bol güneş ışığı", "Güneşli")]
    #[case("Açılıyor", "Güneşli")]
    #[case("AÇIK", "Güneşli")]
    #[case("Çoğunlukla güneşli", "Güneşli")]
    #[case("Parçalı bulutlu", "Parçalı Bulutlu")]
    #[case("Az güneşli", "Parçalı Bulutlu")]
    #[case("Bulutların arasından ara ara kendini gösteren güneş", "Parçalı Bulutlu")]
    #[case("Azalan bulutlar", "Parçalı Bulutlu")]
    #[case("Çok bulutlu", "Bulutlu")]
    #[case("Az bulutlu", "Bulutlu")]
    #[case("Alçak bulutlar", "Bulutlu")]
    #[case("Artan bulutlar", "Bulutlu")]
    #[case("Yağmurlu", "Yağmurlu")]
    #[case("Sağanak yağışlı", "Yağmurlu")]
    #[case("Hafif yağmurlu", "Hafif Yağışlı")]
    #[case("Gök gürültülü sağanak yağışlı", "Gök Gürültülü Yağışlı")]
    #[case("Gök gürültülü", "Gök Gürültülü Yağışlı")]
    #[case("Kar yağışlı", "Karlı")]
    #[case("Karla karışık yağmur", "Karla Karışık Yağmurlu")]
    #[case("Sisli", "Sisli")]
    #[case("Puslu", "Sisli")]
    fn test_standardize_known(
        rules: ConditionRules,
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        let result = rules.standardize(input);
        assert!(result.is_known(), "{input:?} should be classified");
        assert_eq!(result.label(), expected);
    }

    #[rstest]
    #[case("Çok rüzgarlı", "rüzgarlı")]
    #[case("Daha sıcak", "sıcak")]
    #[case("Pek soğuk değil", "ılık")]
    #[case("Bilinmeyen  durum", "bilinmeyen durum")]
    fn test_standardize_unmapped_passes_processed_text(
        rules: ConditionRules,
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(
            rules.standardize(input),
            StandardCondition::Unmapped(expected.to_string())
        );
    }

    #[rstest]
    fn test_empty_condition_is_unmapped(rules: ConditionRules) {
        assert_eq!(
            rules.standardize(" Saatlik "),
            StandardCondition::Unmapped("Saatlik".to_string())
        );
    }

    #[rstest]
    fn test_sunny_without_partial_qualifier_is_sunny(rules: ConditionRules) {
        let phrases = [
            "güneşli",
            "güneşli ve sıcak",
            "sabah güneşli",
            "güneşli, öğleden sonra bulutlu",
            "güneşli yağmur ihtimali",
            "kar sonrası güneşli",
            "bulutların arasından güneşli sonra güneş",
            "yüksek bulutlar arasından görünen güneş sonra güneşli",
        ];
        for phrase in phrases {
            assert_eq!(
                rules.standardize(phrase),
                StandardCondition::Known(CanonicalCondition::Sunny),
                "{phrase:?}"
            );
        }
    }

    #[rstest]
    fn test_partly_cloudy_always_wins_over_cloudy(rules: ConditionRules) {
        let phrases = [
            "parçalı bulutlu",
            "parçalı bulutlu ve yağmurlu",
            "güneşli parçalı bulutlu",
            "çok bulutlu parçalı",
            "parçalı bulutlu sisli",
            "bulutlu, parçalı açık",
        ];
        for phrase in phrases {
            assert_eq!(
                rules.standardize(phrase),
                StandardCondition::Known(CanonicalCondition::PartlyCloudy),
                "{phrase:?}"
            );
        }
    }

    #[test]
    fn test_label_round_trip_is_case_insensitive() {
        assert_eq!(
            CanonicalCondition::from_label("gok gurultulu yagisli"),
            Some(CanonicalCondition::ThunderstormRain)
        );
        assert_eq!("KARLI".parse::<CanonicalCondition>().unwrap(), CanonicalCondition::Snowy);
        assert!("Rüzgarlı".parse::<CanonicalCondition>().is_err());
    }

    #[test]
    fn test_standard_condition_serializes_as_label() {
        let known = StandardCondition::Known(CanonicalCondition::PartlyCloudy);
        assert_eq!(serde_json::to_string(&known).unwrap(), "\"Parçalı Bulutlu\"");

        let unmapped: StandardCondition = serde_json::from_str("\"rüzgarlı\"").unwrap();
        assert_eq!(unmapped, StandardCondition::Unmapped("rüzgarlı".to_string()));
    }
}
