//! Resolution of scraped date tokens into calendar dates
//!
//! The forecast pages label rows either relatively ("Bugün", "Yarın") or as
//! `"<day> <month abbreviation> <weekday>"`, e.g. `"05 Oca Pzt"`. No year is
//! ever printed, so the year of the reference date is assumed. A forecast that
//! crosses New Year therefore lands its January rows in the wrong year; this is
//! a known limitation of the source format.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::Result;
use crate::error::WeatherTripError;
use crate::text::normalize;

const TODAY: &str = "bugun";
const TOMORROW: &str = "yarin";

/// Fixed table of Turkish three-letter month abbreviations
#[derive(Debug, Clone)]
pub struct MonthTable {
    entries: [(String, u32); 12],
}

impl Default for MonthTable {
    fn default() -> Self {
        let names = [
            "oca", "şub", "mar", "nis", "may", "haz", "tem", "ağu", "eyl", "eki", "kas", "ara",
        ];
        Self {
            entries: std::array::from_fn(|i| (normalize(names[i]), i as u32 + 1)),
        }
    }
}

impl MonthTable {
    /// Month number for an abbreviation. Unknown abbreviations fall back to January.
    #[must_use]
    pub fn month(&self, abbreviation: &str) -> u32 {
        let key = normalize(abbreviation);
        self.entries
            .iter()
            .find(|(name, _)| *name == key)
            .map_or(1, |(_, number)| *number)
    }
}

/// Turkish weekday abbreviation as printed by the forecast site
#[must_use]
pub fn weekday_abbreviation(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Pzt",
        Weekday::Tue => "Sal",
        Weekday::Wed => "Çar",
        Weekday::Thu => "Per",
        Weekday::Fri => "Cum",
        Weekday::Sat => "Cmt",
        Weekday::Sun => "Paz",
    }
}

/// A date token resolved against a reference day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    /// Weekday token from the source, or derived from `date` when absent
    pub weekday: String,
}

impl ResolvedDate {
    fn derived(date: NaiveDate) -> Self {
        Self {
            date,
            weekday: weekday_abbreviation(date.weekday()).to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DateParser {
    months: MonthTable,
}

impl DateParser {
    #[must_use]
    pub fn new(months: MonthTable) -> Self {
        Self { months }
    }

    /// Resolve a row's date token relative to `today`.
    pub fn resolve(&self, token: &str, today: NaiveDate) -> Result<ResolvedDate> {
        match normalize(token).as_str() {
            TODAY => return Ok(ResolvedDate::derived(today)),
            TOMORROW => {
                let tomorrow = today
                    .checked_add_days(Days::new(1))
                    .ok_or_else(|| WeatherTripError::parse("date out of range"))?;
                return Ok(ResolvedDate::derived(tomorrow));
            }
            _ => {}
        }

        let parts: Vec<&str> = token.split_whitespace().collect();
        let [day, month, rest @ ..] = parts.as_slice() else {
            return Err(WeatherTripError::parse(format!(
                "Unrecognized date token '{token}'"
            )));
        };

        let day: u32 = day
            .parse()
            .map_err(|_| WeatherTripError::parse(format!("Invalid day in '{token}'")))?;
        let month = self.months.month(month);

        let date = NaiveDate::from_ymd_opt(today.year(), month, day)
            .ok_or_else(|| WeatherTripError::parse(format!("Impossible date '{token}'")))?;

        Ok(match rest.first() {
            Some(weekday) => ResolvedDate {
                date,
                weekday: (*weekday).to_string(),
            },
            None => ResolvedDate::derived(date),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()
    }

    #[rstest]
    #[case("bugün")]
    #[case("Bugün")]
    #[case(" BUGÜN ")]
    fn test_today(#[case] token: &str) {
        let resolved = DateParser::default().resolve(token, reference()).unwrap();
        assert_eq!(resolved.date, reference());
        assert_eq!(resolved.weekday, "Per");
    }

    #[test]
    fn test_tomorrow() {
        let resolved = DateParser::default().resolve("Yarın", reference()).unwrap();
        assert_eq!(resolved.date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(resolved.weekday, "Cum");
    }

    #[test]
    fn test_tomorrow_crosses_month_end() {
        let end_of_feb = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let resolved = DateParser::default().resolve("yarın", end_of_feb).unwrap();
        assert_eq!(resolved.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[rstest]
    #[case("05 Oca Pzt", 1, 5, "Pzt")]
    #[case("5 oca Pzt", 1, 5, "Pzt")]
    #[case("29 Şub Per", 2, 29, "Per")]
    #[case("17 Ağu Cmt", 8, 17, "Cmt")]
    #[case("01 Ara Paz", 12, 1, "Paz")]
    fn test_day_month_weekday(
        #[case] token: &str,
        #[case] month: u32,
        #[case] day: u32,
        #[case] weekday: &str,
    ) {
        let resolved = DateParser::default().resolve(token, reference()).unwrap();
        assert_eq!(resolved.date, NaiveDate::from_ymd_opt(2024, month, day).unwrap());
        assert_eq!(resolved.weekday, weekday);
    }

    #[test]
    fn test_weekday_is_derived_when_missing() {
        let resolved = DateParser::default().resolve("14 Mar", reference()).unwrap();
        assert_eq!(resolved.date, reference());
        assert_eq!(resolved.weekday, "Per");
    }

    #[test]
    fn test_unknown_month_defaults_to_january() {
        let resolved = DateParser::default().resolve("12 Xyz Sal", reference()).unwrap();
        assert_eq!(resolved.date, NaiveDate::from_ymd_opt(2024, 1, 12).unwrap());
    }

    #[test]
    fn test_year_always_follows_reference() {
        let new_years_eve = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let resolved = DateParser::default().resolve("02 Oca Per", new_years_eve).unwrap();
        assert_eq!(resolved.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[rstest]
    #[case("")]
    #[case("Pazartesi")]
    #[case("xx Oca Pzt")]
    #[case("31 Şub Cmt")]
    fn test_invalid_tokens(#[case] token: &str) {
        let result = DateParser::default().resolve(token, reference());
        assert!(matches!(result, Err(WeatherTripError::Parse { .. })));
    }

    #[test]
    fn test_month_table() {
        let months = MonthTable::default();
        assert_eq!(months.month("Eki"), 10);
        assert_eq!(months.month("ŞUB"), 2);
        assert_eq!(months.month("sub"), 2);
        assert_eq!(months.month("?"), 1);
    }
}
