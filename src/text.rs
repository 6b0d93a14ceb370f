//! Text folding helpers for Turkish city names and forecast phrases

/// Fold a Turkish letter to its closest ASCII equivalent, if it has one.
fn fold_turkish(c: char) -> Option<char> {
    match c {
        'ı' | 'I' | 'İ' => Some('i'),
        'ğ' | 'Ğ' => Some('g'),
        'ü' | 'Ü' => Some('u'),
        'ş' | 'Ş' => Some('s'),
        'ö' | 'Ö' => Some('o'),
        'ç' | 'Ç' => Some('c'),
        _ => None,
    }
}

/// Lower-case following Turkish casing rules (`I` → `ı`, `İ` → `i`).
#[must_use]
pub fn turkish_lowercase(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'I' => out.push('ı'),
            'İ' => out.push('i'),
            other => out.extend(other.to_lowercase()),
        }
    }
    out
}

/// Matching key for a city or label: lower-case ASCII letters and digits only.
///
/// "İstanbul", "istanbul " and "ISTANBUL" all normalize to `istanbul`.
/// The output is a fixed point, so normalizing twice changes nothing.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(|c| match fold_turkish(c) {
            Some(folded) => vec![folded],
            None => c.to_lowercase().collect(),
        })
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// URL slug: like [`normalize`], but whitespace runs become a single `-`.
#[must_use]
pub fn slug(text: &str) -> String {
    text.split_whitespace()
        .map(normalize)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Collapse internal whitespace runs to single spaces and trim the ends.
#[must_use]
pub fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("İstanbul", "istanbul")]
    #[case("ŞANLIURFA", "sanliurfa")]
    #[case("Kahramanmaraş", "kahramanmaras")]
    #[case("  Çanakkale ", "canakkale")]
    #[case("Ağrı", "agri")]
    #[case("Muğla/Bodrum", "muglabodrum")]
    #[case("Gümüşhane", "gumushane")]
    #[case("", "")]
    #[case("!!", "")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(input), expected);
    }

    #[rstest]
    #[case("Afyon Karahisar")]
    #[case("ÇOK BULUTLU")]
    #[case("İğdır   ")]
    #[case("é ñ ß 123")]
    fn test_normalize_is_idempotent(#[case] input: &str) {
        let once = normalize(input);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_turkish_lowercase() {
        assert_eq!(turkish_lowercase("AÇIK"), "açık");
        assert_eq!(turkish_lowercase("İzmir"), "izmir");
        assert_eq!(turkish_lowercase("Parçalı Bulutlu"), "parçalı bulutlu");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Kırıkkale"), "kirikkale");
        assert_eq!(slug("Afyon  Karahisar"), "afyon-karahisar");
        assert_eq!(slug("  "), "");
    }

    #[test]
    fn test_squash_whitespace() {
        assert_eq!(squash_whitespace("  çok \n bulutlu  "), "çok bulutlu");
    }
}
