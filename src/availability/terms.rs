//! Multilingual in-stock / out-of-stock term lists and the fuzzy text
//! normalization used to match them.

pub const OOS_TERMS_SHORT: &[&str] = &[
    "sold out",
    "out of stock",
    "stokta yok",
    "agotado",
    "esaurito",
    "esgotado",
    "tukendi",
    "mevcut degil",
];

pub const OOS_TERMS_LONG: &[&str] = &[
    "currently out of stock",
    "ausverkauft",
    "rupture de stock",
    "niet op voorraad",
    "brak w magazynie",
    "net v nalichii",
    "temporarily unavailable",
];

pub const IS_TERMS_SHORT: &[&str] = &["in stock", "stokta", "disponible", "dostepny"];

pub const IS_TERMS_LONG: &[&str] = &[
    "op voorraad",
    "auf lager",
    "disponivel",
    "disponibile",
    "v nalichii",
    "sepete ekle",
    "hemen al",
    "available for order",
];

/// Lowercase, strip common accent marks, fold Turkish dotless `ı` to `i`,
/// and collapse runs of whitespace to a single space.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let folded: String = lowered
        .chars()
        .map(|c| match c {
            'ı' => 'i',
            'â' | 'à' | 'á' | 'ä' | 'ã' => 'a',
            'ê' | 'è' | 'é' | 'ë' => 'e',
            'î' | 'ì' | 'í' | 'ï' => 'i',
            'ô' | 'ò' | 'ó' | 'ö' | 'õ' => 'o',
            'û' | 'ù' | 'ú' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            'ş' => 's',
            'ğ' => 'g',
            other => other,
        })
        .collect();

    let mut out = String::with_capacity(folded.len());
    let mut last_was_space = false;
    for c in folded.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out.trim().to_string()
}

/// Outcome of a term scan: whether it matched out-of-stock or in-stock
/// phrasing, and the base score before any source-specific bonus.
pub struct TermMatch {
    pub is_oos: bool,
    pub base_score: u8,
}

/// Scan normalized `text` for the strongest OOS/IS phrasing. Longer,
/// more specific phrases outscore short generic ones.
pub fn fuzzy_match(text: &str) -> Option<TermMatch> {
    let normalized = normalize(text);

    if OOS_TERMS_LONG.iter().any(|t| normalized.contains(t)) {
        return Some(TermMatch { is_oos: true, base_score: 70 });
    }
    if IS_TERMS_LONG.iter().any(|t| normalized.contains(t)) {
        return Some(TermMatch { is_oos: false, base_score: 62 });
    }
    if OOS_TERMS_SHORT.iter().any(|t| normalized.contains(t)) {
        return Some(TermMatch { is_oos: true, base_score: 60 });
    }
    if IS_TERMS_SHORT.iter().any(|t| normalized.contains(t)) {
        return Some(TermMatch { is_oos: false, base_score: 54 });
    }
    None
}
