//! Keyword-frequency language detection for extracted document text.
//!
//! Scores each supported language by how many of its function words and
//! invoice vocabulary appear as whole words, plus a bonus for letters that
//! are specific to it. Falls back to English when nothing matches.

pub const FALLBACK_LANGUAGE: &str = "en";

/// Texts shorter than this (trimmed, in chars) carry no usable signal.
const MIN_TEXT_CHARS: usize = 20;

struct Profile {
    code: &'static str,
    words: &'static [&'static str],
    letters: &'static [char],
}

// Listed in tie-break order.
const PROFILES: &[Profile] = &[
    Profile {
        code: "en",
        words: &[
            "the", "and", "for", "with", "this", "that", "from", "are", "was", "will", "have",
            "invoice", "date", "due", "total", "amount", "payment", "customer", "number",
            "please", "thank", "services", "tax",
        ],
        letters: &[],
    },
    Profile {
        code: "sv",
        words: &[
            "och", "att", "för", "med", "det", "som", "till", "av", "är", "på", "inte", "vi",
            "faktura", "fakturadatum", "fakturanummer", "förfallodatum", "moms", "summa",
            "totalt", "betala", "kund", "belopp", "organisationsnummer", "bankgiro",
        ],
        letters: &['å', 'ä', 'ö'],
    },
    Profile {
        code: "de",
        words: &[
            "und", "der", "die", "das", "mit", "für", "ist", "nicht", "von", "bitte", "wir",
            "rechnung", "rechnungsnummer", "rechnungsdatum", "betrag", "gesamt", "mwst",
            "zahlbar", "kunde", "datum", "summe",
        ],
        letters: &['ß', 'ü'],
    },
    Profile {
        code: "fr",
        words: &[
            "le", "la", "les", "des", "une", "est", "pour", "avec", "dans", "sur", "nous",
            "facture", "montant", "échéance", "tva", "client", "paiement", "numéro", "merci",
        ],
        letters: &['é', 'è', 'ê', 'ç', 'à', 'â', 'ô'],
    },
];

/// Detect the primary language of `text`, as a two-letter code.
pub fn detect_language(text: &str) -> &'static str {
    if text.trim().chars().count() < MIN_TEXT_CHARS {
        return FALLBACK_LANGUAGE;
    }

    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| !t.is_empty())
        .collect();

    let mut best = (FALLBACK_LANGUAGE, 0u32);
    for profile in PROFILES {
        let score = score(profile, &tokens, &lower);
        if score > best.1 {
            best = (profile.code, score);
        }
    }
    best.0
}

fn score(profile: &Profile, tokens: &[&str], lower: &str) -> u32 {
    let words = tokens
        .iter()
        .filter(|t| profile.words.contains(t))
        .count() as u32;
    // Every two language-specific letters count as one word.
    let letters = lower
        .chars()
        .filter(|c| profile.letters.contains(c))
        .count() as u32;
    words + letters / 2
}
