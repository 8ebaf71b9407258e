use super::amount::normalize_amount;
use super::patterns::{AnchorSet, DateOrder, PatternBank};
use super::{Candidate, FieldContext, Matcher};
use chrono::NaiveDate;
use regex::{Captures, Match};

/// The fields extracted from every document, in output order.
pub const BUILTIN: &[(&str, Matcher)] = &[
    ("invoice_number", invoice_number),
    ("invoice_date", invoice_date),
    ("due_date", due_date),
    ("total_amount", total_amount),
    ("subtotal_amount", subtotal_amount),
    ("vat_amount", vat_amount),
    ("currency", currency),
    ("supplier_name", supplier_name),
    ("customer_name", customer_name),
];

/// Distance (in chars) past which a value gets no further proximity penalty.
const MAX_DISTANCE: usize = 60;
const PROXIMITY_PENALTY: f64 = 0.2;
/// Applied when the value sits on the line below a bare label.
const NEXT_LINE_PENALTY: f64 = 0.15;
/// An exclusion ending this close before an anchor swallows it ("incl. VAT").
const SHADOW_GAP: usize = 2;

const UNANCHORED_DATE: f64 = 0.4;
const UNANCHORED_AMOUNT: f64 = 0.3;
const FIRST_LINE_SUPPLIER: f64 = 0.3;

/// A value found in a line; offsets are bytes relative to the searched text.
struct Span {
    start: usize,
    end: usize,
    value: String,
    bonus: f64,
}

pub fn invoice_number(ctx: &FieldContext<'_>, bank: &PatternBank) -> Vec<Candidate> {
    let mut out = Vec::new();
    let patterns = bank
        .invoice_number
        .iter()
        .chain(std::iter::once(&bank.invoice_number_fallback));

    for pattern in patterns {
        for caps in pattern.regex.captures_iter(ctx.text) {
            let Some(m) = caps.get(1) else { continue };
            let value = m.as_str().trim_end_matches(|c: char| c == '-' || c == '/');
            if value.chars().any(|c| c.is_ascii_digit()) {
                out.push(Candidate::new(value, pattern.confidence, m.start()));
            }
        }
    }
    out
}

pub fn invoice_date(ctx: &FieldContext<'_>, bank: &PatternBank) -> Vec<Candidate> {
    let find = |s: &str| find_dates(s, bank);
    let mut out = anchored(ctx, &bank.invoice_date, find);

    for line in &ctx.lines {
        let due = bank.due_date.anchors.iter().any(|a| a.regex.is_match(line.text));
        if due || bank.invoice_date.excludes(line.text) {
            continue;
        }
        for span in find_dates(line.text, bank) {
            out.push(Candidate::new(
                span.value,
                UNANCHORED_DATE + span.bonus,
                line.offset + span.start,
            ));
        }
    }
    out
}

pub fn due_date(ctx: &FieldContext<'_>, bank: &PatternBank) -> Vec<Candidate> {
    anchored(ctx, &bank.due_date, |s| find_dates(s, bank))
}

pub fn total_amount(ctx: &FieldContext<'_>, bank: &PatternBank) -> Vec<Candidate> {
    let mut out = anchored(ctx, &bank.total_amount, |s| find_amounts(s, bank));

    // Any decimal amount is a weak total candidate.
    for line in &ctx.lines {
        if bank.total_amount.excludes(line.text) {
            continue;
        }
        let dates = find_dates(line.text, bank);
        for caps in bank.amount.captures_iter(line.text) {
            if caps.name("dec").is_none() || is_percentage(&caps) {
                continue;
            }
            if let Some(span) = amount_span(&caps).filter(|a| !within_date(a, &dates)) {
                out.push(Candidate::new(
                    span.value,
                    UNANCHORED_AMOUNT,
                    line.offset + span.start,
                ));
            }
        }
    }
    out
}

pub fn subtotal_amount(ctx: &FieldContext<'_>, bank: &PatternBank) -> Vec<Candidate> {
    anchored(ctx, &bank.subtotal_amount, |s| find_amounts(s, bank))
}

pub fn vat_amount(ctx: &FieldContext<'_>, bank: &PatternBank) -> Vec<Candidate> {
    anchored(ctx, &bank.vat_amount, |s| find_amounts(s, bank))
}

pub fn currency(ctx: &FieldContext<'_>, bank: &PatternBank) -> Vec<Candidate> {
    let mut out = Vec::new();
    for line in &ctx.lines {
        // Markers next to an amount are more trustworthy than stray mentions.
        let penalty = if bank.amount.is_match(line.text) { 0.0 } else { 0.1 };

        for m in bank.currency_code.find_iter(line.text) {
            out.push(Candidate::new(
                m.as_str().to_uppercase(),
                0.9 - penalty,
                line.offset + m.start(),
            ));
        }
        for m in bank.currency_symbol.find_iter(line.text) {
            if let Some(code) = symbol_code(m.as_str()) {
                out.push(Candidate::new(code, 0.75 - penalty, line.offset + m.start()));
            }
        }
        for m in bank.currency_kr.find_iter(line.text) {
            out.push(Candidate::new("SEK", 0.6 - penalty, line.offset + m.start()));
        }
    }
    out
}

pub fn supplier_name(ctx: &FieldContext<'_>, bank: &PatternBank) -> Vec<Candidate> {
    let mut out = party(ctx, &bank.supplier_name);

    // Letterheads usually open with the issuer's name.
    if let Some(first) = ctx.lines.iter().find(|l| l.text.chars().any(char::is_alphabetic)) {
        let labelled = bank.document_title.is_match(first.text)
            || [&bank.supplier_name, &bank.customer_name]
                .iter()
                .any(|set| set.anchors.iter().any(|a| a.regex.is_match(first.text)));
        if !labelled {
            if let Some(name) = clean_party(first.text) {
                out.push(Candidate::new(name, FIRST_LINE_SUPPLIER, first.offset));
            }
        }
    }
    out
}

pub fn customer_name(ctx: &FieldContext<'_>, bank: &PatternBank) -> Vec<Candidate> {
    party(ctx, &bank.customer_name)
}

/// Score every value that follows one of the set's labels, on the same line
/// or on the next line when the label stands alone.
fn anchored(
    ctx: &FieldContext<'_>,
    set: &AnchorSet,
    find: impl Fn(&str) -> Vec<Span>,
) -> Vec<Candidate> {
    let mut out = Vec::new();

    for (i, line) in ctx.lines.iter().enumerate() {
        let exclusions = exclusion_matches(set, line.text);

        for anchor in &set.anchors {
            for label in anchor.regex.find_iter(line.text) {
                if exclusions.iter().any(|x| shadows(x, &label)) {
                    continue;
                }

                let rest = &line.text[label.end()..];
                for span in find(rest) {
                    let start = label.end() + span.start;
                    if exclusions
                        .iter()
                        .any(|x| x.start() >= label.end() && x.start() < start)
                    {
                        continue;
                    }
                    let distance = rest[..span.start].chars().count();
                    out.push(Candidate::new(
                        span.value,
                        anchor.weight + span.bonus - proximity_penalty(distance),
                        line.offset + start,
                    ));
                }

                if !is_bare_label(rest) {
                    continue;
                }
                let Some(next) = ctx.lines.get(i + 1) else {
                    continue;
                };
                if set.excludes(next.text) {
                    continue;
                }
                for span in find(next.text) {
                    let distance = next.text[..span.start].chars().count();
                    out.push(Candidate::new(
                        span.value,
                        anchor.weight + span.bonus
                            - NEXT_LINE_PENALTY
                            - proximity_penalty(distance),
                        next.offset + span.start,
                    ));
                }
            }
        }
    }
    out
}

fn party(ctx: &FieldContext<'_>, set: &AnchorSet) -> Vec<Candidate> {
    let mut out = Vec::new();

    for (i, line) in ctx.lines.iter().enumerate() {
        let exclusions = exclusion_matches(set, line.text);

        for anchor in &set.anchors {
            for label in anchor.regex.find_iter(line.text) {
                if exclusions.iter().any(|x| shadows(x, &label)) {
                    continue;
                }
                // The name ends where a neighbouring label ("Customer no") begins.
                let end = exclusions
                    .iter()
                    .map(|x| x.start())
                    .find(|&s| s >= label.end())
                    .unwrap_or(line.text.len());
                let rest = &line.text[label.end()..end];

                if let Some(name) = clean_party(rest) {
                    out.push(Candidate::new(name, anchor.weight, line.offset + label.end()));
                    continue;
                }
                if !is_bare_label(rest) {
                    continue;
                }
                let Some(next) = ctx.lines.get(i + 1) else {
                    continue;
                };
                if set.excludes(next.text)
                    || set.anchors.iter().any(|a| a.regex.is_match(next.text))
                {
                    continue;
                }
                if let Some(name) = clean_party(next.text) {
                    out.push(Candidate::new(name, anchor.weight - 0.1, next.offset));
                }
            }
        }
    }
    out
}

fn exclusion_matches<'t>(set: &AnchorSet, text: &'t str) -> Vec<Match<'t>> {
    set.exclude
        .as_ref()
        .map(|re| re.find_iter(text).collect())
        .unwrap_or_default()
}

fn clean_party(raw: &str) -> Option<String> {
    let s = raw.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, ':' | '-' | '–' | '#' | '.')
    });
    // Layout text puts the next column after a wide gap.
    let s = s
        .split("   ")
        .next()
        .unwrap_or_default()
        .split('\t')
        .next()
        .unwrap_or_default()
        .trim();

    if s.chars().count() >= 2 && s.chars().any(char::is_alphabetic) {
        Some(s.to_string())
    } else {
        None
    }
}

fn find_dates(text: &str, bank: &PatternBank) -> Vec<Span> {
    let mut found: Vec<Span> = Vec::new();

    for pattern in &bank.dates {
        for caps in pattern.regex.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if found
                .iter()
                .any(|d| whole.start() < d.end && d.start < whole.end())
            {
                continue;
            }
            if let Some(date) = parse_date(&caps, pattern.order) {
                found.push(Span {
                    start: whole.start(),
                    end: whole.end(),
                    value: date.format("%Y-%m-%d").to_string(),
                    bonus: pattern.bonus,
                });
            }
        }
    }

    found.sort_by_key(|d| d.start);
    found
}

fn parse_date(caps: &Captures<'_>, order: DateOrder) -> Option<NaiveDate> {
    let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());

    let (year, month, day) = match order {
        DateOrder::YearFirst => (num("y")?, num("m")?, num("d")?),
        DateOrder::DayFirst | DateOrder::DayFirstShortYear => {
            let mut year = num("y")?;
            if order == DateOrder::DayFirstShortYear {
                year += 2000;
            }
            let (d, m) = (num("d")?, num("m")?);
            // US order when the first number cannot be a day-of-month pair.
            if m > 12 && d <= 12 {
                (year, d, m)
            } else {
                (year, m, d)
            }
        }
        DateOrder::DayMonthName | DateOrder::MonthNameDay => {
            (num("y")?, month_number(caps.name("mon")?.as_str())?, num("d")?)
        }
    };

    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "maj" | "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "okt" | "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn find_amounts(text: &str, bank: &PatternBank) -> Vec<Span> {
    let dates = find_dates(text, bank);
    bank.amount
        .captures_iter(text)
        .filter(|caps| !is_percentage(caps))
        .filter_map(|caps| amount_span(&caps))
        .filter(|amount| !within_date(amount, &dates))
        .collect()
}

/// Digits of a parsed date ("05.01.2024") are never an amount.
fn within_date(amount: &Span, dates: &[Span]) -> bool {
    dates.iter().any(|d| amount.start < d.end && d.start < amount.end)
}

fn amount_span(caps: &Captures<'_>) -> Option<Span> {
    let int = caps.name("int")?;
    let dec = caps.name("dec");
    let value = normalize_amount(int.as_str(), dec.map(|d| d.as_str())).ok()?;
    Some(Span {
        start: int.start(),
        end: dec.unwrap_or(int).end(),
        value,
        bonus: if dec.is_some() { 0.05 } else { 0.0 },
    })
}

fn is_percentage(caps: &Captures<'_>) -> bool {
    caps.name("tail").is_some_and(|t| t.as_str() == "%")
}

fn symbol_code(symbol: &str) -> Option<&'static str> {
    match symbol {
        "$" => Some("USD"),
        "€" => Some("EUR"),
        "£" => Some("GBP"),
        "¥" => Some("JPY"),
        _ => None,
    }
}

fn shadows(exclusion: &Match<'_>, label: &Match<'_>) -> bool {
    exclusion.start() <= label.end() && exclusion.end() + SHADOW_GAP >= label.start()
}

fn is_bare_label(rest: &str) -> bool {
    !rest.chars().any(char::is_alphanumeric)
}

fn proximity_penalty(distance: usize) -> f64 {
    PROXIMITY_PENALTY * distance.min(MAX_DISTANCE) as f64 / MAX_DISTANCE as f64
}
