use crate::error::DocsortError;
use regex::Regex;

/// A keyword that labels a field value, with the base confidence it lends
/// to values found next to it. More specific labels carry higher weights.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub regex: Regex,
    pub weight: f64,
}

/// Labels for one anchored field, plus lines that must be ignored because
/// they belong to a neighbouring field (e.g. "subtotal" for the total).
#[derive(Debug, Clone)]
pub struct AnchorSet {
    pub anchors: Vec<Anchor>,
    pub exclude: Option<Regex>,
}

impl AnchorSet {
    pub fn excludes(&self, line: &str) -> bool {
        self.exclude.as_ref().is_some_and(|re| re.is_match(line))
    }
}

/// A value pattern whose first capture group is the field value.
#[derive(Debug, Clone)]
pub struct ScoredPattern {
    pub regex: Regex,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    /// 2024-03-31
    YearFirst,
    /// 31.03.2024, or 03/31/2024 when the day cannot be a month
    DayFirst,
    /// 31.03.24
    DayFirstShortYear,
    /// 31 March 2024
    DayMonthName,
    /// March 31, 2024
    MonthNameDay,
}

#[derive(Debug, Clone)]
pub struct DatePattern {
    pub regex: Regex,
    pub order: DateOrder,
    /// Added to the anchor weight; negative for ambiguous formats.
    pub bonus: f64,
}

/// Every pattern the field extractor uses, compiled once.
///
/// Built at startup and shared read-only for the lifetime of the extractor.
#[derive(Debug, Clone)]
pub struct PatternBank {
    pub amount: Regex,
    pub currency_code: Regex,
    pub currency_symbol: Regex,
    pub currency_kr: Regex,
    /// Title words that disqualify a line as a party name.
    pub document_title: Regex,
    pub dates: Vec<DatePattern>,
    pub invoice_number: Vec<ScoredPattern>,
    pub invoice_number_fallback: ScoredPattern,
    pub invoice_date: AnchorSet,
    pub due_date: AnchorSet,
    pub total_amount: AnchorSet,
    pub subtotal_amount: AnchorSet,
    pub vat_amount: AnchorSet,
    pub supplier_name: AnchorSet,
    pub customer_name: AnchorSet,
}

const ID: &str = r"([A-Z0-9][A-Z0-9/-]{2,})";
const MONTH: &str = r"(?P<mon>jan|feb|mar|apr|maj|may|jun|jul|aug|sep|okt|oct|nov|dec)[a-zé]*\.?";

impl PatternBank {
    pub fn builtin() -> Result<Self, DocsortError> {
        Ok(PatternBank {
            amount: compile(
                r"\b(?P<int>\d{1,3}(?:[ \u{a0}.,']\d{3})+|\d+)(?P<dec>[.,]\d{1,2})?(?P<tail>\D|$)",
            )?,
            currency_code: compile(r"(?i)\b(SEK|USD|EUR|GBP|NOK|DKK|CHF|JPY)\b")?,
            currency_symbol: compile(r"[$€£¥]")?,
            currency_kr: compile(r"(?i)\bkr\b")?,
            document_title: compile(r"(?i)\b(?:invoice|faktura|rechnung|facture|receipt|kvitto)\b")?,
            dates: vec![
                DatePattern {
                    regex: compile(r"\b(?P<y>\d{4})[-/.](?P<m>\d{1,2})[-/.](?P<d>\d{1,2})\b")?,
                    order: DateOrder::YearFirst,
                    bonus: 0.05,
                },
                DatePattern {
                    regex: compile(&format!(r"(?i)\b(?P<d>\d{{1,2}})\.?\s+{MONTH}\s+(?P<y>\d{{4}})\b"))?,
                    order: DateOrder::DayMonthName,
                    bonus: 0.05,
                },
                DatePattern {
                    regex: compile(&format!(r"(?i)\b{MONTH}\s+(?P<d>\d{{1,2}}),?\s+(?P<y>\d{{4}})\b"))?,
                    order: DateOrder::MonthNameDay,
                    bonus: 0.05,
                },
                DatePattern {
                    regex: compile(r"\b(?P<d>\d{1,2})[./-](?P<m>\d{1,2})[./-](?P<y>\d{4})\b")?,
                    order: DateOrder::DayFirst,
                    bonus: 0.0,
                },
                DatePattern {
                    regex: compile(r"\b(?P<d>\d{1,2})[./-](?P<m>\d{1,2})[./-](?P<y>\d{2})\b")?,
                    order: DateOrder::DayFirstShortYear,
                    bonus: -0.1,
                },
            ],
            invoice_number: vec![
                scored(
                    &format!(r"(?i)\binvoice\s*(?:no\.?|number|nr\.?|num\.?|#)\s*[:#-]?\s*{ID}"),
                    0.9,
                )?,
                scored(
                    &format!(r"(?i)\bfaktura\s*(?:nr\.?|nummer|no\.?)\s*[:#-]?\s*{ID}"),
                    0.85,
                )?,
                scored(&format!(r"(?i)\b(?:faktura|invoice)\s*[:#]\s*{ID}"), 0.75)?,
                scored(
                    &format!(
                        r"(?i)\b(?:document|doc|reference|ref|order)\s*(?:no\.?|nr\.?|number|#)\s*[:#-]?\s*{ID}"
                    ),
                    0.7,
                )?,
                scored(
                    &format!(r"(?i)\binv\.?\s*(?:no\.?|nr\.?|#)\s*[:#-]?\s*{ID}"),
                    0.65,
                )?,
            ],
            invoice_number_fallback: scored(r"(?i)\b(INV[- ]?[A-Z0-9]{3,})\b", 0.5)?,
            invoice_date: anchor_set(
                &[
                    (r"(?i)\b(?:invoice\s+date|date\s+of\s+issue|issue\s+date|fakturadatum|faktureringsdatum)\b", 0.9),
                    (r"(?i)\b(?:date|datum|dated)\b", 0.7),
                ],
                Some(r"(?i)\b(?:due|förfallo\w*|forfallo\w*|betalas\s+senast|delivery|leverans\w*|expiry|order\s+date)\b"),
            )?,
            due_date: anchor_set(
                &[
                    (r"(?i)\b(?:due\s+date|payment\s+due|pay\s+by|förfallodatum|förfallodag|forfallodatum|betalas\s+senast|sista\s+betalningsdag)\b", 0.9),
                    (r"(?i)\bdue\b", 0.75),
                ],
                None,
            )?,
            total_amount: anchor_set(
                &[
                    (r"(?i)\b(?:total\s+amount|amount\s+due|total\s+due|grand\s+total|balance\s+due|att\s+betala|total\s+belopp)\b", 0.9),
                    (r"(?i)\b(?:total|totalt|summa|belopp)\b", 0.8),
                ],
                Some(r"(?i)(?:sub\s*-?\s*total|delsumma|net\s+total|\bexcl\b|\bexkl\b|\bnetto\b)"),
            )?,
            subtotal_amount: anchor_set(
                &[
                    (r"(?i)(?:\bsub\s*-?\s*total|\bdelsumma|\bnet\s+total|\bnetto)\b", 0.9),
                    (r"(?i)\b(?:total|summa)\s+(?:excl|exkl)\b", 0.85),
                ],
                None,
            )?,
            vat_amount: anchor_set(
                &[
                    (r"(?i)\b(?:vat|moms|mervärdesskatt)\b", 0.85),
                    (r"(?i)\b(?:tax|sales\s+tax)\b", 0.75),
                ],
                Some(r"(?i)(?:\b(?:vat|moms)\s*-?\s*(?:no|nr|number|reg\w*)\b|\bmomsreg\w*|\b(?:incl|inkl|excl|exkl)\b|\borg\.?\s*nr)"),
            )?,
            supplier_name: anchor_set(
                &[(r"(?i)\b(?:supplier|vendor|seller|leverantör|säljare|issued\s+by)\b", 0.8)],
                Some(r"(?i)\b(?:supplier|vendor|leverantör)\s*(?:no|nr|number|id|nummer)\b"),
            )?,
            customer_name: anchor_set(
                &[(r"(?i)\b(?:customer|client|buyer|bill\s+to|billed\s+to|kund|köpare|mottagare)\b", 0.8)],
                Some(r"(?i)\b(?:customer|client|kund)\s*(?:no|nr|number|id|nummer|ref\w*)\b"),
            )?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex, DocsortError> {
    Regex::new(pattern).map_err(|e| DocsortError::Config(format!("bad pattern '{pattern}': {e}")))
}

fn scored(pattern: &str, confidence: f64) -> Result<ScoredPattern, DocsortError> {
    Ok(ScoredPattern {
        regex: compile(pattern)?,
        confidence,
    })
}

fn anchor_set(anchors: &[(&str, f64)], exclude: Option<&str>) -> Result<AnchorSet, DocsortError> {
    Ok(AnchorSet {
        anchors: anchors
            .iter()
            .map(|&(pattern, weight)| {
                Ok(Anchor {
                    regex: compile(pattern)?,
                    weight,
                })
            })
            .collect::<Result<_, DocsortError>>()?,
        exclude: exclude.map(compile).transpose()?,
    })
}
