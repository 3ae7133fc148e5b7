//! Domain-name helpers: extraction from queries and answers, and the
//! per-domain card model rendered under an analysis.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn response_domain_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"### ([a-zA-Z0-9.-]+\.[a-zA-Z]{2,})").expect("static domain pattern")
    })
}

fn jp_query_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)([a-z0-9][a-z0-9\-]*\.(?:co\.jp|ne\.jp|or\.jp|jp))")
            .expect("static jp pattern")
    })
}

fn other_query_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)([a-z0-9][a-z0-9\-]*\.(?:com|org|net|io|ai|app|edu|gov))")
            .expect("static gTLD pattern")
    })
}

/// Domains named by `### <domain>` headings, in order of appearance.
pub fn extract_domains_from_response(response: &str) -> Vec<String> {
    response_domain_pattern()
        .captures_iter(response)
        .map(|c| c[1].to_string())
        .collect()
}

pub fn is_domain_analysis(response: &str) -> bool {
    response.contains("技術分析結果")
        || response.contains("Technical Analysis Results")
        || response.contains("総合スコア")
}

/// Domains a user mentioned in a free-text query.
///
/// `.jp` family matches come first, then common generic TLDs. Results are
/// lowercased, validated, and deduplicated keeping first occurrence.
pub fn extract_domains_from_query(query: &str) -> Vec<String> {
    let candidates = jp_query_pattern()
        .captures_iter(query)
        .chain(other_query_pattern().captures_iter(query))
        .map(|c| c[1].to_string());

    let mut seen = Vec::new();
    for candidate in candidates {
        let Some(domain) = clean_domain(&candidate) else {
            continue;
        };
        if !seen.contains(&domain) {
            seen.push(domain);
        }
    }
    seen
}

fn clean_domain(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();

    if cleaned.len() < 5
        || !cleaned.contains('.')
        || cleaned.starts_with(['.', '-'])
        || cleaned.ends_with(['.', '-'])
    {
        return None;
    }

    let parts: Vec<&str> = cleaned.split('.').collect();
    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    let tld = parts[parts.len() - 1];
    if tld.len() < 2 {
        return None;
    }
    Some(cleaned)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    Registered,
    Unknown,
}

impl Availability {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Available => "Available for Registration",
            Self::Registered => "Currently Registered",
            Self::Unknown => "Availability Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScoreBand {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Self::Excellent,
            60..=79 => Self::Good,
            40..=59 => Self::Fair,
            _ => Self::Poor,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Poor => "Poor",
        }
    }
}

/// Per-domain summary pulled out of a markdown analysis section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCard {
    pub domain: String,
    pub availability: Availability,
    pub overall_score: Option<u8>,
    pub security_score: Option<u8>,
    pub performance_score: Option<u8>,
    pub recommendations: Vec<String>,
    pub risks: Vec<String>,
}

impl DomainCard {
    /// Status shown on the card badge.
    pub fn status(&self) -> &'static str {
        match (self.availability, self.overall_score) {
            (Availability::Available, _) => "Available",
            (_, Some(score)) => ScoreBand::from_score(score).label(),
            _ => "Unknown",
        }
    }
}

fn score_after(line: &str, labels: &[&str]) -> Option<u8> {
    let lower = line.to_lowercase();
    let start = labels
        .iter()
        .find_map(|label| lower.find(&label.to_lowercase()).map(|i| i + label.len()))?;
    let digits: String = lower[start..]
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u16>().ok().map(|v| v.min(100) as u8)
}

const OVERALL_LABELS: &[&str] = &["総合スコア", "overall score"];
const SECURITY_LABELS: &[&str] = &["セキュリティスコア", "security score"];
const PERFORMANCE_LABELS: &[&str] = &["パフォーマンススコア", "performance score"];

/// Split an analysis answer into cards, one per `### <domain>` section.
pub fn parse_domain_cards(response: &str) -> Vec<DomainCard> {
    let headings: Vec<(usize, usize, String)> = response_domain_pattern()
        .captures_iter(response)
        .filter_map(|c| {
            let whole = c.get(0)?;
            Some((whole.start(), whole.end(), c[1].to_string()))
        })
        .collect();

    headings
        .iter()
        .enumerate()
        .map(|(i, (_, body_start, domain))| {
            let body_end = headings
                .get(i + 1)
                .map(|(next_start, _, _)| *next_start)
                .unwrap_or(response.len());
            parse_section(domain, &response[*body_start..body_end])
        })
        .collect()
}

#[derive(Clone, Copy)]
enum ListKind {
    Recommendations,
    Risks,
}

fn parse_section(domain: &str, body: &str) -> DomainCard {
    let lower = body.to_lowercase();
    let availability = if lower.contains("登録可能") || lower.contains("available for registration")
    {
        Availability::Available
    } else if lower.contains("登録済み") || lower.contains("currently registered") {
        Availability::Registered
    } else {
        Availability::Unknown
    };

    let mut card = DomainCard {
        domain: domain.to_string(),
        availability,
        overall_score: None,
        security_score: None,
        performance_score: None,
        recommendations: Vec::new(),
        risks: Vec::new(),
    };

    let mut list: Option<ListKind> = None;
    for line in body.lines() {
        let trimmed = line.trim();
        let lowered = trimmed.to_lowercase();

        card.overall_score = card.overall_score.or_else(|| score_after(trimmed, OVERALL_LABELS));
        card.security_score = card
            .security_score
            .or_else(|| score_after(trimmed, SECURITY_LABELS));
        card.performance_score = card
            .performance_score
            .or_else(|| score_after(trimmed, PERFORMANCE_LABELS));

        if trimmed.starts_with('#') || trimmed.starts_with("**") {
            list = if lowered.contains("推奨") || lowered.contains("recommend") {
                Some(ListKind::Recommendations)
            } else if lowered.contains("リスク") || lowered.contains("risk") {
                Some(ListKind::Risks)
            } else {
                None
            };
            continue;
        }

        let item = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "))
            .or_else(|| trimmed.strip_prefix("• "));
        if let (Some(kind), Some(item)) = (list, item) {
            let item = item.trim().to_string();
            match kind {
                ListKind::Recommendations => card.recommendations.push(item),
                ListKind::Risks => card.risks.push(item),
            }
        }
    }

    card
}
