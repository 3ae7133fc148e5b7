//! Rule-based follow-up questions derived from an agent answer.
//!
//! Matching is plain substring containment on the lowercased answer; every
//! rule appends canned questions. Results are deduplicated in order and
//! capped at [`MAX_SUGGESTIONS`].

use itertools::Itertools;

pub const MAX_SUGGESTIONS: usize = 4;
const MIN_SUGGESTIONS: usize = 3;

const GENERIC_QUESTIONS: &[&str] = &[
    "Can you provide more details?",
    "What are the next steps?",
    "Are there any alternatives?",
    "What would you recommend?",
    "Can you explain this in simpler terms?",
];

const GENERIC_QUESTIONS_JA: &[&str] = &[
    "もっと詳しく教えてください",
    "次のステップは何ですか？",
    "他に選択肢はありますか？",
    "どのような対策を推奨しますか？",
    "もう少し簡単に説明してください",
];

struct Rule {
    keywords: &'static [&'static str],
    questions: &'static [&'static str],
}

const DOMAIN_RULES: &[Rule] = &[
    Rule {
        keywords: &["available", "登録可能"],
        questions: &[
            "How do I register this domain?",
            "What are the best domain registrars?",
            "How much does domain registration cost?",
        ],
    },
    Rule {
        keywords: &["ssl", "証明書"],
        questions: &[
            "How do I set up SSL certificate?",
            "What are the best SSL providers?",
        ],
    },
    Rule {
        keywords: &["dns", "ネームサーバー"],
        questions: &[
            "How do I configure DNS settings?",
            "What is the best DNS provider?",
        ],
    },
    Rule {
        keywords: &["security", "セキュリティ"],
        questions: &[
            "How can I improve domain security?",
            "What are common domain security threats?",
        ],
    },
    Rule {
        keywords: &["score", "スコア"],
        questions: &[
            "How can I improve the domain score?",
            "What factors affect domain scoring?",
        ],
    },
];

const GENERAL_DOMAIN_QUESTIONS: &[&str] = &[
    "Can you suggest alternative domain names?",
    "What should I consider when choosing a domain?",
];

const TOPIC_RULES: &[Rule] = &[
    Rule {
        keywords: &["technical", "技術"],
        questions: &[
            "Can you explain the technical details?",
            "What are the performance implications?",
        ],
    },
    Rule {
        keywords: &["risk", "リスク"],
        questions: &[
            "How can I mitigate these risks?",
            "What are the worst-case scenarios?",
        ],
    },
    Rule {
        keywords: &["recommend", "推奨"],
        questions: &[
            "Can you prioritize these recommendations?",
            "What's the implementation timeline?",
        ],
    },
    Rule {
        keywords: &["cost", "費用", "価格"],
        questions: &[
            "What are the total costs involved?",
            "Are there any free alternatives?",
        ],
    },
    Rule {
        keywords: &["performance", "パフォーマンス"],
        questions: &[
            "How can I optimize performance?",
            "What are the performance benchmarks?",
        ],
    },
];

/// Deep-investigation prompts, offered unless the answer already covers them.
const JA_INVESTIGATIONS: &[(&[&str], &str)] = &[
    (
        &["whois詳細", "登録者情報"],
        "このドメインのWHOIS詳細情報を調査してください",
    ),
    (
        &["評判", "ブラックリスト"],
        "このドメインの評判とブラックリスト状況を詳しく調べてください",
    ),
    (
        &["ssl labs", "ssl評価"],
        "SSL証明書の詳細とSSL Labs評価を確認してください",
    ),
    (
        &["トラフィック", "アクセス数"],
        "このドメインのトラフィック統計とSEO情報を調査してください",
    ),
];

const JA_DOMAIN_RULES: &[Rule] = &[
    Rule {
        keywords: &["available", "登録可能"],
        questions: &[
            "このドメインの登録方法と費用を教えてください",
            "類似ドメインの可用性も調べてください",
        ],
    },
    Rule {
        keywords: &["登録済み", "使用中"],
        questions: &[
            "このドメインの所有者履歴と有効期限を調べてください",
            "ドメインの取得可能性と推定価格を調査してください",
        ],
    },
    Rule {
        keywords: &["ssl", "証明書"],
        questions: &[
            "SSL実装の品質評価とセキュリティスコアを詳しく調べてください",
            "過去のセキュリティインシデントを調査してください",
        ],
    },
    Rule {
        keywords: &["security", "セキュリティ"],
        questions: &[
            "マルウェアとフィッシングの検出履歴を詳しく調べてください",
            "セキュリティベンダーのブラックリストを全て確認してください",
        ],
    },
    Rule {
        keywords: &["performance", "パフォーマンス"],
        questions: &[
            "詳細なスピードテストとサーバー応答時間を測定してください",
            "稼働率履歴とダウンタイム情報を調査してください",
        ],
    },
];

fn contains_any(content: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| content.contains(k))
}

fn apply_rules(content: &str, rules: &[Rule], out: &mut Vec<String>) {
    for rule in rules {
        if contains_any(content, rule.keywords) {
            out.extend(rule.questions.iter().map(|q| q.to_string()));
        }
    }
}

fn top_up_and_cap(mut suggestions: Vec<String>, generic: &[&str]) -> Vec<String> {
    if suggestions.len() < MIN_SUGGESTIONS {
        let slots = (MIN_SUGGESTIONS - suggestions.len()).min(generic.len());
        for question in &generic[..slots] {
            if !suggestions.iter().any(|s| s == question) {
                suggestions.push(question.to_string());
            }
        }
    }
    suggestions
        .into_iter()
        .unique()
        .take(MAX_SUGGESTIONS)
        .collect()
}

fn is_domain_related(content: &str) -> bool {
    content.contains("domain") || content.contains("ドメイン")
}

pub fn generate_follow_up_questions(message_content: &str) -> Vec<String> {
    if message_content.trim().is_empty() {
        return Vec::new();
    }

    let content = message_content.to_lowercase();
    let mut suggestions = Vec::new();

    if is_domain_related(&content) {
        apply_rules(&content, DOMAIN_RULES, &mut suggestions);
        suggestions.extend(GENERAL_DOMAIN_QUESTIONS.iter().map(|q| q.to_string()));
    }
    apply_rules(&content, TOPIC_RULES, &mut suggestions);

    top_up_and_cap(suggestions, GENERIC_QUESTIONS)
}

pub fn generate_japanese_follow_up_questions(message_content: &str) -> Vec<String> {
    if message_content.trim().is_empty() {
        return Vec::new();
    }

    let content = message_content.to_lowercase();
    let mut suggestions = Vec::new();

    if is_domain_related(&content) {
        for (covered, question) in JA_INVESTIGATIONS {
            if !contains_any(&content, covered) {
                suggestions.push(question.to_string());
            }
        }
        apply_rules(&content, JA_DOMAIN_RULES, &mut suggestions);
    }

    top_up_and_cap(suggestions, GENERIC_QUESTIONS_JA)
}

/// Two English and two Japanese questions, interleaved.
pub fn generate_mixed_follow_up_questions(message_content: &str) -> Vec<String> {
    let english = generate_follow_up_questions(message_content);
    let japanese = generate_japanese_follow_up_questions(message_content);

    let mut mixed = Vec::new();
    for i in 0..2 {
        if let Some(q) = english.get(i) {
            mixed.push(q.clone());
        }
        if let Some(q) = japanese.get(i) {
            mixed.push(q.clone());
        }
    }
    mixed.truncate(MAX_SUGGESTIONS);
    mixed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(generate_follow_up_questions("").is_empty());
        assert!(generate_follow_up_questions("   \n").is_empty());
        assert!(generate_japanese_follow_up_questions("").is_empty());
        assert!(generate_mixed_follow_up_questions(" ").is_empty());
    }

    #[test]
    fn test_available_domain_suggests_registration() {
        let suggestions = generate_follow_up_questions("このドメインは available です");
        assert_eq!(
            suggestions,
            vec![
                "How do I register this domain?",
                "What are the best domain registrars?",
                "How much does domain registration cost?",
                "Can you suggest alternative domain names?",
            ]
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let suggestions = generate_follow_up_questions("DOMAIN has a valid SSL certificate");
        assert_eq!(suggestions[0], "How do I set up SSL certificate?");
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn test_generic_top_up() {
        let suggestions = generate_follow_up_questions("Hello there");
        assert_eq!(
            suggestions,
            vec![
                "Can you provide more details?",
                "What are the next steps?",
                "Are there any alternatives?",
            ]
        );

        let one_topic = generate_follow_up_questions("low risk");
        assert_eq!(
            one_topic,
            vec![
                "How can I mitigate these risks?",
                "What are the worst-case scenarios?",
                "Can you provide more details?",
            ]
        );
    }

    #[test]
    fn test_no_duplicates() {
        let suggestions =
            generate_follow_up_questions("technical performance cost risk recommend domain");
        let unique: std::collections::HashSet<_> = suggestions.iter().collect();
        assert_eq!(unique.len(), suggestions.len());
        assert!(suggestions.len() <= MAX_SUGGESTIONS);
    }

    #[test]
    fn test_japanese_skips_covered_investigations() {
        let suggestions = generate_japanese_follow_up_questions(
            "ドメイン whois詳細 と 評判 と ssl labs と トラフィック を確認済み。登録済みです",
        );
        assert_eq!(
            suggestions,
            vec![
                "このドメインの所有者履歴と有効期限を調べてください",
                "ドメインの取得可能性と推定価格を調査してください",
                "SSL実装の品質評価とセキュリティスコアを詳しく調べてください",
                "過去のセキュリティインシデントを調査してください",
            ]
        );
    }

    #[test]
    fn test_japanese_generic_fallback() {
        let suggestions = generate_japanese_follow_up_questions("こんにちは");
        assert_eq!(suggestions.len(), 3);
        assert_eq!(suggestions[0], "もっと詳しく教えてください");
    }

    #[test]
    fn test_mixed_interleaves() {
        let mixed = generate_mixed_follow_up_questions("domain is available");
        assert_eq!(
            mixed,
            vec![
                "How do I register this domain?",
                "このドメインのWHOIS詳細情報を調査してください",
                "What are the best domain registrars?",
                "このドメインの評判とブラックリスト状況を詳しく調べてください",
            ]
        );
    }
}
