use scout_core::{
    domain::extract_domains_from_query,
    theme::{Element, Theme},
};
use ratatui::{
    prelude::{Alignment, Frame, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Starter queries, picked with Alt+1..4.
pub const EXAMPLE_QUERIES: [&str; 4] = [
    "google.com を分析して",
    "amazon.co.jp の安全性を確認",
    "github.com のパフォーマンス",
    "新しいドメイン myawesomesite.com",
];

const FEATURES: [(&str, &str); 3] = [
    ("可用性チェック", "ドメインの登録状況と取得可能性を確認"),
    ("セキュリティ分析", "SSL証明書やセキュリティヘッダーを評価"),
    ("パフォーマンス分析", "応答速度と最適化の余地を測定"),
];

pub fn render_welcome(frame: &mut Frame, area: Rect, theme: &Theme, input: &str) {
    let block = Block::new()
        .borders(Borders::ALL)
        .border_style(theme.ratatui_style(Element::Border))
        .style(theme.ratatui_style(Element::Text));
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("DomainScout", theme.ratatui_style(Element::Title))),
        Line::from(Span::styled(
            "ドメインの可用性・セキュリティ・パフォーマンスをAIが調査します",
            theme.ratatui_style(Element::Inactive),
        )),
        Line::from(""),
    ];

    for (name, description) in FEATURES {
        lines.push(Line::from(vec![
            Span::styled(format!("◆ {}", name), theme.ratatui_style(Element::Accent)),
            Span::styled(format!("  {}", description), theme.text_style()),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "例えば:",
        theme.ratatui_style(Element::Inactive),
    )));
    for (i, example) in EXAMPLE_QUERIES.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("[Alt+{}] ", i + 1), theme.ratatui_style(Element::Accent)),
            Span::styled(*example, theme.text_style()),
        ]));
    }

    let targets = extract_domains_from_query(input);
    if !targets.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("分析対象: ", theme.ratatui_style(Element::Inactive)),
            Span::styled(targets.join(", "), theme.ratatui_style(Element::Success)),
        ]));
    }

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner_area);
}
