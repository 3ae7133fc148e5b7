use scout_core::{
    domain::{is_domain_analysis, parse_domain_cards, DomainCard},
    message::{Message, MessageKind},
    theme::{Element, Theme},
    timeline::ProcessedEvent,
};
use ratatui::{
    prelude::{Frame, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::collections::HashMap;
use unicode_width::UnicodeWidthStr;

pub struct ChatView<'a> {
    pub theme: &'a Theme,
    pub messages: &'a [Message],
    pub is_loading: bool,
    pub live_events: &'a [ProcessedEvent],
    pub historical_activities: &'a HashMap<String, Vec<ProcessedEvent>>,
    pub suggestions: &'a [String],
    /// Lines scrolled up from the bottom
    pub scroll: u16,
}

pub fn render_chat(frame: &mut Frame, area: Rect, view: ChatView) {
    let chat_block = Block::new()
        .borders(Borders::ALL)
        .border_style(view.theme.ratatui_style(Element::Border))
        .style(view.theme.ratatui_style(Element::Text));
    let inner_area = chat_block.inner(area);
    frame.render_widget(chat_block, area);

    let lines = build_chat_lines(&view, inner_area.width.saturating_sub(2) as usize);

    // Stick to the bottom unless the user scrolled up
    let total = lines.len().min(u16::MAX as usize) as u16;
    let max_top = total.saturating_sub(inner_area.height);
    let top = max_top.saturating_sub(view.scroll);

    frame.render_widget(Paragraph::new(lines).scroll((top, 0)), inner_area);
}

pub(crate) fn build_chat_lines(view: &ChatView, width: usize) -> Vec<Line<'static>> {
    let theme = view.theme;
    let width = width.max(10);
    let mut lines = Vec::new();

    for (index, message) in view.messages.iter().enumerate() {
        match message.kind {
            MessageKind::Human => {
                lines.push(Line::from(Span::styled(
                    "You",
                    theme.ratatui_style(Element::Accent),
                )));
                push_wrapped(
                    &mut lines,
                    &message.content,
                    width,
                    theme.ratatui_style(Element::UserMessage),
                );
            }
            MessageKind::Ai => {
                lines.push(Line::from(Span::styled(
                    "DomainScout",
                    theme.ratatui_style(Element::Title),
                )));
                let is_last = index + 1 == view.messages.len();
                let activity = message
                    .id
                    .as_ref()
                    .and_then(|id| view.historical_activities.get(id));
                match activity {
                    Some(events) if !events.is_empty() => {
                        push_timeline(&mut lines, theme, "Research", events)
                    }
                    _ if is_last && view.is_loading && !view.live_events.is_empty() => {
                        push_timeline(&mut lines, theme, "Research", view.live_events)
                    }
                    _ => {}
                }
                push_wrapped(
                    &mut lines,
                    &message.content,
                    width,
                    theme.ratatui_style(Element::AgentMessage),
                );
                if is_domain_analysis(&message.content) {
                    for card in parse_domain_cards(&message.content) {
                        push_card(&mut lines, theme, &card, width);
                    }
                }
            }
            MessageKind::Tool | MessageKind::System | MessageKind::Other => continue,
        }
        lines.push(Line::from(""));
    }

    let last_is_human = view.messages.last().is_some_and(Message::is_human);
    if view.is_loading && (last_is_human || view.messages.is_empty()) {
        lines.push(Line::from(Span::styled(
            "Analyzing...",
            theme.ratatui_style(Element::Accent),
        )));
        if view.live_events.is_empty() {
            lines.push(Line::from(Span::styled(
                "  • Waiting for the agent...",
                theme.ratatui_style(Element::Timeline),
            )));
        } else {
            push_events(&mut lines, theme, view.live_events);
        }
        lines.push(Line::from(""));
    }

    if !view.suggestions.is_empty() {
        lines.push(Line::from(Span::styled(
            "続けて深ぼる",
            theme.ratatui_style(Element::Title),
        )));
        for (i, suggestion) in view.suggestions.iter().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  [Alt+{}] ", i + 1),
                    theme.ratatui_style(Element::Accent),
                ),
                Span::styled(suggestion.clone(), theme.text_style()),
            ]));
        }
    }

    lines
}

fn push_wrapped(lines: &mut Vec<Line<'static>>, text: &str, width: usize, style: Style) {
    for raw in text.lines() {
        if raw.trim().is_empty() {
            lines.push(Line::from(""));
            continue;
        }
        for wrapped in textwrap::wrap(raw, width) {
            lines.push(Line::from(Span::styled(wrapped.into_owned(), style)));
        }
    }
}

fn push_timeline(
    lines: &mut Vec<Line<'static>>,
    theme: &Theme,
    heading: &str,
    events: &[ProcessedEvent],
) {
    lines.push(Line::from(Span::styled(
        format!("  ▸ {} ({} steps)", heading, events.len()),
        theme.ratatui_style(Element::Timeline),
    )));
    push_events(lines, theme, events);
}

fn push_events(lines: &mut Vec<Line<'static>>, theme: &Theme, events: &[ProcessedEvent]) {
    for event in events {
        lines.push(Line::from(vec![
            Span::styled(
                format!("    • {}", event.title),
                theme.ratatui_style(Element::Accent),
            ),
            Span::styled(
                format!(": {}", event.data),
                theme.ratatui_style(Element::Timeline),
            ),
        ]));
    }
}

fn push_card(lines: &mut Vec<Line<'static>>, theme: &Theme, card: &DomainCard, width: usize) {
    let border = theme.ratatui_style(Element::Border);
    let rule_width = width.saturating_sub(4).min(48);
    let badge = format!("[{}]", card.status());

    lines.push(Line::from(vec![
        Span::styled("  ┌ ", border),
        Span::styled(card.domain.clone(), theme.ratatui_style(Element::Title)),
        Span::raw(" ".repeat(
            rule_width
                .saturating_sub(card.domain.width() + badge.width())
                .max(1),
        )),
        Span::styled(badge, theme.score_style(card.overall_score)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("  │ ", border),
        Span::styled(
            card.availability.label(),
            theme.ratatui_style(Element::Inactive),
        ),
    ]));

    let mut scores = vec![Span::styled("  │ ", border)];
    for (label, score) in [
        ("Overall", card.overall_score),
        ("Security", card.security_score),
        ("Performance", card.performance_score),
    ] {
        scores.push(Span::styled(
            format!("{} ", label),
            theme.ratatui_style(Element::Inactive),
        ));
        let value = score.map_or_else(|| "--".to_string(), |s| format!("{}/100", s));
        scores.push(Span::styled(value, theme.score_style(score)));
        scores.push(Span::raw("  "));
    }
    lines.push(Line::from(scores));

    for (heading, items, style) in [
        (
            "Recommendations",
            &card.recommendations,
            theme.ratatui_style(Element::Success),
        ),
        (
            "Risks & Concerns",
            &card.risks,
            theme.ratatui_style(Element::Warning),
        ),
    ] {
        if items.is_empty() {
            continue;
        }
        lines.push(Line::from(vec![
            Span::styled("  │ ", border),
            Span::styled(heading, style),
        ]));
        for item in items.iter() {
            lines.push(Line::from(vec![
                Span::styled("  │   • ", border),
                Span::styled(item.clone(), theme.text_style()),
            ]));
        }
    }
    lines.push(Line::from(Span::styled(format!("  └{}", "─".repeat(rule_width)), border)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn view<'a>(
        theme: &'a Theme,
        messages: &'a [Message],
        live: &'a [ProcessedEvent],
        history: &'a HashMap<String, Vec<ProcessedEvent>>,
        suggestions: &'a [String],
        is_loading: bool,
    ) -> ChatView<'a> {
        ChatView {
            theme,
            messages,
            is_loading,
            live_events: live,
            historical_activities: history,
            suggestions,
            scroll: 0,
        }
    }

    #[test]
    fn test_loading_shows_live_timeline() {
        let theme = Theme::default();
        let messages = vec![Message::human("example.com", "1")];
        let live = vec![ProcessedEvent {
            title: "Domain Extraction".into(),
            data: "example.com".into(),
        }];
        let history = HashMap::new();
        let lines = text(&build_chat_lines(
            &view(&theme, &messages, &live, &history, &[], true),
            60,
        ));

        assert_eq!(lines[0], "You");
        assert!(lines.iter().any(|l| l == "Analyzing..."));
        assert!(lines
            .iter()
            .any(|l| l.contains("Domain Extraction: example.com")));
    }

    #[test]
    fn test_answer_renders_activity_and_cards() {
        let theme = Theme::default();
        let answer = "## 技術分析結果\n### example.com\n総合スコア: 85/100\nセキュリティスコア: 55\n**推奨事項**\n- HSTS を有効化";
        let messages = vec![Message::human("q", "1"), Message::ai(answer, "ai-1")];
        let mut history = HashMap::new();
        history.insert(
            "ai-1".to_string(),
            vec![ProcessedEvent {
                title: "Finalizing Domain Analysis".into(),
                data: "Composing answer".into(),
            }],
        );
        let suggestions = vec!["How do I improve security?".to_string()];
        let lines = text(&build_chat_lines(
            &view(&theme, &messages, &[], &history, &suggestions, false),
            80,
        ));

        assert!(lines.iter().any(|l| l.contains("Research (1 steps)")));
        assert!(lines.iter().any(|l| l.contains("example.com") && l.contains("[Excellent]")));
        assert!(lines.iter().any(|l| l.contains("Overall 85/100")));
        assert!(lines.iter().any(|l| l.contains("Security 55/100")));
        assert!(lines.iter().any(|l| l.contains("Performance --")));
        assert!(lines.iter().any(|l| l.contains("• HSTS を有効化")));
        assert!(lines.iter().any(|l| l == "続けて深ぼる"));
        assert!(lines
            .iter()
            .any(|l| l.contains("[Alt+1] How do I improve security?")));
        assert!(!lines.iter().any(|l| l == "Analyzing..."));
    }

    #[test]
    fn test_long_lines_wrap() {
        let theme = Theme::default();
        let messages = vec![Message::ai("word ".repeat(40), "a")];
        let history = HashMap::new();
        let lines = build_chat_lines(&view(&theme, &messages, &[], &history, &[], false), 20);
        assert!(lines.len() > 5);
        assert!(lines.iter().all(|l| l.width() <= 20));
    }

    #[test]
    fn test_tool_messages_are_hidden() {
        let theme = Theme::default();
        let tool: Message =
            serde_json::from_value(serde_json::json!({"type": "tool", "content": "raw"}))
                .unwrap();
        let messages = vec![tool];
        let history = HashMap::new();
        let lines = text(&build_chat_lines(
            &view(&theme, &messages, &[], &history, &[], false),
            40,
        ));
        assert!(lines.is_empty());
    }
}
