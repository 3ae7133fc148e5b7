use crate::ui::app::AppMode;
use chrono::{DateTime, Local};
use scout_core::{
    effort::{model_label, EffortLevel},
    history::{HistoryStatistics, SearchSessionSummary},
    theme::{Element, Theme},
};
use ratatui::{
    prelude::{Constraint, Direction, Frame, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub struct SidebarView<'a> {
    pub theme: &'a Theme,
    pub items: &'a [SearchSessionSummary],
    pub selected: usize,
    pub mode: AppMode,
    pub filter: &'a str,
    pub statistics: Option<HistoryStatistics>,
    pub loading: bool,
    pub error: Option<&'a str>,
}

pub fn render_sidebar(frame: &mut Frame, area: Rect, view: SidebarView) {
    let theme = view.theme;
    let focused = matches!(
        view.mode,
        AppMode::History | AppMode::HistorySearch | AppMode::ConfirmClear
    );

    let block = Block::new()
        .borders(Borders::ALL)
        .title(" 検索履歴 ")
        .title_style(theme.ratatui_style(Element::Title))
        .border_style(if focused {
            theme.ratatui_style(Element::Accent)
        } else {
            theme.ratatui_style(Element::Border)
        })
        .style(theme.ratatui_style(Element::Text));
    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Search
            Constraint::Min(0),    // List
            Constraint::Length(2), // Statistics / status
            Constraint::Length(1), // Key hints
        ])
        .split(inner_area);

    let search_line = match view.mode {
        AppMode::HistorySearch => Line::from(vec![
            Span::styled("/ ", theme.ratatui_style(Element::Accent)),
            Span::styled(format!("{}_", view.filter), theme.text_style()),
        ]),
        _ if !view.filter.is_empty() => Line::from(vec![
            Span::styled("/ ", theme.ratatui_style(Element::Inactive)),
            Span::styled(view.filter.to_string(), theme.text_style()),
        ]),
        _ => Line::from(Span::styled(
            "/ 検索...",
            theme.ratatui_style(Element::Inactive),
        )),
    };
    frame.render_widget(Paragraph::new(search_line), chunks[0]);

    let width = chunks[1].width.saturating_sub(2) as usize;
    if view.items.is_empty() {
        let empty = if view.filter.is_empty() {
            "まだ検索履歴がありません"
        } else {
            "該当する履歴がありません"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(empty, theme.ratatui_style(Element::Inactive)))
                .wrap(Wrap { trim: true }),
            chunks[1],
        );
    } else {
        let items: Vec<ListItem> = view
            .items
            .iter()
            .map(|item| history_item(theme, item, width))
            .collect();
        let list = List::new(items).highlight_style(if focused {
            theme.highlight_style()
        } else {
            theme.text_style()
        });
        let mut state = ListState::default().with_selected(Some(view.selected));
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    let status = if let Some(error) = view.error {
        Line::from(Span::styled(
            truncate(error, chunks[2].width as usize),
            theme.ratatui_style(Element::Error),
        ))
    } else if view.loading {
        Line::from(Span::styled(
            "履歴を読み込み中...",
            theme.ratatui_style(Element::Inactive),
        ))
    } else if view.mode == AppMode::ConfirmClear {
        Line::from(Span::styled(
            "すべての履歴を削除しますか？ (y/n)",
            theme.ratatui_style(Element::Warning),
        ))
    } else {
        statistics_line(theme, view.statistics)
    };
    frame.render_widget(Paragraph::new(status).wrap(Wrap { trim: true }), chunks[2]);

    if focused {
        let hints = Line::from(Span::styled(
            "Enter 表示 | r 再実行 | d 削除 | c 全削除",
            theme.ratatui_style(Element::Inactive),
        ));
        frame.render_widget(Paragraph::new(hints), chunks[3]);
    }
}

fn history_item<'a>(theme: &Theme, item: &SearchSessionSummary, width: usize) -> ListItem<'a> {
    let mut meta = vec![
        Span::styled(
            format_timestamp(&item.timestamp),
            theme.ratatui_style(Element::Inactive),
        ),
        Span::styled(
            format!(
                " · {} · {}",
                EffortLevel::parse_or_default(&item.effort_level).label(),
                model_label(&item.model_used)
            ),
            theme.ratatui_style(Element::Inactive),
        ),
    ];
    if item.domain_analysis {
        meta.push(Span::styled(
            format!(" · {} domains", item.domains.len()),
            theme.ratatui_style(Element::Success),
        ));
    }

    ListItem::new(vec![
        Line::from(Span::styled(
            truncate(&item.query, width),
            theme.text_style(),
        )),
        Line::from(meta),
    ])
}

fn statistics_line<'a>(theme: &Theme, statistics: Option<HistoryStatistics>) -> Line<'a> {
    match statistics {
        Some(stats) => Line::from(Span::styled(
            format!(
                "合計 {} | ドメイン分析 {} | 7日間 {}",
                stats.total_searches, stats.domain_analyses, stats.recent_searches
            ),
            theme.ratatui_style(Element::Inactive),
        )),
        None => Line::from(""),
    }
}

fn format_timestamp(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|at| at.with_timezone(&Local).format("%m/%d %H:%M").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

/// Cut `text` to `width` terminal columns, marking the cut with an ellipsis.
fn truncate(text: &str, width: usize) -> String {
    let text = text.lines().next().unwrap_or_default();
    if text.width() <= width {
        return text.to_string();
    }
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            out.push('…');
            return out;
        }
        used += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_wide_chars() {
        assert_eq!(truncate("google.com", 20), "google.com");
        assert_eq!(truncate("abcdefgh", 5), "abcd…");
        // Each kana takes two columns
        assert_eq!(truncate("ドメイン分析", 7), "ドメイ…");
        assert_eq!(truncate("abcde", 5), "abcde");
    }

    #[test]
    fn test_truncate_keeps_first_line() {
        assert_eq!(truncate("first\nsecond", 20), "first");
    }

    #[test]
    fn test_invalid_timestamp_is_shown_raw() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert!(!format_timestamp("2025-05-01T10:00:00.000Z").is_empty());
    }
}
