use scout_core::theme::{Element, Theme};
use ratatui::{
    prelude::{Alignment, Frame, Rect},
    text::{Line, Span},
    widgets::{block::Title, Block, Borders, Paragraph},
};

pub fn render_header(
    frame: &mut Frame,
    area: Rect,
    theme: &Theme,
    viewing_history: bool,
    is_loading: bool,
) {
    let title = Title::from(" DomainScout ").alignment(Alignment::Left);

    let mut spans = vec![Span::styled(
        "AIドメイン分析エージェント",
        theme.ratatui_style(Element::Text),
    )];
    if viewing_history {
        spans.push(Span::styled(" (履歴表示)", theme.ratatui_style(Element::Warning)));
    }
    if is_loading {
        spans.push(Span::styled(" | Analyzing...", theme.ratatui_style(Element::Accent)));
    }

    let header_paragraph = Paragraph::new(Line::from(spans))
        .style(theme.ratatui_style(Element::Text))
        .alignment(Alignment::Left)
        .block(
            Block::new()
                .borders(Borders::ALL)
                .title(title)
                .border_style(theme.ratatui_style(Element::Border))
                .title_style(theme.ratatui_style(Element::Title)),
        );

    frame.render_widget(header_paragraph, area);
}
