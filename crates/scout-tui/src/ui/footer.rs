use crate::ui::app::AppMode;
use scout_core::{
    domain::extract_domains_from_query,
    effort::{model_label, EffortLevel},
    theme::{Element, Theme},
};
use ratatui::{
    prelude::{Frame, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

const PLACEHOLDER: &str =
    "分析対象のドメイン名を入力してください（例：example.com）または質問を入力してください...";

pub struct FooterView<'a> {
    pub theme: &'a Theme,
    pub mode: AppMode,
    pub input: &'a str,
    pub is_loading: bool,
    pub effort: EffortLevel,
    pub model: &'a str,
    pub has_history: bool,
    pub error: Option<&'a str>,
}

pub fn render_footer(frame: &mut Frame, area: Rect, view: FooterView) {
    let theme = view.theme;
    let mut footer_block = Block::default()
        .borders(Borders::ALL)
        .border_style(if view.mode == AppMode::Input {
            theme.ratatui_style(Element::Accent)
        } else {
            theme.ratatui_style(Element::Border)
        })
        .style(theme.ratatui_style(Element::Text));
    if let Some(error) = view.error {
        footer_block = footer_block
            .title(format!(" Error: {} ", error))
            .title_style(theme.ratatui_style(Element::Error));
    }

    let inner_area = footer_block.inner(area);
    frame.render_widget(footer_block, area);

    let lines = vec![input_line(&view, inner_area.width), controls_line(&view)];
    frame.render_widget(
        Paragraph::new(lines).style(theme.ratatui_style(Element::Text)),
        inner_area,
    );
}

fn input_line<'a>(view: &FooterView<'a>, width: u16) -> Line<'a> {
    let theme = view.theme;
    let mut spans = vec![Span::styled("🌐 ", theme.ratatui_style(Element::Accent))];

    if view.input.is_empty() {
        spans.push(Span::styled(PLACEHOLDER, theme.ratatui_style(Element::Inactive)));
    } else {
        spans.push(Span::styled(view.input, theme.text_style()));
        if view.mode == AppMode::Input {
            spans.push(Span::styled("_", theme.highlight_style()));
        }
        let targets = extract_domains_from_query(view.input);
        if !targets.is_empty() && width > 50 {
            spans.push(Span::styled(
                format!("  → {}", targets.join(", ")),
                theme.ratatui_style(Element::Success),
            ));
        }
    }
    Line::from(spans)
}

fn controls_line<'a>(view: &FooterView<'a>) -> Line<'a> {
    let theme = view.theme;
    let key = |k: &'a str| Span::styled(k, theme.ratatui_style(Element::Accent));
    let label = |l: String| Span::styled(l, theme.ratatui_style(Element::Inactive));

    let mut spans = vec![
        label("深度: ".into()),
        Span::styled(view.effort.label(), theme.text_style()),
        key(" [^E]"),
        label(" | モデル: ".into()),
        Span::styled(model_label(view.model).to_string(), theme.text_style()),
        key(" [^L]"),
        label(" | ".into()),
    ];
    if view.is_loading {
        spans.push(key("[Esc]"));
        spans.push(label(" 停止".into()));
    } else {
        spans.push(key("[Enter]"));
        spans.push(label(" 分析する".into()));
    }
    if view.has_history {
        spans.push(label(" | ".into()));
        spans.push(key("[^N]"));
        spans.push(label(" 新規分析".into()));
    }
    spans.extend([
        label(" | ".into()),
        key("[Tab]"),
        label(" 履歴 | ".into()),
        key("[^S]"),
        label(" 設定 | ".into()),
        key("[^C]"),
        label(" 終了".into()),
    ]);
    Line::from(spans)
}
