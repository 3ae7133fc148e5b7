use crate::ui::app::{AppMode, SettingsSelection};
use scout_core::{
    effort::model_label,
    settings::Settings,
    theme::{Element, Theme, ThemeVariant},
};
use ratatui::{
    prelude::{Alignment, Constraint, Direction, Frame, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub fn render_settings_modal(
    frame: &mut Frame,
    area: Rect,
    settings: &Settings,
    theme: &Theme,
    selection: SettingsSelection,
    mode: AppMode,
    edit_buffer: &str,
) {
    let block = Block::new()
        .title(" 設定 ")
        .borders(Borders::ALL)
        .style(theme.ratatui_style(Element::Warning));

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // API URL
            Constraint::Length(1), // Effort
            Constraint::Length(1), // Model
            Constraint::Length(1), // Theme
            Constraint::Min(0),    // Spacer
            Constraint::Length(1), // Action Text
        ])
        .split(inner_area);

    let create_setting_line = |label: &str, value: &str, is_selected: bool, is_editing: bool| {
        let value_style = if is_selected {
            theme.highlight_style()
        } else {
            theme.text_style()
        };

        let display_value = if is_editing {
            format!("{}_", value)
        } else {
            value.to_owned()
        };

        Line::from(vec![
            Span::styled(
                format!("{:<12}", label),
                theme
                    .ratatui_style(Element::Warning)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(display_value, value_style),
        ])
    };

    let editing_url = matches!(mode, AppMode::EditingApiUrl);
    let api_url = if editing_url {
        edit_buffer
    } else {
        &settings.api_url
    };
    let api_url_line = create_setting_line(
        "API URL:",
        api_url,
        selection == SettingsSelection::ApiUrl,
        editing_url,
    );
    frame.render_widget(Paragraph::new(api_url_line), chunks[0]);

    let effort_value = format!("◄ {} ►", settings.effort.label());
    let effort_line = create_setting_line(
        "深度:",
        &effort_value,
        selection == SettingsSelection::Effort,
        false,
    );
    frame.render_widget(Paragraph::new(effort_line), chunks[1]);

    let model_value = format!("◄ {} ►", model_label(&settings.model));
    let model_line = create_setting_line(
        "モデル:",
        &model_value,
        selection == SettingsSelection::Model,
        false,
    );
    frame.render_widget(Paragraph::new(model_line), chunks[2]);

    let theme_value = match settings.theme {
        ThemeVariant::Dark => "◄ DARK ►",
        ThemeVariant::Light => "◄ LIGHT ►",
    };
    let theme_line = create_setting_line(
        "Theme:",
        theme_value,
        selection == SettingsSelection::Theme,
        false,
    );
    frame.render_widget(Paragraph::new(theme_line), chunks[3]);

    let action_text = match mode {
        AppMode::EditingApiUrl => "[ENTER] Apply | [ESC] Cancel",
        _ => "[↑↓] Navigate | [←→] Change | [S]ave | [ESC] Return",
    };
    let action_style = if selection == SettingsSelection::Save {
        theme.highlight_style()
    } else {
        theme.ratatui_style(Element::Inactive)
    };
    let action_paragraph = Paragraph::new(action_text)
        .alignment(Alignment::Center)
        .style(action_style);
    frame.render_widget(action_paragraph, chunks[5]);
}
