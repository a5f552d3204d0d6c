use super::app_logic::TuiApp;
use super::app_state::AppMode;
use crate::tree::NodeKind;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

fn draw_help_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let help_text_lines_content = vec![
        Line::from(
            "Arrows/jk: Nav | Space/Enter: Sel | Tab/o: Fold | l/h: Open/Close | y: Confirm | q/Esc: Quit",
        ),
        Line::from(
            "a: Sel Vis | d: Desel Vis | c: Clear | x: Drop Missing | *: Expand All | -: Collapse All | r: Rescan | /: Filter",
        ),
    ];
    let workspace = app
        .engine
        .root()
        .map(|root| root.display().to_string())
        .unwrap_or_else(|| ".".to_string());
    let help_paragraph = Paragraph::new(help_text_lines_content).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("treepick: {}", workspace)),
    );
    f.render_widget(help_paragraph, area);
}

fn draw_filter_input_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let input_text = format!("/{}", app.filter_input);
    let filter_paragraph = Paragraph::new(input_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Filter (Esc to cancel, Enter to apply)"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(filter_paragraph, area);
    let cursor_col = app.filter_input[..app.filter_cursor_pos].chars().count() as u16;
    f.set_cursor_position((area.x + 1 + cursor_col + 1, area.y + 1));
}

fn list_title(app: &TuiApp) -> String {
    let (selected, total) = app.engine.tally("").unwrap_or((0, 0));
    let mut title = format!("Files ({}/{} selected", selected, total);
    let stale = app.engine.stale_selection().len();
    if stale > 0 {
        title.push_str(&format!(", {} missing", stale));
    }
    let pending = app.engine.pending_paths().len();
    if pending > 0 {
        title.push_str(&format!(", {} loading", pending));
    }
    title.push(')');
    if !app.filter_input.is_empty() && app.mode == AppMode::Normal {
        title.push_str(&format!(" Filter: '{}'", app.filter_input));
    }
    title
}

fn draw_main_list_block(f: &mut Frame, app: &mut TuiApp, area: Rect) {
    app.list_viewport_height = area.height.saturating_sub(2) as usize;
    app.ensure_selection_is_visible_in_viewport();

    let window_end = (app.scroll_offset + app.list_viewport_height).min(app.rows.len());
    let list_items: Vec<ListItem> = app
        .rows
        .get(app.scroll_offset..window_end)
        .unwrap_or(&[])
        .iter()
        .map(|row| {
            let expansion_prefix = match row.kind {
                NodeKind::Directory if row.path.is_empty() => "    ",
                NodeKind::Directory if row.is_expanded => "[-] ",
                NodeKind::Directory => "[+] ",
                NodeKind::File => "    ",
            };
            ListItem::new(format!(
                "{}{}{}",
                expansion_prefix,
                row.status.marker(),
                row.label
            ))
        })
        .collect();

    let list_widget = List::new(list_items)
        .block(Block::default().borders(Borders::ALL).title(list_title(app)))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("❯ ");

    let mut list_state_for_view = ratatui::widgets::ListState::default();
    if app.current_selection_idx >= app.scroll_offset && app.current_selection_idx < window_end {
        list_state_for_view.select(Some(app.current_selection_idx - app.scroll_offset));
    }
    f.render_stateful_widget(list_widget, area, &mut list_state_for_view);
}

pub(super) fn ui_frame(frame: &mut Frame, app: &mut TuiApp) {
    let help_lines = 2;
    let filter_input_height = if app.mode == AppMode::Filtering { 3 } else { 0 };
    let top_block_container_height = (help_lines + 2) + filter_input_height;

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(top_block_container_height),
            Constraint::Min(0),
        ])
        .split(frame.area());

    let top_container_area = main_chunks[0];
    let list_area = main_chunks[1];

    let top_content_constraints = if app.mode == AppMode::Filtering {
        vec![
            Constraint::Length(help_lines + 2),
            Constraint::Length(filter_input_height),
        ]
    } else {
        vec![Constraint::Length(help_lines + 2)]
    };
    let top_content_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(top_content_constraints)
        .split(top_container_area);

    draw_help_block(frame, app, top_content_chunks[0]);
    if app.mode == AppMode::Filtering {
        draw_filter_input_block(frame, app, top_content_chunks[1]);
    }

    draw_main_list_block(frame, app, list_area);
}
