use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::line::NORMAL as LINE;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render modals
use tui_widgets::popup::Popup;

use crate::config::RgbColor;
use crate::lists::Site;
use crate::select::Selection;

use super::app::{App, Pane, SearchFocus};

const SEARCH_HELP_INPUT: &str = "Type to filter  Esc: focus lists  Enter: open";
const SITES_HELP: &str =
    "j/k: nav  Enter: open  f: favorite  Tab: favorites  /: search  i: import  d/D: clear  q: quit";
const FAVORITES_HELP: &str =
    "j/k: nav  Enter: open  J/K: move  x: unfavorite  Tab: sites  /: search  q: quit";
const CONFIRM_HELP: &str = "Enter/y: confirm  Esc/n: cancel";
const IMPORT_HELP: &str = "Type a .csv path  Enter: import  Esc: cancel";

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_body(frame, layout[1], app);
    draw_footer(frame, layout[2], app);
    draw_import_modal(frame, size, app);
    draw_confirm_modal(frame, size, app);
    draw_help_modal(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let style = header_text_style(app);
    let line = Line::from(vec![
        Span::styled(
            format!("STORE://{}", app.lists().store().path().display()),
            style,
        ),
        Span::raw("   "),
        Span::styled(
            format!(
                "{} sites | {} favorites",
                app.lists().sites().len(),
                app.lists().favorites().len()
            ),
            style,
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_body(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_sites_pane(frame, panes[0], app);
    draw_favorites_pane(frame, panes[1], app);
}

fn draw_sites_pane(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let active = matches!(app.focused_pane, Pane::Sites);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" SITES ")
        .border_style(border_style(app, active));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(inner);

    draw_search_header(frame, layout[0], app, area.width);
    draw_site_list(
        frame,
        layout[1],
        app,
        &app.sites_view,
        active,
        "No sites imported",
    );
}

fn draw_search_header(frame: &mut Frame<'_>, area: Rect, app: &App, outer_width: u16) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let typing = matches!(app.search_focus, SearchFocus::Input);
    let label = "SEARCH: ";
    let value_style = if typing {
        selection_style(app)
    } else {
        Style::default()
    };
    let line = Line::from(vec![
        Span::styled(label, header_text_style(app)),
        Span::styled(app.search_input.value().to_string(), value_style),
    ]);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    frame.render_widget(Paragraph::new(line), parts[0]);

    if typing {
        let column = label.len() + app.search_input.visual_cursor();
        let x = parts[0].x.saturating_add(column as u16);
        frame.set_cursor_position((x, parts[0].y));
    }

    // Separator with connector characters: ├───┤
    let inner_width = outer_width.saturating_sub(2) as usize;
    let separator = format!(
        "{}{}{}",
        LINE.vertical_right,
        LINE.horizontal.to_string().repeat(inner_width),
        LINE.vertical_left
    );
    let separator_area = Rect {
        x: parts[1].x.saturating_sub(1),
        y: parts[1].y,
        width: outer_width,
        height: 1,
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(separator, separator_style(app)))),
        separator_area,
    );
}

fn draw_favorites_pane(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let active = matches!(app.focused_pane, Pane::Favorites);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" FAVORITES ")
        .border_style(border_style(app, active));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.width == 0 || inner.height == 0 {
        return;
    }

    draw_site_list(frame, inner, app, &app.favorites_view, active, "No favorites");
}

fn draw_site_list(
    frame: &mut Frame<'_>,
    area: Rect,
    app: &App,
    view: &Selection,
    active: bool,
    empty_message: &str,
) {
    let items: Vec<ListItem> = if view.rows().is_empty() {
        vec![ListItem::new(Line::from(empty_message.to_string()))]
    } else {
        view.rows()
            .iter()
            .map(|site| build_site_item(site, app))
            .collect()
    };

    let mut state = ListState::default();
    if active {
        state.select(view.cursor());
    }

    let list = List::new(items)
        .highlight_style(selection_style(app))
        .highlight_symbol(" ")
        .repeat_highlight_symbol(false);

    frame.render_stateful_widget(list, area, &mut state);
}

fn build_site_item(site: &Site, app: &App) -> ListItem<'static> {
    let line = Line::from(vec![
        Span::styled(format!("{:<10}", site.stack), separator_style(app)),
        Span::raw(" "),
        Span::raw(site.name.clone()),
        Span::raw("  "),
        Span::styled(site.url.clone(), separator_style(app)),
    ]);
    ListItem::new(line)
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let message: String = if app.import_modal.is_some() {
        IMPORT_HELP.to_string()
    } else if app.confirm_modal.is_some() {
        CONFIRM_HELP.to_string()
    } else if matches!(app.search_focus, SearchFocus::Input) {
        SEARCH_HELP_INPUT.to_string()
    } else if let Some(status) = &app.status {
        status.clone()
    } else {
        match app.focused_pane {
            Pane::Sites => SITES_HELP.to_string(),
            Pane::Favorites => FAVORITES_HELP.to_string(),
        }
    };

    let colors = &app.config().ui;
    let style = Style::default()
        .fg(color(colors.status_fg))
        .bg(color(colors.status_bg));

    let background = Block::default().style(Style::default().bg(color(colors.status_bg)));
    frame.render_widget(background, area);
    frame.render_widget(Paragraph::new(message).style(style), area);
}

fn draw_import_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    if app.import_modal.is_none() {
        return;
    }

    let label = "PATH: ";
    let value = app
        .import_modal
        .as_ref()
        .map(|m| m.input.value().to_string())
        .unwrap_or_default();
    let lines = vec![
        Line::from(vec![
            Span::styled(label, header_text_style(app)),
            Span::raw(value),
        ]),
        Line::from("".to_string()),
        Line::from(IMPORT_HELP.to_string()),
    ];
    let body_text = ratatui::text::Text::from(lines);

    let title_line = Line::from(Span::styled("IMPORT CSV", header_text_style(app)));
    let popup = Popup::new(body_text)
        .title(title_line)
        .border_style(border_style(app, true));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);

    if let Some(area) = app.modal_popup.area() {
        let inner = Block::default().borders(Borders::ALL).inner(*area);
        if let Some(m) = app.import_modal.as_ref() {
            let x = inner
                .x
                .saturating_add(label.len() as u16 + m.input.visual_cursor() as u16);
            frame.set_cursor_position((x, inner.y));
        }
    }
}

fn draw_confirm_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(modal) = app.confirm_modal.as_ref() else {
        return;
    };

    let lines = vec![
        Line::from(modal.message.clone()),
        Line::from("".to_string()),
        Line::from(CONFIRM_HELP.to_string()),
    ];
    let body_text = ratatui::text::Text::from(lines);

    let title_line = Line::from(Span::styled(modal.title.clone(), header_text_style(app)));
    let popup = Popup::new(body_text)
        .title(title_line)
        .border_style(border_style(app, true));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

fn draw_help_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    if !app.help_modal {
        return;
    }

    let keys = &app.config().keys;
    let entries: Vec<(&str, String)> = vec![
        ("Quit", keys.global.quit.join(", ")),
        ("Focus search", keys.global.search.join(", ")),
        ("Help", keys.global.help.join(", ")),
        ("Next / previous", format!("{} / {}", keys.list.next.join(", "), keys.list.prev.join(", "))),
        ("Open selected", keys.list.open.join(", ")),
        ("Favorite", keys.list.favorite.join(", ")),
        ("Unfavorite", keys.list.unfavorite.join(", ")),
        ("Move favorite up / down", format!("{} / {}", keys.list.move_up.join(", "), keys.list.move_down.join(", "))),
        ("Switch pane", keys.list.switch_pane.join(", ")),
        ("Import CSV", keys.list.import.join(", ")),
        ("Clear sites", keys.list.delete.join(", ")),
        ("Clear sites and favorites", keys.list.delete_all.join(", ")),
    ];

    let width = entries
        .iter()
        .map(|(action, _)| action.len())
        .max()
        .unwrap_or(0);
    let lines: Vec<Line> = entries
        .into_iter()
        .map(|(action, binding)| {
            Line::from(vec![
                Span::styled(format!("{action:<width$}  "), header_text_style(app)),
                Span::raw(binding),
            ])
        })
        .collect();
    let body_text = ratatui::text::Text::from(lines);

    let title_line = Line::from(Span::styled("KEYS", header_text_style(app)));
    let popup = Popup::new(body_text)
        .title(title_line)
        .border_style(border_style(app, true));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}

fn color(c: RgbColor) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

fn border_style(app: &App, active: bool) -> Style {
    let style = Style::default().fg(color(app.config().ui.border));
    if active {
        style.add_modifier(Modifier::BOLD)
    } else {
        style.add_modifier(Modifier::DIM)
    }
}

fn header_text_style(app: &App) -> Style {
    Style::default()
        .fg(color(app.config().ui.status_fg))
        .add_modifier(Modifier::BOLD)
}

fn selection_style(app: &App) -> Style {
    Style::default()
        .fg(color(app.config().ui.selection_fg))
        .bg(color(app.config().ui.selection_bg))
}

fn separator_style(app: &App) -> Style {
    Style::default().fg(color(app.config().ui.separator))
}
