mod app;
mod theme;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, ExecutableCommand};
use grocery_list::paths::AppPaths;
use grocery_list::{group_by_category, logging, FileStore, GroceryStore, KeyValueStore};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use unicode_width::UnicodeWidthStr;

use app::{App, InfoPopup, ItemField, ItemFormState, PopupState};

fn main() -> Result<()> {
    let paths = AppPaths::new()?;
    if let Err(err) = logging::init(&paths.log_file) {
        eprintln!("Logging disabled: {err}");
    }
    tracing::info!(storage = %paths.storage_file.display(), "starting grocery list");
    let store = GroceryStore::open(FileStore::open(&paths.storage_file));
    let mut app = App::new(store);
    run_app(&mut app)
}

fn run_app<S: KeyValueStore>(app: &mut App<S>) -> Result<()> {
    enable_raw_mode().context("Unable to enable raw mode")?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let result = event_loop(&mut terminal, app);

    restore_terminal(&mut terminal)?;
    result
}

fn event_loop<B, S>(terminal: &mut Terminal<B>, app: &mut App<S>) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
    S: KeyValueStore,
{
    let tick_rate = Duration::from_millis(200);
    loop {
        terminal.draw(|frame| render(frame, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    tracing::info!(items = app.store.items().len(), "exiting");
    Ok(())
}

fn restore_terminal<B>(terminal: &mut Terminal<B>) -> Result<()>
where
    B: ratatui::backend::Backend + Write,
{
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn render<S: KeyValueStore>(frame: &mut Frame, app: &App<S>) {
    let size = frame.size();
    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.background)),
        size,
    );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(size);

    let header = Paragraph::new(format!("🛒 {} | {}", app.title, app.stats().summary()))
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(Color::White)
                .bg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(header, chunks[0]);

    let shortcuts = Paragraph::new(footer_line(app, app.stats().completed > 0))
        .alignment(Alignment::Center)
        .style(Style::default().bg(app.theme.highlight));
    frame.render_widget(shortcuts, chunks[1]);

    let content_area = chunks[2];
    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.surface)),
        content_area,
    );
    render_items(
        frame,
        content_area.inner(&Margin {
            vertical: 1,
            horizontal: 2,
        }),
        app,
    );

    let status = Paragraph::new(app.status_text())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .bg(app.theme.primary)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(status, chunks[3]);

    if let Some(popup) = &app.active_popup {
        render_popup(frame, popup, app);
    }
}

fn render_items<S: KeyValueStore>(frame: &mut Frame, area: Rect, app: &App<S>) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    if app.store.items().is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Your grocery list is empty",
                Style::default()
                    .fg(app.theme.text)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Press n to add your first item!",
                Style::default().fg(app.theme.muted),
            )),
        ])
        .alignment(Alignment::Center)
        .style(Style::default().bg(app.theme.surface));
        frame.render_widget(empty, area);
        return;
    }

    let selected_id = app.selected_item().map(|item| item.id.as_str());
    let mut rows: Vec<ListItem> = Vec::new();
    let mut selected_row = None;
    for group in group_by_category(app.store.items()) {
        if !rows.is_empty() {
            rows.push(ListItem::new(""));
        }
        let percent = group.completion_percent();
        rows.push(ListItem::new(Line::from(vec![
            Span::styled(
                format!("{} {}", group.category.icon(), group.category),
                Style::default()
                    .fg(app.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    "  {} of {} completed  ",
                    group.completed_count(),
                    group.total()
                ),
                Style::default().fg(app.theme.muted),
            ),
            Span::styled(progress_bar(percent, 10), Style::default().fg(app.theme.done)),
            Span::styled(
                format!(" {}%", percent.round() as u32),
                Style::default()
                    .fg(app.theme.done)
                    .add_modifier(Modifier::BOLD),
            ),
        ])));

        for item in group.iter() {
            let mut name_style = Style::default().fg(app.theme.text);
            let mut detail_style = Style::default().fg(app.theme.done);
            let mut notes_style = Style::default().fg(app.theme.muted);
            if item.completed {
                name_style = name_style
                    .fg(app.theme.muted)
                    .add_modifier(Modifier::CROSSED_OUT);
                detail_style = detail_style.fg(app.theme.muted);
                notes_style = notes_style.add_modifier(Modifier::DIM);
            }
            let marker = if item.completed { "  [✓] " } else { "  [ ] " };
            let mut spans = vec![
                Span::styled(marker, Style::default().fg(app.theme.done)),
                Span::styled(item.name.clone(), name_style),
            ];
            if !item.quantity.is_empty() {
                spans.push(Span::styled(format!("  {}", item.quantity), detail_style));
            }
            if !item.notes.is_empty() {
                spans.push(Span::styled(format!("  · {}", item.notes), notes_style));
            }
            let mut line = Line::from(spans);
            if Some(item.id.as_str()) == selected_id {
                line = highlight_line_with_width(line, area.width as usize, app);
                selected_row = Some(rows.len());
            }
            rows.push(ListItem::new(line));
        }
    }

    let list = List::new(rows).style(Style::default().bg(app.theme.surface).fg(app.theme.text));
    let mut state = ListState::default().with_selected(selected_row);
    frame.render_stateful_widget(list, area, &mut state);
}

fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

fn render_popup<S: KeyValueStore>(frame: &mut Frame, popup: &PopupState, app: &App<S>) {
    match popup {
        PopupState::Info(info) => render_info_popup(frame, info, app),
        PopupState::ItemForm(form) => {
            let area = frame.size();
            frame.render_widget(Clear, area);
            render_item_form_popup(frame, area, app, form);
        }
    }
}

fn render_info_popup<S: KeyValueStore>(frame: &mut Frame, info: &InfoPopup, app: &App<S>) {
    let area = centered_rect(frame.size(), 60, 40);
    frame.render_widget(Clear, area);
    let status = if info.completed { "Completed" } else { "Active" };
    let notes = if info.notes.is_empty() { "-" } else { info.notes.as_str() };
    let text = format!(
        "Name: {}\nQuantity: {}\nCategory: {} {}\nNotes: {}\nStatus: {}\nAdded: {}\n\nPress Enter or Esc to close.",
        info.name,
        info.quantity,
        info.category.icon(),
        info.category,
        notes,
        status,
        info.added
    );
    let block = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(app.theme.surface).fg(app.theme.text))
        .block(
            Block::default()
                .title("Item Info")
                .borders(Borders::ALL)
                .style(Style::default().bg(app.theme.surface)),
        );
    frame.render_widget(block, area);
}

fn popup_sections(area: Rect) -> Option<[Rect; 4]> {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    if sections.len() < 4 {
        return None;
    }
    Some([sections[0], sections[1], sections[2], sections[3]])
}

fn render_item_form_popup<S: KeyValueStore>(
    frame: &mut Frame,
    area: Rect,
    app: &App<S>,
    form: &ItemFormState,
) {
    let mut lines: Vec<FormLine> = Vec::new();
    lines.push(plain_line(Line::from(
        "Fill in the item details. Leave the category on auto to sort it by name.",
    )));
    lines.push(plain_line(Line::from("")));
    lines.push(make_field_line(
        "Name",
        &form.name,
        form.selected_field == ItemField::Name && form.suggestion_index.is_none(),
        app,
    ));

    let suggestions = form.suggestions();
    for (index, suggestion) in suggestions.iter().enumerate() {
        let line = Line::from(vec![Span::styled(
            format!("    ↳ {suggestion}"),
            Style::default().fg(app.theme.muted),
        )]);
        if form.suggestion_index == Some(index) {
            lines.push(FormLine::highlighted(line));
        } else {
            lines.push(plain_line(line));
        }
    }

    lines.push(make_field_line(
        "Quantity",
        &form.quantity,
        form.selected_field == ItemField::Quantity,
        app,
    ));
    lines.push(make_field_line(
        "Category",
        &form.category_display(),
        form.selected_field == ItemField::Category,
        app,
    ));
    lines.push(make_field_line(
        "Notes",
        &form.notes,
        form.selected_field == ItemField::Notes,
        app,
    ));
    if let Some(error) = &form.error {
        lines.push(plain_line(Line::from("")));
        lines.push(plain_line(Line::from(vec![Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )])));
    }

    let key_style = Style::default()
        .fg(app.theme.accent)
        .add_modifier(Modifier::BOLD);
    let mut shortcut_spans = vec![
        Span::styled("Tab", key_style),
        Span::raw("/"),
        Span::styled("Shift+Tab", key_style),
        Span::raw(" Move    "),
        Span::styled("←/→", key_style),
        Span::raw(" Category    "),
    ];
    if !suggestions.is_empty() {
        shortcut_spans.push(Span::styled("↑/↓", key_style));
        shortcut_spans.push(Span::raw(" Suggestions    "));
    }
    shortcut_spans.extend([
        Span::styled("Enter", key_style),
        Span::raw(" Save    "),
        Span::styled("Esc", key_style),
        Span::raw(" Cancel"),
    ]);
    let shortcut_line = Line::from(shortcut_spans);

    if let Some(sections) = popup_sections(area) {
        frame.render_widget(
            Block::default().style(Style::default().bg(app.theme.background)),
            area,
        );
        let [header_area, shortcuts_area, content_area, status_area] = sections;
        let header = Paragraph::new(format!("{} - {}", app.title, form.mode_label))
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .bg(app.theme.primary)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(header, header_area);

        let shortcuts = Paragraph::new(shortcut_line)
            .alignment(Alignment::Center)
            .style(Style::default().bg(app.theme.highlight));
        frame.render_widget(shortcuts, shortcuts_area);

        frame.render_widget(
            Block::default().style(Style::default().bg(app.theme.surface)),
            content_area,
        );
        let inner = content_area.inner(&Margin {
            horizontal: 3,
            vertical: 1,
        });
        let rendered_lines = materialize_form_lines(&lines, inner.width as usize, app);
        let paragraph = Paragraph::new(rendered_lines)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(app.theme.surface).fg(app.theme.text));
        frame.render_widget(paragraph, inner);

        let status = Paragraph::new(app.status_text())
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .bg(app.theme.primary)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(status, status_area);
    }
}

#[derive(Clone)]
struct FormLine {
    line: Line<'static>,
    highlight: bool,
}

impl FormLine {
    fn plain(line: Line<'static>) -> Self {
        Self {
            line,
            highlight: false,
        }
    }

    fn highlighted(line: Line<'static>) -> Self {
        Self {
            line,
            highlight: true,
        }
    }
}

fn materialize_form_lines<S: KeyValueStore>(
    lines: &[FormLine],
    width: usize,
    app: &App<S>,
) -> Vec<Line<'static>> {
    lines
        .iter()
        .map(|form_line| {
            if form_line.highlight {
                highlight_line_with_width(form_line.line.clone(), width, app)
            } else {
                form_line.line.clone()
            }
        })
        .collect()
}

fn highlight_line_with_width<'a, S: KeyValueStore>(
    mut line: Line<'a>,
    width: usize,
    app: &App<S>,
) -> Line<'a> {
    let mut text_width = 0usize;
    let highlight_style = Style::default()
        .fg(app.theme.background)
        .bg(app.theme.accent)
        .add_modifier(Modifier::BOLD);
    for span in &mut line.spans {
        span.style = span.style.patch(highlight_style);
        text_width += UnicodeWidthStr::width(span.content.as_ref());
    }
    if width > text_width {
        line.spans
            .push(Span::styled(" ".repeat(width - text_width), highlight_style));
    }
    line
}

fn plain_line(line: impl Into<Line<'static>>) -> FormLine {
    FormLine::plain(line.into())
}

fn make_field_line<S: KeyValueStore>(
    label: &str,
    value: &str,
    selected: bool,
    app: &App<S>,
) -> FormLine {
    let value_display = if value.trim().is_empty() {
        "(empty)".to_string()
    } else {
        value.to_string()
    };
    let label_style = Style::default()
        .fg(app.theme.accent)
        .add_modifier(Modifier::BOLD);
    let value_style = Style::default().fg(app.theme.text);
    let label_span = Span::styled(format!("{label}: "), label_style);
    let value_span = Span::styled(value_display, value_style);
    if selected {
        FormLine::highlighted(Line::from(vec![label_span, value_span]))
    } else {
        FormLine::plain(Line::from(vec![label_span, value_span]))
    }
}

fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(area);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100 - height_percent) / 2),
        ])
        .split(horizontal[1]);
    vertical[1]
}

struct FooterShortcut {
    key: &'static str,
    label: &'static str,
}

const FOOTER_SHORTCUTS: &[FooterShortcut] = &[
    FooterShortcut {
        key: "q",
        label: " Exit",
    },
    FooterShortcut {
        key: "n",
        label: " New",
    },
    FooterShortcut {
        key: "␣",
        label: " Check",
    },
    FooterShortcut {
        key: "e",
        label: " Edit",
    },
    FooterShortcut {
        key: "d",
        label: " Delete",
    },
    FooterShortcut {
        key: "i",
        label: " Info",
    },
    FooterShortcut {
        key: "t",
        label: " Theme",
    },
];

const CLEAR_SHORTCUT: FooterShortcut = FooterShortcut {
    key: "c",
    label: " Clear Completed",
};

/// The clear shortcut is listed only while something is completed.
fn footer_line<S: KeyValueStore>(app: &App<S>, show_clear: bool) -> Line<'static> {
    let shortcut_style = Style::default()
        .fg(app.theme.accent)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(app.theme.text);
    let mut spans: Vec<Span<'static>> = Vec::new();
    let shortcuts = FOOTER_SHORTCUTS
        .iter()
        .chain(show_clear.then_some(&CLEAR_SHORTCUT));
    for (index, shortcut) in shortcuts.enumerate() {
        if index > 0 {
            spans.push(Span::styled(" | ", label_style));
        }
        spans.push(Span::styled(shortcut.key, shortcut_style));
        spans.push(Span::styled(shortcut.label, label_style));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "[░░░░]");
        assert_eq!(progress_bar(50.0, 4), "[██░░]");
        assert_eq!(progress_bar(100.0, 4), "[████]");
    }
}
