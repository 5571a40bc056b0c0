//! Editor rendering: gutter, syntax-colored text, error underlines, the
//! completion and overload popups, and the modal error dialog.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Position, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use pscode_engine::App;
use pscode_types::{ParseErrorInfo, PsToken};

use crate::theme::Palette;

const GUTTER_WIDTH: u16 = 5;
const MAX_POPUP_ROWS: u16 = 8;
const MAX_OUTPUT_ROWS: u16 = 8;

pub struct DrawOptions {
    pub show_line_numbers: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            show_line_numbers: true,
        }
    }
}

pub fn draw(frame: &mut Frame<'_>, app: &App, palette: &Palette, options: &DrawOptions) {
    let output_rows = if app.last_output().is_empty() {
        0
    } else {
        let lines = app.last_output().lines().count() as u16;
        (lines + 2).min(MAX_OUTPUT_ROWS)
    };

    let [editor_area, output_area, status_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(output_rows),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_editor(frame, app, palette, options, editor_area);
    if output_rows > 0 {
        draw_output(frame, app, palette, output_area);
    }
    draw_status(frame, app, palette, status_area);

    if let Some(popup) = app.completion() {
        draw_completion(frame, app, palette, options, editor_area, popup);
    }
    if let Some(popup) = app.overload() {
        draw_overload(frame, app, palette, options, editor_area, popup);
    }
    if let Some(dialog) = app.current_dialog() {
        draw_dialog(frame, palette, dialog);
    }
}

fn gutter_width(options: &DrawOptions) -> u16 {
    if options.show_line_numbers {
        GUTTER_WIDTH
    } else {
        0
    }
}

/// First visible line, chosen so the caret row stays on screen.
fn scroll_offset(caret_line: usize, height: usize) -> usize {
    if height == 0 {
        return caret_line;
    }
    caret_line.saturating_sub(height - 1)
}

fn draw_editor(
    frame: &mut Frame<'_>,
    app: &App,
    palette: &Palette,
    options: &DrawOptions,
    area: Rect,
) {
    let buffer = app.buffer();
    let (caret_line, caret_col) = buffer.caret_line_col();
    let height = area.height as usize;
    let top = scroll_offset(caret_line, height);
    let gutter = gutter_width(options);

    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg_dark)),
        area,
    );

    let mut line_start = 0usize;
    for (idx, text) in buffer.lines().enumerate() {
        let line_end = line_start + text.len();
        if idx >= top && idx - top < height {
            let y = area.y + (idx - top) as u16;
            if gutter > 0 {
                let number = format!("{:>width$} ", idx + 1, width = (gutter - 1) as usize);
                frame.render_widget(
                    Paragraph::new(number).style(palette.gutter_style()),
                    Rect::new(area.x, y, gutter, 1),
                );
            }
            let line = styled_line(text, line_start, palette, app.tokens(), app.markers());
            frame.render_widget(
                Paragraph::new(line),
                Rect::new(area.x + gutter, y, area.width.saturating_sub(gutter), 1),
            );
        }
        line_start = line_end + 1;
    }

    // Dialogs own the cursor while open.
    if app.current_dialog().is_none() {
        let col_width: usize = buffer
            .line_text(caret_line)
            .chars()
            .take(caret_col)
            .collect::<String>()
            .width();
        let x = area.x + gutter + (col_width as u16).min(area.width.saturating_sub(gutter + 1));
        let y = area.y + (caret_line - top) as u16;
        frame.set_cursor_position(Position::new(x, y));
    }
}

/// Build one display line, applying token colors and overlaying the error
/// underline wherever a marker covers the text.
fn styled_line(
    text: &str,
    line_start: usize,
    palette: &Palette,
    tokens: &[PsToken],
    markers: &[ParseErrorInfo],
) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style: Option<Style> = None;

    for (i, c) in text.char_indices() {
        let offset = line_start + i;
        let mut style = tokens
            .iter()
            .find(|t| t.span.contains(offset))
            .map_or_else(
                || Style::default().fg(palette.text_primary),
                |t| palette.token_style(t.kind),
            );
        if markers.iter().any(|m| m.span().contains(offset)) {
            style = style.patch(palette.marker_style());
        }

        if run_style == Some(style) {
            run.push(c);
        } else {
            if let Some(prev) = run_style.take() {
                spans.push(Span::styled(std::mem::take(&mut run), prev));
            }
            run.push(c);
            run_style = Some(style);
        }
    }
    if let Some(style) = run_style {
        spans.push(Span::styled(run, style));
    }
    Line::from(spans)
}

fn draw_output(frame: &mut Frame<'_>, app: &App, palette: &Palette, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.bg_border))
        .title(" Output ");
    let paragraph = Paragraph::new(app.last_output().trim_end().to_string())
        .block(block)
        .style(Style::default().fg(palette.text_muted).bg(palette.bg_panel));
    frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame<'_>, app: &App, palette: &Palette, area: Rect) {
    let (line, col) = app.buffer().caret_line_col();
    let errors = app.markers().len();
    let status = format!(
        " PowerShell  Ln {}, Col {}  {}  F5 run · Ctrl+Q quit",
        line + 1,
        col + 1,
        if errors == 0 {
            "✓ no errors".to_string()
        } else {
            format!("✗ {errors} error(s)")
        },
    );
    frame.render_widget(Paragraph::new(status).style(palette.status_style()), area);
}

/// Screen cell of the caret inside the editor area.
fn caret_cell(app: &App, options: &DrawOptions, area: Rect) -> (u16, u16) {
    let (line, col) = app.buffer().caret_line_col();
    let top = scroll_offset(line, area.height as usize);
    let col_width: usize = app
        .buffer()
        .line_text(line)
        .chars()
        .take(col)
        .collect::<String>()
        .width();
    let x = area.x + gutter_width(options) + col_width as u16;
    let y = area.y + (line - top) as u16;
    (x, y)
}

/// Place a popup of the given size below the caret, flipping above when the
/// bottom edge would clip.
fn popup_area(anchor: (u16, u16), width: u16, height: u16, bounds: Rect) -> Rect {
    let (cx, cy) = anchor;
    let width = width.min(bounds.width);
    let height = height.min(bounds.height);
    let x = cx.min(bounds.right().saturating_sub(width));
    let y = if cy + 1 + height <= bounds.bottom() {
        cy + 1
    } else {
        cy.saturating_sub(height)
    };
    Rect::new(x, y.max(bounds.y), width, height)
}

fn draw_completion(
    frame: &mut Frame<'_>,
    app: &App,
    palette: &Palette,
    options: &DrawOptions,
    editor_area: Rect,
    popup: &pscode_engine::CompletionPopup,
) {
    let items = popup.visible_items();
    if items.is_empty() {
        return;
    }

    let width = items
        .iter()
        .map(|c| c.list_text().width() + 4)
        .max()
        .unwrap_or(16) as u16;
    let height = (items.len() as u16).min(MAX_POPUP_ROWS);
    let area = popup_area(caret_cell(app, options, editor_area), width, height, editor_area);

    frame.render_widget(Clear, area);
    frame.render_widget(Block::default().style(palette.popup_style()), area);

    let top = scroll_offset(popup.selected(), height as usize);
    for (row, (idx, item)) in items.iter().enumerate().skip(top).take(height as usize).enumerate() {
        let style = if idx == popup.selected() {
            palette.popup_selected_style()
        } else {
            palette.popup_style()
        };
        let text = format!(" {} {}", item.kind().glyph(), item.list_text());
        frame.render_widget(
            Paragraph::new(text).style(style),
            Rect::new(area.x, area.y + row as u16, area.width, 1),
        );
    }
}

fn draw_overload(
    frame: &mut Frame<'_>,
    app: &App,
    palette: &Palette,
    options: &DrawOptions,
    editor_area: Rect,
    popup: &pscode_engine::OverloadPopup,
) {
    let (signature, description) = popup.current();
    let header = format!(
        " {}/{}  {} ",
        popup.selected() + 1,
        popup.count(),
        signature
    );
    let body = format!(" {description} ");
    let width = header.width().max(body.width()) as u16;
    let area = popup_area(caret_cell(app, options, editor_area), width, 2, editor_area);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(vec![
            Line::styled(header, palette.popup_selected_style()),
            Line::styled(body, palette.popup_style()),
        ]),
        area,
    );
}

fn draw_dialog(frame: &mut Frame<'_>, palette: &Palette, dialog: &pscode_engine::ErrorDialog) {
    let bounds = frame.area();
    let width = bounds.width.saturating_sub(8).clamp(20, 60);
    let height = 7;
    let area = Rect::new(
        bounds.x + (bounds.width.saturating_sub(width)) / 2,
        bounds.y + (bounds.height.saturating_sub(height)) / 2,
        width,
        height.min(bounds.height),
    );

    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.error))
        .title(Line::styled(
            format!(" {} ", dialog.title),
            palette.dialog_title_style(),
        ));
    let paragraph = Paragraph::new(vec![
        Line::raw(dialog.message.clone()),
        Line::raw(""),
        Line::styled("[Enter] OK", palette.status_style()),
    ])
    .wrap(Wrap { trim: false })
    .block(block)
    .style(palette.dialog_style());
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_keeps_caret_visible() {
        assert_eq!(scroll_offset(0, 10), 0);
        assert_eq!(scroll_offset(9, 10), 0);
        assert_eq!(scroll_offset(10, 10), 1);
        assert_eq!(scroll_offset(25, 10), 16);
    }

    #[test]
    fn test_popup_flips_above_near_bottom() {
        let bounds = Rect::new(0, 0, 80, 24);
        let below = popup_area((10, 5), 20, 6, bounds);
        assert_eq!(below.y, 6);

        let above = popup_area((10, 22), 20, 6, bounds);
        assert_eq!(above.y, 16);
    }

    #[test]
    fn test_popup_clamps_to_right_edge() {
        let bounds = Rect::new(0, 0, 80, 24);
        let area = popup_area((75, 5), 20, 4, bounds);
        assert_eq!(area.right(), 80);
    }
}
