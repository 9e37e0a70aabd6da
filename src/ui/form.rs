// ============================================================================
// Formulaire - Rendu de l'interface principale
// ============================================================================
// Dessine le formulaire de téléchargement :
//
//   ┌ 台股資料抓取助手 ┐   header
//   │ 股票代碼          │
//   │ 開始日期          │   champs (le champ actif a une bordure jaune)
//   │ 結束日期          │
//   │ [x] 還原權息      │
//   │ [ 開始抓取並存檔 ] │   bouton (grisé pendant une requête)
//   ├ 狀態 ─────────────┤   ligne de statut
//   └ raccourcis ───────┘   footer
//
// CONCEPTS RATATUI :
// 1. Layout : découpage de l'espace en zones
// 2. Widgets : Block, Paragraph, Clear
// 3. Style : couleurs et attributs de texte
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Field};
use crate::fetcher::DEFAULT_TICKER;
use crate::ui::dialog;

/// Dessine l'interface complète
///
/// Le dialogue modal, s'il existe, est dessiné par-dessus le formulaire.
pub fn render(frame: &mut Frame, app: &App) {
    let size = frame.size();
    let chunks = create_layout(size);

    render_header(frame, chunks[0]);
    render_form(frame, app, chunks[1]);
    render_status(frame, app, chunks[2]);
    render_footer(frame, app, chunks[3]);

    if let Some(d) = &app.dialog {
        dialog::render_dialog(frame, d, size);
    }
}

/// Crée le layout principal (header, formulaire, statut, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(18),   // Formulaire
            Constraint::Length(4), // Statut (2 lignes)
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec() // Convertit Rc<[Rect]> en Vec<Rect>
}

/// Dessine le header avec le titre
fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(Line::from(Span::styled(
        "台股資料抓取助手",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    )))
    .block(block)
    .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Formulaire
// ============================================================================

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Ticker
            Constraint::Length(3), // Date de début
            Constraint::Length(1), // Aide format
            Constraint::Length(3), // Date de fin
            Constraint::Length(1), // Case à cocher
            Constraint::Length(1), // Espace
            Constraint::Length(3), // Bouton
            Constraint::Min(0),
        ])
        .split(inner);

    render_text_field(
        frame,
        app,
        Field::Ticker,
        &format!(" 股票代碼 (預設 {}) ", DEFAULT_TICKER),
        &app.ticker,
        rows[0],
    );
    render_text_field(frame, app, Field::StartDate, " 開始日期 (格式 YYYY/MM/DD) ", &app.start_date, rows[1]);

    let hint = Paragraph::new(Span::styled(
        " 提示: 支援 2026/02/01 或 2026-02-01",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(hint, rows[2]);

    render_text_field(frame, app, Field::EndDate, " 結束日期 (預設今日) ", &app.end_date, rows[3]);
    render_checkbox(frame, app, rows[4]);
    render_submit_button(frame, app, rows[6]);
}

/// Style de bordure selon le focus
fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    }
}

/// Dessine un champ de saisie avec son libellé en titre
fn render_text_field(frame: &mut Frame, app: &App, field: Field, label: &str, value: &str, area: Rect) {
    let focused = app.focus == field && !app.has_dialog();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title(label.to_string());

    let mut spans = vec![Span::styled(value.to_string(), Style::default().fg(Color::White))];
    if focused {
        spans.push(Span::styled(
            "█", // Curseur
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_checkbox(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Field::Adjusted && !app.has_dialog();
    let mark = if app.use_adjusted { "[x]" } else { "[ ]" };

    let style = if focused {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", mark), style),
        Span::styled("下載還原權息價格 (Adj Close)", style),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Dessine le bouton de soumission
///
/// Pendant une requête il est grisé et affiche "處理中..." : Entrée est
/// ignorée tant que le worker n'a pas répondu.
fn render_submit_button(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Field::Submit && !app.has_dialog();

    let (text_style, border) = if app.busy {
        (Style::default().fg(Color::DarkGray), Style::default().fg(Color::DarkGray))
    } else if focused {
        (
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            border_style(true),
        )
    } else {
        (Style::default().add_modifier(Modifier::BOLD), border_style(false))
    };

    let button = Paragraph::new(Span::styled(app.submit_label(), text_style))
        .block(Block::default().borders(Borders::ALL).border_style(border))
        .alignment(Alignment::Center);

    frame.render_widget(button, area);
}

// ============================================================================
// Statut et footer
// ============================================================================

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let lines: Vec<Line> = app
        .status
        .lines()
        .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(Color::Blue))))
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

/// Dessine le footer avec les raccourcis clavier
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[Esc]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            key("[Tab/↑↓]"),
            Span::raw(" Champ  "),
            key("[Espace]"),
            Span::raw(" Adj Close  "),
            key("[Enter]"),
            Span::raw(" Télécharger  "),
            key("[Esc]"),
            Span::raw(" Quitter"),
        ])
    };

    let paragraph = Paragraph::new(vec![shortcuts])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests
// ============================================================================
