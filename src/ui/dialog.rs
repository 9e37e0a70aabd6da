// ============================================================================
// Dialogue modal
// ============================================================================
// Boîte centrée dessinée par-dessus le formulaire (succès, erreur, rappel).
// Tant qu'elle est affichée, seules Entrée et Échap sont traitées.
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{Dialog, DialogKind};

fn kind_color(kind: DialogKind) -> Color {
    match kind {
        DialogKind::Info => Color::Green,
        DialogKind::Warning => Color::Yellow,
        DialogKind::Error => Color::Red,
    }
}

/// Rectangle centré occupant `percent_x` % de la largeur et `height` lignes
pub fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length((area.height - height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Min(0),
        ])
        .split(vertical[1])[1]
}

/// Dessine le dialogue par-dessus le reste de l'écran
pub fn render_dialog(frame: &mut Frame, dialog: &Dialog, area: Rect) {
    let color = kind_color(dialog.kind);

    let mut lines: Vec<Line> = vec![Line::from("")];
    lines.extend(dialog.body.lines().map(|l| Line::from(l.to_string())));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[Enter]", Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw(" OK"),
    ]));

    // Bordures + lignes du message, sans dépasser l'écran
    let height = (lines.len() as u16).saturating_add(4);
    let rect = centered_rect(70, height, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .title(format!(" {} ", dialog.title))
        .title_alignment(Alignment::Center);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: false });

    // CONCEPT RATATUI : Clear
    // - Efface les cellules sous le dialogue avant de le dessiner
    frame.render_widget(Clear, rect);
    frame.render_widget(paragraph, rect);
}
