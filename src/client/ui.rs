use ratatui::{
    layout::{Alignment, Rect},
    prelude::Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};

use crate::client::app::{App, Overlay};
use crate::client::input::{ZoomView, DROP_TARGETS};
use crate::client::layout::ItemKind;
use crate::client::prompt::Prompt;
use crate::client::render::{
    BoardView, CardElement, CardFace, PileFace, PileView, PlayerSummary, ZoneContent, BOARD_SLOTS,
};
use crate::client::snapshot_listener::LinkStatus;
use crate::table::prelude::*;

const HELP: &str = concat!(
    "d draw  p pass  n phase  s shuffle  m mulligan  h/t reveal  c/o token  ",
    "+/- life  w/W wins  3-9/0 [ ] { } zoom  g stack  q quit",
);

pub fn render(app: &App, f: &mut Frame) {
    let (Some(board), Some(scene)) = (app.board(), app.scene()) else {
        f.render_widget(
            Paragraph::new(format!("Waiting for the table... ({})", link_text(app.link_status())))
                .block(
                    Block::default()
                        .title("Arcana Tabletop")
                        .title_alignment(Alignment::Center)
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded),
                )
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center),
            f.size(),
        );
        return;
    };

    let layout = app.layout();
    f.render_widget(header(app, board), layout.header);
    f.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        layout.footer,
    );

    let hover = app
        .drag()
        .and_then(|press| layout.zone_at(press.cursor.0, press.cursor.1))
        .filter(|slot| DROP_TARGETS.contains(slot));

    for slot in BOARD_SLOTS {
        let Some(zone) = board.zone(slot) else {
            continue;
        };
        let count = match &zone.content {
            ZoneContent::Pile(pile) => pile.count,
            ZoneContent::Cards(cards) => cards.len(),
        };
        let who = match slot.side {
            Side::Own => "",
            Side::Opponent => "Opp ",
        };
        let border = if hover == Some(slot) {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        f.render_widget(
            Block::default()
                .title(format!("{who}{} ({count})", slot.label()))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(border),
            layout.outer(slot),
        );
    }

    // Cards and piles, in paint order
    for item in &scene.items {
        let Some(zone) = board.zone(item.slot) else {
            continue;
        };
        match (&zone.content, item.kind) {
            (ZoneContent::Pile(pile), ItemKind::Pile) => {
                f.render_widget(pile_widget(pile), item.area)
            }
            (ZoneContent::Cards(cards), ItemKind::Card { index }) => {
                let Some(element) = cards.get(index) else {
                    continue;
                };
                f.render_widget(Clear, item.area);
                if item.slot.kind == ZoneKind::TokenTray {
                    f.render_widget(chip_line(element), item.area);
                } else {
                    f.render_widget(card_widget(element), item.area);
                }
            }
            _ => {}
        }
    }

    if let Some(press) = app.drag() {
        let width = (press.label.chars().count() as u16 + 2).min(f.size().width);
        let area = Rect::new(press.cursor.0, press.cursor.1, width, 1).intersection(f.size());
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(format!(" {} ", press.label))
                .style(Style::default().add_modifier(Modifier::REVERSED)),
            area,
        );
    }

    match app.overlay() {
        Some(Overlay::Zoom(zoom)) => zoom_popup(f, zoom),
        Some(Overlay::Prompt(prompt)) => prompt_popup(f, prompt),
        None => {}
    }
}

fn summary(player: &PlayerSummary) -> String {
    let mut text = format!(
        "{} ({}) life {} wins {}",
        player.name, player.id, player.life, player.wins
    );
    if player.show_hand {
        text.push_str(" [hand open]");
    }
    if player.show_top {
        text.push_str(" [top open]");
    }
    text
}

fn link_text(status: &LinkStatus) -> String {
    match status {
        LinkStatus::Waiting => "connecting".to_string(),
        LinkStatus::Ok(None) => "connected".to_string(),
        LinkStatus::Ok(Some(msg)) => msg.clone(),
        LinkStatus::Rejected(msg) => format!("rejected: {}", msg.as_deref().unwrap_or("no reason")),
        LinkStatus::Disconnected => "disconnected".to_string(),
    }
}

fn header(app: &App, board: &BoardView) -> Paragraph<'static> {
    let header = &board.header;
    let mut spans = vec![
        Span::styled(
            format!(" Turn {} | {} ", header.turn, header.phase),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("| {} ", summary(&header.own))),
        Span::raw(format!("| vs {} ", summary(&header.opponent))),
        Span::raw(format!(
            "| zoom {}%/{}% ",
            app.scale_percent(Side::Own),
            app.scale_percent(Side::Opponent)
        )),
    ];
    if app.stack_lock() {
        spans.push(Span::styled("| STACK ", Style::default().fg(Color::Yellow)));
    }
    let link = match app.link_status() {
        LinkStatus::Rejected(_) | LinkStatus::Disconnected => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::DarkGray),
    };
    spans.push(Span::styled(format!("| {}", link_text(app.link_status())), link));
    Paragraph::new(Line::from(spans))
}

fn pile_widget(pile: &PileView) -> Paragraph<'static> {
    let face = match &pile.face {
        PileFace::Back => Line::styled("░░ back ░░", Style::default().fg(Color::Blue)),
        PileFace::Top { name, .. } => {
            Line::styled(name.clone(), Style::default().add_modifier(Modifier::BOLD))
        }
        PileFace::Blank => Line::raw(""),
    };
    let count = Line::styled(
        pile.count.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    );
    Paragraph::new(vec![count, face])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

fn card_widget(element: &CardElement) -> Paragraph<'static> {
    let face = match element {
        CardElement::FaceDown => {
            return Paragraph::new("░░░░").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Blue)),
            )
        }
        CardElement::Face(face) => face,
    };
    let mut style = Style::default();
    let mut border = Style::default().fg(Color::White);
    if face.token.is_some() {
        border = border.fg(Color::Yellow);
    }
    if face.tapped {
        style = style.add_modifier(Modifier::DIM | Modifier::ITALIC);
    }
    let mut lines = vec![Line::styled(face_label(face), style)];
    let extra = face.text.as_deref().filter(|text| !text.is_empty() && *text != face.label);
    if let Some(text) = extra {
        lines.push(Line::styled(text.to_string(), Style::default().fg(Color::DarkGray)));
    }
    Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(border))
}

fn face_label(face: &CardFace) -> String {
    if face.tapped {
        format!("↷ {}", face.label)
    } else {
        face.label.clone()
    }
}

fn chip_line(element: &CardElement) -> Paragraph<'static> {
    match element {
        CardElement::Face(face) => {
            Paragraph::new(format!("● {}", face.label)).style(Style::default().fg(Color::Yellow))
        }
        CardElement::FaceDown => Paragraph::new("●"),
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn zoom_popup(f: &mut Frame, zoom: &ZoomView) {
    let area = centered(f.size(), 48, 12);
    let mut lines = vec![Line::raw(zoom.image.clone()), Line::raw("")];
    if let Some(text) = &zoom.text {
        lines.push(Line::raw(text.clone()));
    }
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(zoom.title.clone())
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_type(BorderType::Double),
        ),
        area,
    );
}

fn prompt_popup(f: &mut Frame, prompt: &Prompt) {
    let area = centered(f.size(), 60, 3);
    let body = if prompt.is_confirmation() {
        String::new()
    } else {
        format!("{}_", prompt.input)
    };
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(body).block(
            Block::default()
                .title(prompt.title())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Cyan)),
        ),
        area,
    );
}

#[cfg(test)]
mod tests {
    use ratatui::{backend::TestBackend, Terminal};

    use super::*;
    use crate::client::app::tests::harness;
    use crate::table::snapshot::fixtures::*;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 50)).unwrap();
        terminal.draw(|f| render(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol.as_str())
            .collect()
    }

    #[test]
    fn test_hidden_cards_are_not_drawn() {
        let mut snapshot = empty_snapshot();
        put(&mut snapshot, PlayerId::A, ZoneKind::Hand, "mine", card("Bear"));
        put(&mut snapshot, PlayerId::B, ZoneKind::Hand, "theirs", card("Secret"));
        put(&mut snapshot, PlayerId::B, ZoneKind::Library, "deck", card("Hidden"));
        let h = harness(snapshot);
        let text = screen_text(&h.app);
        assert!(text.contains("Bear"));
        assert!(!text.contains("Secret"));
        assert!(!text.contains("Hidden"));
        assert!(text.contains("Opp Hand (1)"));
    }

    #[test]
    fn test_header_shows_players() {
        let h = harness(empty_snapshot());
        let text = screen_text(&h.app);
        assert!(text.contains("Alice"));
        assert!(text.contains("Bob"));
        assert!(text.contains("Main"));
    }
}
