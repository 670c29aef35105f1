use crossterm::event::{KeyCode, KeyEvent};

use crate::client::session::Intent;
use crate::table::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptKind {
    CreateCreature,
    CreateMarker,
    EditToken(CardId),
    ConfirmRemoveToken(CardId),
    ConfirmPutOnBottom(CardId),
}

pub enum PromptOutcome {
    Pending,
    Cancelled,
    Submitted(Intent),
}

/// A one-line question shown over the board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
}

impl Prompt {
    pub fn create_creature() -> Self {
        Self::with_input(PromptKind::CreateCreature, "Token Creature")
    }

    pub fn create_marker() -> Self {
        Self::with_input(PromptKind::CreateMarker, "+1/+1")
    }

    pub fn edit_token(card_id: CardId, current: &str) -> Self {
        Self::with_input(PromptKind::EditToken(card_id), current)
    }

    pub fn confirm(kind: PromptKind) -> Self {
        Self::with_input(kind, "")
    }

    fn with_input(kind: PromptKind, input: &str) -> Self {
        Self {
            kind,
            input: input.to_string(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            PromptKind::CreateCreature => "Creature token name",
            PromptKind::CreateMarker => "Marker token text",
            PromptKind::EditToken(_) => "Edit token",
            PromptKind::ConfirmRemoveToken(_) => "Remove token? (y/n)",
            PromptKind::ConfirmPutOnBottom(_) => "Put this card at the bottom of your library? (y/n)",
        }
    }

    pub fn is_confirmation(&self) -> bool {
        matches!(
            self.kind,
            PromptKind::ConfirmRemoveToken(_) | PromptKind::ConfirmPutOnBottom(_)
        )
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PromptOutcome {
        if self.is_confirmation() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => self.submit(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => PromptOutcome::Cancelled,
                _ => PromptOutcome::Pending,
            };
        }
        match key.code {
            KeyCode::Esc => PromptOutcome::Cancelled,
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
                PromptOutcome::Pending
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                PromptOutcome::Pending
            }
            _ => PromptOutcome::Pending,
        }
    }

    fn submit(&self) -> PromptOutcome {
        let text = self.input.trim().to_string();
        let intent = match &self.kind {
            PromptKind::CreateCreature if !text.is_empty() => Intent::CreateToken {
                name: text.clone(),
                creature: true,
                text,
            },
            PromptKind::CreateMarker if !text.is_empty() => Intent::CreateToken {
                name: "Marker".to_string(),
                creature: false,
                text,
            },
            PromptKind::CreateCreature | PromptKind::CreateMarker => return PromptOutcome::Cancelled,
            PromptKind::EditToken(card_id) => Intent::UpdateToken {
                card_id: card_id.clone(),
                text,
            },
            PromptKind::ConfirmRemoveToken(card_id) => Intent::RemoveToken(card_id.clone()),
            PromptKind::ConfirmPutOnBottom(card_id) => Intent::PutOnBottom(card_id.clone()),
        };
        PromptOutcome::Submitted(intent)
    }
}
