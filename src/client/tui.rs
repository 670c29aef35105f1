use std::{io, panic, time::Duration};

use color_eyre::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};

use crate::client::{
    app::App,
    event::{Event, EventHandler},
    ui,
};

pub type CrosstermTerminal = Terminal<CrosstermBackend<io::Stderr>>;

/// The real terminal: raw mode, alternate screen and mouse capture while the
/// table is open, plus the thread that reads input from it.
pub struct Tui {
    terminal: CrosstermTerminal,
    events: EventHandler,
}

impl Tui {
    /// Builds the terminal on stderr. Nothing changes on screen until [`Tui::enter`].
    pub fn new() -> Result<Self> {
        info!("Initializing ratatui terminal");
        let terminal = Terminal::new(CrosstermBackend::new(io::stderr()))?;
        Ok(Self {
            terminal,
            events: EventHandler::new(),
        })
    }

    pub fn enter(&mut self) -> Result<()> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;

        // Leave the alternate screen before the panic message is printed
        let panic_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            if let Err(e) = Self::reset() {
                error!("Failed to reset the terminal: {e}");
            }
            panic_hook(panic_info);
        }));

        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        Self::reset()?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Also called from the panic hook.
    pub fn reset() -> Result<()> {
        terminal::disable_raw_mode()?;
        crossterm::execute!(io::stderr(), LeaveAlternateScreen, DisableMouseCapture)?;
        Ok(())
    }

    pub fn size(&self) -> Result<Rect> {
        Ok(self.terminal.size()?)
    }

    /// Waits up to `timeout` for the next input event.
    pub fn next_event(&self, timeout: Duration) -> Result<Option<Event>> {
        self.events.next(timeout)
    }

    /// [`Draw`] one frame through [`ui::render`].
    ///
    /// [`Draw`]: ratatui::Terminal::draw
    pub fn draw(&mut self, app: &App) -> Result<()> {
        self.terminal.draw(|frame| ui::render(app, frame))?;
        Ok(())
    }
}
