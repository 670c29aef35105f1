use std::{
    sync::mpsc::{self, RecvTimeoutError},
    thread,
    time::Duration,
};
use color_eyre::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use log::error;

/// Terminal client events.
#[derive(Clone, Copy, Debug)]
pub enum Event {
    /// Key press
    Key(KeyEvent),
    /// Mouse press/drag/release/scroll
    Mouse(MouseEvent),
    /// Terminal resize
    Resize(u16, u16),
}

/// Terminal event handler
pub struct EventHandler {
    /// Event receiver channel
    receiver: mpsc::Receiver<Event>,
    /// Thread polls crossterm for user input and sends them along the channel
    #[allow(dead_code)]
    handler: thread::JoinHandle<()>,
}

impl EventHandler {
    pub fn new() -> Self {
        let timeout = Duration::from_secs_f64(1.0 / 50.0);
        let (sender, receiver) = mpsc::channel();

        let handler = thread::spawn(move || loop {
            let event = match event::poll(timeout) {
                Ok(true) => match event::read() {
                    Ok(event) => event,
                    Err(e) => {
                        error!("Unable to read terminal event: {e}");
                        return;
                    }
                },
                Ok(false) => continue,
                Err(e) => {
                    error!("Unable to poll for terminal event: {e}");
                    return;
                }
            };
            let event = match event {
                // ignore key release
                CrosstermEvent::Key(e) if e.kind == event::KeyEventKind::Press => Event::Key(e),
                CrosstermEvent::Mouse(e) => Event::Mouse(e),
                CrosstermEvent::Resize(w, h) => Event::Resize(w, h),
                _ => continue,
            };
            if sender.send(event).is_err() {
                // the app hung up
                return;
            }
        });

        Self { receiver, handler }
    }

    /// Waits up to `timeout` for the next event.
    pub fn next(&self, timeout: Duration) -> Result<Option<Event>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
