use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{MouseButton, MouseEventKind};
use log::{debug, info};
use ratatui::layout::Rect;

use super::action_sender::ActionSender;
use super::event::Event;
use super::input::{InputState, Press, Reaction, ZoomView};
use super::layout::{CellMetrics, Scene, ScreenLayout};
use super::prompt::{Prompt, PromptOutcome};
use super::render::BoardView;
use super::session::{Message, Session};
use super::snapshot_listener::{LinkStatus, SnapshotListener};
use super::tui::Tui;
use crate::table::prelude::*;

/// How long the loop waits for input before checking the network again.
const FRAME: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Running,
    Quitting,
}

/// Something covering the board and taking all input.
#[derive(Clone, Debug, PartialEq)]
pub enum Overlay {
    Zoom(ZoomView),
    Prompt(Prompt),
}

/// The terminal application
pub struct App {
    session: Session,
    snapshots: SnapshotListener,
    actions: ActionSender,
    input: InputState,
    overlay: Option<Overlay>,

    metrics: CellMetrics,
    area: Option<Rect>,
    layout: ScreenLayout,
    /// Derived from the session after every change.
    board: Option<BoardView>,
    scene: Option<Scene>,

    /// The state of the application.
    mode: Mode,
}

impl App {
    /// Constructs a new instance of [`App`]
    pub fn new(viewer: PlayerId, metrics: CellMetrics, snapshots: SnapshotListener, actions: ActionSender) -> Self {
        Self {
            session: Session::new(viewer),
            snapshots,
            actions,
            input: InputState::new(),
            overlay: None,
            metrics,
            area: None,
            layout: ScreenLayout::new(Rect::default()),
            board: None,
            scene: None,
            mode: Mode::Running,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        info!("Starting clientside application as {}", self.session.viewer());

        let mut tui = Tui::new()?;
        tui.enter()?;

        let result = self.main_loop(&mut tui);

        // exit the user interface, even when the loop failed
        info!("Tearing down user interface");
        tui.exit()?;

        result
    }

    fn main_loop(&mut self, tui: &mut Tui) -> Result<()> {
        self.relayout(tui.size()?);
        self.session.dispatch(Message::Settle(Instant::now()));

        info!("Entering main loop");
        while self.running() {
            self.update(Instant::now())?;
            tui.draw(self)?;

            if let Some(event) = tui.next_event(FRAME)? {
                self.handle_event(event, Instant::now());
            }
        }
        Ok(())
    }

    pub fn running(&self) -> bool {
        self.mode != Mode::Quitting
    }

    pub fn quit(&mut self) {
        self.mode = Mode::Quitting;
    }

    pub fn board(&self) -> Option<&BoardView> {
        self.board.as_ref()
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn layout(&self) -> &ScreenLayout {
        &self.layout
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub fn drag(&self) -> Option<&Press> {
        self.input.drag()
    }

    pub fn stack_lock(&self) -> bool {
        self.input.stack_lock
    }

    pub fn scale_percent(&self, side: Side) -> i32 {
        self.session.scale().percent(side)
    }

    pub fn link_status(&self) -> &LinkStatus {
        self.snapshots.status()
    }

    /// One turn of the loop without input: take in the newest snapshot,
    /// advance timers, send queued requests and rebuild the view.
    pub fn update(&mut self, now: Instant) -> Result<()> {
        if let Some(snapshot) = self.snapshots.update() {
            self.session.dispatch(Message::Snapshot(snapshot));
        }
        if self.snapshots.status() == &LinkStatus::Disconnected {
            info!("Connection to the authority is gone, closing the table");
            self.quit();
            return Ok(());
        }
        self.session.dispatch(Message::Tick(now));
        let reaction = self.input.tick(now);
        self.react(reaction);
        self.flush()?;
        self.refresh();
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Resize(width, height) => self.relayout(Rect::new(0, 0, width, height)),
            Event::Key(key) => match self.overlay.take() {
                Some(Overlay::Zoom(_)) => {}
                Some(Overlay::Prompt(mut prompt)) => match prompt.handle_key(key) {
                    PromptOutcome::Pending => self.overlay = Some(Overlay::Prompt(prompt)),
                    PromptOutcome::Cancelled => debug!("Prompt cancelled"),
                    PromptOutcome::Submitted(intent) => self.react(Reaction::Intent(intent)),
                },
                None => {
                    let reaction = self.input.handle_key(key);
                    self.react(reaction);
                }
            },
            Event::Mouse(mouse) => match &self.overlay {
                Some(Overlay::Zoom(_)) => {
                    if matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left | MouseButton::Right)) {
                        self.overlay = None;
                    }
                }
                Some(Overlay::Prompt(_)) => {}
                None => {
                    let (Some(board), Some(scene)) = (&self.board, &self.scene) else {
                        return;
                    };
                    let reaction = self.input.handle_mouse(mouse, board, scene, now);
                    self.react(reaction);
                }
            },
        }
        self.refresh();
    }

    fn react(&mut self, reaction: Reaction) {
        match reaction {
            Reaction::None => {}
            Reaction::Intent(intent) => self.session.dispatch(Message::Intent(intent)),
            Reaction::Zoom(zoom) => self.overlay = Some(Overlay::Zoom(zoom)),
            Reaction::Prompt(prompt) => self.overlay = Some(Overlay::Prompt(prompt)),
            Reaction::Quit => self.quit(),
        }
    }

    /// Lays the board out for a new terminal size and reports every scaled
    /// container whose height changed.
    fn relayout(&mut self, area: Rect) {
        if self.area == Some(area) {
            return;
        }
        let layout = ScreenLayout::new(area);
        let heights = layout.scaled_containers(self.metrics);
        if self.area.is_none() {
            self.session.dispatch(Message::WindowResized(heights));
        } else {
            let before = self.layout.scaled_containers(self.metrics);
            for (side, container, height) in heights {
                let unchanged = before
                    .iter()
                    .any(|(s, c, h)| *s == side && *c == container && *h == height);
                if !unchanged {
                    self.session.dispatch(Message::ContainerResized(side, container, height));
                }
            }
        }
        debug!("Laid out for {}x{}", area.width, area.height);
        self.area = Some(area);
        self.layout = layout;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.board = self.session.board();
        self.scene = self
            .board
            .as_ref()
            .map(|board| Scene::build(board, self.layout.clone(), self.session.scale(), self.metrics));
    }

    fn flush(&mut self) -> Result<()> {
        for action in self.session.take_outbox() {
            self.actions.send(action)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

    use super::*;
    use crate::client::render::ZoneSlot;
    use crate::table::protocol::ServerMessage;
    use crate::table::snapshot::fixtures::*;

    pub(crate) struct Harness {
        pub app: App,
        pub server: UnboundedSender<ServerMessage>,
        pub requests: UnboundedReceiver<ClientMessage>,
    }

    pub(crate) fn harness(snapshot: Snapshot) -> Harness {
        let (server, inbound) = unbounded_channel();
        let (outbound, requests) = unbounded_channel();
        let mut app = App::new(
            PlayerId::A,
            CellMetrics::default(),
            SnapshotListener::from(inbound),
            ActionSender::from(outbound),
        );
        app.handle_event(Event::Resize(120, 50), Instant::now());
        server.send(ServerMessage::State { state: snapshot }).unwrap();
        app.update(Instant::now()).unwrap();
        Harness { app, server, requests }
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn test_key_sends_request() {
        let mut h = harness(empty_snapshot());
        h.app.handle_event(key('d'), Instant::now());
        h.app.update(Instant::now()).unwrap();
        assert_eq!(
            h.requests.try_recv().unwrap(),
            ClientMessage::Action(ActionRequest::Draw { player_id: PlayerId::A, n: 1 })
        );
        assert!(h.app.board().is_some());
    }

    #[test]
    fn test_prompt_captures_keys() {
        let mut h = harness(empty_snapshot());
        h.app.handle_event(key('o'), Instant::now());
        assert!(matches!(h.app.overlay(), Some(Overlay::Prompt(_))));
        // 'd' is typed into the prompt instead of drawing
        h.app.handle_event(key('d'), Instant::now());
        h.app.handle_event(Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)), Instant::now());
        assert!(h.app.overlay().is_none());
        h.app.update(Instant::now()).unwrap();
        assert_eq!(
            h.requests.try_recv().unwrap(),
            ClientMessage::Action(ActionRequest::CreateToken {
                player_id: PlayerId::A,
                name: "Marker".to_string(),
                creature: false,
                text: "+1/+1d".to_string(),
            })
        );
        assert!(h.requests.try_recv().is_err());
    }

    #[test]
    fn test_zoom_closes_on_click() {
        let mut snapshot = empty_snapshot();
        let mut bear = card("Bear");
        bear.image = Some("images/bear.png".to_string());
        put(&mut snapshot, PlayerId::A, ZoneKind::Hand, "c1", bear);
        let mut h = harness(snapshot);
        let hand = h.app.layout().inner(ZoneSlot::new(Side::Own, ZoneKind::Hand));
        let mouse = |kind| {
            Event::Mouse(MouseEvent { kind, column: hand.x, row: hand.y, modifiers: KeyModifiers::NONE })
        };

        h.app.handle_event(mouse(MouseEventKind::ScrollUp), Instant::now());
        assert!(matches!(h.app.overlay(), Some(Overlay::Zoom(_))));
        h.app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left)), Instant::now());
        assert!(h.app.overlay().is_none());
    }

    #[test]
    fn test_shrinking_window_rescales_cards() {
        let mut h = harness(empty_snapshot());
        let before = h.app.session.scale().card_height(Side::Own, Container::Battlefield);
        h.app.handle_event(Event::Resize(120, 30), Instant::now());
        let after = h.app.session.scale().card_height(Side::Own, Container::Battlefield);
        assert!(after < before);
    }

    #[test]
    fn test_lost_connection_quits() {
        let mut h = harness(empty_snapshot());
        drop(h.server);
        h.app.handle_event(key('d'), Instant::now());
        h.app.update(Instant::now()).unwrap();
        assert!(!h.app.running());
        // nothing is flushed once the link is gone
        assert!(h.requests.try_recv().is_err());
    }

    #[test]
    fn test_newer_snapshot_replaces_board() {
        let mut h = harness(empty_snapshot());
        let mut next = empty_snapshot();
        next.phase = Phase::Combat;
        h.server.send(ServerMessage::State { state: next }).unwrap();
        h.app.update(Instant::now()).unwrap();
        assert_eq!(h.app.board().unwrap().header.phase, Phase::Combat);
        assert_eq!(h.app.link_status(), &LinkStatus::Ok(None));
    }
}
