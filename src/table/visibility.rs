use super::prelude::*;

/// How much of a card's identity the viewer is allowed to see.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    /// Name and image are shown.
    Full,
    /// A uniform card back; nothing identifying leaks.
    FaceDown,
    /// Only the size of the pile is shown.
    CountOnly,
}

/// Decides how a card in `zone`, owned by `owner`, is shown to `viewer`.
///
/// `toggles` are the owner's switches. Piles are summarized unless the owner
/// reveals the top of their library, hands are private to their owner unless
/// revealed, and the battlefield and token tray are public.
pub fn resolve(zone: ZoneKind, owner: PlayerId, viewer: PlayerId, toggles: Toggles) -> DisplayMode {
    match zone {
        ZoneKind::Library if toggles.show_top => DisplayMode::Full,
        ZoneKind::Library | ZoneKind::Exile | ZoneKind::Graveyard => DisplayMode::CountOnly,
        ZoneKind::Hand if owner == viewer || toggles.show_hand => DisplayMode::Full,
        ZoneKind::Hand => DisplayMode::FaceDown,
        ZoneKind::Battlefield | ZoneKind::TokenTray => DisplayMode::Full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HIDDEN: Toggles = Toggles { show_hand: false, show_top: false };
    const REVEALED: Toggles = Toggles { show_hand: true, show_top: true };

    #[test]
    fn test_piles_are_count_only_by_default() {
        for zone in [ZoneKind::Library, ZoneKind::Exile, ZoneKind::Graveyard] {
            assert_eq!(resolve(zone, PlayerId::A, PlayerId::A, HIDDEN), DisplayMode::CountOnly);
            assert_eq!(resolve(zone, PlayerId::B, PlayerId::A, HIDDEN), DisplayMode::CountOnly);
        }
    }

    #[test]
    fn test_show_top_only_opens_the_library() {
        let top_only = Toggles { show_hand: false, show_top: true };
        assert_eq!(resolve(ZoneKind::Library, PlayerId::B, PlayerId::A, top_only), DisplayMode::Full);
        assert_eq!(resolve(ZoneKind::Graveyard, PlayerId::B, PlayerId::A, top_only), DisplayMode::CountOnly);
        assert_eq!(resolve(ZoneKind::Exile, PlayerId::B, PlayerId::A, top_only), DisplayMode::CountOnly);
    }

    #[test]
    fn test_own_hand_is_always_full() {
        assert_eq!(resolve(ZoneKind::Hand, PlayerId::A, PlayerId::A, HIDDEN), DisplayMode::Full);
    }

    #[test]
    fn test_opponent_hand_depends_on_show_hand() {
        assert_eq!(resolve(ZoneKind::Hand, PlayerId::B, PlayerId::A, HIDDEN), DisplayMode::FaceDown);
        assert_eq!(resolve(ZoneKind::Hand, PlayerId::B, PlayerId::A, REVEALED), DisplayMode::Full);
        // show_top alone never reveals a hand
        let top_only = Toggles { show_hand: false, show_top: true };
        assert_eq!(resolve(ZoneKind::Hand, PlayerId::A, PlayerId::B, top_only), DisplayMode::FaceDown);
    }

    #[test]
    fn test_battlefield_is_public() {
        assert_eq!(resolve(ZoneKind::Battlefield, PlayerId::B, PlayerId::A, HIDDEN), DisplayMode::Full);
        assert_eq!(resolve(ZoneKind::TokenTray, PlayerId::A, PlayerId::A, HIDDEN), DisplayMode::Full);
    }
}
