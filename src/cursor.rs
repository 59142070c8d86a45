pub const INTERACTIVE_SELECTOR: &str = "a, button, [role=\"button\"], input, textarea, select";

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CursorEvent {
    Moved { x: f64, y: f64 },
    HoverChanged { interactive: bool },
    Pressed(bool),
    Left,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CursorState {
    pub x: f64,
    pub y: f64,
    pub visible: bool,
    pub hovering: bool,
    pub pressed: bool,
}

impl CursorState {
    pub fn apply(&mut self, event: CursorEvent) {
        match event {
            CursorEvent::Moved { x, y } => {
                self.x = x;
                self.y = y;
                self.visible = true;
            }
            CursorEvent::HoverChanged { interactive } => self.hovering = interactive,
            CursorEvent::Pressed(pressed) => self.pressed = pressed,
            CursorEvent::Left => {
                self.visible = false;
                self.hovering = false;
                self.pressed = false;
            }
        }
    }

    pub fn transform(&self) -> String {
        format!("transform: translate3d({:.1}px, {:.1}px, 0);", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_stays_hidden_until_first_move() {
        let mut cursor = CursorState::default();
        assert!(!cursor.visible);

        cursor.apply(CursorEvent::Moved { x: 12.0, y: 40.5 });

        assert!(cursor.visible);
        assert_eq!(cursor.transform(), "transform: translate3d(12.0px, 40.5px, 0);");
    }

    #[test]
    fn leaving_window_resets_hover_and_press() {
        let mut cursor = CursorState::default();
        cursor.apply(CursorEvent::Moved { x: 1.0, y: 1.0 });
        cursor.apply(CursorEvent::HoverChanged { interactive: true });
        cursor.apply(CursorEvent::Pressed(true));

        cursor.apply(CursorEvent::Left);

        assert!(!cursor.visible);
        assert!(!cursor.hovering);
        assert!(!cursor.pressed);
        assert_eq!((cursor.x, cursor.y), (1.0, 1.0));
    }
}
