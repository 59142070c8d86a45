#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MenuEvent {
    Toggle,
    DocumentClick { inside_menu: bool },
    Resized { width: f64 },
    LinkFollowed,
}

/// Open/closed state of the mobile navigation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MenuState {
    open: bool,
}

impl MenuState {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Applies `event` and reports whether the state changed.
    pub fn apply(&mut self, event: MenuEvent, breakpoint: f64) -> bool {
        let next = match event {
            MenuEvent::Toggle => !self.open,
            MenuEvent::DocumentClick { inside_menu } => self.open && inside_menu,
            MenuEvent::Resized { width } => self.open && width <= breakpoint,
            MenuEvent::LinkFollowed => false,
        };

        let changed = next != self.open;
        self.open = next;
        changed
    }

    /// Value for `body.style.overflow`: scrolling is locked while open.
    pub fn body_overflow(&self) -> &'static str {
        if self.open {
            "hidden"
        } else {
            ""
        }
    }
}
