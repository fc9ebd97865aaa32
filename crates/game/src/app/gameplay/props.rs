use engine::LookTarget;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PropKind {
    FlashDrive,
    Locker,
    ExitDoor,
    Poster,
    Monitor,
    OfficeDoor,
}

impl PropKind {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::FlashDrive => "flash drive",
            Self::Locker => "locker",
            Self::ExitDoor => "exit door",
            Self::Poster => "poster",
            Self::Monitor => "security monitor",
            Self::OfficeDoor => "office door",
        }
    }

    fn prompt(self) -> Option<&'static str> {
        match self {
            Self::FlashDrive => Some("Pick up"),
            Self::Locker => Some("Hide"),
            Self::ExitDoor => Some("Leave"),
            Self::Poster | Self::Monitor | Self::OfficeDoor => None,
        }
    }
}

/// Scene object that shows its prompt while it is looked at.
#[derive(Debug, Clone)]
pub(crate) struct Prop {
    kind: PropKind,
    looked_at: bool,
    pub(crate) enter_count: u32,
    pub(crate) stay_count: u32,
    pub(crate) exit_count: u32,
}

impl Prop {
    pub(crate) fn new(kind: PropKind) -> Self {
        Self {
            kind,
            looked_at: false,
            enter_count: 0,
            stay_count: 0,
            exit_count: 0,
        }
    }

    pub(crate) fn kind(&self) -> PropKind {
        self.kind
    }

    #[cfg(test)]
    pub(crate) fn is_looked_at(&self) -> bool {
        self.looked_at
    }

    pub(crate) fn prompt(&self) -> Option<&'static str> {
        self.kind.prompt()
    }
}

impl LookTarget for Prop {
    fn on_look_enter(&mut self) {
        self.looked_at = true;
        self.enter_count += 1;
        if let Some(prompt) = self.kind.prompt() {
            info!(prop = self.kind.name(), prompt, "prompt_shown");
        }
    }

    fn on_look_stay(&mut self) {
        self.stay_count += 1;
    }

    fn on_look_exit(&mut self) {
        self.looked_at = false;
        self.exit_count += 1;
        if self.kind.prompt().is_some() {
            info!(prop = self.kind.name(), "prompt_hidden");
        }
        debug!(
            prop = self.kind.name(),
            enters = self.enter_count,
            stays = self.stay_count,
            exits = self.exit_count,
            "look_exited"
        );
    }

    fn target_name(&self) -> &str {
        self.kind.name()
    }
}
