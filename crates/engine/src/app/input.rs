#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    Interact,
    Pause,
    Crouch,
    RotateLeft,
    RotateRight,
    Hide,
    OpenCamera,
    SwitchScene,
    DebugCompleteNight,
    DebugFailNight,
}

const ACTION_COUNT: usize = 14;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn clear(&mut self) {
        self.down = [false; ACTION_COUNT];
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveForward => 0,
            InputAction::MoveBack => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Interact => 4,
            InputAction::Pause => 5,
            InputAction::Crouch => 6,
            InputAction::RotateLeft => 7,
            InputAction::RotateRight => 8,
            InputAction::Hide => 9,
            InputAction::OpenCamera => 10,
            InputAction::SwitchScene => 11,
            InputAction::DebugCompleteNight => 12,
            InputAction::DebugFailNight => 13,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_clear_track_each_action_independently() {
        let mut states = ActionStates::default();
        states.set(InputAction::Crouch, true);
        states.set(InputAction::DebugFailNight, true);

        assert!(states.is_down(InputAction::Crouch));
        assert!(states.is_down(InputAction::DebugFailNight));
        assert!(!states.is_down(InputAction::Interact));

        states.clear();
        assert!(!states.is_down(InputAction::Crouch));
        assert!(!states.is_down(InputAction::DebugFailNight));
    }
}
