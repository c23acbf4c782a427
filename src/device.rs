use crate::prompt::{FormId, InputType, KeyboardState, Prompt};

use std::io::{self, Write};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StandbyState {
    /// The device is awake.
    Off,
    Halfwake,
    Standby,
}

/// Commands the lock sends to the endpoint.
pub trait Device {
    fn display(&mut self, prompt: &Prompt);

    fn clear(&mut self, form: FormId);

    fn set_standby(&mut self, state: StandbyState);
}

/// Renders commands as text on stdout, for running the lock from a terminal or behind a
/// line-based bridge to the endpoint.
pub struct ConsoleDevice<W: Write> {
    out: W,
}

impl ConsoleDevice<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write> ConsoleDevice<W> {
    fn send(&mut self, line: &str) {
        if let Err(err) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            log::warn!("Error writing command \"{}\": {}", line, err);
        }
    }
}

impl<W: Write> Device for ConsoleDevice<W> {
    fn display(&mut self, prompt: &Prompt) {
        log::debug!("Displaying {}", prompt.form);
        let input = match prompt.input {
            InputType::Pin => "PIN",
            InputType::Numeric => "Numeric",
        };
        let keyboard = match prompt.keyboard {
            KeyboardState::Open => "Open",
            KeyboardState::Closed => "Closed",
        };
        self.send(&format!(
            "display {} input={} keyboard={} duration={} placeholder={:?} text={:?}",
            prompt.form, input, keyboard, prompt.duration, prompt.placeholder, prompt.text
        ));
    }

    fn clear(&mut self, form: FormId) {
        log::debug!("Clearing {}", form);
        self.send(&format!("clear {}", form));
    }

    fn set_standby(&mut self, state: StandbyState) {
        let state = match state {
            StandbyState::Off => "off",
            StandbyState::Halfwake => "halfwake",
            StandbyState::Standby => "standby",
        };
        self.send(&format!("standby {}", state));
    }
}
