use crate::auth::{Confirmation, PinAuth};
use crate::countdown::Countdown;
use crate::device::{Device, StandbyState};
use crate::prompt::{self, FormId, Prompt};

use std::time::{Duration, SystemTime};

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LockState {
    /// Nothing on screen, waiting for the device to wake up.
    Idle,
    Prompting,
    Setup,
    Confirm,
    Disabled,
}

#[derive(Clone, Debug)]
pub struct Policy {
    pub max_attempts: u32,
    pub disable_duration: Duration,
    /// Shown under the first prompt while the PIN hasn't been changed from its default.
    pub default_hint: Option<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            disable_duration: Duration::from_secs(2 * 60),
            default_hint: None,
        }
    }
}

/// Result of advancing the disablement countdown by one second.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Tick {
    /// Not disabled, nothing to do.
    Idle,
    Running(u64),
    Expired,
}

pub struct PinLock<D: Device> {
    device: D,
    auth: PinAuth,
    policy: Policy,
    state: LockState,
    attempt: u32,
    countdown: Option<Countdown>,
}

impl<D: Device> PinLock<D> {
    pub fn new(device: D, auth: PinAuth, policy: Policy) -> Self {
        Self { device, auth, policy, state: LockState::Idle, attempt: 1, countdown: None }
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_disabled(&self) -> bool {
        self.countdown.is_some()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.countdown.map_or(0, |countdown| countdown.remaining())
    }

    pub fn on_wake(&mut self) {
        if self.is_disabled() {
            self.alert_disabled();
        } else if self.auth.needs_setup() {
            self.ask_for_setup(None);
        } else {
            self.ask_for_pin(self.pin_text());
        }
    }

    pub fn on_form_submitted(&mut self, form: FormId, text: &str) {
        if self.is_disabled() {
            match form {
                FormId::DisabledAlert => self.reshow_after_dismiss(),
                _ => {
                    self.auth.abandon();
                    self.alert_disabled();
                }
            }
            return;
        }

        match (form, self.state) {
            (FormId::PinCode, _) => self.on_pin(text),
            (FormId::DisabledAlert, _) => self.reshow_after_dismiss(),
            (FormId::PinSetup, LockState::Setup) => self.on_setup(text),
            (FormId::PinConfirm, LockState::Confirm) => self.on_confirm(text),
            // Only the form currently on screen may change the PIN.
            (form, state) => log::warn!("Ignoring {} submitted while {:?}", form, state),
        }
    }

    pub fn on_form_cancelled(&mut self, form: FormId) {
        match form {
            FormId::PinCode | FormId::DisabledAlert => self.reshow_after_dismiss(),
            FormId::PinSetup | FormId::PinConfirm => {
                self.auth.abandon();
                if !self.is_disabled() {
                    self.state = LockState::Idle;
                }
            }
        }
    }

    /// Advances a running disablement by one second. Driven by a recurring timer.
    pub fn tick(&mut self) -> Tick {
        let countdown = match self.countdown.as_mut() {
            Some(countdown) => countdown,
            None => return Tick::Idle,
        };

        if countdown.tick() {
            self.enable();
            Tick::Expired
        } else {
            let remaining = countdown.remaining();
            self.alert_disabled();
            Tick::Running(remaining)
        }
    }

    fn on_pin(&mut self, text: &str) {
        if text.is_empty() {
            log::info!("Empty PIN was submitted");
            self.ask_for_pin(self.pin_text());
        } else if self.auth.check_pin(text) {
            log::info!("PIN was accepted");
            self.reset_attempts();
            self.state = LockState::Idle;
        } else if self.attempt >= self.policy.max_attempts {
            log::warn!("Incorrect PIN, reached the maximum of {} attempts", self.policy.max_attempts);
            self.disable();
        } else {
            self.attempt += 1;
            log::warn!("Incorrect PIN, attempt {} of {}", self.attempt, self.policy.max_attempts);
            self.ask_for_pin(prompt::incorrect_pin_text(self.attempt, self.policy.max_attempts));
        }
    }

    fn on_setup(&mut self, text: &str) {
        if text.is_empty() {
            self.ask_for_setup(Some("The PIN code can't be empty."));
        } else if !text.chars().all(|c| c.is_ascii_digit()) {
            self.ask_for_setup(Some("The PIN code must contain only digits."));
        } else {
            self.auth.stage(text);
            self.state = LockState::Confirm;
            self.device.display(&Prompt::confirm());
        }
    }

    fn on_confirm(&mut self, text: &str) {
        match self.auth.confirm(text) {
            Confirmation::Accepted => {
                if self.auth.is_volatile() {
                    log::warn!("New PIN is only kept until restart");
                }
                self.reset_attempts();
                self.state = LockState::Idle;
            }
            Confirmation::Mismatch => {
                log::info!("PIN confirmation did not match");
                self.ask_for_setup(Some("The PIN codes did not match."));
            }
            Confirmation::NotStaged => {
                log::debug!("Ignoring confirmation without a staged PIN");
            }
        }
    }

    /// The PIN check and the alert can't be dismissed. Put them back and drop to half wake.
    fn reshow_after_dismiss(&mut self) {
        if self.is_disabled() {
            self.alert_disabled();
        } else {
            self.ask_for_pin(self.pin_text());
        }
        self.device.set_standby(StandbyState::Halfwake);
    }

    fn disable(&mut self) {
        log::warn!(
            "Disabling device for {} starting at {}",
            humantime::format_duration(self.policy.disable_duration),
            humantime::format_rfc3339_seconds(SystemTime::now())
        );
        self.auth.abandon();
        self.countdown = Some(Countdown::start(self.policy.disable_duration));
        self.alert_disabled();
    }

    fn enable(&mut self) {
        log::info!(
            "Device has been enabled again at {}",
            humantime::format_rfc3339_seconds(SystemTime::now())
        );
        self.countdown = None;
        self.state = LockState::Idle;
        self.reset_attempts();
        self.device.clear(FormId::DisabledAlert);
    }

    fn reset_attempts(&mut self) {
        self.attempt = 1;
        log::debug!("Number of attempts has been reset");
    }

    fn pin_text(&self) -> String {
        match &self.policy.default_hint {
            Some(pin) if self.attempt == 1 && !self.auth.is_configured() => {
                prompt::default_pin_hint(self.attempt, self.policy.max_attempts, pin)
            }
            _ => prompt::enter_pin_text(self.attempt, self.policy.max_attempts),
        }
    }

    fn ask_for_pin(&mut self, text: String) {
        self.state = LockState::Prompting;
        self.device.display(&Prompt::pin_entry(text));
    }

    fn ask_for_setup(&mut self, error: Option<&str>) {
        self.state = LockState::Setup;
        self.device.display(&Prompt::setup(prompt::setup_text(error)));
    }

    fn alert_disabled(&mut self) {
        self.state = LockState::Disabled;
        self.device.display(&Prompt::disabled_alert(self.remaining_secs()));
    }

    #[cfg(test)]
    fn device(&self) -> &D {
        &self.device
    }
}
