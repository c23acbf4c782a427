use std::fmt;
use std::str::FromStr;

/// The forms this lock puts on screen. The device reports back which one a response belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FormId {
    PinCode,
    DisabledAlert,
    PinSetup,
    PinConfirm,
}

impl FormId {
    pub fn as_str(self) -> &'static str {
        match self {
            FormId::PinCode => "pin-code",
            FormId::DisabledAlert => "device-disabled-alert",
            FormId::PinSetup => "pin-setup",
            FormId::PinConfirm => "pin-confirm",
        }
    }
}

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown form id \"{0}\"")]
pub struct UnknownForm(pub String);

impl FromStr for FormId {
    type Err = UnknownForm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pin-code" => Ok(FormId::PinCode),
            "device-disabled-alert" => Ok(FormId::DisabledAlert),
            "pin-setup" => Ok(FormId::PinSetup),
            "pin-confirm" => Ok(FormId::PinConfirm),
            _ => Err(UnknownForm(s.to_owned())),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputType {
    Pin,
    Numeric,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KeyboardState {
    Open,
    Closed,
}

/// A text input modal. `duration` is in seconds, 0 keeps it open until answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub form: FormId,
    pub text: String,
    pub input: InputType,
    pub keyboard: KeyboardState,
    pub placeholder: String,
    pub duration: u32,
}

impl Prompt {
    fn new(form: FormId, text: String, input: InputType) -> Self {
        Self {
            form,
            text,
            input,
            keyboard: KeyboardState::Open,
            placeholder: " ".to_owned(),
            duration: 0,
        }
    }

    pub fn pin_entry(text: String) -> Self {
        Self::new(FormId::PinCode, text, InputType::Pin)
    }

    pub fn disabled_alert(remaining_secs: u64) -> Self {
        Self {
            keyboard: KeyboardState::Closed,
            ..Self::new(FormId::DisabledAlert, disabled_text(remaining_secs), InputType::Pin)
        }
    }

    pub fn setup(text: String) -> Self {
        Self::new(FormId::PinSetup, text, InputType::Numeric)
    }

    pub fn confirm() -> Self {
        Self::new(FormId::PinConfirm, "Confirm the new PIN code:".to_owned(), InputType::Pin)
    }
}

pub fn enter_pin_text(attempt: u32, max: u32) -> String {
    format!("Enter PIN code: ({}/{})", attempt, max)
}

pub fn default_pin_hint(attempt: u32, max: u32, default_pin: &str) -> String {
    format!("{}<br>(default: {})", enter_pin_text(attempt, max), default_pin)
}

pub fn incorrect_pin_text(attempt: u32, max: u32) -> String {
    format!("Incorrect PIN, try again: ({}/{})", attempt, max)
}

pub fn disabled_text(remaining_secs: u64) -> String {
    format!("Device is disabled! Please contact support...<br>Remaining time: {}", remaining_secs)
}

pub fn setup_text(error: Option<&str>) -> String {
    let text = "Choose a new PIN code:";
    match error {
        Some(error) => format!("{}<br>{}", error, text),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_ids() {
        for form in [FormId::PinCode, FormId::DisabledAlert, FormId::PinSetup, FormId::PinConfirm]
        {
            assert_eq!(form.as_str().parse::<FormId>(), Ok(form));
        }
        assert_eq!("volume".parse::<FormId>(), Err(UnknownForm("volume".to_owned())));
    }

    #[test]
    fn prompt_texts() {
        assert_eq!(enter_pin_text(1, 3), "Enter PIN code: (1/3)");
        assert_eq!(default_pin_hint(2, 3, "1234"), "Enter PIN code: (2/3)<br>(default: 1234)");
        assert_eq!(incorrect_pin_text(3, 3), "Incorrect PIN, try again: (3/3)");
        assert_eq!(setup_text(Some("PINs did not match")), "PINs did not match<br>Choose a new PIN code:");
    }

    #[test]
    fn alert_keeps_keyboard_closed() {
        let prompt = Prompt::disabled_alert(42);
        assert_eq!(prompt.form, FormId::DisabledAlert);
        assert_eq!(prompt.keyboard, KeyboardState::Closed);
        assert_eq!(prompt.duration, 0);
        assert!(prompt.text.ends_with("Remaining time: 42"));
    }
}
