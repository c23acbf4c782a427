//! Events reported by the endpoint, one per line:
//!
//! ```text
//! submit <form-id> [text]
//! cancel <form-id>
//! standby <off|halfwake|standby>
//! ```

use crate::device::StandbyState;
use crate::prompt::{FormId, UnknownForm};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    FormSubmitted { form: FormId, text: String },
    FormCancelled { form: FormId },
    StandbyChanged(StandbyState),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("empty line")]
    Empty,
    #[error("unknown event \"{0}\"")]
    UnknownEvent(String),
    #[error("missing form id")]
    MissingForm,
    /// Forms owned by someone else. Not an error as far as the lock is concerned.
    #[error(transparent)]
    ForeignForm(#[from] UnknownForm),
    #[error("unknown standby state \"{0}\"")]
    UnknownStandby(String),
}

pub fn parse_line(line: &str) -> Result<Event, ParseError> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    let (kind, rest) = match line.trim_start().split_once(' ') {
        Some((kind, rest)) => (kind, rest),
        None => (line.trim(), ""),
    };

    match kind {
        "" => Err(ParseError::Empty),
        "submit" => {
            let (form, text) = rest.split_once(' ').unwrap_or((rest, ""));
            Ok(Event::FormSubmitted { form: parse_form(form)?, text: text.to_owned() })
        }
        "cancel" => Ok(Event::FormCancelled { form: parse_form(rest.trim())? }),
        "standby" => {
            let state = match rest.trim() {
                "off" => StandbyState::Off,
                "halfwake" => StandbyState::Halfwake,
                "standby" => StandbyState::Standby,
                other => return Err(ParseError::UnknownStandby(other.to_owned())),
            };
            Ok(Event::StandbyChanged(state))
        }
        other => Err(ParseError::UnknownEvent(other.to_owned())),
    }
}

fn parse_form(form: &str) -> Result<FormId, ParseError> {
    if form.is_empty() {
        return Err(ParseError::MissingForm);
    }
    Ok(form.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit() {
        assert_eq!(
            parse_line("submit pin-code 1234\n"),
            Ok(Event::FormSubmitted { form: FormId::PinCode, text: "1234".to_owned() })
        );
        assert_eq!(
            parse_line("submit pin-code"),
            Ok(Event::FormSubmitted { form: FormId::PinCode, text: String::new() })
        );
        assert_eq!(
            parse_line("submit pin-setup 12 34"),
            Ok(Event::FormSubmitted { form: FormId::PinSetup, text: "12 34".to_owned() })
        );
    }

    #[test]
    fn cancel_and_standby() {
        assert_eq!(
            parse_line("cancel device-disabled-alert"),
            Ok(Event::FormCancelled { form: FormId::DisabledAlert })
        );
        assert_eq!(parse_line("standby off"), Ok(Event::StandbyChanged(StandbyState::Off)));
        assert_eq!(
            parse_line("standby halfwake\r\n"),
            Ok(Event::StandbyChanged(StandbyState::Halfwake))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_line("   "), Err(ParseError::Empty));
        assert_eq!(parse_line("reboot now"), Err(ParseError::UnknownEvent("reboot".to_owned())));
        assert_eq!(parse_line("cancel"), Err(ParseError::MissingForm));
        assert_eq!(
            parse_line("submit volume 10"),
            Err(ParseError::ForeignForm(UnknownForm("volume".to_owned())))
        );
        assert_eq!(parse_line("standby maybe"), Err(ParseError::UnknownStandby("maybe".to_owned())));
    }
}
