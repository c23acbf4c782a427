mod auth;
mod config;
mod countdown;
mod device;
mod event;
mod lock;
mod logger;
mod options;
mod prompt;
mod store;

use calloop::{
    channel::{self, Channel},
    timer::{TimeoutAction, Timer},
    EventLoop, LoopHandle, RegistrationToken,
};
use std::io::{self, BufRead};
use std::thread;

use crate::auth::PinAuth;
use crate::device::{ConsoleDevice, Device, StandbyState};
use crate::event::{Event, ParseError};
use crate::lock::{PinLock, Policy, Tick};
use crate::options::Options;
use crate::store::{FileStore, MemoryStore, PinStore};

struct AppData<D: Device + 'static> {
    loop_handle: LoopHandle<'static, Self>,
    lock: PinLock<D>,
    countdown_timer: Option<RegistrationToken>,
    exit: bool,
}

fn main() {
    let options = Options::new();

    let auth = if options.setup {
        let store: Box<dyn PinStore> = match &options.store {
            Some(path) => Box::new(FileStore::new(path.clone(), options.store_limit)),
            None => Box::new(MemoryStore::new()),
        };
        PinAuth::load(store, &options.pin)
    } else {
        PinAuth::fixed(&options.pin)
    };
    let policy = Policy {
        max_attempts: options.max_attempts,
        disable_duration: options.disable_duration,
        default_hint: Some(options.pin.clone()),
    };

    let mut event_loop: EventLoop<AppData<ConsoleDevice<io::Stdout>>> =
        EventLoop::try_new().expect("Failed to initialize the event loop!");

    let mut app_data = AppData {
        loop_handle: event_loop.handle(),
        lock: PinLock::new(ConsoleDevice::stdout(), auth, policy),
        countdown_timer: None,
        exit: false,
    };

    app_data
        .loop_handle
        .insert_source(spawn_reader(), |event, _, app_data| match event {
            channel::Event::Msg(event) => app_data.handle_event(event),
            channel::Event::Closed => {
                log::info!("Event stream closed, exiting");
                app_data.exit = true;
            }
        })
        .expect("Failed to insert the event source");

    loop {
        event_loop.dispatch(None, &mut app_data).expect("Error dispatching the event loop");

        if app_data.exit {
            break;
        }
    }

    if let Some(token) = app_data.countdown_timer.take() {
        app_data.loop_handle.remove(token);
    }
}

/// Reads events from stdin on a separate thread, the loop only ever sees parsed events.
fn spawn_reader() -> Channel<Event> {
    let (sender, channel) = channel::channel();

    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    log::error!("Error reading events: {}", err);
                    break;
                }
            };

            match event::parse_line(&line) {
                Ok(event) => {
                    if sender.send(event).is_err() {
                        break;
                    }
                }
                Err(ParseError::Empty) => {}
                Err(ParseError::ForeignForm(err)) => log::debug!("Ignoring event: {}", err),
                Err(err) => log::warn!("Ignoring event \"{}\": {}", line, err),
            }
        }
        // Dropping the sender closes the channel and ends the loop.
    });

    channel
}

impl<D: Device + 'static> AppData<D> {
    fn handle_event(&mut self, event: Event) {
        log::debug!("Received {:?}", redact(&event));

        match event {
            Event::FormSubmitted { form, text } => self.lock.on_form_submitted(form, &text),
            Event::FormCancelled { form } => self.lock.on_form_cancelled(form),
            Event::StandbyChanged(StandbyState::Off) => self.lock.on_wake(),
            Event::StandbyChanged(_) => {}
        }

        log::trace!("Lock is {:?} at attempt {}", self.lock.state(), self.lock.attempt());

        if self.lock.is_disabled() && self.countdown_timer.is_none() {
            self.start_countdown();
        }
    }

    fn start_countdown(&mut self) {
        let token = self
            .loop_handle
            .insert_source(Timer::from_duration(countdown::TICK), |_, _, app_data| {
                match app_data.lock.tick() {
                    Tick::Running(remaining) => {
                        log::trace!("{} seconds left", remaining);
                        TimeoutAction::ToDuration(countdown::TICK)
                    }
                    Tick::Expired | Tick::Idle => {
                        app_data.countdown_timer = None;
                        TimeoutAction::Drop
                    }
                }
            });

        match token {
            Ok(token) => self.countdown_timer = Some(token),
            Err(err) => log::error!("Unable to start the disable countdown: {}", err),
        }
    }
}

/// Submitted text is a PIN attempt and stays out of the log.
fn redact(event: &Event) -> Event {
    match event {
        Event::FormSubmitted { form, .. } => {
            Event::FormSubmitted { form: *form, text: "<redacted>".to_owned() }
        }
        event => event.clone(),
    }
}
