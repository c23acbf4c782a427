use crate::store::{PinRecord, PinStore, StoreError};

/// Result of confirming a staged PIN.
#[derive(Debug, PartialEq, Eq)]
pub enum Confirmation {
    Accepted,
    Mismatch,
    /// Nothing was staged, e.g. the setup form was abandoned.
    NotStaged,
}

pub struct PinAuth {
    record: PinRecord,
    store: Option<Box<dyn PinStore>>,
    staged: Option<String>,
    setup_allowed: bool,
}

impl PinAuth {
    /// A fixed PIN that can't be changed from the device. The store is never touched.
    pub fn fixed(pin: &str) -> Self {
        Self {
            record: PinRecord { configured: true, pin: pin.to_owned() },
            store: None,
            staged: None,
            setup_allowed: false,
        }
    }

    /// Loads the record from `store`, writing a default one on first run. Any failure leaves us
    /// running on an in-memory record for the rest of the process.
    pub fn load(store: Box<dyn PinStore>, default_pin: &str) -> Self {
        let loaded = store.read();
        let default = PinRecord { configured: false, pin: default_pin.to_owned() };
        let mut auth =
            Self { record: default, store: Some(store), staged: None, setup_allowed: true };

        match loaded {
            Ok(Some(record)) => {
                log::info!("Loaded PIN record (configured: {})", record.configured);
                auth.record = record;
            }
            Ok(None) => {
                log::info!("No PIN record found, creating a default one");
                auth.persist();
            }
            Err(err) => auth.degrade(err),
        }

        auth
    }

    pub fn check_pin(&self, pin: &str) -> bool {
        self.record.pin == pin
    }

    pub fn is_configured(&self) -> bool {
        self.record.configured
    }

    /// Whether the user still has to pick a PIN before the lock can be used.
    pub fn needs_setup(&self) -> bool {
        self.setup_allowed && !self.record.configured
    }

    pub fn is_volatile(&self) -> bool {
        !self.store.as_ref().map_or(false, |store| store.is_persistent())
    }

    pub fn stage(&mut self, pin: &str) {
        self.staged = Some(pin.to_owned());
    }

    pub fn abandon(&mut self) {
        if self.staged.take().is_some() {
            log::debug!("PIN setup abandoned");
        }
    }

    /// Compares `pin` with the staged candidate. Only a match touches the record.
    pub fn confirm(&mut self, pin: &str) -> Confirmation {
        let staged = match self.staged.take() {
            Some(staged) => staged,
            None => return Confirmation::NotStaged,
        };
        if staged != pin {
            return Confirmation::Mismatch;
        }

        self.record = PinRecord { configured: true, pin: staged };
        self.persist();
        log::info!("New PIN configured");
        Confirmation::Accepted
    }

    fn persist(&mut self) {
        let result = match self.store.as_mut() {
            Some(store) => store.write(&self.record),
            None => return,
        };
        if let Err(err) = result {
            self.degrade(err);
        }
    }

    fn degrade(&mut self, err: StoreError) {
        log::error!("{}", err);
        log::warn!("Falling back to an in-memory PIN record until restart");
        self.store = None;
    }

    #[cfg(test)]
    pub fn record(&self) -> &PinRecord {
        &self.record
    }
}
