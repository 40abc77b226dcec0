use std::fs::File;
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, error};

use crate::engine::{Engine, EngineFactory, EngineSettings};
use crate::error::ConfigurationError;

enum SlotState {
    Ready(Box<dyn Engine>),
    /// Checking is switched off for this project
    Disabled,
    Failed(Arc<ConfigurationError>),
}

/// One worker's engine, constructed lazily on first use.
///
/// Lives in the worker's state, so it never leaves the worker thread.
#[derive(Default)]
pub struct EngineSlot {
    state: Option<SlotState>,
}

impl EngineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }
}

/// Shared recipe for the per-worker engines of one build pass
pub struct EngineCache {
    factory: Arc<dyn EngineFactory>,
    settings: EngineSettings,
    eligible: bool,
    constructions: AtomicUsize,
}

impl EngineCache {
    pub fn new(factory: Arc<dyn EngineFactory>, settings: EngineSettings, eligible: bool) -> Self {
        Self {
            factory,
            settings,
            eligible,
            constructions: AtomicUsize::new(0),
        }
    }

    /// The engine held by `slot`, constructing it on first use.
    ///
    /// Returns `Ok(None)` when the project is not eligible for checking; the
    /// caller skips the task. A construction failure is kept in the slot and
    /// returned again on every later call, without retrying.
    pub fn get<'s>(
        &self,
        slot: &'s mut EngineSlot,
    ) -> Result<Option<&'s mut dyn Engine>, Arc<ConfigurationError>> {
        let state = slot.state.get_or_insert_with(|| self.initialize());

        match state {
            SlotState::Ready(engine) => Ok(Some(engine.as_mut())),
            SlotState::Disabled => Ok(None),
            SlotState::Failed(err) => Err(Arc::clone(err)),
        }
    }

    /// Number of engine constructions attempted so far, across all workers
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }

    fn initialize(&self) -> SlotState {
        if !self.eligible {
            debug!("Project is not eligible for checking, no engine created");
            return SlotState::Disabled;
        }

        self.constructions.fetch_add(1, Ordering::SeqCst);
        match self.construct() {
            Ok(engine) => {
                debug!("Engine created");
                SlotState::Ready(engine)
            }
            Err(e) => {
                error!("Failed to create engine: {}", e);
                SlotState::Failed(Arc::new(e))
            }
        }
    }

    fn construct(&self) -> Result<Box<dyn Engine>, ConfigurationError> {
        match &self.settings.custom_lib {
            Some(path) => {
                let mut library =
                    File::open(path).map_err(|source| ConfigurationError::CustomLibOpen {
                        path: path.clone(),
                        source,
                    })?;
                // The library file is closed when it goes out of scope, on
                // success and failure alike
                self.factory
                    .create(Some(&mut library as &mut dyn Read), &self.settings.options)
            }
            None => self.factory.create(None, &self.settings.options),
        }
    }
}
