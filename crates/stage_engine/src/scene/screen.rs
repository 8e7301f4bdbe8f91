//! Screens: named units of content driving a stage
//!
//! A [`Screen`] builds its nodes in `load`, reacts to becoming current in
//! `activate`/`deactivate` and advances its content in `update`. The
//! [`ScreenManager`] registers screens by name and keeps at most one active.

use std::collections::BTreeMap;

use thiserror::Error;

use super::stage::Stage;

/// Screen registry errors
#[derive(Error, Debug)]
pub enum ScreenError {
    /// No screen registered under this name
    #[error("Screen not registered: {0}")]
    NotRegistered(String),

    /// Name already taken
    #[error("Screen already registered: {0}")]
    AlreadyRegistered(String),

    /// A screen callback failed
    #[error("Screen '{name}' failed: {message}")]
    Callback {
        /// Screen name
        name: String,
        /// What went wrong
        message: String,
    },

    /// Error raised by screen code, tagged with the screen name by the manager
    #[error("{0}")]
    Custom(String),
}

/// Capability interface implemented by concrete screens
pub trait Screen {
    /// Build the screen's content
    fn load(&mut self, stage: &mut Stage) -> Result<(), ScreenError>;

    /// Tear the content down again
    fn unload(&mut self, _stage: &mut Stage) -> Result<(), ScreenError> {
        Ok(())
    }

    /// The screen became current
    fn activate(&mut self, _stage: &mut Stage) -> Result<(), ScreenError> {
        Ok(())
    }

    /// The screen stopped being current
    fn deactivate(&mut self, _stage: &mut Stage) -> Result<(), ScreenError> {
        Ok(())
    }

    /// Fixed-step update, called zero or more times per frame
    fn fixed_update(&mut self, _stage: &mut Stage, _step: f32) -> Result<(), ScreenError> {
        Ok(())
    }

    /// Per-frame update
    fn update(&mut self, stage: &mut Stage, dt: f32) -> Result<(), ScreenError>;
}

struct Registered {
    screen: Box<dyn Screen>,
    loaded: bool,
}

/// Named screens with at most one active
#[derive(Default)]
pub struct ScreenManager {
    screens: BTreeMap<String, Registered>,
    active: Option<String>,
}

impl ScreenManager {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a screen under `name`
    pub fn register(
        &mut self,
        name: impl Into<String>,
        screen: Box<dyn Screen>,
    ) -> Result<(), ScreenError> {
        let name = name.into();
        if self.screens.contains_key(&name) {
            return Err(ScreenError::AlreadyRegistered(name));
        }
        self.screens.insert(
            name,
            Registered {
                screen,
                loaded: false,
            },
        );
        Ok(())
    }

    /// Make `name` current: deactivate the previous screen, load `name` if
    /// needed, then activate it
    pub fn activate(&mut self, name: &str, stage: &mut Stage) -> Result<(), ScreenError> {
        if !self.screens.contains_key(name) {
            return Err(ScreenError::NotRegistered(name.to_owned()));
        }
        if self.active.as_deref() == Some(name) {
            return Ok(());
        }

        self.deactivate(stage)?;

        let entry = self.entry_mut(name)?;
        if !entry.loaded {
            entry.screen.load(stage).map_err(|e| tag(name, e))?;
            entry.loaded = true;
            log::info!("Loaded screen '{name}'");
        }
        entry.screen.activate(stage).map_err(|e| tag(name, e))?;
        self.active = Some(name.to_owned());
        log::info!("Activated screen '{name}'");
        Ok(())
    }

    /// Deactivate the current screen, if any
    pub fn deactivate(&mut self, stage: &mut Stage) -> Result<(), ScreenError> {
        let Some(name) = self.active.take() else {
            return Ok(());
        };
        self.entry_mut(&name)?
            .screen
            .deactivate(stage)
            .map_err(|e| tag(&name, e))?;
        log::info!("Deactivated screen '{name}'");
        Ok(())
    }

    /// Deactivate (if current) and unload a screen. It stays registered.
    pub fn unload(&mut self, name: &str, stage: &mut Stage) -> Result<(), ScreenError> {
        if self.active.as_deref() == Some(name) {
            self.deactivate(stage)?;
        }
        let entry = self.entry_mut(name)?;
        if entry.loaded {
            entry.screen.unload(stage).map_err(|e| tag(name, e))?;
            entry.loaded = false;
            log::info!("Unloaded screen '{name}'");
        }
        Ok(())
    }

    /// Unload and remove a screen
    pub fn unregister(&mut self, name: &str, stage: &mut Stage) -> Result<Box<dyn Screen>, ScreenError> {
        self.unload(name, stage)?;
        self.screens
            .remove(name)
            .map(|entry| entry.screen)
            .ok_or_else(|| ScreenError::NotRegistered(name.to_owned()))
    }

    /// Forward a fixed step to the current screen
    pub fn fixed_update(&mut self, stage: &mut Stage, step: f32) -> Result<(), ScreenError> {
        let Some(name) = self.active.clone() else {
            return Ok(());
        };
        self.entry_mut(&name)?
            .screen
            .fixed_update(stage, step)
            .map_err(|e| tag(&name, e))
    }

    /// Forward a frame update to the current screen
    pub fn update(&mut self, stage: &mut Stage, dt: f32) -> Result<(), ScreenError> {
        let Some(name) = self.active.clone() else {
            return Ok(());
        };
        self.entry_mut(&name)?
            .screen
            .update(stage, dt)
            .map_err(|e| tag(&name, e))
    }

    /// Name of the current screen
    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.screens.contains_key(name)
    }

    /// Whether `name` has been loaded
    pub fn is_loaded(&self, name: &str) -> bool {
        self.screens.get(name).is_some_and(|e| e.loaded)
    }

    /// Registered screen names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.screens.keys().map(String::as_str)
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut Registered, ScreenError> {
        self.screens
            .get_mut(name)
            .ok_or_else(|| ScreenError::NotRegistered(name.to_owned()))
    }
}

impl std::fmt::Debug for ScreenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenManager")
            .field("screens", &self.screens.keys().collect::<Vec<_>>())
            .field("active", &self.active)
            .finish()
    }
}

fn tag(name: &str, error: ScreenError) -> ScreenError {
    match error {
        ScreenError::Custom(message) => {
            log::error!("Screen '{name}' failed: {message}");
            ScreenError::Callback {
                name: name.to_owned(),
                message,
            }
        }
        other => other,
    }
}
