//! Extension pour lire les réglages de génération dans podconfig

use anyhow::{Result, anyhow};
use podconfig::Config;
use serde_yaml::{Number, Value};

use crate::{
    pipeline::DEFAULT_SPEAKERS,
    validate::{MAX_SPEAKERS, MIN_SPEAKERS},
};

const DEFAULT_SPEAKERS_PATH: [&str; 2] = ["generation", "default_speakers"];

/// Trait d'extension pour la configuration du pipeline
pub trait GenerationConfigExt {
    /// Nombre d'intervenants par défaut (`generation.default_speakers`)
    ///
    /// Une valeur hors de `1..=4` est ignorée au profit de 2.
    fn get_default_speakers(&self) -> Result<u8>;
    fn set_default_speakers(&self, speakers: u8) -> Result<()>;
}

impl GenerationConfigExt for Config {
    fn get_default_speakers(&self) -> Result<u8> {
        let value = self.get_u64_or(&DEFAULT_SPEAKERS_PATH, DEFAULT_SPEAKERS as u64);
        Ok(u8::try_from(value)
            .ok()
            .filter(|n| (MIN_SPEAKERS..=MAX_SPEAKERS).contains(n))
            .unwrap_or(DEFAULT_SPEAKERS))
    }

    fn set_default_speakers(&self, speakers: u8) -> Result<()> {
        if !(MIN_SPEAKERS..=MAX_SPEAKERS).contains(&speakers) {
            return Err(anyhow!(
                "default_speakers must be between {} and {}",
                MIN_SPEAKERS,
                MAX_SPEAKERS
            ));
        }
        self.set_value(&DEFAULT_SPEAKERS_PATH, Value::Number(Number::from(speakers)))
    }
}
