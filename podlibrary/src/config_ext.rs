//! Extension pour gérer les répertoires de la bibliothèque dans podconfig
//!
//! Les répertoires relatifs sont résolus depuis le répertoire de
//! configuration et créés au premier accès.

use anyhow::Result;
use podconfig::Config;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_AUDIO_DIR: &str = "static/audio";
const DEFAULT_COVERS_DIR: &str = "static/covers";

/// Trait d'extension pour la configuration de la bibliothèque
pub trait LibraryConfigExt {
    /// Répertoire contenant `podcasts.json` (`storage.data_dir`)
    fn get_library_data_dir(&self) -> Result<String>;
    fn set_library_data_dir(&self, directory: String) -> Result<()>;

    /// Répertoire des fichiers audio (`storage.audio_dir`)
    fn get_audio_dir(&self) -> Result<String>;
    fn set_audio_dir(&self, directory: String) -> Result<()>;

    /// Répertoire des couvertures (`storage.covers_dir`)
    fn get_covers_dir(&self) -> Result<String>;
    fn set_covers_dir(&self, directory: String) -> Result<()>;
}

impl LibraryConfigExt for Config {
    fn get_library_data_dir(&self) -> Result<String> {
        self.get_managed_dir(&["storage", "data_dir"], DEFAULT_DATA_DIR)
    }

    fn set_library_data_dir(&self, directory: String) -> Result<()> {
        self.set_managed_dir(&["storage", "data_dir"], directory)
    }

    fn get_audio_dir(&self) -> Result<String> {
        self.get_managed_dir(&["storage", "audio_dir"], DEFAULT_AUDIO_DIR)
    }

    fn set_audio_dir(&self, directory: String) -> Result<()> {
        self.set_managed_dir(&["storage", "audio_dir"], directory)
    }

    fn get_covers_dir(&self) -> Result<String> {
        self.get_managed_dir(&["storage", "covers_dir"], DEFAULT_COVERS_DIR)
    }

    fn set_covers_dir(&self, directory: String) -> Result<()> {
        self.set_managed_dir(&["storage", "covers_dir"], directory)
    }
}
