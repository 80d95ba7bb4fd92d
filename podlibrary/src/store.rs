//! JSON-file podcast library
//!
//! The whole library is one file, `{"podcasts": [...]}`, rewritten on every
//! change. Read-modify-write cycles hold a `tokio::sync::Mutex` so that
//! concurrent updates from the API and the generation pipeline never lose
//! writes.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use podmodel::{Podcast, PodcastList};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info, warn};

use crate::{
    error::{LibraryError, Result},
    media::{
        MediaDirs, MediaKind, file_name_from_url, file_stem, is_audio_file_name, media_url,
    },
};

/// Nom du fichier de la bibliothèque dans le répertoire de données
pub const LIBRARY_FILE_NAME: &str = "podcasts.json";

pub struct Library {
    file: PathBuf,
    media: MediaDirs,
    lock: Mutex<()>,
}

impl Library {
    /// Ouvre (ou crée) une bibliothèque
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Répertoire contenant `podcasts.json`
    /// * `media` - Répertoires des fichiers audio et des couvertures
    pub async fn open(data_dir: impl AsRef<Path>, media: MediaDirs) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).await?;
        fs::create_dir_all(&media.audio).await?;
        fs::create_dir_all(&media.covers).await?;

        let library = Self {
            file: data_dir.join(LIBRARY_FILE_NAME),
            media,
            lock: Mutex::new(()),
        };
        info!("Podcast library at {}", library.file.display());
        Ok(library)
    }

    pub fn media(&self) -> &MediaDirs {
        &self.media
    }

    pub fn file_path(&self) -> &Path {
        &self.file
    }

    async fn load(&self) -> Result<Vec<Podcast>> {
        match fs::read(&self.file).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => {
                let list: PodcastList = serde_json::from_slice(&bytes)?;
                Ok(list.podcasts)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Écrit dans un fichier temporaire puis renomme
    async fn save(&self, podcasts: Vec<Podcast>) -> Result<()> {
        let json = serde_json::to_vec_pretty(&PodcastList { podcasts })?;
        let tmp = self.file.with_extension("json.tmp");
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.file).await?;
        Ok(())
    }

    /// Applique `f` au podcast `id` et persiste le résultat
    async fn modify<F>(&self, id: &str, f: F) -> Result<Podcast>
    where
        F: FnOnce(&mut Podcast) -> Result<()>,
    {
        let _guard = self.lock.lock().await;
        let mut podcasts = self.load().await?;
        let podcast = podcasts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        f(podcast)?;
        let updated = podcast.clone();
        self.save(podcasts).await?;
        Ok(updated)
    }

    /// All podcasts, after reconciling the library with the audio directory
    pub async fn list(&self) -> Result<Vec<Podcast>> {
        let _guard = self.lock.lock().await;
        let mut podcasts = self.load().await?;
        let audio_files = self.audio_files().await?;

        let changed = reconcile(&mut podcasts, &audio_files);
        if changed {
            self.save(podcasts.clone()).await?;
        }
        Ok(podcasts)
    }

    pub async fn get(&self, id: &str) -> Result<Podcast> {
        let _guard = self.lock.lock().await;
        self.load()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))
    }

    pub async fn insert(&self, podcast: Podcast) -> Result<Podcast> {
        let _guard = self.lock.lock().await;
        let mut podcasts = self.load().await?;
        podcasts.retain(|p| p.id != podcast.id);
        podcasts.push(podcast.clone());
        self.save(podcasts).await?;
        debug!("Podcast {} saved", podcast.id);
        Ok(podcast)
    }

    pub async fn update_script(&self, id: &str, script: &str) -> Result<Podcast> {
        self.modify(id, |p| {
            p.script = Some(script.to_string());
            Ok(())
        })
        .await
    }

    pub async fn rename(&self, id: &str, title: &str) -> Result<Podcast> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LibraryError::EmptyTitle);
        }
        self.modify(id, |p| {
            p.title = title.to_string();
            Ok(())
        })
        .await
    }

    pub async fn toggle_listened(&self, id: &str) -> Result<Podcast> {
        self.modify(id, |p| {
            p.listened = !p.listened;
            Ok(())
        })
        .await
    }

    /// Supprime le podcast et ses fichiers média locaux
    ///
    /// Sans cela, le fichier audio serait ré-adopté au prochain listing.
    pub async fn delete(&self, id: &str) -> Result<Podcast> {
        let _guard = self.lock.lock().await;
        let mut podcasts = self.load().await?;
        let index = podcasts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))?;
        let removed = podcasts.remove(index);
        self.save(podcasts).await?;

        for (kind, url) in [
            (MediaKind::Audio, removed.audio_url.as_deref()),
            (MediaKind::Cover, removed.cover_url.as_deref()),
        ] {
            if let Some(url) = url {
                self.remove_media_file(kind, url).await;
            }
        }

        info!("Podcast {} deleted", id);
        Ok(removed)
    }

    /// Écrit un fichier média et l'attache au podcast `id`
    ///
    /// Fichier et enregistrement sont mis à jour sous le même verrou : un
    /// listing concurrent ne peut pas adopter le fichier comme orphelin.
    /// Si le podcast n'existe pas, rien n'est écrit. Le fichier local
    /// remplacé, s'il y en a un, est supprimé.
    pub async fn attach_media(
        &self,
        id: &str,
        kind: MediaKind,
        file_name: &str,
        bytes: &[u8],
        duration: Option<u64>,
    ) -> Result<Podcast> {
        let path = self.media.path(kind, file_name)?;
        let url = media_url(kind, file_name);

        let _guard = self.lock.lock().await;
        let mut podcasts = self.load().await?;
        let Some(podcast) = podcasts.iter_mut().find(|p| p.id == id) else {
            return Err(LibraryError::NotFound(id.to_string()));
        };

        fs::write(&path, bytes).await?;
        debug!("Stored {} ({} bytes)", path.display(), bytes.len());

        let previous = match kind {
            MediaKind::Audio => {
                if let Some(d) = duration {
                    podcast.duration = d;
                }
                podcast.audio_url.replace(url.clone())
            }
            MediaKind::Cover => podcast.cover_url.replace(url.clone()),
        };
        let updated = podcast.clone();

        if let Err(e) = self.save(podcasts).await {
            let _ = fs::remove_file(&path).await;
            return Err(e);
        }

        if let Some(previous) = previous.filter(|p| *p != url) {
            self.remove_media_file(kind, &previous).await;
        }
        Ok(updated)
    }

    /// Supprime le fichier désigné par une URL locale, s'il existe
    async fn remove_media_file(&self, kind: MediaKind, url: &str) {
        let Some(name) = file_name_from_url(kind, url) else {
            return;
        };
        if let Ok(path) = self.media.path(kind, name) {
            if let Err(e) = fs::remove_file(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Cannot remove {}: {}", path.display(), e);
                }
            }
        }
    }

    /// Noms des fichiers audio présents, triés
    async fn audio_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match fs::read_dir(&self.media.audio).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_audio_file_name(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Aligne la bibliothèque sur le contenu du répertoire audio
///
/// - un fichier audio référencé par aucun podcast (ni par nom, ni par
///   stem) devient une nouvelle entrée ;
/// - un podcast dont le fichier a disparu est redirigé vers un fichier de
///   même stem s'il en existe un ;
/// - les entrées pointant vers un fichier non audio (ex: `.DS_Store`) sont
///   retirées.
///
/// Retourne `true` si la liste a été modifiée.
pub(crate) fn reconcile(podcasts: &mut Vec<Podcast>, audio_files: &[String]) -> bool {
    let mut changed = false;

    let before = podcasts.len();
    podcasts.retain(|p| {
        match p
            .audio_url
            .as_deref()
            .and_then(|u| file_name_from_url(MediaKind::Audio, u))
        {
            Some(name) => is_audio_file_name(name),
            None => true,
        }
    });
    changed |= podcasts.len() != before;

    let available: HashSet<&str> = audio_files.iter().map(String::as_str).collect();
    for podcast in podcasts.iter_mut() {
        let Some(name) = podcast
            .audio_url
            .as_deref()
            .and_then(|u| file_name_from_url(MediaKind::Audio, u))
        else {
            continue;
        };
        if available.contains(name) {
            continue;
        }
        let stem = file_stem(name);
        if let Some(candidate) = audio_files.iter().find(|f| file_stem(f) == stem) {
            info!("Podcast {} re-pointed to {}", podcast.id, candidate);
            podcast.audio_url = Some(media_url(MediaKind::Audio, candidate));
            changed = true;
        }
    }

    let mut referenced: HashSet<String> = HashSet::new();
    for podcast in podcasts.iter() {
        if let Some(name) = podcast
            .audio_url
            .as_deref()
            .and_then(|u| file_name_from_url(MediaKind::Audio, u))
        {
            referenced.insert(name.to_string());
            referenced.insert(file_stem(name).to_string());
        }
    }

    for file in audio_files {
        if referenced.contains(file) || referenced.contains(file_stem(file)) {
            continue;
        }
        info!("Adopting orphan audio file {}", file);
        podcasts.push(Podcast::adopted_audio(
            file_stem(file),
            media_url(MediaKind::Audio, file),
        ));
        referenced.insert(file.clone());
        referenced.insert(file_stem(file).to_string());
        changed = true;
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use podmodel::PodcastFormat;

    fn podcast_with_audio(url: Option<&str>) -> Podcast {
        let mut p = Podcast::from_script("T", PodcastFormat::Debate, "A: hi");
        p.audio_url = url.map(str::to_string);
        p
    }

    #[test]
    fn orphans_are_adopted_once() {
        let mut podcasts = vec![podcast_with_audio(Some("/static/audio/known.wav"))];
        let files = vec!["known.wav".to_string(), "orphan.mp3".to_string()];

        assert!(reconcile(&mut podcasts, &files));
        assert_eq!(podcasts.len(), 2);
        assert_eq!(podcasts[1].title, "Audio orphan");
        assert_eq!(podcasts[1].duration, 300);
        assert_eq!(podcasts[1].format, PodcastFormat::Conversational);

        assert!(!reconcile(&mut podcasts, &files));
        assert_eq!(podcasts.len(), 2);
    }

    #[test]
    fn missing_file_is_repointed_by_stem() {
        let mut podcasts = vec![podcast_with_audio(Some("/static/audio/abc.mp3"))];
        let files = vec!["abc.wav".to_string()];

        assert!(reconcile(&mut podcasts, &files));
        assert_eq!(podcasts.len(), 1);
        assert_eq!(podcasts[0].audio_url.as_deref(), Some("/static/audio/abc.wav"));
    }

    #[test]
    fn podcasts_without_audio_are_kept() {
        let mut podcasts = vec![
            podcast_with_audio(None),
            podcast_with_audio(Some("https://cdn.example.com/x.mp3")),
        ];
        assert!(!reconcile(&mut podcasts, &[]));
        assert_eq!(podcasts.len(), 2);
    }

    #[test]
    fn non_audio_references_are_dropped() {
        let mut podcasts = vec![podcast_with_audio(Some("/static/audio/.DS_Store"))];
        assert!(reconcile(&mut podcasts, &[]));
        assert!(podcasts.is_empty());
    }
}
