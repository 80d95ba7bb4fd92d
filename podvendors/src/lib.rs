//! # podvendors - Clients des services de génération
//!
//! Chaque service externe est caché derrière un trait, ce qui permet au
//! pipeline de génération d'être testé avec des implémentations factices :
//!
//! | Trait | Client | Service |
//! |---|---|---|
//! | [`TextGenerator`] | [`AnthropicClient`] | Anthropic Messages API |
//! | [`SpeechSynthesizer`] | [`CartesiaClient`] | Cartesia `/tts/bytes` |
//! | [`ImageGenerator`] | [`HuggingFaceClient`] | Hugging Face inference |
//!
//! Les réglages se lisent dans `podconfig` via [`VendorConfigExt`]
//! (feature `podconfig`, activée par défaut).

pub mod error;
pub mod image;
pub mod speech;
pub mod text;

#[cfg(feature = "podconfig")]
mod config_ext;

pub use error::{Result, VendorError};
pub use image::{GeneratedImage, HuggingFaceClient, ImageGenerator, ImageSettings};
pub use speech::{CartesiaClient, SpeechSynthesizer, TtsSettings, Voice, VoiceGender};
pub use text::{AnthropicClient, LlmSettings, TextGenerator, TextRequest};

#[cfg(feature = "podconfig")]
pub use config_ext::VendorConfigExt;
