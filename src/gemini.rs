//! Gateway to the generative-language API: workout text and speech.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::audio::AudioClip;
use crate::config::GeminiConfig;
use crate::error::{Error, Result};

pub const PLAN_SYSTEM_INSTRUCTION: &str = "You are a professional fitness coach.";
pub const ANALYSIS_SYSTEM_INSTRUCTION: &str = "You are an expert in sports performance analysis.";
pub const NARRATION_PREFIX: &str = "Read clearly: ";

pub trait AiGateway: Send + Sync {
    /// Generated text, or an error once retries are exhausted.
    fn generate_plan_text(&self, prompt: &str, system_instruction: &str) -> Result<String>;

    /// Narrated `text` as a playable clip. `None` when no audio could be produced.
    fn synthesize_speech(&self, text: &str) -> Option<AudioClip>;
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize, Debug)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize, Debug)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_modalities: Vec<&'a str>,
    speech_config: SpeechConfig<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig<'a> {
    voice_config: VoiceConfig<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig<'a> {
    prebuilt_voice_config: PrebuiltVoiceConfig<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig<'a> {
    voice_name: &'a str,
}

impl<'a> Content<'a> {
    fn text(text: &'a str) -> Self {
        Content { parts: vec![TextPart { text }] }
    }
}

impl<'a> GenerateRequest<'a> {
    fn text(prompt: &'a str, system_instruction: &'a str) -> Self {
        GenerateRequest {
            contents: vec![Content::text(prompt)],
            system_instruction: Some(Content::text(system_instruction)),
            generation_config: None,
        }
    }

    fn speech(narration: &'a str, voice_name: &'a str) -> Self {
        GenerateRequest {
            contents: vec![Content::text(narration)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["AUDIO"],
                speech_config: SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig { voice_name },
                    },
                },
            }),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Deserialize, Debug)]
struct InlineData {
    data: String,
}

impl GenerateResponse {
    fn first_part(&self) -> Option<&ResponsePart> {
        self.candidates.first()?.content.as_ref()?.parts.first()
    }

    fn first_text(&self) -> Option<&str> {
        self.first_part()?.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    fn first_audio(&self) -> Option<&str> {
        self.first_part()?
            .inline_data
            .as_ref()
            .map(|d| d.data.as_str())
            .filter(|d| !d.is_empty())
    }
}

/// Exponential backoff over transient failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy { max_attempts: 5, initial_delay: Duration::from_secs(1) }
    }
}

impl RetryPolicy {
    pub fn run<T>(&self, mut op: impl FnMut(u32) -> Result<T>) -> Result<T> {
        let attempts = self.max_attempts.max(1);
        let mut delay = self.initial_delay;
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < attempts => {
                    debug!(attempt, ?delay, "Retrying after error: {}", e);
                    thread::sleep(delay);
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    text_model: String,
    tts_model: String,
    voice: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        if config.api_key.is_empty() {
            warn!("No Gemini API key configured; AI features will fail");
        }
        Ok(GeminiClient {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            tts_model: config.tts_model.clone(),
            voice: config.voice.clone(),
            retry: RetryPolicy {
                max_attempts: config.max_attempts,
                initial_delay: Duration::from_millis(config.initial_backoff_ms),
            },
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn post(&self, model: &str, body: &GenerateRequest<'_>) -> Result<GenerateResponse> {
        let response = self
            .http
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }
        Ok(response.json::<GenerateResponse>()?)
    }

    fn try_synthesize(&self, text: &str) -> Result<Option<AudioClip>> {
        let narration = format!("{NARRATION_PREFIX}{text}");
        let body = GenerateRequest::speech(&narration, &self.voice);
        let response = self.post(&self.tts_model, &body)?;
        response.first_audio().map(AudioClip::from_base64_pcm).transpose()
    }
}

impl AiGateway for GeminiClient {
    fn generate_plan_text(&self, prompt: &str, system_instruction: &str) -> Result<String> {
        let body = GenerateRequest::text(prompt, system_instruction);
        self.retry.run(|attempt| {
            debug!(attempt, model = %self.text_model, "Requesting text generation");
            let response = self.post(&self.text_model, &body)?;
            response.first_text().map(str::to_owned).ok_or(Error::EmptyResponse)
        })
    }

    fn synthesize_speech(&self, text: &str) -> Option<AudioClip> {
        match self.try_synthesize(text) {
            Ok(Some(clip)) => Some(clip),
            Ok(None) => {
                debug!("Speech response carried no audio");
                None
            }
            Err(e) => {
                warn!("Speech synthesis failed: {}", e);
                None
            }
        }
    }
}
