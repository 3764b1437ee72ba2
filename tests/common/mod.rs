//! Shared test helpers: scripted adapters and in-memory storage.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use loreforge::config::ForgeConfig;
use loreforge::error::{ForgeError, Result};
use loreforge::generation::{CompletionResolver, ImageResolver};
use loreforge::models::{ModelRegistry, Vendor};
use loreforge::provider::{AdapterSet, ImageAdapter, ImageOptions, ImageOutput, TextAdapter, TextCall};
use loreforge::storage::StorageProvider;

/// One scripted answer from a text vendor.
#[derive(Clone)]
pub enum Reply {
    Text(String),
    Empty,
    Fail(u16, String),
}

impl Reply {
    pub fn text(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Text adapter that plays back scripted replies and records every call.
///
/// Once the script runs out, the last reply repeats.
pub struct ScriptedText {
    vendor: Vendor,
    replies: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    calls: Mutex<Vec<RecordedCall>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub system_text: String,
    pub user_text: String,
    pub temperature: f64,
    pub vendor_model_id: String,
}

impl ScriptedText {
    pub fn new(vendor: Vendor, replies: Vec<Reply>) -> Arc<Self> {
        let fallback = replies.last().cloned().unwrap_or(Reply::Empty);
        Arc::new(Self {
            vendor,
            replies: Mutex::new(VecDeque::from(replies)),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Always answers with the same text.
    pub fn always(vendor: Vendor, text: &str) -> Arc<Self> {
        Self::new(vendor, vec![Reply::text(text)])
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.calls().into_iter().map(|c| c.temperature).collect()
    }
}

#[async_trait]
impl TextAdapter for ScriptedText {
    fn vendor(&self) -> Vendor {
        self.vendor
    }

    async fn complete(&self, call: &TextCall<'_>) -> Result<Option<String>> {
        self.calls.lock().unwrap().push(RecordedCall {
            system_text: call.system_text.to_string(),
            user_text: call.user_text.to_string(),
            temperature: call.temperature,
            vendor_model_id: call.vendor_model_id.to_string(),
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        match reply {
            Reply::Text(s) => Ok(Some(s)),
            Reply::Empty => Ok(None),
            Reply::Fail(status, msg) => Err(ForgeError::vendor_status(self.vendor, status, msg)),
        }
    }
}

/// How the stub image vendor answers.
#[derive(Clone)]
pub enum ImageReply {
    Url(String),
    Accessor(String),
    Bytes(Vec<u8>),
    Fail(String),
}

/// Image adapter with fixed defaults that records the options it receives.
pub struct StubImage {
    reply: ImageReply,
    format: String,
    received: Mutex<Vec<(String, String, ImageOptions)>>,
}

impl StubImage {
    pub fn new(reply: ImageReply, format: &str) -> Arc<Self> {
        Arc::new(Self {
            reply,
            format: format.to_string(),
            received: Mutex::new(Vec::new()),
        })
    }

    /// `(prompt, vendor_model_id, options)` for every generate call.
    pub fn received(&self) -> Vec<(String, String, ImageOptions)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageAdapter for StubImage {
    fn vendor(&self) -> Vendor {
        Vendor::Replicate
    }

    fn default_options(&self, _vendor_model_id: &str, prompt: &str) -> ImageOptions {
        let mut options = ImageOptions::new();
        options.insert("prompt".into(), prompt.into());
        options.insert("aspect_ratio".into(), "3:4".into());
        options.insert("output_quality".into(), 80.into());
        options
    }

    fn output_format(&self, _vendor_model_id: &str) -> String {
        self.format.clone()
    }

    async fn generate(
        &self,
        prompt: &str,
        vendor_model_id: &str,
        options: &ImageOptions,
    ) -> Result<ImageOutput> {
        self.received.lock().unwrap().push((
            prompt.to_string(),
            vendor_model_id.to_string(),
            options.clone(),
        ));
        match &self.reply {
            ImageReply::Url(url) => Ok(ImageOutput::Url(url.clone())),
            ImageReply::Accessor(url) => {
                let url = url.clone();
                Ok(ImageOutput::Accessor(loreforge::provider::UrlAccessor::new(move || url.clone())))
            }
            ImageReply::Bytes(bytes) => Ok(ImageOutput::Bytes(bytes.clone())),
            ImageReply::Fail(msg) => Err(ForgeError::vendor_status(Vendor::Replicate, 500, msg.clone())),
        }
    }
}

/// Storage that keeps files in memory.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<Vec<StoredFile>>,
    fail_with: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl MemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            files: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        })
    }

    pub fn files(&self) -> Vec<StoredFile> {
        self.files.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageProvider for MemoryStorage {
    async fn save_file(&self, file_name: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        if let Some(message) = &self.fail_with {
            return Err(ForgeError::Io(std::io::Error::other(message.clone())));
        }
        self.files.lock().unwrap().push(StoredFile {
            name: file_name.to_string(),
            bytes,
            content_type: content_type.to_string(),
        });
        Ok(self.public_url(file_name))
    }

    fn public_url(&self, file_name: &str) -> String {
        format!("https://cdn.test/{file_name}")
    }
}

pub fn completion_resolver(adapters: AdapterSet) -> CompletionResolver {
    completion_resolver_with(adapters, &ForgeConfig::default())
}

pub fn completion_resolver_with(adapters: AdapterSet, config: &ForgeConfig) -> CompletionResolver {
    CompletionResolver::new(Arc::new(ModelRegistry::builtin()), adapters, config).unwrap()
}

pub fn image_resolver(adapter: Arc<StubImage>, storage: Arc<MemoryStorage>) -> ImageResolver {
    ImageResolver::new(
        Arc::new(ModelRegistry::builtin()),
        AdapterSet::new().with_image_adapter(adapter),
        storage,
        &ForgeConfig::default(),
    )
}
