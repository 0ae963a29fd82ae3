#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use invite_core::config_store::ConfigStore;
use invite_core::error::CoreError;
use invite_core::form::InvitationForm;
use invite_core::preset::Preset;
use invite_events::{EmailDelivery, EmailError, InvitationEmail, Mailer};
use invite_worker::{JobLimits, JobRunner, Renderer, RunnerFactory};
use lettre::Message;

pub const CONFIG: &str = r##"{
    "city2phone": {"Kazan": "+78430000"},
    "city2email": {"Kazan": "kazan@example.com"},
    "city2vk": {"Kazan": "vk.com/kazan"},
    "presets": [
        {"name": "wedding", "template": "wedding.png", "texts": [
            {"type": "date", "x": 10, "y": 10, "font": "a.ttf", "size": 20, "color": "#000"},
            {"type": "time", "x": 10, "y": 40, "font": "a.ttf", "size": 20, "color": "#000"},
            {"type": "address", "x": 10, "y": 70, "font": "a.ttf", "size": 20, "color": "#000"}
        ]}
    ]
}"##;

/// Renders a fixed byte string after an optional delay.
#[derive(Default)]
pub struct StubRenderer {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl StubRenderer {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, preset: &Preset, form: &InvitationForm) -> Result<Vec<u8>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(format!("{}:{}", preset.name, form.email).into_bytes())
    }
}

/// Panics on its first call, then renders like [`StubRenderer`].
#[derive(Default)]
pub struct PanicOnceRenderer {
    panicked: AtomicBool,
}

#[async_trait]
impl Renderer for PanicOnceRenderer {
    async fn render(&self, preset: &Preset, form: &InvitationForm) -> Result<Vec<u8>, CoreError> {
        if !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("renderer crashed");
        }
        Ok(format!("{}:{}", preset.name, form.email).into_bytes())
    }
}

/// Records messages, or fails every send when `fail` is set.
#[derive(Default)]
pub struct RecordingMailer {
    pub fail: bool,
    pub sent: Mutex<Vec<Message>>,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        let mut to: Vec<String> = self
            .sent
            .lock()
            .unwrap()
            .iter()
            .flat_map(|m| m.envelope().to().iter().map(|a| a.to_string()).collect::<Vec<_>>())
            .collect();
        to.sort();
        to
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: Message) -> Result<(), EmailError> {
        if self.fail {
            return Err(EmailError::Build("smtp unavailable".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Temp storage with a config document and email assets.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub store: Arc<ConfigStore>,
    pub renderer: Arc<StubRenderer>,
    pub mailer: Arc<RecordingMailer>,
}

impl Harness {
    pub fn new(renderer: StubRenderer, mailer: RecordingMailer) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, CONFIG).unwrap();
        std::fs::write(
            dir.path().join("template.html"),
            "<p>{date} {time} {address}</p><p>{phone}</p><img src=\"cid:logo\">",
        )
        .unwrap();
        std::fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();

        Self {
            store: Arc::new(ConfigStore::new(config_path)),
            renderer: Arc::new(renderer),
            mailer: Arc::new(mailer),
            dir,
        }
    }

    pub fn runner(&self, limits: JobLimits) -> JobRunner {
        assemble(
            Arc::clone(&self.store),
            self.renderer.clone(),
            self.mailer.clone(),
            self.dir.path(),
            limits,
        )
    }

    pub fn factory(&self, limits: JobLimits) -> CountingFactory {
        self.factory_with(self.renderer.clone(), limits)
    }

    /// Factory building a fresh runner per call around `renderer`.
    pub fn factory_with(&self, renderer: Arc<dyn Renderer>, limits: JobLimits) -> CountingFactory {
        let builds = Arc::new(AtomicUsize::new(0));
        let store = Arc::clone(&self.store);
        let mailer = self.mailer.clone();
        let dir = self.dir.path().to_path_buf();
        let counter = Arc::clone(&builds);
        let factory: RunnerFactory = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(assemble(
                Arc::clone(&store),
                Arc::clone(&renderer),
                mailer.clone(),
                &dir,
                limits,
            ))
        });
        CountingFactory { factory, builds }
    }
}

/// A [`RunnerFactory`] plus the number of runners it has built.
pub struct CountingFactory {
    pub factory: RunnerFactory,
    builds: Arc<AtomicUsize>,
}

impl CountingFactory {
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

fn assemble(
    store: Arc<ConfigStore>,
    renderer: Arc<dyn Renderer>,
    mailer: Arc<RecordingMailer>,
    dir: &Path,
    limits: JobLimits,
) -> JobRunner {
    let settings = InvitationEmail {
        from_address: "sender@example.com".into(),
        subject: "Invitation".into(),
        attachment_name: "QuestGuru.jpg".into(),
        template_path: dir.join("template.html"),
        logo_path: dir.join("logo.png"),
    };
    JobRunner::new(
        store,
        renderer,
        Arc::new(EmailDelivery::new(settings, mailer)),
        limits,
    )
}

pub fn form(email: &str) -> InvitationForm {
    InvitationForm {
        preset: "wedding".into(),
        date: "12.06".into(),
        time: "18:00".into(),
        address: "Main st. 1".into(),
        email: email.into(),
        city: Some("Kazan".into()),
    }
}

pub fn limits_ms(soft: u64, hard: u64) -> JobLimits {
    JobLimits::new(Duration::from_millis(soft), Duration::from_millis(hard)).unwrap()
}

/// Poll `cond` until it holds, panicking after five seconds.
pub async fn wait_for(mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
