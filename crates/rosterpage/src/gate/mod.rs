//! The download verification gate.
//!
//! [`GateController`] is the state machine behind the verification modal:
//! it opens on a download button, validates the typed code against the value
//! carried by that button, and turns a match into a [`DownloadRequest`]. The
//! browser runs the same machine from the embedded script; this model drives
//! the `unlock` command and pins down the behaviour in tests.
//!
//! The expected code is part of the rendered page, so the gate is a UI
//! affordance and not an access control.

mod fetch;
mod save;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, info, warn};

pub use fetch::{FetchError, FetchResponse, Fetcher, SiteFetcher};
pub use save::{DirectorySink, SaveSink};

use crate::config::{GateConfig, GateMessages};

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Source of the current time for the submit cooldown.
pub trait Clock: Send + Sync + fmt::Debug {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// What a download button carries: the file, the code and who it is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateTarget {
    /// PDF file name, relative to the download directory.
    pub pdf_file: String,
    /// The code that unlocks the file.
    pub expected_code: String,
    /// Companion the button belongs to.
    pub companion_name: String,
}

/// Whether the modal is showing, and for which button.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GateState {
    /// The modal is hidden.
    #[default]
    Closed,
    /// The modal is showing for this target.
    Open(GateTarget),
}

/// Why the modal was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The close control was pressed.
    Cancel,
    /// A click landed outside the dialog.
    OutsideClick,
    /// The Escape key was pressed.
    Escape,
    /// The file was saved.
    Downloaded,
}

/// A submit attempt that did not lead to a saved file.
///
/// Every rejection leaves the modal open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// No target is open.
    NotOpen,
    /// The previous accepted attempt was too recent.
    Cooldown,
    /// The code has the wrong number of characters.
    WrongLength,
    /// The code contains non-digit characters.
    NotNumeric,
    /// The code does not match.
    WrongCode,
    /// Fetching or saving the file failed.
    DownloadFailed(String),
}

impl Rejection {
    /// The message shown to the user, if any.
    #[must_use]
    pub fn message<'a>(&self, messages: &'a GateMessages) -> Option<&'a str> {
        match self {
            Self::NotOpen => None,
            Self::Cooldown => Some(&messages.cooldown),
            Self::WrongLength => Some(&messages.wrong_length),
            Self::NotNumeric => Some(&messages.not_numeric),
            Self::WrongCode => Some(&messages.wrong_code),
            Self::DownloadFailed(_) => Some(&messages.download_failed),
        }
    }

    /// Whether the code field is cleared after this rejection.
    #[must_use]
    pub fn clears_input(&self) -> bool {
        matches!(self, Self::WrongCode)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotOpen => write!(f, "no download selected"),
            Self::Cooldown => write!(f, "attempt inside cooldown window"),
            Self::WrongLength => write!(f, "code has the wrong length"),
            Self::NotNumeric => write!(f, "code is not numeric"),
            Self::WrongCode => write!(f, "code does not match"),
            Self::DownloadFailed(reason) => write!(f, "download failed: {reason}"),
        }
    }
}

/// A verified request to fetch a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// URL relative to the page: download directory plus encoded file name.
    pub url: String,
    /// The original file name to save under.
    pub file_name: String,
}

/// Build the relative URL for a file in the download directory.
#[must_use]
pub fn download_url(download_dir: &str, file_name: &str) -> String {
    format!(
        "{}/{}",
        download_dir.trim_end_matches('/'),
        utf8_percent_encode(file_name, URI_COMPONENT)
    )
}

/// Keep only digits and at most `code_length` of them, as the code field
/// does while the user types.
#[must_use]
pub fn sanitize_code_input(typed: &str, code_length: usize) -> String {
    typed
        .chars()
        .filter(char::is_ascii_digit)
        .take(code_length)
        .collect()
}

/// The verification modal's state machine.
///
/// One controller exists per page; it owns the open target, the last
/// accepted attempt time and the message currently shown.
#[derive(Debug)]
pub struct GateController<C: Clock = SystemClock> {
    settings: GateConfig,
    clock: C,
    state: GateState,
    message: Option<String>,
    last_attempt: Option<DateTime<Utc>>,
}

impl GateController<SystemClock> {
    /// Create a controller using the wall clock.
    #[must_use]
    pub fn new(settings: GateConfig) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> GateController<C> {
    /// Create a controller with a custom clock.
    #[must_use]
    pub fn with_clock(settings: GateConfig, clock: C) -> Self {
        Self {
            settings,
            clock,
            state: GateState::Closed,
            message: None,
            last_attempt: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Whether the modal is showing.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, GateState::Open(_))
    }

    /// The message currently shown in the modal.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Show the modal for `target`, clearing any previous message.
    pub fn open(&mut self, target: GateTarget) {
        debug!(companion = %target.companion_name, pdf = %target.pdf_file, "Gate opened");
        self.message = None;
        self.state = GateState::Open(target);
    }

    /// Hide the modal.
    pub fn close(&mut self, reason: CloseReason) {
        if self.is_open() {
            debug!(?reason, "Gate closed");
        }
        self.state = GateState::Closed;
    }

    /// Validate a submitted code.
    ///
    /// Checks run in order and stop at the first failure: cooldown, length,
    /// digits, match. Length counts UTF-16 code units, as the page script
    /// does. Only attempts that pass the cooldown restart it.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] for the first failed check; the modal stays
    /// open and shows the matching message.
    pub fn submit(&mut self, input: &str) -> Result<DownloadRequest, Rejection> {
        let GateState::Open(target) = &self.state else {
            return Err(Rejection::NotOpen);
        };

        let now = self.clock.now();
        if let Some(last) = self.last_attempt {
            if within_cooldown(now, last, self.settings.cooldown()) {
                return Err(self.reject(Rejection::Cooldown));
            }
        }
        self.last_attempt = Some(now);
        self.message = None;

        let code = input.trim();
        let rejection = if code.encode_utf16().count() != self.settings.code_length {
            Some(Rejection::WrongLength)
        } else if !code.chars().all(|c| c.is_ascii_digit()) {
            Some(Rejection::NotNumeric)
        } else if code != target.expected_code {
            Some(Rejection::WrongCode)
        } else {
            None
        };
        if let Some(rejection) = rejection {
            return Err(self.reject(rejection));
        }

        info!(companion = %target.companion_name, "Verification code accepted");
        Ok(DownloadRequest {
            url: download_url(&self.settings.download_dir, &target.pdf_file),
            file_name: target.pdf_file.clone(),
        })
    }

    /// Fetch a verified request and save it under its original name.
    ///
    /// On success the modal closes and the saved location is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::DownloadFailed`] if the fetch fails, answers
    /// with a non-success status, or the file cannot be saved. The modal
    /// stays open for a retry.
    pub async fn download<F, S>(
        &mut self,
        request: &DownloadRequest,
        fetcher: &F,
        sink: &S,
    ) -> Result<PathBuf, Rejection>
    where
        F: Fetcher + ?Sized,
        S: SaveSink + ?Sized,
    {
        let response = match fetcher.fetch(&request.url).await {
            Ok(response) => response,
            Err(e) => return Err(self.download_failed(e.to_string())),
        };
        if !response.is_success() {
            return Err(self.download_failed(format!(
                "HTTP {}: {}",
                response.status, response.status_text
            )));
        }

        let saved = match sink.save(&request.file_name, &response.body).await {
            Ok(path) => path,
            Err(e) => return Err(self.download_failed(e.to_string())),
        };

        info!(file = %request.file_name, bytes = response.body.len(), "Download saved");
        self.close(CloseReason::Downloaded);
        Ok(saved)
    }

    fn download_failed(&mut self, reason: String) -> Rejection {
        warn!(%reason, "Download failed");
        self.reject(Rejection::DownloadFailed(reason))
    }

    fn reject(&mut self, rejection: Rejection) -> Rejection {
        debug!(%rejection, "Submit rejected");
        self.message = rejection
            .message(&self.settings.messages)
            .map(str::to_string);
        rejection
    }
}

/// A clock that went backwards counts as inside the window.
fn within_cooldown(now: DateTime<Utc>, last: DateTime<Utc>, cooldown: Duration) -> bool {
    match (now - last).to_std() {
        Ok(elapsed) => elapsed < cooldown,
        Err(_) => true,
    }
}
