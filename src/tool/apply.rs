//! Profile synthesis orchestration.
//!
//! One apply is a discrete, complete operation: ensure the display is
//! registered (best effort), load the base template, run the editing
//! pipeline, convert the document at a fresh path, associate the
//! result with the display, and prune superseded files. Nothing is
//! rolled back on failure; a partial run (converted but not applied)
//! is recoverable by retrying.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use tokio::fs;

use crate::icc::{
    EditError, FileTemplateSource, LoadsTemplates, ProfileEditor, TagSignature, TemplateError,
};
use crate::store::ProfileStore;
use crate::tool::colord::{self, AppliesProfiles, Colormgr, RegistersDevices};
use crate::tool::convert::{ConvertsProfiles, IccFromXml};
use crate::tool::{ConfigProfile, ToolError};

/// A fatal error from a single apply, one per failing stage.
#[derive(Debug)]
pub enum ApplyError {
    /// No base template at any known location.
    TemplateNotFound { searched: Vec<PathBuf> },
    /// The template lacked a tag the edit must rewrite.
    MissingTag(TagSignature),
    /// The converter is not installed.
    ToolUnavailable { tool: String },
    /// Conversion ran and failed, or timed out.
    ConversionFailed { message: String },
    /// The profile could not be associated with the display.
    ApplyFailed { message: String },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyError::TemplateNotFound { searched } => {
                write!(f, "no base profile template found (searched ")?;
                for (i, path) in searched.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", path.display())?;
                }
                write!(f, ")")
            }
            ApplyError::MissingTag(signature) => {
                write!(f, "base template is missing the {signature} tag")
            }
            ApplyError::ToolUnavailable { tool } => {
                write!(f, "required tool `{tool}` is not installed")
            }
            ApplyError::ConversionFailed { message } => {
                write!(f, "profile conversion failed: {message}")
            }
            ApplyError::ApplyFailed { message } => {
                write!(f, "could not apply profile to display: {message}")
            }
        }
    }
}

impl std::error::Error for ApplyError {}

/// What one apply call changes on the system.
#[derive(Debug, Clone)]
pub struct ApplyRequest {
    pub display: String,
    pub saturation: f64,
    pub gamma: f64,
}

/// The per-display serialization locks.
///
/// Applies for the same display share the generated-files directory
/// and a check-then-act registration sequence, so they must not
/// interleave; applies for different displays may.
fn display_lock(display: &str) -> Arc<tokio::sync::Mutex<()>> {
    static LOCKS: OnceLock<Mutex<BTreeMap<String, Arc<tokio::sync::Mutex<()>>>>> = OnceLock::new();

    let mut locks = LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Arc::clone(locks.entry(display.to_string()).or_default())
}

/// Runs one complete apply against the given collaborators.
///
/// Returns the path of the generated profile. Registration and pruning
/// never affect the outcome; the call succeeds only if the template,
/// edit, conversion, and association stages all succeeded.
pub async fn apply<T, R, C, A>(
    templates: &T,
    registry: &R,
    converter: &C,
    applier: &A,
    store: &ProfileStore,
    request: &ApplyRequest,
) -> Result<PathBuf, ApplyError>
where
    T: LoadsTemplates,
    R: RegistersDevices,
    C: ConvertsProfiles,
    A: AppliesProfiles,
{
    let lock = display_lock(&request.display);
    let _guard = lock.lock().await;

    // 1. Best-effort registration; never aborts.
    colord::ensure_registered(registry, &request.display).await;

    // 2. Base template.
    let doc = templates.load().await.map_err(|e| {
        let TemplateError::NotFound { searched } = e;
        ApplyError::TemplateNotFound { searched }
    })?;

    // 3. Editing pipeline, in order; nothing is written on failure.
    let mut editor = ProfileEditor::new(doc);
    editor.update_primaries(request.saturation).map_err(|e| {
        let EditError::MissingTag(signature) = e;
        ApplyError::MissingTag(signature)
    })?;
    editor.replace_tone_curve(request.gamma);
    editor.set_device_class();
    let (path, token) = store.next_path();
    editor.set_description(request.saturation, request.gamma, token);
    let doc = editor.finish();

    // 4. Conversion at the freshly allocated path.
    if let Err(e) = fs::create_dir_all(store.dir()).await {
        return Err(ApplyError::ConversionFailed {
            message: format!("could not create {}: {}", store.dir().display(), e),
        });
    }
    converter.convert(&doc, &path).await.map_err(|e| match e {
        ToolError::Unavailable { tool } => ApplyError::ToolUnavailable { tool },
        other => ApplyError::ConversionFailed {
            message: other.to_string(),
        },
    })?;

    // 5. Association with the display.
    applier
        .apply(&request.display, &path)
        .await
        .map_err(|e| ApplyError::ApplyFailed {
            message: e.to_string(),
        })?;

    tracing::info!(
        "applied saturation {:.2}, gamma {:.2} to {} via {}",
        request.saturation,
        request.gamma,
        request.display,
        path.display()
    );

    // 6. Retention, best-effort, only after success.
    store.prune().await;

    Ok(path)
}

/// Runs one apply with the production collaborators from `config`.
pub async fn run(config: &ConfigProfile, request: &ApplyRequest) -> Result<PathBuf, ApplyError> {
    let templates = FileTemplateSource::well_known();
    let colormgr = Colormgr::new(config.colormgr(), config.timeout());
    let converter = IccFromXml::new(config.converter(), config.timeout());
    let store = ProfileStore::new(config.cache_dir(), config.keep());

    apply(&templates, &colormgr, &converter, &colormgr, &store, request).await
}
