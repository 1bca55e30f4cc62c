//! Default presentation of errors to a user.

use tracing::{error, warn};

use dualforce_client::Error;

/// How an error should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Transient, non-blocking notice.
    Toast,
    /// Blocking dialog that needs acknowledgement.
    Modal,
}

impl Presentation {
    /// 4xx errors get a toast, everything else a modal.
    pub fn for_error(err: &Error) -> Self {
        if err.is_client_error() {
            Presentation::Toast
        } else {
            Presentation::Modal
        }
    }
}

/// Host UI hooks for showing errors.
pub trait Presenter: Send + Sync {
    fn toast(&self, title: &str, message: &str);
    fn modal(&self, title: &str, message: &str);
}

/// Presenter that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn toast(&self, title: &str, message: &str) {
        warn!(title, message, "salesforce error");
    }

    fn modal(&self, title: &str, message: &str) {
        error!(title, message, "salesforce error");
    }
}

/// Show `err` through `presenter` and report which presentation was used.
pub fn show_error(err: &Error, presenter: &dyn Presenter) -> Presentation {
    let presentation = Presentation::for_error(err);
    let title = match (err.http_status, err.code.as_deref()) {
        (0, _) => "Salesforce unreachable".to_string(),
        (status, Some(code)) => format!("Salesforce error {status} ({code})"),
        (status, None) => format!("Salesforce error {status}"),
    };
    let message = err.message();

    match presentation {
        Presentation::Toast => presenter.toast(&title, &message),
        Presentation::Modal => presenter.modal(&title, &message),
    }
    presentation
}
