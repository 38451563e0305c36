use iva_core::text;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("request timed out")]
    Timeout,

    #[error("could not reach server: {0}")]
    Unreachable(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl NetworkError {
    pub fn user_message(&self) -> String {
        text::CONNECTION_FAILED.into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("login rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("already signed in")]
    AlreadyAuthenticated,

    #[error("superseded by a newer login attempt")]
    Superseded,
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Rejected { message, .. } => message.clone(),
            AuthError::Network(e) => e.user_message(),
            AuthError::AlreadyAuthenticated | AuthError::Superseded => text::LOGIN_FAILED.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegError {
    #[error("registration rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("already signed in")]
    AlreadyAuthenticated,
}

impl RegError {
    pub fn user_message(&self) -> String {
        match self {
            RegError::Rejected { message, .. } => message.clone(),
            RegError::Network(e) => e.user_message(),
            RegError::AlreadyAuthenticated => text::REGISTRATION_FAILED.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("recording cancelled before the device opened")]
    Cancelled,

    #[error("not signed in")]
    NotAuthenticated,
}

impl RecorderError {
    pub fn user_message(&self) -> String {
        match self {
            RecorderError::DeviceUnavailable(_) => text::MICROPHONE_DENIED.into(),
            RecorderError::AlreadyRecording => "Already recording".into(),
            RecorderError::Cancelled => "Recording cancelled".into(),
            RecorderError::NotAuthenticated => "Please log in first".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("server returned status {status}")]
    Rejected { status: u16 },

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("response arrived after the session ended")]
    Stale,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("nothing to send")]
    EmptyMessage,
}

impl UploadError {
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Rejected { status } => format!("Server error ({status})"),
            UploadError::Network(e) => e.user_message(),
            UploadError::Stale => "Session ended".into(),
            UploadError::NotAuthenticated => "Please log in first".into(),
            UploadError::EmptyMessage => "Nothing to send".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_follow_backend_detail_or_generic_text() {
        let e = AuthError::Rejected {
            status: 401,
            message: "Invalid credentials".into(),
        };
        assert_eq!(e.user_message(), "Invalid credentials");
        assert_eq!(
            AuthError::from(NetworkError::Timeout).user_message(),
            text::CONNECTION_FAILED
        );
        assert_eq!(
            RecorderError::DeviceUnavailable("denied".into()).user_message(),
            text::MICROPHONE_DENIED
        );
    }

    #[test]
    fn upload_errors_have_short_messages() {
        assert_eq!(
            UploadError::Network(NetworkError::Timeout).user_message(),
            text::CONNECTION_FAILED
        );
        assert_eq!(
            NetworkError::Malformed("bad json".into()).user_message(),
            text::CONNECTION_FAILED
        );
        assert_eq!(
            UploadError::Rejected { status: 500 }.user_message(),
            "Server error (500)"
        );
        assert_eq!(UploadError::EmptyMessage.user_message(), "Nothing to send");
        assert_eq!(UploadError::NotAuthenticated.user_message(), "Please log in first");
    }
}
