use serde::{Deserialize, Serialize};

/// Most recent outcome shown to the user.
///
/// The kind is carried by the variant; the presentation layer never inspects
/// the message text to decide how to style it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Status {
    #[default]
    Idle,
    Success(String),
    Error(String),
    Pending(String),
}

/// Discriminant of [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Idle,
    Success,
    Error,
    Pending,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Idle => "idle",
            StatusKind::Success => "success",
            StatusKind::Error => "error",
            StatusKind::Pending => "pending",
        }
    }
}

/// A status flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedStatus {
    pub kind: StatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Status {
    pub fn success(message: impl Into<String>) -> Self {
        Status::Success(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Status::Error(message.into())
    }

    pub fn pending(message: impl Into<String>) -> Self {
        Status::Pending(message.into())
    }

    pub fn kind(&self) -> StatusKind {
        match self {
            Status::Idle => StatusKind::Idle,
            Status::Success(_) => StatusKind::Success,
            Status::Error(_) => StatusKind::Error,
            Status::Pending(_) => StatusKind::Pending,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Status::Idle => None,
            Status::Success(m) | Status::Error(m) | Status::Pending(m) => Some(m),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }

    pub fn render(&self) -> RenderedStatus {
        RenderedStatus {
            kind: self.kind(),
            message: self.message().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_comes_from_variant_not_text() {
        // A success message that happens to mention "Error" stays a success.
        let status = Status::success("No Error tickets found");
        assert_eq!(status.kind(), StatusKind::Success);
        assert!(!status.is_error());

        // An error without the word stays an error.
        let status = Status::error("Invalid wallet address");
        assert_eq!(status.kind(), StatusKind::Error);
        assert!(status.is_error());
    }

    #[test]
    fn test_render() {
        assert_eq!(
            Status::Idle.render(),
            RenderedStatus {
                kind: StatusKind::Idle,
                message: None
            }
        );

        let rendered = Status::pending("Swap Offer Created! Status: Pending").render();
        assert_eq!(rendered.kind, StatusKind::Pending);
        assert_eq!(
            rendered.message.as_deref(),
            Some("Swap Offer Created! Status: Pending")
        );
    }

    #[test]
    fn test_serialization() {
        let json = serde_json::to_value(Status::error("boom")).unwrap();
        assert_eq!(json["kind"], "error");
        assert_eq!(json["message"], "boom");

        let json = serde_json::to_value(Status::Idle).unwrap();
        assert_eq!(json["kind"], "idle");

        let rendered = serde_json::to_value(Status::success("ok").render()).unwrap();
        assert_eq!(rendered["kind"], "success");
        assert_eq!(StatusKind::Pending.as_str(), "pending");
    }
}
