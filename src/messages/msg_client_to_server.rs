use serde::Deserialize;
use serde_json::Value;

/// Raw frame as it arrives on the socket, before the event name is looked at.
#[derive(Deserialize, Debug, Clone)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

// Client to Server events
#[derive(Debug, Clone, PartialEq)]
pub enum ClientToServer {
    // Role re-requests
    Admin,
    User,

    // Relayed to the viewer group, payload untouched
    BallMoved(Value),
    AdminButtonClicked(Value),

    // Sent by clients but never relayed
    ViewerButtonClicked(Value),
    BallPosition(Value),

    Unhandled { event: String },
}

impl ClientToServer {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let envelope: Envelope = serde_json::from_str(text)?;
        Ok(Self::from_envelope(envelope))
    }

    pub fn from_envelope(envelope: Envelope) -> Self {
        let Envelope { event, data } = envelope;
        match event.as_str() {
            "admin" => Self::Admin,
            "user" | "viewer" => Self::User,
            "ballMoved" => Self::BallMoved(data),
            "adminButtonClicked" => Self::AdminButtonClicked(data),
            "userButtonClicked" | "viewerButtonClicked" => Self::ViewerButtonClicked(data),
            "ballPosition" => Self::BallPosition(data),
            _ => Self::Unhandled { event },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::BallMoved(_) => "ballMoved",
            Self::AdminButtonClicked(_) => "adminButtonClicked",
            Self::ViewerButtonClicked(_) => "userButtonClicked",
            Self::BallPosition(_) => "ballPosition",
            Self::Unhandled { event } => event,
        }
    }
}
