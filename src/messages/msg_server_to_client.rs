use serde::Serialize;
use serde_json::Value;

use crate::role::Role;

// Server to Client events
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data")]
pub enum ServerToClient {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "user")]
    User,

    #[serde(rename = "ballMoved")]
    BallMoved(Value),
    #[serde(rename = "adminButtonClicked")]
    AdminButtonClicked(Value),
}

impl ServerToClient {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize {:?}: {}", self, e);
            String::new()
        })
    }

    pub fn role(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::Viewer => Self::User,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_events_have_no_data() {
        assert_eq!(ServerToClient::role(Role::Admin).to_json(), r#"{"event":"admin"}"#);
        assert_eq!(ServerToClient::role(Role::Viewer).to_json(), r#"{"event":"user"}"#);
    }

    #[test]
    fn test_relayed_events_carry_payload() {
        let moved: Value =
            serde_json::from_str(&ServerToClient::BallMoved(json!({"x": 10, "y": 20})).to_json())
                .unwrap();
        assert_eq!(moved, json!({"event": "ballMoved", "data": {"x": 10, "y": 20}}));

        let clicked: Value =
            serde_json::from_str(&ServerToClient::AdminButtonClicked(json!("Button 1")).to_json())
                .unwrap();
        assert_eq!(clicked, json!({"event": "adminButtonClicked", "data": "Button 1"}));
    }
}
