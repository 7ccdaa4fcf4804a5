//! Wire types for the backend channel.
//!
//! One JSON object per message with a `type` discriminator field. There are
//! no correlation IDs: message kind alone determines handling, and at most
//! one recognition or synthesis request is outstanding at a time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Messages sent to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum ClientMessage {
    /// Submit a final transcript to the command interpreter.
    ProcessCommand { command: String },
    /// Ask the backend to run one cloud recognition pass.
    AzureRecognize {},
    /// Ask the backend to synthesize text with a provider voice.
    AzureSynthesize { text: String, voice_name: String },
    /// Forward new cloud credentials. Never stored locally.
    UpdateAzureCredentials { key: String, region: CloudRegion },
}

/// Interpreter result nested inside a cloud recognition result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub text: String,
    pub success: bool,
    #[serde(default)]
    pub command_type: String,
}

/// Messages received from the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum ServerMessage {
    /// Command interpreter result for a locally recognized command.
    Response {
        text: String,
        success: bool,
        #[serde(default)]
        command_type: String,
    },
    /// Cloud recognition finished; `success` covers the recognition step,
    /// `response` carries the interpreter result for the transcript.
    AzureRecognitionResult {
        #[serde(default)]
        transcript: String,
        response: CommandResponse,
        success: bool,
    },
    /// Cloud recognition failed at the provider level.
    AzureRecognitionError { error: String },
    /// Cloud synthesis finished. Informational only.
    AzureSynthesisComplete {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        success: Option<bool>,
    },
    /// Cloud synthesis failed; `text` echoes the request text when known.
    AzureSynthesisError {
        error: String,
        #[serde(default)]
        text: Option<String>,
    },
    /// A timer set earlier has expired.
    TimerComplete {
        text: String,
        #[serde(default)]
        success: bool,
    },
    /// Credential update accepted by the backend.
    AzureCredentialsUpdated {
        #[serde(default)]
        success: bool,
        #[serde(default)]
        message: String,
    },
    /// Credential update rejected.
    AzureCredentialsError {
        #[serde(default)]
        success: bool,
        error: String,
    },
}

/// Accepted cloud provider regions. Closed set; anything else is rejected
/// before a credential update leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudRegion {
    Japaneast,
    Eastus,
    Westus,
    Westeurope,
    Southeastasia,
    Australiaeast,
}

impl CloudRegion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Japaneast => "japaneast",
            Self::Eastus => "eastus",
            Self::Westus => "westus",
            Self::Westeurope => "westeurope",
            Self::Southeastasia => "southeastasia",
            Self::Australiaeast => "australiaeast",
        }
    }
}

impl fmt::Display for CloudRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudRegion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "japaneast" => Ok(Self::Japaneast),
            "eastus" => Ok(Self::Eastus),
            "westus" => Ok(Self::Westus),
            "westeurope" => Ok(Self::Westeurope),
            "southeastasia" => Ok(Self::Southeastasia),
            "australiaeast" => Ok(Self::Australiaeast),
            other => Err(anyhow::anyhow!("unknown cloud region: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn client_messages_use_type_discriminator() {
        let json = serde_json::to_value(ClientMessage::ProcessCommand {
            command: "what time is it".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "process_command");
        assert_eq!(json["command"], "what time is it");

        let json = serde_json::to_value(ClientMessage::AzureRecognize {}).unwrap();
        assert_eq!(json["type"], "azure_recognize");

        let json = serde_json::to_value(ClientMessage::AzureSynthesize {
            text: "hello".into(),
            voice_name: "en-GB-RyanNeural".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "azure_synthesize");
        assert_eq!(json["voice_name"], "en-GB-RyanNeural");
    }

    #[test]
    fn credential_update_carries_key_and_region() {
        let json = serde_json::to_value(ClientMessage::UpdateAzureCredentials {
            key: "secret".into(),
            region: CloudRegion::Japaneast,
        })
        .unwrap();
        assert_eq!(json["type"], "update_azure_credentials");
        assert_eq!(json["key"], "secret");
        assert_eq!(json["region"], "japaneast");
    }

    #[test]
    fn response_message_parses() {
        let msg: ServerMessage = serde_json::from_str(
            r#"{"type":"response","text":"It is 5 PM","success":true,"command_type":"time"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ServerMessage::Response {
                text: "It is 5 PM".into(),
                success: true,
                command_type: "time".into(),
            }
        );
    }

    #[test]
    fn recognition_result_parses_nested_response() {
        let msg: ServerMessage = serde_json::from_str(
            r#"{"type":"azure_recognition_result","transcript":"tell me a joke",
                "response":{"text":"An impasta!","success":true,"command_type":"joke"},
                "success":true}"#,
        )
        .unwrap();
        match msg {
            ServerMessage::AzureRecognitionResult {
                transcript,
                response,
                success,
            } => {
                assert!(success);
                assert_eq!(transcript, "tell me a joke");
                assert_eq!(response.command_type, "joke");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn synthesis_error_text_is_optional() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type":"azure_synthesis_error","error":"boom"}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::AzureSynthesisError {
                error: "boom".into(),
                text: None,
            }
        );
    }

    #[test]
    fn region_parses_only_known_codes() {
        assert_eq!(
            "westeurope".parse::<CloudRegion>().unwrap(),
            CloudRegion::Westeurope
        );
        assert!("mars-north".parse::<CloudRegion>().is_err());
    }
}
