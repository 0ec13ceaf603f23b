const GLOBAL_LOCATION: &str = "global";
const GLOBAL_ENDPOINT: &str = "https://dialogflow.googleapis.com";

/// Identifies the Dialogflow CX agent every request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub project_id: String,
    pub location: String,
    pub agent_id: String,
    /// Replaces the regional host, e.g. for private endpoints.
    pub api_endpoint: Option<String>,
    pub default_language_code: String,
}

impl AgentConfig {
    pub fn new(
        project_id: impl Into<String>,
        location: impl Into<String>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            location: location.into(),
            agent_id: agent_id.into(),
            api_endpoint: None,
            default_language_code: "en".to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        if let Some(endpoint) = self
            .api_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return endpoint.trim_end_matches('/').to_string();
        }
        if self.location == GLOBAL_LOCATION {
            GLOBAL_ENDPOINT.to_string()
        } else {
            format!("https://{}-dialogflow.googleapis.com", self.location)
        }
    }

    pub fn agent_path(&self) -> String {
        format!(
            "projects/{}/locations/{}/agents/{}",
            self.project_id, self.location, self.agent_id
        )
    }

    pub fn detect_intent_url(&self, session_id: &str) -> String {
        format!(
            "{}/v3/{}/sessions/{}:detectIntent",
            self.endpoint(),
            self.agent_path(),
            urlencoding::encode(session_id)
        )
    }
}
