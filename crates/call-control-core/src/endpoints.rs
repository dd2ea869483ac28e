//! REST paths of the telephony API
//!
//! Every path the core calls is built here. They must match the service
//! byte for byte, so keep changes to this file deliberate.

const PRESENCE_QUERY: &str = "detailedTelephonyState=true&sipData=true";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    prefix: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_API_PREFIX)
    }
}

impl Endpoints {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self { prefix: prefix.trim_end_matches('/').to_string() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn extension_info(&self) -> String {
        format!("{}/account/~/extension/~", self.prefix)
    }

    pub fn devices(&self) -> String {
        format!("{}/account/~/extension/~/device", self.prefix)
    }

    pub fn extension_presence(&self) -> String {
        format!("{}/account/~/extension/~/presence?{}", self.prefix, PRESENCE_QUERY)
    }

    pub fn account_presence(&self) -> String {
        format!("{}/account/~/presence?{}", self.prefix, PRESENCE_QUERY)
    }

    pub fn call_out(&self) -> String {
        format!("{}/account/~/telephony/call-out", self.prefix)
    }

    pub fn conference(&self) -> String {
        format!("{}/account/~/telephony/conference", self.prefix)
    }

    pub fn session(&self, session_id: &str) -> String {
        format!("{}/account/~/telephony/sessions/{}", self.prefix, session_id)
    }

    pub fn supervise(&self, session_id: &str) -> String {
        format!("{}/supervise", self.session(session_id))
    }

    pub fn bring_in(&self, session_id: &str) -> String {
        format!("{}/parties/bring-in", self.session(session_id))
    }

    pub fn party(&self, session_id: &str, party_id: &str) -> String {
        format!("{}/parties/{}", self.session(session_id), party_id)
    }

    /// Party sub-resource such as `hold`, `transfer` or `park`
    pub fn party_action(&self, session_id: &str, party_id: &str, action: &str) -> String {
        format!("{}/{}", self.party(session_id, party_id), action)
    }

    pub fn recordings(&self, session_id: &str, party_id: &str) -> String {
        self.party_action(session_id, party_id, "recordings")
    }

    pub fn recording(&self, session_id: &str, party_id: &str, recording_id: &str) -> String {
        format!("{}/{}", self.recordings(session_id, party_id), recording_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.extension_info(), "/restapi/v1.0/account/~/extension/~");
        assert_eq!(
            endpoints.extension_presence(),
            "/restapi/v1.0/account/~/extension/~/presence?detailedTelephonyState=true&sipData=true"
        );
        assert_eq!(
            endpoints.account_presence(),
            "/restapi/v1.0/account/~/presence?detailedTelephonyState=true&sipData=true"
        );
        assert_eq!(
            endpoints.party_action("s-1", "p-1", "hold"),
            "/restapi/v1.0/account/~/telephony/sessions/s-1/parties/p-1/hold"
        );
        assert_eq!(
            endpoints.recording("s-1", "p-1", "r-1"),
            "/restapi/v1.0/account/~/telephony/sessions/s-1/parties/p-1/recordings/r-1"
        );
        assert_eq!(
            endpoints.bring_in("s-1"),
            "/restapi/v1.0/account/~/telephony/sessions/s-1/parties/bring-in"
        );
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let endpoints = Endpoints::new("/restapi/v1.0/");
        assert_eq!(endpoints.call_out(), "/restapi/v1.0/account/~/telephony/call-out");
    }
}
