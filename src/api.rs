//! Backend endpoints, their JSON shapes and the transport seam.
//!
//! The server owns all real game state. This module only knows how to ask for
//! it and how to read the fields the client consumes.

use crate::error::ClickerError;
use crate::utils::percent_encode;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<String>,
}

impl ApiRequest {
    /// Mutating requests must carry the CSRF header.
    pub fn is_mutating(&self) -> bool {
        self.method == Method::Post
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint<'a> {
    AchievementsCheck,
    MarkAchievementSeen(u64),
    AchievementProgress,
    AutoClickerInfo { player_id: &'a str },
    AutoClick,
    UpdateCoins,
    BattleUpdates { battle_id: &'a str, last_check: &'a str },
    BattleClick { battle_id: &'a str },
}

impl Endpoint<'_> {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::AchievementProgress
            | Endpoint::AutoClickerInfo { .. }
            | Endpoint::BattleUpdates { .. } => Method::Get,
            _ => Method::Post,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Endpoint::AchievementsCheck => "/achievements/check/".to_string(),
            Endpoint::MarkAchievementSeen(id) => format!("/achievements/{}/mark_seen/", id),
            Endpoint::AchievementProgress => "/achievements/progress/".to_string(),
            Endpoint::AutoClickerInfo { player_id } => {
                format!("/player/{}/auto_clicker_info/", player_id)
            }
            Endpoint::AutoClick => "/auto_click/".to_string(),
            Endpoint::UpdateCoins => "/update_coins/".to_string(),
            Endpoint::BattleUpdates {
                battle_id,
                last_check,
            } => format!(
                "/api/battle/{}/updates/?last_check={}",
                percent_encode(battle_id),
                percent_encode(last_check)
            ),
            Endpoint::BattleClick { battle_id } => {
                format!("/api/battle/{}/click/", percent_encode(battle_id))
            }
        }
    }

    pub fn request(&self, body: Option<String>) -> ApiRequest {
        ApiRequest {
            method: self.method(),
            path: self.path(),
            body,
        }
    }
}

/// Sends a request and yields the raw response body. Non-success statuses
/// come back as `ClickerError::HttpStatus`.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn send(&self, request: ApiRequest) -> Result<String, ClickerError>;
}

// ---- Payloads --------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    #[serde(other)]
    Unknown,
}

impl Rarity {
    /// Popup accent colour.
    pub fn color(self) -> &'static str {
        match self {
            Rarity::Common => "#808080",
            Rarity::Uncommon => "#1EFF00",
            Rarity::Rare => "#0070DD",
            Rarity::Epic => "#A335EE",
            Rarity::Legendary => "#FF8000",
            Rarity::Unknown => "#FFD700",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Achievement {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub reward_coins: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AchievementCheck {
    pub success: bool,
    #[serde(default)]
    pub new_achievements: Vec<Achievement>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SuccessFlag {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Progress {
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NextAchievement {
    #[serde(default)]
    pub icon: String,
    pub name: String,
    pub progress: Progress,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AchievementProgress {
    pub success: bool,
    #[serde(default)]
    pub next_achievements: Vec<NextAchievement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AutoClickerInfo {
    #[serde(default)]
    pub has_auto_clicker: bool,
    #[serde(default)]
    pub clicks_per_second: u64,
}

impl AutoClickerInfo {
    /// Power the local tick should apply.
    pub fn effective_power(&self) -> u64 {
        if self.has_auto_clicker {
            self.clicks_per_second
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutoClickResult {
    pub success: bool,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub auto_clicks: u64,
    #[serde(default)]
    pub coins_earned: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BattleState {
    pub status: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BattleState {
    pub fn is_finished(&self) -> bool {
        self.status == "finished"
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BattleUpdate {
    #[serde(default)]
    pub has_update: bool,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub timeout: bool,
    #[serde(default)]
    pub data: Option<BattleState>,
}

#[derive(Debug, Serialize)]
struct UpdateCoinsBody {
    coins: u64,
    click_power: u64,
}

#[derive(Debug, Serialize)]
struct AutoClickBody<'a> {
    player_id: &'a str,
}

// ---- Client ----------------------------------------------------------------

/// Typed calls over any transport.
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn call<R: for<'de> Deserialize<'de>>(
        &self,
        endpoint: Endpoint<'_>,
        body: Option<String>,
    ) -> Result<R, ClickerError> {
        let request = endpoint.request(body);
        debug!("{} {}", request.method.as_str(), request.path);
        let text = self.transport.send(request).await?;
        Ok(serde_json::from_str(&text)?)
    }

    pub async fn check_achievements(&self) -> Result<AchievementCheck, ClickerError> {
        self.call(Endpoint::AchievementsCheck, Some("{}".to_string())).await
    }

    pub async fn mark_achievement_seen(&self, id: u64) -> Result<SuccessFlag, ClickerError> {
        self.call(Endpoint::MarkAchievementSeen(id), None).await
    }

    pub async fn achievement_progress(&self) -> Result<AchievementProgress, ClickerError> {
        self.call(Endpoint::AchievementProgress, None).await
    }

    pub async fn auto_clicker_info(&self, player_id: &str) -> Result<AutoClickerInfo, ClickerError> {
        self.call(Endpoint::AutoClickerInfo { player_id }, None).await
    }

    pub async fn auto_click(&self, player_id: &str) -> Result<AutoClickResult, ClickerError> {
        let body = serde_json::to_string(&AutoClickBody { player_id })?;
        self.call(Endpoint::AutoClick, Some(body)).await
    }

    /// Fire-and-forget save; the response body is ignored.
    pub async fn update_coins(&self, coins: u64, click_power: u64) -> Result<(), ClickerError> {
        let body = serde_json::to_string(&UpdateCoinsBody { coins, click_power })?;
        self.transport
            .send(Endpoint::UpdateCoins.request(Some(body)))
            .await
            .map(|_| ())
    }

    pub async fn battle_updates(&self, battle_id: &str, last_check: &str) -> Result<BattleUpdate, ClickerError> {
        self.call(
            Endpoint::BattleUpdates {
                battle_id,
                last_check,
            },
            None,
        )
        .await
    }

    pub async fn battle_click(&self, battle_id: &str) -> Result<serde_json::Value, ClickerError> {
        self.call(Endpoint::BattleClick { battle_id }, None).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Replays canned responses in order and records every request.
    #[derive(Clone, Default)]
    pub(crate) struct ScriptedTransport {
        responses: Rc<RefCell<VecDeque<Result<String, ClickerError>>>>,
        pub requests: Rc<RefCell<Vec<ApiRequest>>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(responses: Vec<Result<&str, ClickerError>>) -> Self {
            let responses = responses
                .into_iter()
                .map(|r| r.map(str::to_string))
                .collect();
            Self {
                responses: Rc::new(RefCell::new(responses)),
                requests: Rc::default(),
            }
        }

        pub(crate) fn paths(&self) -> Vec<String> {
            self.requests.borrow().iter().map(|r| r.path.clone()).collect()
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&self, request: ApiRequest) -> Result<String, ClickerError> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(ClickerError::Network("script exhausted".into())))
        }
    }

    #[test]
    fn endpoint_paths_and_methods() {
        assert_eq!(
            Endpoint::BattleUpdates {
                battle_id: "7",
                last_check: "abc"
            }
            .path(),
            "/api/battle/7/updates/?last_check=abc"
        );
        assert_eq!(
            Endpoint::BattleUpdates {
                battle_id: "7",
                last_check: "a+b&c=d e"
            }
            .path(),
            "/api/battle/7/updates/?last_check=a%2Bb%26c%3Dd%20e"
        );
        assert_eq!(Endpoint::MarkAchievementSeen(3).path(), "/achievements/3/mark_seen/");
        assert_eq!(Endpoint::AchievementProgress.method(), Method::Get);
        assert!(Endpoint::UpdateCoins.request(None).is_mutating());
    }

    #[test]
    fn achievement_check_parses_and_defaults_rarity() {
        let transport = ScriptedTransport::new(vec![Ok(
            r#"{"success": true, "new_achievements": [
                {"id": 1, "name": "First", "description": "d", "icon": "fas fa-star", "rarity": "epic", "reward_coins": 50},
                {"id": 2, "name": "Odd", "rarity": "mythic"}
            ]}"#,
        )]);
        let client = ApiClient::new(transport.clone());
        let check = block_on(client.check_achievements()).unwrap();
        assert_eq!(check.new_achievements[0].rarity.color(), "#A335EE");
        assert_eq!(check.new_achievements[1].rarity, Rarity::Unknown);
        assert_eq!(check.new_achievements[1].rarity.color(), "#FFD700");
        assert_eq!(transport.requests.borrow()[0].body.as_deref(), Some("{}"));
    }

    #[test]
    fn malformed_body_is_a_payload_error() {
        let client = ApiClient::new(ScriptedTransport::new(vec![Ok("<html>")]));
        assert!(matches!(
            block_on(client.auto_clicker_info("5")),
            Err(ClickerError::Payload(_))
        ));
    }

    #[test]
    fn auto_click_sends_player_id() {
        let transport = ScriptedTransport::new(vec![Ok(
            r#"{"success": true, "coins": 10, "clicks": 4, "auto_clicks": 1, "coins_earned": 2}"#,
        )]);
        let client = ApiClient::new(transport.clone());
        let result = block_on(client.auto_click("42")).unwrap();
        assert_eq!(result.coins, 10);
        assert_eq!(
            transport.requests.borrow()[0].body.as_deref(),
            Some(r#"{"player_id":"42"}"#)
        );
    }

    #[test]
    fn battle_state_keeps_extra_fields() {
        let update: BattleUpdate = serde_json::from_str(
            r#"{"has_update": true, "hash": "h2", "timeout": false,
                "data": {"status": "finished", "winner": "bob", "score": [3, 1]}}"#,
        )
        .unwrap();
        let data = update.data.unwrap();
        assert!(data.is_finished());
        assert_eq!(data.extra["winner"], "bob");
    }

    #[test]
    fn lost_auto_clicker_has_no_power() {
        let info = AutoClickerInfo {
            has_auto_clicker: false,
            clicks_per_second: 5,
        };
        assert_eq!(info.effective_power(), 0);
    }
}
