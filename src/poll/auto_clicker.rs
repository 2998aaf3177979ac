use super::{PollOutcome, PollSource};
use crate::api::{ApiClient, AutoClickerInfo, Transport};

/// Periodic check of the player's auto-clicker. The endpoint has no change
/// token, so one is derived from the fields the client consumes.
pub struct AutoClickerSource<T> {
    client: ApiClient<T>,
    player_id: String,
}

impl<T: Transport> AutoClickerSource<T> {
    pub fn new(client: ApiClient<T>, player_id: impl Into<String>) -> Self {
        Self {
            client,
            player_id: player_id.into(),
        }
    }
}

fn token(info: &AutoClickerInfo) -> String {
    format!("{}:{}", info.has_auto_clicker, info.clicks_per_second)
}

impl<T: Transport> PollSource for AutoClickerSource<T> {
    type Data = AutoClickerInfo;

    async fn fetch(&mut self, last_token: &str) -> PollOutcome<AutoClickerInfo> {
        match self.client.auto_clicker_info(&self.player_id).await {
            Ok(info) if token(&info) == last_token => PollOutcome::NoChange,
            Ok(info) => PollOutcome::Updated {
                token: token(&info),
                data: info,
            },
            Err(e) => PollOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::ScriptedTransport;
    use futures::executor::block_on;

    #[test]
    fn first_answer_is_always_news() {
        let transport = ScriptedTransport::new(vec![
            Ok(r#"{"has_auto_clicker": true, "clicks_per_second": 3}"#),
            Ok(r#"{"has_auto_clicker": true, "clicks_per_second": 3}"#),
            Ok(r#"{"has_auto_clicker": true, "clicks_per_second": 5}"#),
        ]);
        let mut src = AutoClickerSource::new(ApiClient::new(transport.clone()), "12");

        let first = block_on(src.fetch(""));
        assert_eq!(
            first,
            PollOutcome::Updated {
                token: "true:3".into(),
                data: AutoClickerInfo {
                    has_auto_clicker: true,
                    clicks_per_second: 3
                }
            }
        );
        assert_eq!(block_on(src.fetch("true:3")), PollOutcome::NoChange);
        assert!(matches!(block_on(src.fetch("true:3")), PollOutcome::Updated { .. }));
        assert_eq!(transport.paths()[0], "/player/12/auto_clicker_info/");
    }
}
