use super::{PollOutcome, PollSource};
use crate::api::{ApiClient, BattleState, Transport};
use crate::error::ClickerError;

/// Long-poll of one battle's status. The server answers with a content hash;
/// a matching `last_check` means nothing moved.
pub struct BattleSource<T> {
    client: ApiClient<T>,
    battle_id: String,
}

impl<T: Transport> BattleSource<T> {
    pub fn new(client: ApiClient<T>, battle_id: impl Into<String>) -> Self {
        Self {
            client,
            battle_id: battle_id.into(),
        }
    }

    pub fn battle_id(&self) -> &str {
        &self.battle_id
    }
}

impl<T: Transport> PollSource for BattleSource<T> {
    type Data = BattleState;

    async fn fetch(&mut self, last_token: &str) -> PollOutcome<BattleState> {
        let update = match self.client.battle_updates(&self.battle_id, last_token).await {
            Ok(update) => update,
            Err(e) => return PollOutcome::Failed(e),
        };
        if !update.has_update {
            return PollOutcome::NoChange;
        }
        match update.data {
            Some(data) => PollOutcome::Updated {
                token: update.hash,
                data,
            },
            None => PollOutcome::Failed(ClickerError::Payload(
                "battle update without data".to_string(),
            )),
        }
    }

    fn is_terminal(&self, data: &BattleState) -> bool {
        data.is_finished()
    }
}
