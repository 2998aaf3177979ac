use super::{PollOutcome, PollSource};
use crate::api::{Achievement, ApiClient, Transport};
use log::debug;

/// Periodic achievement check. Each answer lists only achievements the
/// server has not yet seen acknowledged, so any non-empty list is news.
pub struct AchievementSource<T> {
    client: ApiClient<T>,
}

impl<T: Transport> AchievementSource<T> {
    pub fn new(client: ApiClient<T>) -> Self {
        Self { client }
    }
}

impl<T: Transport> PollSource for AchievementSource<T> {
    type Data = Vec<Achievement>;

    async fn fetch(&mut self, _last_token: &str) -> PollOutcome<Vec<Achievement>> {
        match self.client.check_achievements().await {
            Ok(check) if check.success && !check.new_achievements.is_empty() => {
                let token = check
                    .new_achievements
                    .iter()
                    .map(|a| a.id.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                debug!("{} new achievement(s)", check.new_achievements.len());
                PollOutcome::Updated {
                    token,
                    data: check.new_achievements,
                }
            }
            Ok(_) => PollOutcome::NoChange,
            Err(e) => PollOutcome::Failed(e),
        }
    }
}
