use std::sync::Arc;

use tracing::info;

use super::{SettingsInput, SettingsRepository, UserSettings};
use crate::access::Principal;
use crate::clock::Clock;
use crate::error::ErrorKind;
use crate::store::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Musisz być zalogowany.")]
    Unauthenticated,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SettingsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettingsError::Unauthenticated => ErrorKind::Unauthenticated,
            SettingsError::Repository(err) => err.kind(),
        }
    }
}

pub struct SettingsService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> SettingsService<R>
where
    R: SettingsRepository + 'static,
{
    pub fn new(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    pub fn settings(&self, principal: Option<&Principal>) -> Result<Option<UserSettings>, SettingsError> {
        let principal = principal.ok_or(SettingsError::Unauthenticated)?;
        Ok(self.repository.settings(&principal.user_id)?)
    }

    /// Upserts the caller's settings row.
    pub fn update_settings(
        &self,
        principal: Option<&Principal>,
        input: SettingsInput,
    ) -> Result<UserSettings, SettingsError> {
        let principal = principal.ok_or(SettingsError::Unauthenticated)?;
        let settings = UserSettings {
            user_id: principal.user_id,
            contact_email: trimmed(input.contact_email),
            chat_name: trimmed(input.chat_name),
            phone: trimmed(input.phone),
            region_id: input.region_id,
            district_id: input.district_id,
            city: trimmed(input.city),
            updated_at: self.clock.now(),
        };
        self.repository.upsert_settings(settings.clone())?;
        info!(user_id = %principal.user_id, "user settings updated");
        Ok(settings)
    }
}

fn trimmed(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::UserId;
    use crate::clock::FixedClock;
    use crate::store::InMemoryStore;
    use chrono::{TimeZone, Utc};

    fn service() -> SettingsService<InMemoryStore> {
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap());
        SettingsService::new(Arc::new(InMemoryStore::default()), Arc::new(clock))
    }

    #[test]
    fn blank_fields_are_stored_as_missing() {
        let service = service();
        let principal = Principal::member(UserId::new());
        let saved = service
            .update_settings(
                Some(&principal),
                SettingsInput {
                    contact_email: "  jan@example.com ".into(),
                    chat_name: "   ".into(),
                    city: "Kraków".into(),
                    ..SettingsInput::default()
                },
            )
            .expect("settings saved");

        assert_eq!(saved.contact_email.as_deref(), Some("jan@example.com"));
        assert_eq!(saved.chat_name, None);
        assert_eq!(saved.city.as_deref(), Some("Kraków"));
        assert_eq!(
            service.settings(Some(&principal)).expect("read back"),
            Some(saved)
        );
    }

    #[test]
    fn second_update_replaces_previous_row() {
        let service = service();
        let principal = Principal::member(UserId::new());
        service
            .update_settings(
                Some(&principal),
                SettingsInput {
                    phone: "600100200".into(),
                    ..SettingsInput::default()
                },
            )
            .expect("first save");
        let saved = service
            .update_settings(Some(&principal), SettingsInput::default())
            .expect("second save");

        assert_eq!(saved.phone, None);
        let stored = service
            .settings(Some(&principal))
            .expect("read back")
            .expect("row exists");
        assert_eq!(stored.phone, None);
    }

    #[test]
    fn anonymous_callers_are_rejected() {
        let error = service()
            .update_settings(None, SettingsInput::default())
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Unauthenticated);
    }
}
