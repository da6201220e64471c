use super::lifecycle::TransitionError;
use super::storage::StorageError;
use crate::error::ErrorKind;
use crate::store::RepositoryError;

/// Mutations that owners may perform themselves and moderators may perform on anyone's listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingAction {
    Renew,
    Archive,
    Delete,
}

impl ListingAction {
    /// "Brak uprawnień do ___ tego ogłoszenia."
    pub fn genitive(self) -> &'static str {
        match self {
            ListingAction::Renew => "odświeżenia",
            ListingAction::Archive => "zakończenia",
            ListingAction::Delete => "usunięcia",
        }
    }

    /// "Konfiguracja administratora nie pozwala na ___ cudzego ogłoszenia."
    pub fn accusative(self) -> &'static str {
        match self {
            ListingAction::Renew => "odświeżenie",
            ListingAction::Archive => "zakończenie",
            ListingAction::Delete => "usunięcie",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingValidationError {
    #[error("Tytuł jest wymagany.")]
    TitleRequired,
    #[error("Telefon kontaktowy jest wymagany i musi składać się z 9 cyfr (spacje są ignorowane).")]
    InvalidPhone,
    #[error("Cena musi być poprawną liczbą nieujemną (do dwóch miejsc po przecinku).")]
    InvalidPrice,
    #[error("W tej kategorii cena musi być większa od zera.")]
    PriceRequired,
    #[error("Wybierz okres publikacji.")]
    PeriodRequired,
    #[error("Wybrana kategoria nie jest dostępna.")]
    CategoryUnavailable,
    #[error("Wystawianie dozwolone tylko w kategorii końcowej. Wybierz najgłębszą podkategorię.")]
    CategoryNotLeaf,
    #[error("Wybrany okres publikacji nie jest dostępny w tej kategorii.")]
    PeriodNotInCategory,
    #[error("Wybrany okres publikacji nie jest dostępny.")]
    PeriodUnavailable,
    #[error("To ogłoszenie nie ma przypisanej kategorii, nie można obliczyć okresu publikacji.")]
    MissingCategory,
    #[error("Filtr nie jest przypisany do wybranej kategorii.")]
    UnknownFilter,
    #[error("Wybrana opcja nie należy do tego filtra.")]
    InvalidFilterOption,
    #[error("Wartość filtra liczbowego musi być liczbą.")]
    InvalidNumberFilter,
    #[error("Nieprawidłowy numer zdjęcia.")]
    InvalidImageSlot,
}

impl ListingValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ListingValidationError::CategoryUnavailable => ErrorKind::NotFound,
            _ => ErrorKind::Validation,
        }
    }
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("Musisz być zalogowany.")]
    Unauthenticated,
    #[error("Brak uprawnień do {} tego ogłoszenia.", .0.genitive())]
    Forbidden(ListingAction),
    #[error("Konfiguracja administratora nie pozwala na {} cudzego ogłoszenia.", .0.accusative())]
    ElevatedAccessUnavailable(ListingAction),
    #[error("Ogłoszenie nie istnieje lub nie masz do niego dostępu.")]
    NotFound,
    #[error("Nie znaleziono ogłoszenia.")]
    PublicNotFound,
    #[error("Brak podanych danych kontaktowych.")]
    NoContact,
    #[error(transparent)]
    Validation(#[from] ListingValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("Błąd uploadu zdjęcia {slot}: {source}")]
    Upload { slot: usize, source: StorageError },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ListingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ListingError::Unauthenticated => ErrorKind::Unauthenticated,
            ListingError::Forbidden(_) | ListingError::ElevatedAccessUnavailable(_) => {
                ErrorKind::Forbidden
            }
            ListingError::NotFound | ListingError::PublicNotFound | ListingError::NoContact => {
                ErrorKind::NotFound
            }
            ListingError::Validation(err) => err.kind(),
            ListingError::Transition(_) => ErrorKind::Conflict,
            ListingError::Upload { .. } => ErrorKind::Dependency,
            ListingError::Repository(err) => err.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_messages_inflect_the_action() {
        assert_eq!(
            ListingError::Forbidden(ListingAction::Delete).to_string(),
            "Brak uprawnień do usunięcia tego ogłoszenia."
        );
        assert_eq!(
            ListingError::ElevatedAccessUnavailable(ListingAction::Renew).to_string(),
            "Konfiguracja administratora nie pozwala na odświeżenie cudzego ogłoszenia."
        );
    }

    #[test]
    fn upload_errors_number_slots_from_one() {
        let err = ListingError::Upload {
            slot: 2,
            source: StorageError::Rejected("quota exceeded".to_string()),
        };
        assert_eq!(err.to_string(), "Błąd uploadu zdjęcia 2: quota exceeded");
        assert_eq!(err.kind(), ErrorKind::Dependency);
    }

    #[test]
    fn unavailable_category_is_a_referential_error() {
        let err = ListingError::from(ListingValidationError::CategoryUnavailable);
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = ListingError::from(ListingValidationError::PriceRequired);
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
