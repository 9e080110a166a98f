pub mod google_places;
pub mod mailer;

pub use google_places::{GooglePlacesClient, PlaceDetails, RatingProvider};
pub use mailer::{Mailer, OutgoingMail, SmtpMailer};
