mod contact;
mod place;
mod refresh;

pub use contact::{
    is_valid_email, strip_line_breaks, ContactMessage, ContactOutcome, ContactRequest,
};
pub use place::{violations_error, Coordinates, NewPlace, Place, PlaceType, Violation};
pub use refresh::{
    clamp_limit, ItemState, Outcome, RefreshItem, RefreshResult, RefreshSummary,
    DEFAULT_REFRESH_LIMIT, MAX_REFRESH_LIMIT,
};
