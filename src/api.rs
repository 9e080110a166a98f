pub mod interface;
pub mod server;

pub use interface::{ContactAPI, DynAPI, HealthAPI, PlaceAPI, RatingAPI, API};
pub use server::{build_router, serve, RateLimit, ServerOptions};
