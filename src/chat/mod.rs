//! Coach chat over the user's routine.

pub mod coach;
pub mod routes;

pub use coach::{ChatTurn, CoachChat};
pub use routes::{ChatRouteState, chat_routes};
