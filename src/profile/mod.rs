//! User profiles: the answers collected during onboarding.

pub mod model;
pub mod routes;

pub use model::{ActivityLevel, FitnessGoal, OnboardingStatus, ProfileUpdate, UserProfile};
pub use routes::{ProfileRouteState, profile_routes};
