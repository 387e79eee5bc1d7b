//! Services the engine hands over to resolvers through the shared context.

pub mod fetch;
pub mod pubsub;
