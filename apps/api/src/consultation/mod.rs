// Career coach consultations: scripted response engine, session lifecycle and
// the store the sessions persist through.

pub mod engine;
pub mod handlers;
pub mod memory_store;
pub mod pg_store;
pub mod prompts;
pub mod registry;
pub mod session;
pub mod store;

#[cfg(test)]
pub mod testing;
