pub mod doubles;
pub mod entities;

#[allow(unused_imports)]
pub use doubles::{EventLog, FlakyCache, InMemoryTodoStore};
#[allow(unused_imports)]
pub use entities::{fast_config, page, seed_todos, service_with};
