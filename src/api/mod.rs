//! HTTP API surface.
//!
//! Endpoints:
//! - `GET /api/health` - service status
//! - `GET /api/tasks` - computed list view (filter, search, sort)
//! - `POST /api/tasks` - create a task from free text
//! - `PUT /api/tasks/:id` - replace a task record
//! - `DELETE /api/tasks/:id` - delete a task
//! - `POST /api/tasks/:id/decompose` - generate subtasks
//! - `POST /api/tasks/prioritize` - assistant-driven smart ordering
//! - `GET /api/advice` - daily coaching string
//! - `GET /api/stats` - store-wide counters
//! - `GET|PUT /api/notifications/permission` - reminder authorization

mod routes;
pub mod types;

pub use routes::{serve, AppState};
