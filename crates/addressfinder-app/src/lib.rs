// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod config;
pub mod filter;
pub mod list;
pub mod service;
pub mod session;
pub mod status;
pub mod suggestion;

pub use config::*;
pub use filter::*;
pub use list::*;
pub use service::*;
pub use session::*;
pub use status::*;
pub use suggestion::*;
