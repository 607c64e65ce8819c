// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod demo;
pub mod error;
pub mod ids;
pub mod model;
pub mod present;
pub mod state;

pub use error::*;
pub use ids::*;
pub use model::*;
pub use state::*;
