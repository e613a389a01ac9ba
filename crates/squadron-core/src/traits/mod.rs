// SPDX-FileCopyrightText: 2026 Squadron Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Port definitions at the boundary of the routing core.
//!
//! Both ports extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod classifier;
pub mod responder;

pub use adapter::PluginAdapter;
pub use classifier::ClassifierAdapter;
pub use responder::ResponderAdapter;
