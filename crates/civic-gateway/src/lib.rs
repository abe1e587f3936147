// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Civic webhook engine.
//!
//! Serves the WhatsApp Cloud API webhook (handshake and deliveries), plus
//! health and Prometheus metrics endpoints.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
