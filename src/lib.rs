//! Fruit Party - relay server and shared-canvas engine for a phone-controlled slashing game
//!
//! Phones run the input side ([`controller`]), a relay ([`relay`], served over [`ws`] and
//! [`http`]) fans their input out, and one projector ([`projector`]) owns the [`game`] and
//! turns it into frames ([`render`]).

pub mod app;
pub mod config;
pub mod controller;
pub mod game;
pub mod http;
pub mod net;
pub mod projector;
pub mod relay;
pub mod render;
pub mod util;
pub mod ws;
