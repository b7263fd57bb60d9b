//! Core library for the price-volume order book client.
//!
//! The binary (`main.rs`) wires these modules to a live node; everything
//! below the [`exchange::ExchangeApi`] and [`render::Renderer`] traits is
//! independent of the chain and the front end.

pub mod book;
pub mod cli;
pub mod codec;
pub mod config;
pub mod errors;
pub mod exchange;
pub mod form;
pub mod models;
pub mod render;
pub mod session;
pub mod submission;
pub mod sync;
pub mod utils;

#[cfg(test)]
mod testing;
