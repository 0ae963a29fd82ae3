//! Domain core of the invitation service.
//!
//! - [`preset`]: layout types and the structural validator.
//! - [`config_store`]: whole-document JSON configuration and its edits.
//! - [`assets`]: filename-addressed font and template stores.
//! - [`compose`]: draws form text onto a template and encodes JPEG.
//! - [`form`] / [`city`]: request and contact types.

pub mod assets;
pub mod city;
pub mod compose;
pub mod config_store;
pub mod error;
pub mod form;
pub mod preset;
