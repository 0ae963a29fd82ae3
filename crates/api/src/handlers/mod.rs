pub mod assets;
pub mod cities;
pub mod config;
pub mod invitation;
pub mod presets;
