pub mod distributions;
pub mod logging;
pub mod security;

// Design content: effectors, styles and the damage simulator
pub mod effectors;
pub mod effect_styles;
pub mod weapon_analysis;

// GitHub-backed design document store
pub mod store;
