pub mod orientation;
pub mod playback;
pub mod presentation;
pub mod sensor;
pub mod session;
pub mod settings;
pub mod sfx;
pub mod trigger;
