//! Built-in effects, loadable by path through a [`Loader`].

use crate::loader::{Factory, Loader};

pub mod color_plasma;
pub mod digital_clock;
pub mod expanding_circle;
pub mod fireworks;
pub mod font;
pub mod key_tester;
pub mod led_tracker;
pub mod matrix_rain;
pub mod pong;
pub mod static_noise;

/// Paths loaded at startup unless settings say otherwise.
pub const DEFAULT_LOAD_ORDER: &[&str] = &[
    "effects/digital_clock",
    "effects/color_plasma",
    "effects/expanding_circle",
    "effects/static_noise",
    "effects/matrix_rain",
    "effects/fireworks",
    "effects/key_tester",
    "effects/led_tracker",
    "effects/pong",
];

pub fn catalog() -> Vec<(&'static str, Factory)> {
    vec![
        ("effects/digital_clock", digital_clock::register as Factory),
        ("effects/color_plasma", color_plasma::register as Factory),
        ("effects/expanding_circle", expanding_circle::register as Factory),
        ("effects/static_noise", static_noise::register as Factory),
        ("effects/matrix_rain", matrix_rain::register as Factory),
        ("effects/fireworks", fireworks::register as Factory),
        ("effects/key_tester", key_tester::register as Factory),
        ("effects/led_tracker", led_tracker::register as Factory),
        ("effects/pong", pong::register as Factory),
    ]
}

pub fn loader() -> Loader {
    Loader::new(catalog())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_path_is_in_the_catalog() {
        let cat = catalog();
        for path in DEFAULT_LOAD_ORDER {
            assert!(cat.iter().any(|(p, _)| p == path), "{path}");
        }
    }

    #[test]
    fn factories_register_under_their_file_names() {
        for (path, factory) in catalog() {
            let reg = factory().unwrap();
            assert_eq!(Some(reg.name.as_str()), path.strip_prefix("effects/"));
        }
    }
}
