use ledwall::config::Settings;
use ledwall::dimensions::PixelLimits;
use ledwall::engine::{Engine, FrameOutcome};
use ledwall::host::{HeadlessSurface, HostEvent};
use ledwall::input::Modifiers;
use ledwall::loader::Loader;
use ledwall::{CoreError, Effect, Resolution, Token};

fn engine() -> Engine<HeadlessSurface> {
    let settings = Settings {
        seed: 11,
        ..Settings::default()
    };
    Engine::new(
        &settings,
        HeadlessSurface::new(PixelLimits::default()),
        Loader::empty(),
    )
}

fn solid(token: Token) -> Effect {
    Effect::bare(move |buf, _, _| {
        buf.fill(token);
        Ok(None)
    })
}

fn top_blue_row(surface: &HeadlessSurface, col: u16) -> Option<u16> {
    (0..surface.rows()).find(|&r| surface.cell(col, r) == Some(Token::Blue))
}

#[test]
fn landscape_then_portrait_viewport() {
    let mut e = engine();
    e.init((1280, 720), 0).unwrap();
    assert_eq!(e.dimensions().resolution(), Resolution::Wide);
    assert_eq!(
        (e.dimensions().visual_cols(), e.dimensions().visual_rows()),
        (70, 40)
    );
    assert_eq!(e.dimensions().offsets(), (3, 4));

    e.handle_event(
        HostEvent::Resize {
            width: 720,
            height: 1280,
        },
        5,
    )
    .unwrap();
    assert_eq!(e.dimensions().resolution(), Resolution::Tall);
    assert_eq!((e.buffer().cols(), e.buffer().rows()), (32, 64));
    assert_eq!(e.shared().config().rows, 64);
}

#[test]
fn effects_cycle_in_registration_order() {
    let mut e = engine();
    e.init((1280, 720), 0).unwrap();
    e.register_effect("a", solid(Token::Red));
    e.register_effect("b", solid(Token::Green));
    e.register_effect("c", solid(Token::Blue));
    assert_eq!(e.active_effect(), Some("a"));

    e.frame(0).unwrap();
    assert_eq!(e.surface().cell(10, 10), Some(Token::Red));

    assert_eq!(e.cycle_next().as_deref(), Some("b"));
    assert_eq!(e.cycle_next().as_deref(), Some("c"));
    e.frame(40).unwrap();
    assert_eq!(e.surface().cell(10, 10), Some(Token::Blue));
    assert_eq!(e.cycle_next().as_deref(), Some("a"));
}

#[test]
fn held_key_moves_paddle_without_refilling_the_queue() {
    let mut e = engine();
    e.init((1280, 720), 0).unwrap();
    e.register(ledwall::effects::pong::register().unwrap());

    e.frame(0).unwrap();
    // logical column 0 sits at visual column 3; paddle top starts at row 13
    assert_eq!(top_blue_row(e.surface(), 3), Some(13 + 4));

    e.handle_event(
        HostEvent::KeyDown {
            key: "w".into(),
            modifiers: Modifiers::default(),
            repeat: false,
        },
        1,
    )
    .unwrap();
    for i in 1..=10u64 {
        if i > 1 {
            e.handle_event(
                HostEvent::KeyDown {
                    key: "w".into(),
                    modifiers: Modifiers::default(),
                    repeat: true,
                },
                i * 40 - 1,
            )
            .unwrap();
        }
        assert!(matches!(
            e.frame(i * 40).unwrap(),
            FrameOutcome::Rendered { .. }
        ));
    }

    assert_eq!(e.shared().keys.len(), 1);
    let top = top_blue_row(e.surface(), 3).unwrap();
    assert!((8..=9).contains(&top), "paddle top at visual row {top}");
}

#[test]
fn unchanged_frames_write_nothing() {
    let mut e = engine();
    e.init((1280, 720), 0).unwrap();
    e.register_effect("still", solid(Token::Purple));

    assert_eq!(e.frame(0).unwrap(), FrameOutcome::Rendered { writes: 2800 });
    assert_eq!(e.frame(40).unwrap(), FrameOutcome::Rendered { writes: 0 });
    assert_eq!(e.surface().writes(), 2800);
    // padding stays uncolored
    assert_eq!(e.surface().cell(0, 0), Some(Token::Empty));
    assert_eq!(e.surface().cell(3, 4), Some(Token::Purple));
}

#[test]
fn detached_surface_never_ticks() {
    let mut e = Engine::new(
        &Settings::default(),
        HeadlessSurface::detached(),
        Loader::empty(),
    );
    assert!(matches!(
        e.init((1280, 720), 0),
        Err(CoreError::SurfaceMissing(_))
    ));
    e.register_effect("a", solid(Token::Red));
    assert_eq!(e.frame(0).unwrap(), FrameOutcome::Stopped);
    assert_eq!(e.surface().writes(), 0);
}

#[test]
fn built_in_effects_load_and_render() {
    let settings = Settings {
        seed: 5,
        ..Settings::default()
    };
    let mut e = Engine::new(
        &settings,
        HeadlessSurface::new(settings.pixel_limits()),
        ledwall::effects::loader(),
    );
    e.init((1280, 720), 0).unwrap();
    for path in &settings.effects {
        e.load(path);
    }
    e.wait_for_loads(std::time::Duration::from_secs(10));
    assert_eq!(e.effect_names().len(), settings.effects.len());

    let mut now = 0;
    for _ in 0..settings.effects.len() {
        assert!(matches!(e.frame(now).unwrap(), FrameOutcome::Rendered { .. }));
        e.cycle_next();
        now += 40;
    }
    assert_eq!(e.faults(), 0);
}
