//! End-to-end scenarios driving the engine the way a page would.

use std::cell::Cell;
use std::rc::Rc;

use choreo::ChoreoError;
use choreo::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine() -> Engine {
    init_logging();
    Engine::new().viewport(1000.0, 800.0)
}

fn opacity(engine: &Engine, el: ElementId) -> f32 {
    engine.style(el).map_or(1.0, |s| s.get(Property::Opacity))
}

#[test]
fn fire_once_entrance_plays_once() {
    let mut engine = engine();
    let section = engine
        .elements_mut()
        .insert("services", Rect::new(0.0, 2000.0, 1000.0, 600.0));
    let cards: Vec<_> = (0..3)
        .map(|i| {
            engine.elements_mut().insert(
                format!("services/card/{i}"),
                Rect::new(i as f32 * 320.0, 2100.0, 300.0, 400.0),
            )
        })
        .collect();

    let completed = Rc::new(Cell::new(0));
    let done = completed.clone();
    let clips = cards.iter().map(|card| {
        Clip::new(*card)
            .from_to(Property::Y, 60.0, 0.0)
            .from_to(Property::Opacity, 0.0, 1.0)
            .duration(1000.0)
            .timing(TimingFunction::Power(3, EaseDirection::Out))
    });
    let timeline = Timeline::compose(clips, &[0.0, -900.0, -900.0])
        .on_complete(move || done.set(done.get() + 1));
    assert_eq!(timeline.duration_ms(), 1200.0);

    let scope = engine.open_scope(None).unwrap();
    let trigger = engine
        .register_trigger(
            scope,
            Trigger::fire_once(section, timeline).start("top 80%".parse().unwrap()),
        )
        .unwrap();
    let animation = engine.triggers().animation(trigger).unwrap();

    // explicit start values show before the trigger fires
    for card in &cards {
        assert_eq!(opacity(&engine, *card), 0.0);
    }
    assert_eq!(engine.triggers().is_fired(trigger), Some(false));

    engine.scroll_to(1000.0, 0.0);
    assert_eq!(engine.animation_state(animation), Some(PlayState::Idle));

    // start threshold: 2000 - 0.8 * 800
    engine.scroll_to(1360.0, 100.0);
    assert_eq!(engine.triggers().is_fired(trigger), Some(true));
    assert_eq!(engine.animation_state(animation), Some(PlayState::Playing));

    // the first frame after firing anchors the clock
    engine.tick(1000.0);
    assert_eq!(opacity(&engine, cards[0]), 0.0);

    engine.tick(2000.0);
    assert_eq!(engine.animation_state(animation), Some(PlayState::Playing));
    assert!(opacity(&engine, cards[2]) < 1.0);

    engine.tick(2199.0);
    assert_eq!(engine.animation_state(animation), Some(PlayState::Playing));

    // 1000 + 2 * 100 after the first frame
    engine.tick(2200.0);
    assert_eq!(engine.animation_state(animation), Some(PlayState::Finished));
    for card in &cards {
        assert_eq!(opacity(&engine, *card), 1.0);
        assert_eq!(engine.style(*card).unwrap().get(Property::Y), 0.0);
    }

    engine.scroll_to(0.0, 2300.0);
    engine.scroll_to(1500.0, 2400.0);
    engine.tick(2500.0);
    assert_eq!(engine.animation_state(animation), Some(PlayState::Finished));
    assert_eq!(completed.get(), 1);
}

#[test]
fn content_past_its_threshold_fires_on_registration() {
    let mut engine = engine();
    let hero = engine
        .elements_mut()
        .insert("hero/title", Rect::new(0.0, 100.0, 800.0, 120.0));
    let scope = engine.open_scope(None).unwrap();
    let trigger = engine
        .register_trigger(
            scope,
            Trigger::fire_once(hero, Clip::new(hero).from_to(Property::Opacity, 0.0, 1.0))
                .start("top 80%".parse().unwrap()),
        )
        .unwrap();
    assert_eq!(engine.triggers().is_fired(trigger), Some(true));
}

#[test]
fn above_the_fold_entrance_animates_from_first_frame() {
    let mut engine = engine();
    let title = engine
        .elements_mut()
        .insert("hero/title", Rect::new(0.0, 100.0, 800.0, 120.0));
    let fade = Clip::new(title)
        .from_to(Property::Opacity, 0.0, 1.0)
        .duration(1000.0)
        .timing(TimingFunction::Linear);
    let scope = engine.open_scope(None).unwrap();
    let trigger = engine
        .register_trigger(
            scope,
            Trigger::fire_once(title, fade).start("top 80%".parse().unwrap()),
        )
        .unwrap();
    let animation = engine.triggers().animation(trigger).unwrap();
    assert_eq!(engine.animation_state(animation), Some(PlayState::Playing));

    // the host's first frame arrives long after page load
    engine.tick(1500.0);
    assert_eq!(engine.animation_state(animation), Some(PlayState::Playing));
    assert!(opacity(&engine, title) < 0.01);

    engine.tick(2000.0);
    assert_eq!(opacity(&engine, title), 0.5);
    engine.tick(2500.0);
    assert_eq!(engine.animation_state(animation), Some(PlayState::Finished));
    assert_eq!(opacity(&engine, title), 1.0);
}

#[test]
fn triggers_write_in_registration_order() {
    let mut engine = engine();
    let card = engine
        .elements_mut()
        .insert("services/card", Rect::new(0.0, 2000.0, 400.0, 400.0));
    let scope = engine.open_scope(None).unwrap();
    for from in [0.0, 0.5] {
        engine
            .register_trigger(
                scope,
                Trigger::fire_once(card, Clip::new(card).from_to(Property::Opacity, from, 1.0))
                    .start("top bottom".parse().unwrap()),
            )
            .unwrap();
    }
    let values = |writes: Vec<PropertyWrite>| -> Vec<f32> {
        writes
            .into_iter()
            .filter(|w| w.element == card && w.property == Property::Opacity)
            .map(|w| w.value)
            .collect()
    };
    assert_eq!(values(engine.take_writes()), vec![0.0, 0.5]);

    // both fire on the same scroll event; the later registration wins
    engine.scroll_to(1500.0, 0.0);
    assert_eq!(values(engine.take_writes()), vec![0.0, 0.5]);
    assert_eq!(opacity(&engine, card), 0.5);
}

#[test]
fn missing_targets_leave_no_trace() {
    let mut engine = engine();
    let region = engine
        .elements_mut()
        .insert("hero", Rect::new(0.0, 0.0, 1000.0, 800.0));
    let gone = engine
        .elements_mut()
        .insert("hero/letter/0", Rect::new(0.0, 0.0, 20.0, 20.0));
    engine.elements_mut().remove(gone);
    let scope = engine.open_scope(None).unwrap();

    let err = ChoreoError::MissingTarget(gone);
    assert_eq!(engine.add_looper(scope, Looper::new(gone, 50.0)).unwrap_err(), err);
    assert_eq!(
        engine
            .attach_effector(
                scope,
                Effector::new(region).track(gone, Response::new().translate(0.2, 0.2)),
            )
            .unwrap_err(),
        err
    );
    assert_eq!(engine.follow(scope, Follower::new(gone)).unwrap_err(), err);
    let grow = Clip::new(gone).to(Property::Scale, 1.8);
    assert_eq!(
        engine
            .add_hover(scope, Hover::new(region, grow.clone(), grow))
            .unwrap_err(),
        err
    );

    assert!(engine.loopers().is_empty());
    assert!(engine.effectors().is_empty());
    assert!(engine.followers().is_empty());
    assert!(engine.hovers().is_empty());
    assert_eq!(engine.sample().subscription_count(), 0);
    assert!(engine.scopes().resources(scope).is_empty());
    assert!(engine.take_writes().is_empty());
}

#[test]
fn hover_grows_cursor_over_links() {
    let mut engine = engine();
    let link = engine
        .elements_mut()
        .insert("nav/link", Rect::new(100.0, 20.0, 120.0, 40.0));
    let cursor = engine
        .elements_mut()
        .insert("cursor", Rect::new(0.0, 0.0, 40.0, 40.0));
    let scope = engine.open_scope(None).unwrap();
    let grow = |scale: f32| {
        Clip::new(cursor)
            .to(Property::Scale, scale)
            .duration(300.0)
            .timing(TimingFunction::Back(1.5, EaseDirection::Out))
    };
    let hover = engine
        .add_hover(scope, Hover::new(link, grow(1.8), grow(1.0)))
        .unwrap();

    engine.pointer_move(150.0, 40.0, 0.0);
    engine.pointer_move(160.0, 40.0, 10.0);
    assert_eq!(engine.hovers().enters_started(hover), Some(1));
    engine.tick(300.0);
    assert_eq!(engine.style(cursor).unwrap().get(Property::Scale), 1.8);

    engine.pointer_exit(400.0);
    engine.tick(700.0);
    assert_eq!(engine.style(cursor).unwrap().get(Property::Scale), 1.0);

    engine.pointer_move(150.0, 40.0, 800.0);
    engine.revert(scope);
    assert!(engine.hovers().is_empty());
    assert_eq!(engine.style(cursor).unwrap().explicit(Property::Scale), None);
}

#[test]
fn scrub_maps_progress_to_timeline_position() {
    let mut engine = engine();
    let image = engine
        .elements_mut()
        .insert("about/image", Rect::new(0.0, 1000.0, 500.0, 400.0));
    let parallax = Clip::new(image)
        .from_to(Property::Y, 0.0, -100.0)
        .duration(1000.0)
        .timing(TimingFunction::Linear);

    let scope = engine.open_scope(None).unwrap();
    // range: 1000 - 800 = 200 to 1000 + 400 = 1400
    engine
        .register_trigger(scope, Trigger::scrub(image, parallax))
        .unwrap();
    let y = |engine: &Engine| engine.style(image).unwrap().get(Property::Y);
    assert_eq!(y(&engine), 0.0);

    engine.take_writes();
    engine.scroll_to(150.0, 0.0);
    assert!(engine.take_writes().is_empty(), "clamped progress must not seek again");

    engine.scroll_to(800.0, 16.0);
    assert_eq!(y(&engine), -50.0);

    engine.scroll_to(5000.0, 32.0);
    assert_eq!(y(&engine), -100.0);
    engine.take_writes();
    engine.scroll_to(6000.0, 48.0);
    assert!(engine.take_writes().is_empty());

    engine.scroll_to(0.0, 64.0);
    assert_eq!(y(&engine), 0.0);
    engine.scroll_to(200.0, 80.0);
    assert_eq!(y(&engine), 0.0);
}

#[test]
fn smoothed_scrub_lags_behind_scroll() {
    let mut engine = engine();
    let el = engine
        .elements_mut()
        .insert("works/strip", Rect::new(0.0, 800.0, 1000.0, 800.0));
    let clip = Clip::new(el)
        .from_to(Property::X, 0.0, -1000.0)
        .duration(1000.0)
        .timing(TimingFunction::Linear);
    let scope = engine.open_scope(None).unwrap();
    let trigger = engine
        .register_trigger(scope, Trigger::scrub(el, clip).smoothing(500.0))
        .unwrap();

    // range 0..1600, jump to the middle
    engine.tick(0.0);
    engine.scroll_to(800.0, 0.0);
    assert_eq!(engine.triggers().progress(trigger), Some(0.0));

    engine.tick(500.0);
    let p = engine.triggers().progress(trigger).unwrap();
    assert!((p - 0.475).abs() < 1e-3, "p = {p}");

    for frame in 1..40 {
        engine.tick(500.0 + frame as f64 * 100.0);
    }
    assert_eq!(engine.triggers().progress(trigger), Some(0.5));
    assert_eq!(engine.style(el).unwrap().get(Property::X), -500.0);
}

#[test]
fn looper_rate_clamps_under_fling() {
    let mut engine = engine();
    let track = engine
        .elements_mut()
        .insert("marquee/track", Rect::new(0.0, 3000.0, 2000.0, 120.0));
    let scope = engine.open_scope(None).unwrap();
    let looper = engine
        .add_looper(
            scope,
            Looper::new(track, 50.0).coupling(1.0).max_rate(200.0),
        )
        .unwrap();

    engine.scroll_to(0.0, 0.0);
    engine.scroll_to(50.0, 100.0);
    let velocity = engine.sample().scroll().velocity;
    assert_eq!(velocity, 500.0);
    assert_eq!(engine.loopers().rate(looper, velocity), Some(200.0));

    engine.tick(100.0);
    engine.tick(150.0);
    assert_eq!(engine.loopers().offset(looper), Some(10.0));
    assert_eq!(engine.style(track).unwrap().get(Property::X), -10.0);

    // the scroll sample is stale by now, back to the base rate
    engine.tick(1150.0);
    assert_eq!(engine.loopers().offset(looper), Some(60.0));
}

#[test]
fn looper_wrap_is_continuous() {
    let mut engine = engine();
    let track = engine
        .elements_mut()
        .insert("marquee/track", Rect::new(0.0, 0.0, 200.0, 50.0));
    let scope = engine.open_scope(None).unwrap();
    // wraps at half the doubled content: 100px
    let looper = engine.add_looper(scope, Looper::new(track, 50.0)).unwrap();

    engine.tick(0.0);
    engine.tick(1000.0);
    assert_eq!(engine.loopers().offset(looper), Some(50.0));
    engine.tick(2000.0);
    assert_eq!(engine.loopers().offset(looper), Some(0.0));
    engine.tick(2500.0);
    assert_eq!(engine.loopers().offset(looper), Some(25.0));
}

#[test]
fn effector_returns_to_rest_once() {
    let mut engine = engine();
    let hero = engine
        .elements_mut()
        .insert("hero", Rect::new(0.0, 0.0, 1000.0, 800.0));
    let letter = engine
        .elements_mut()
        .insert("hero/letter/0", Rect::new(490.0, 390.0, 20.0, 20.0));
    let scope = engine.open_scope(None).unwrap();
    let effector = engine
        .attach_effector(
            scope,
            Effector::new(hero)
                .track(letter, Response::new().translate(0.2, 0.4).rotation(0.08))
                .falloff(Falloff::linear(250.0)),
        )
        .unwrap();

    // far away: no displacement
    engine.pointer_move(10.0, 10.0, 0.0);
    engine.tick(500.0);
    assert_eq!(engine.style(letter).unwrap().get(Property::X), 0.0);

    engine.pointer_move(550.0, 400.0, 600.0);
    engine.tick(1000.0);
    let x = engine.style(letter).unwrap().get(Property::X);
    assert!(x < 0.0, "pushed away from the pointer, got {x}");

    engine.pointer_exit(1100.0);
    engine.pointer_exit(1150.0);
    engine.pointer_move(2000.0, 400.0, 1200.0);
    assert_eq!(engine.effectors().returns_started(effector), Some(1));

    engine.tick(2200.0);
    let style = engine.style(letter).unwrap();
    assert_eq!(style.get(Property::X), 0.0);
    assert_eq!(style.get(Property::Y), 0.0);
    assert_eq!(style.get(Property::Rotation), 0.0);
}

#[test]
fn follower_tracks_cursor() {
    let mut engine = engine();
    let cursor = engine
        .elements_mut()
        .insert("cursor", Rect::new(0.0, 0.0, 40.0, 40.0));
    let scope = engine.open_scope(None).unwrap();
    engine.follow(scope, Follower::new(cursor)).unwrap();

    engine.scroll_to(3000.0, 0.0);
    engine.pointer_move(200.0, 300.0, 0.0);
    engine.tick(600.0);
    let style = engine.style(cursor).unwrap();
    assert_eq!(style.get(Property::X), 200.0);
    assert_eq!(style.get(Property::Y), 300.0);
}

#[test]
fn revert_is_idempotent_and_total() {
    let mut engine = engine();
    let section = engine
        .elements_mut()
        .insert("contact", Rect::new(0.0, 1000.0, 1000.0, 600.0));
    let track = engine
        .elements_mut()
        .insert("contact/marquee", Rect::new(0.0, 1500.0, 2000.0, 80.0));
    let cursor = engine
        .elements_mut()
        .insert("cursor", Rect::new(0.0, 0.0, 40.0, 40.0));

    let cleaned = Rc::new(Cell::new(0));
    let scope = engine.open_scope(None).unwrap();
    engine
        .register_trigger(
            scope,
            Trigger::scrub(section, Clip::new(section).from_to(Property::Opacity, 0.0, 1.0)),
        )
        .unwrap();
    engine
        .add_looper(scope, Looper::new(track, 80.0).coupling(0.5))
        .unwrap();
    engine
        .attach_effector(
            scope,
            Effector::new(section).track(track, Response::new().translate(0.3, 0.3)),
        )
        .unwrap();
    engine.follow(scope, Follower::new(cursor)).unwrap();
    let c = cleaned.clone();
    engine.on_cleanup(scope, move || c.set(c.get() + 1)).unwrap();

    engine.tick(0.0);
    engine.scroll_to(900.0, 10.0);
    engine.pointer_move(500.0, 400.0, 20.0);
    engine.tick(100.0);

    engine.revert(scope);
    let after_first = (
        engine.style(section).cloned(),
        engine.style(track).cloned(),
        engine.style(cursor).cloned(),
    );
    engine.revert(scope);
    assert_eq!(
        after_first,
        (
            engine.style(section).cloned(),
            engine.style(track).cloned(),
            engine.style(cursor).cloned(),
        )
    );
    assert_eq!(cleaned.get(), 1);

    assert!(engine.triggers().is_empty());
    assert!(engine.loopers().is_empty());
    assert!(engine.effectors().is_empty());
    assert!(engine.followers().is_empty());
    assert!(engine.scheduler().is_empty());
    assert_eq!(engine.sample().subscription_count(), 0);
    assert!(engine.style(track).unwrap().is_empty());

    engine.take_writes();
    engine.scroll_to(1200.0, 200.0);
    engine.pointer_move(100.0, 100.0, 210.0);
    engine.pointer_exit(220.0);
    engine.tick(1000.0);
    assert!(engine.take_writes().is_empty());
}

#[test]
fn view_mode_toggle_remounts_against_new_elements() {
    let mut engine = engine();
    let list: Vec<_> = (0..4)
        .map(|i| {
            (
                format!("works/list/{i}"),
                Rect::new(0.0, 1000.0 + i as f32 * 120.0, 1000.0, 100.0),
            )
        })
        .collect();
    let list_set = ElementSet::rebuild(engine.elements_mut(), &ElementSet::new(), list);

    let scope = engine.open_scope(None).unwrap();
    for el in list_set.iter() {
        engine
            .register_trigger(
                scope,
                Trigger::fire_once(el, Clip::new(el).from_to(Property::X, -50.0, 0.0))
                    .start("top 80%".parse().unwrap()),
            )
            .unwrap();
    }
    assert_eq!(engine.triggers().len(), 4);

    engine.scroll_to(2000.0, 0.0);

    // toggle to grid: revert first, then rebuild the element set
    let scope = engine.remount(scope).unwrap();
    let grid: Vec<_> = (0..4)
        .map(|i| {
            (
                format!("works/grid/{i}"),
                Rect::new((i % 2) as f32 * 500.0, 1000.0 + (i / 2) as f32 * 400.0, 480.0, 380.0),
            )
        })
        .collect();
    let grid_set = ElementSet::rebuild(engine.elements_mut(), &list_set, grid);

    assert!(engine.triggers().is_empty());
    for el in list_set.iter() {
        assert!(!engine.elements().contains(el));
    }

    for el in grid_set.iter() {
        let trigger = engine
            .register_trigger(
                scope,
                Trigger::fire_once(el, Clip::new(el).from_to(Property::Scale, 0.8, 1.0))
                    .start("top 80%".parse().unwrap()),
            )
            .unwrap();
        // already scrolled past: fires during registration
        assert_eq!(engine.triggers().is_fired(trigger), Some(true));
    }
    assert_eq!(engine.triggers().len(), 4);
}

#[test]
fn observe_reports_velocity() {
    let mut engine = engine();
    let el = engine
        .elements_mut()
        .insert("marquee", Rect::new(0.0, 1000.0, 1000.0, 200.0));
    let seen = Rc::new(Cell::new(0.0_f32));
    let s = seen.clone();
    let scope = engine.open_scope(None).unwrap();
    engine
        .register_trigger(scope, Trigger::observe(el, move |_, v| s.set(v)))
        .unwrap();

    engine.scroll_to(500.0, 0.0);
    engine.scroll_to(600.0, 50.0);
    assert_eq!(seen.get(), 2000.0);
}
