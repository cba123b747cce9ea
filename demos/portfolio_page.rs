use choreo::prelude::*;

const VIEWPORT: (f32, f32) = (1280.0, 800.0);
const FRAME_MS: f64 = 1000.0 / 60.0;

struct Page {
    hero: ElementId,
    letters: Vec<ElementId>,
    services: ElementId,
    cards: Vec<ElementId>,
    about_image: ElementId,
    marquee: ElementId,
    cursor: ElementId,
}

fn layout(engine: &mut Engine) -> Page {
    let elements = engine.elements_mut();
    let hero = elements.insert("hero", Rect::new(0.0, 0.0, 1280.0, 800.0));
    let letters = "CHOREO"
        .chars()
        .enumerate()
        .map(|(i, c)| {
            elements.insert(
                format!("hero/letter/{i}/{c}"),
                Rect::new(240.0 + i as f32 * 130.0, 320.0, 120.0, 160.0),
            )
        })
        .collect();
    let services = elements.insert("services", Rect::new(0.0, 900.0, 1280.0, 700.0));
    let cards = (0..3)
        .map(|i| {
            elements.insert(
                format!("services/card/{i}"),
                Rect::new(80.0 + i as f32 * 400.0, 1000.0, 360.0, 480.0),
            )
        })
        .collect();
    let about_image = elements.insert("about/image", Rect::new(640.0, 1800.0, 560.0, 700.0));
    let marquee = elements.insert("marquee/track", Rect::new(0.0, 2700.0, 3200.0, 140.0));
    let cursor = elements.insert("cursor", Rect::new(0.0, 0.0, 32.0, 32.0));

    Page {
        hero,
        letters,
        services,
        cards,
        about_image,
        marquee,
        cursor,
    }
}

fn mount(engine: &mut Engine, page: &Page, root: ScopeId) -> choreo::Result<()> {
    let hero = engine.open_scope(Some(root))?;
    engine.attach_effector(
        hero,
        Effector::new(page.hero)
            .track_all(
                page.letters.iter().copied(),
                Response::new().translate(0.25, 0.25).rotation(0.05),
            )
            .falloff(Falloff::linear(300.0)),
    )?;

    let services = engine.open_scope(Some(root))?;
    let entrance = Clip::batch(page.cards.iter().copied())
        .from_to(Property::Y, 80.0, 0.0)
        .from_to(Property::Opacity, 0.0, 1.0)
        .duration(900.0)
        .stagger(120.0)
        .timing(TimingFunction::Power(3, EaseDirection::Out));
    engine.register_trigger(
        services,
        Trigger::fire_once(page.services, entrance).start("top 75%".parse()?),
    )?;

    let about = engine.open_scope(Some(root))?;
    let parallax = Clip::new(page.about_image)
        .from_to(Property::Y, 60.0, -60.0)
        .timing(TimingFunction::Linear);
    engine.register_trigger(
        about,
        Trigger::scrub(page.about_image, parallax).smoothing(300.0),
    )?;

    let marquee = engine.open_scope(Some(root))?;
    engine.add_looper(marquee, Looper::new(page.marquee, 60.0).coupling(0.004))?;

    engine.follow(root, Follower::new(page.cursor).offset(-16.0, -16.0))?;
    engine.add_hover(
        root,
        Hover::new(
            page.hero,
            Clip::new(page.cursor).to(Property::Scale, 1.8).duration(300.0),
            Clip::new(page.cursor).to(Property::Scale, 1.0).duration(300.0),
        ),
    )?;
    Ok(())
}

fn flush(engine: &mut Engine, label: &str) {
    let writes = engine.take_writes();
    if writes.is_empty() {
        return;
    }
    log::info!("{label}: {} writes", writes.len());
    for write in writes {
        let key = engine
            .elements()
            .get(write.element)
            .map_or("?", |node| node.key.as_str());
        println!("  {key:<24} {:?} = {:.2}", write.property, write.value);
    }
}

fn main() -> choreo::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut engine = Engine::new().viewport(VIEWPORT.0, VIEWPORT.1);
    let page = layout(&mut engine);
    let root = engine.open_scope(None)?;
    mount(&mut engine, &page, root)?;
    flush(&mut engine, "mount");

    let mut now = 0.0;
    engine.tick(now);

    // pointer drifts across the hero title
    for step in 0..20 {
        now += FRAME_MS;
        engine.pointer_move(300.0 + step as f32 * 30.0, 400.0, now);
        engine.tick(now);
    }
    flush(&mut engine, "hero hover");
    engine.pointer_exit(now);

    // slow scroll down the page
    let mut scroll = 0.0;
    while scroll < 2400.0 {
        now += FRAME_MS;
        scroll += 40.0;
        engine.scroll_to(scroll, now);
        engine.tick(now);
    }
    flush(&mut engine, "scroll");

    // let the scrub and the entrance settle
    for _ in 0..90 {
        now += FRAME_MS;
        engine.tick(now);
    }
    flush(&mut engine, "settle");

    engine.revert(root);
    flush(&mut engine, "revert");
    log::info!(
        "live scopes after revert: {}",
        engine.scopes().live_count()
    );
    Ok(())
}
