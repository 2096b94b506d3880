//! Registry composition and deep-link behavior across feature modules.
//!
//! 1. `a + b` resolves every lookup from `b` first; `b + a` from `a`.
//! 2. Composite configs build containers declared in any module, with
//!    nested routes resolved through the composite.
//! 3. Deep links round-trip between URIs and typed destinations.
//! 4. Deep links are tried right module first, then left.

use ftui_nav::{
    ContainerRegistry, ContainerSpec, DeepLinkMatch, DeepLinkRegistry, DeepLinkRoute, Destination,
    KeyAllocator, ModuleConfig, NavConfig, NavDestination, NavNode, NavigationConfig, ParamKind,
    PaneRole, PaneSpec, Route, ScreenRegistry, TransitionHint, TransitionRegistry, TransitionSpec,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Item {
    id: String,
}

impl NavDestination for Item {
    const ROUTE: &'static str = "item";
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Search {
    query: String,
    #[serde(default)]
    page: Option<i64>,
}

impl NavDestination for Search {
    const ROUTE: &'static str = "search";
}

fn catalog() -> ModuleConfig {
    ModuleConfig::builder()
        .screen_of::<Item>()
        .screen_of::<Search>()
        .transition("item", TransitionSpec::new(TransitionHint::SlideHorizontal, 250))
        .deep_link(DeepLinkRoute::for_destination::<Item>("item/{id}").expect("template"))
        .deep_link(
            DeepLinkRoute::for_destination::<Search>("search/{query}")
                .expect("template")
                .param("page", ParamKind::Int),
        )
        .build()
}

fn theming() -> ModuleConfig {
    ModuleConfig::builder()
        .transition("item", TransitionSpec::new(TransitionHint::Fade, 150))
        .build()
}

#[test]
fn right_operand_has_priority() {
    let item = Route::new("item");
    let ab = catalog() + theming();
    let ba = theming() + catalog();
    assert_eq!(ab.transition(&item).map(|t| t.hint), Some(TransitionHint::Fade));
    assert_eq!(
        ba.transition(&item).map(|t| t.hint),
        Some(TransitionHint::SlideHorizontal)
    );
    assert!(ab.screen(&item).is_some());
    assert!(ba.screen(&item).is_some());
}

#[test]
fn three_way_composition_orders_right_to_left() {
    let third = ModuleConfig::builder()
        .transition("item", TransitionSpec::new(TransitionHint::Instant, 0))
        .build();
    let config = catalog() + theming() + third;
    assert_eq!(
        config.transition(&Route::new("item")).map(|t| t.hint),
        Some(TransitionHint::Instant)
    );
}

#[test]
fn composite_builds_containers_from_any_module() {
    let shell = ModuleConfig::builder()
        .screen("inbox")
        .container(
            "mail",
            ContainerSpec::panes([
                PaneSpec::new(PaneRole::Primary, "inbox"),
                PaneSpec::new(PaneRole::Secondary, "item"),
            ])
            .with_wrapper("mail-chrome"),
        )
        .build();
    let config: NavConfig = catalog() + shell;
    assert!(config.container(&Route::new("mail")).is_some());

    let mut keys = KeyAllocator::new();
    let node = config
        .build_nav_node(&Route::new("mail"), None, None, &mut keys)
        .expect("build")
        .expect("declared");
    let pane = node.as_pane().expect("pane container");
    assert_eq!(pane.wrapper_key(), Some("mail-chrome"));
    let secondary = pane.content(PaneRole::Secondary).expect("secondary pane");
    let first = secondary.as_stack().and_then(|s| s.children().first()).expect("screen");
    assert_eq!(first.destination().map(|d| d.route().as_str()), Some("item"));

    let plain = config
        .build_nav_node(&Route::new("search"), None, None, &mut keys)
        .expect("build")
        .expect("screen route");
    assert!(matches!(&plain, NavNode::Stack(stack) if stack.len() == 1));
    assert!(
        config
            .build_nav_node(&Route::new("nowhere"), None, None, &mut keys)
            .expect("build")
            .is_none()
    );
}

#[test]
fn deep_link_round_trip() {
    let config = NavConfig::from(catalog());
    let destination = config
        .handle_deep_link("app://item/42")
        .expect("parse")
        .into_destination()
        .expect("matched");
    assert_eq!(destination.decode::<Item>().expect("decode"), Item { id: "42".into() });
    assert_eq!(
        config.create_uri(&destination, "app").as_deref(),
        Some("app://item/42")
    );
}

#[test]
fn deep_link_query_params_round_trip() {
    let config = NavConfig::from(catalog());
    let destination = Destination::of(&Search {
        query: "red shoes".into(),
        page: Some(3),
    })
    .expect("encode");
    let uri = config.create_uri(&destination, "shop").expect("template registered");
    assert_eq!(uri, "shop://search/red%20shoes?page=3");
    let back = config
        .handle_deep_link(&uri)
        .expect("parse")
        .into_destination()
        .expect("matched");
    assert_eq!(back, destination);
}

#[test]
fn deep_links_try_right_module_first() {
    let promo = ModuleConfig::builder()
        .deep_link(DeepLinkRoute::new("item/{id}", "promo-item").expect("template"))
        .build();
    let config = catalog() + promo;
    let routed = |uri: &str| match config.handle_deep_link(uri).expect("parse") {
        DeepLinkMatch::Matched(destination) => Some(destination.route().to_string()),
        DeepLinkMatch::NotMatched => None,
    };
    assert_eq!(routed("app://item/1").as_deref(), Some("promo-item"));
    assert_eq!(routed("app://search/hats").as_deref(), Some("search"));
    assert_eq!(routed("app://cart"), None);
    assert!(config.handle_deep_link("not a uri").is_err());
}
