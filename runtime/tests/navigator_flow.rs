//! Navigator behavior against a scripted in-memory page.

mod common;

use common::{test_config, FakeRenderer, PageBehavior, STALE_AUD, STALE_DATE};
use nbc_rates_runtime::navigator::{DateInputStrategy, NavStep, NavigationError, Navigator};
use nbc_rates_runtime::renderer::RenderContext;
use std::time::Duration;

#[tokio::test]
async fn test_direct_set_is_tried_first() {
    let renderer = FakeRenderer::new(PageBehavior::default());
    let mut ctx = renderer.context();

    let doc = Navigator::new(test_config())
        .load(&mut ctx, "2025-01-02")
        .await
        .unwrap();

    assert_eq!(doc.strategy, DateInputStrategy::DirectSet);
    assert!(doc.html.contains("AUD/KHR"));
    assert!(doc.html.contains(r#"value="2025-01-02""#));

    let calls = renderer.calls();
    assert_eq!(calls[0], "navigate https://nbc.test/exchange_rate.php");
    assert!(calls.contains(&"set_value #datepicker 2025-01-02".to_string()));
    assert!(calls.contains(&r#"click input[name="view"]"#.to_string()));
    assert!(!calls.iter().any(|c| c.starts_with("type_into")));
    // Closing is the caller's job
    assert!(!calls.contains(&"close".to_string()));
}

#[tokio::test]
async fn test_falls_back_to_typing() {
    let renderer = FakeRenderer::new(PageBehavior {
        direct_set_works: false,
        ..Default::default()
    });
    let mut ctx = renderer.context();

    let doc = Navigator::new(test_config())
        .load(&mut ctx, "2025-01-02")
        .await
        .unwrap();

    assert_eq!(doc.strategy, DateInputStrategy::FocusAndType);
    assert!(doc.html.contains(r#"value="2025-01-02""#));
    assert!(!doc.html.contains(STALE_AUD));
    let calls = renderer.calls();
    let set = calls.iter().position(|c| c.starts_with("set_value")).unwrap();
    let typed = calls.iter().position(|c| c.starts_with("type_into")).unwrap();
    assert!(set < typed);
    assert_eq!(calls.iter().filter(|c| c.starts_with("click")).count(), 2);
}

#[tokio::test]
async fn test_fails_after_both_strategies() {
    let renderer = FakeRenderer::new(PageBehavior {
        direct_set_works: false,
        typing_works: false,
        ..Default::default()
    });
    let mut ctx = renderer.context();

    let err = Navigator::new(test_config())
        .load(&mut ctx, "2025-01-02")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        NavigationError::Timeout {
            step: NavStep::AwaitTable,
            ..
        }
    ));
    // Exactly one retry
    let calls = renderer.calls();
    assert_eq!(calls.iter().filter(|c| c.starts_with("click")).count(), 2);
    assert!(!calls.contains(&"get_html".to_string()));
    // The form's own table was there throughout; it is not taken as a result
    assert!(ctx.selector_exists("table").await.unwrap());
}

#[tokio::test]
async fn test_waits_for_slow_form_post() {
    let renderer = FakeRenderer::new(PageBehavior {
        submit_delay: Duration::from_millis(60),
        ..Default::default()
    });
    let mut ctx = renderer.context();

    let doc = Navigator::new(test_config())
        .load(&mut ctx, "2025-01-02")
        .await
        .unwrap();

    assert_eq!(doc.strategy, DateInputStrategy::DirectSet);
    assert!(doc.html.contains(r#"value="2025-01-02""#));
    assert!(doc.html.contains("2,872.50"));
    assert!(!doc.html.contains(STALE_DATE));
    assert!(!doc.html.contains(STALE_AUD));
    assert_eq!(
        renderer.calls().iter().filter(|c| c.starts_with("click")).count(),
        1
    );
}

#[tokio::test]
async fn test_fallback_with_slow_form_post() {
    let renderer = FakeRenderer::new(PageBehavior {
        direct_set_works: false,
        submit_delay: Duration::from_millis(40),
        ..Default::default()
    });
    let mut ctx = renderer.context();

    let doc = Navigator::new(test_config())
        .load(&mut ctx, "2025-01-02")
        .await
        .unwrap();

    assert_eq!(doc.strategy, DateInputStrategy::FocusAndType);
    assert!(doc.html.contains(r#"value="2025-01-02""#));
    assert!(!doc.html.contains(STALE_AUD));
}

#[tokio::test]
async fn test_in_place_update_is_detected() {
    let renderer = FakeRenderer::new(PageBehavior {
        updates_in_place: true,
        submit_delay: Duration::from_millis(30),
        ..Default::default()
    });
    let mut ctx = renderer.context();

    let doc = Navigator::new(test_config())
        .load(&mut ctx, "2025-01-02")
        .await
        .unwrap();

    assert_eq!(doc.strategy, DateInputStrategy::DirectSet);
    assert!(doc.html.contains("2,872.50"));
    assert!(!doc.html.contains(STALE_AUD));
}

#[tokio::test]
async fn test_missing_date_input() {
    let renderer = FakeRenderer::new(PageBehavior {
        has_date_input: false,
        ..Default::default()
    });
    let mut ctx = renderer.context();

    let err = Navigator::new(test_config())
        .load(&mut ctx, "2025-01-02")
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(NavStep::LocateDateInput));
    assert!(err.to_string().starts_with("locate date input timed out"));
}

#[tokio::test]
async fn test_unreachable_page() {
    let renderer = FakeRenderer::new(PageBehavior {
        navigate_fails: true,
        ..Default::default()
    });
    let mut ctx = renderer.context();

    let err = Navigator::new(test_config())
        .load(&mut ctx, "2025-01-02")
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(NavStep::Open));
    assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"));
}

#[tokio::test]
async fn test_missing_submit_is_not_retried() {
    let renderer = FakeRenderer::new(PageBehavior {
        has_submit: false,
        ..Default::default()
    });
    let mut ctx = renderer.context();

    let err = Navigator::new(test_config())
        .load(&mut ctx, "2025-01-02")
        .await
        .unwrap_err();

    assert_eq!(err.step(), Some(NavStep::Submit));
    assert!(!renderer.calls().iter().any(|c| c.starts_with("type_into")));
}

#[tokio::test]
async fn test_transient_eval_failures_are_tolerated() {
    let renderer = FakeRenderer::new(PageBehavior {
        eval_failures: 5,
        ..Default::default()
    });
    let mut ctx = renderer.context();

    let doc = Navigator::new(test_config())
        .load(&mut ctx, "2025-01-02")
        .await;

    tokio_test::assert_ok!(doc);
}
