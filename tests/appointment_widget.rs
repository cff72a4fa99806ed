use clinic_dashboard::appointment::{
    AppointmentConfig, AppointmentWidget, HttpAppointmentResource, LoadingStatus, RefreshTimer,
};
use clinic_dashboard::dashboard::WidgetEnv;
use clinic_dashboard::i18n::Translations;
use clinic_dashboard::notify::ChannelNotifier;
use httpmock::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

fn env() -> WidgetEnv {
    let (notifier, _rx) = ChannelNotifier::new();
    WidgetEnv {
        resource: Arc::new(HttpAppointmentResource::new().unwrap()),
        notifier: Arc::new(notifier),
        translations: Arc::new(Translations::builtin("en")),
    }
}

fn widget(settings: Value) -> AppointmentWidget {
    let cfg = AppointmentConfig::from_value(&settings).unwrap();
    AppointmentWidget::try_new(cfg, &env()).unwrap()
}

fn settle(widget: &mut AppointmentWidget, now: Instant) {
    for _ in 0..500 {
        widget.pump(now);
        if !widget.cycle().is_fetching() {
            return;
        }
        sleep(Duration::from_millis(10));
    }
    panic!("fetch did not settle");
}

fn uuids(widget: &AppointmentWidget) -> Vec<&str> {
    widget
        .rows()
        .iter()
        .filter_map(|r| r["uuid"].as_str())
        .collect()
}

#[test]
fn fetches_filters_and_sorts() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET).path("/appointments");
        then.status(200).json_body(json!([
            {"uuid": "late", "status": "Scheduled", "startDateTime": 1_700_000_900_000i64},
            {"uuid": "gone", "status": "Cancelled", "startDateTime": 1_700_000_000_000i64},
            {"uuid": "early", "status": "Scheduled", "startDateTime": 1_700_000_100_000i64}
        ]));
    });

    let mut w = widget(json!({
        "source": {"url": server.url("/appointments"), "filters": {"status": "Scheduled"}},
        "refreshInterval": 5
    }));
    assert_eq!(w.status(), LoadingStatus::Loading);
    let now = Instant::now();
    settle(&mut w, now);

    m.assert();
    assert_eq!(w.status(), LoadingStatus::Loaded);
    assert_eq!(uuids(&w), vec!["early", "late"]);
    assert_eq!(
        w.cycle().timer(),
        RefreshTimer::Armed {
            interval: Duration::from_millis(5000),
            due: now + Duration::from_millis(5000),
        }
    );
}

#[test]
fn server_error_shows_failure_and_stops_the_timer() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET).path("/appointments");
        then.status(500).body("boom");
    });

    let mut w = widget(json!({"source": {"url": server.url("/appointments")}}));
    let now = Instant::now();
    settle(&mut w, now);
    assert_eq!(w.status(), LoadingStatus::Failed);
    assert_eq!(w.cycle().timer(), RefreshTimer::Disabled);

    w.pump(now + Duration::from_secs(600));
    assert!(!w.cycle().is_fetching());
    m.assert_hits(1);
}

#[test]
fn timer_expiry_refetches() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET).path("/appointments");
        then.status(200).json_body(json!({"data": [{"uuid": "a", "startDateTime": 1}]}));
    });

    let mut w = widget(json!({
        "source": {"url": server.url("/appointments")},
        "refreshInterval": 0
    }));
    let now = Instant::now();
    settle(&mut w, now);
    assert_eq!(w.cycle().interval(), Duration::from_secs(60));

    w.pump(now + Duration::from_secs(59));
    assert!(!w.cycle().is_fetching());
    let later = now + Duration::from_secs(60);
    w.pump(later);
    assert!(w.cycle().is_fetching());
    assert_eq!(w.status(), LoadingStatus::Loaded);
    settle(&mut w, later);
    m.assert_hits(2);
    assert_eq!(uuids(&w), vec!["a"]);
}

#[test]
fn provider_uuid_is_sent_as_query() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET)
            .path("/appointments")
            .query_param("provider", "prov-1");
        then.status(200).json_body(json!([]));
    });

    let mut w = widget(json!({
        "source": {"url": server.url("/appointments")},
        "provider": {"uuid": "prov-1", "display": "Dr. Who"}
    }));
    settle(&mut w, Instant::now());
    m.assert();
    assert_eq!(w.status(), LoadingStatus::Loaded);
    assert!(w.rows().is_empty());
}

#[test]
fn manual_refresh_during_fetch_is_queued() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET).path("/appointments");
        then.status(200)
            .delay(Duration::from_millis(100))
            .json_body(json!([]));
    });

    let mut w = widget(json!({"source": {"url": server.url("/appointments")}}));
    let now = Instant::now();
    w.pump(now);
    assert!(w.cycle().is_fetching());
    w.refresh();
    w.refresh();
    settle(&mut w, now);
    m.assert_hits(2);
}
