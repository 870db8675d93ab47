use atrium_core::recurrence::{Frequency, RecurrenceRule};
use chrono::{Duration, TimeZone, Utc, Weekday};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn rule(freq: Frequency, by_day: Vec<Weekday>) -> RecurrenceRule {
    RecurrenceRule {
        freq,
        interval: 1,
        by_day,
        count: None,
        until: None,
        timezone: "America/New_York".to_string(),
    }
}

fn bench_rule_parsing(c: &mut Criterion) {
    c.bench_function("rule_parsing", |b| {
        b.iter(|| {
            RecurrenceRule::parse(
                black_box("FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE,FR;COUNT=100"),
                black_box("America/New_York"),
            )
            .unwrap()
        })
    });
}

fn bench_expansion_over_year(c: &mut Criterion) {
    let dtstart = Utc.with_ymd_and_hms(2030, 1, 7, 14, 0, 0).unwrap();
    let window_end = dtstart + Duration::days(365);

    let mut group = c.benchmark_group("expansion_over_year");
    let cases = [
        ("daily", rule(Frequency::Daily, vec![])),
        (
            "weekly_mwf",
            rule(
                Frequency::Weekly,
                vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
            ),
        ),
        ("monthly", rule(Frequency::Monthly, vec![])),
    ];
    for (name, rule) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), &rule, |b, rule| {
            b.iter(|| {
                rule.occurrences_between(
                    black_box(dtstart),
                    black_box(dtstart),
                    black_box(window_end),
                )
                .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_windowed_expansion_deep_into_series(c: &mut Criterion) {
    // Expansion always walks from dtstart, so a far-future window measures
    // the worst case for long-lived series.
    let dtstart = Utc.with_ymd_and_hms(2020, 1, 6, 14, 0, 0).unwrap();
    let window_start = dtstart + Duration::days(3650);
    let window_end = window_start + Duration::days(30);
    let daily = rule(Frequency::Daily, vec![]);

    c.bench_function("windowed_expansion_ten_years_in", |b| {
        b.iter(|| {
            daily
                .occurrences_between(
                    black_box(dtstart),
                    black_box(window_start),
                    black_box(window_end),
                )
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_rule_parsing,
    bench_expansion_over_year,
    bench_windowed_expansion_deep_into_series
);
criterion_main!(benches);
