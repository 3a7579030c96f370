// ABOUTME: Criterion benchmarks for coaching decisions
// ABOUTME: Measures rule selection over growing catalogs, template rendering, and full ticks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Criterion benchmarks for the coaching path.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    missing_docs
)]

mod common;

use std::collections::HashMap;

use chrono::Utc;
use common::fixtures::{generate_rules, generate_track, BatchSize, BENCH_COACH};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pierre_live_coach::coaching::{render_template, CoachingSelector, SelectionQuery};
use pierre_live_coach::collaborators::memory::{
    InMemoryCollaborators, ScriptedGenerator, StaticRuleCatalog,
};
use pierre_live_coach::conditions::ConditionSet;
use pierre_live_coach::config::LiveCoachConfig;
use pierre_live_coach::live::{SessionRegistry, StartRequest, TickInput};
use tokio::runtime::Runtime;
use uuid::Uuid;

fn bench_select_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_message");
    let conditions: ConditionSet = ["phase:main", "pace:slower_than_target", "trend:slowing"]
        .into_iter()
        .collect();
    let mut variables = HashMap::new();
    variables.insert("distance_km".to_owned(), "4.20".to_owned());
    variables.insert("pace".to_owned(), "5:12".to_owned());

    for rule_count in [10_usize, 100, 1_000] {
        let rules = generate_rules(rule_count);
        group.throughput(Throughput::Elements(rule_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(rule_count),
            &rules,
            |b, rules| {
                let mut selector = CoachingSelector::new(42, true);
                let now = Utc::now();
                b.iter(|| {
                    selector.select_message(
                        black_box(rules),
                        &SelectionQuery {
                            coach_id: BENCH_COACH,
                            category: None,
                            conditions: &conditions,
                            variables: &variables,
                            now,
                        },
                    )
                });
            },
        );
    }

    group.finish();
}

fn bench_render_template(c: &mut Criterion) {
    let mut variables = HashMap::new();
    variables.insert("distance_km".to_owned(), "4.20".to_owned());
    variables.insert("pace".to_owned(), "5:12".to_owned());
    variables.insert("name".to_owned(), "Sam".to_owned());

    c.bench_function("render_template", |b| {
        b.iter(|| {
            render_template(
                black_box("{distance_km} km done at {pace}/km, {name}. {unknown}Keep going!"),
                &variables,
            )
        });
    });
}

fn bench_coach_tick(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let memory = InMemoryCollaborators::new(
        StaticRuleCatalog::new(generate_rules(200)),
        ScriptedGenerator::replying("Generated line"),
    );
    let registry = SessionRegistry::new(LiveCoachConfig::default(), memory.as_collaborators());
    let run = rt
        .block_on(registry.start(Uuid::new_v4(), StartRequest::new(BENCH_COACH)))
        .unwrap();
    rt.block_on(async {
        for fix in generate_track(BatchSize::Small.count()) {
            run.ingest_fix(&fix).await;
        }
    });

    c.bench_function("coach_tick", |b| {
        b.iter(|| rt.block_on(run.coach_tick(TickInput::default())).unwrap());
    });
}

criterion_group!(benches, bench_select_message, bench_render_template, bench_coach_tick);
criterion_main!(benches);
