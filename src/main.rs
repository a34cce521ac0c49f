// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing_subscriber::EnvFilter;

use tributary::config::{build_graph, load_config, StageRegistry};
use tributary::engine::Pipeline;
use tributary::io::CsvSource;
use tributary::stages::{Collector, FieldMap, Head, Partitioner, StdoutSink, Tap};

const DEFAULT_CONFIG: &str = "configs/weekday-split.yaml";
const DEFAULT_DATA: &str = "data/schedule.csv";

/// The stage instances the demo config wires together. Closures and file
/// paths live here; the YAML only decides the wiring.
fn demo_registry(data_file: &str) -> StageRegistry {
    let mut registry = StageRegistry::new();
    registry.insert("reader", Arc::new(CsvSource::new(data_file)));
    registry.insert(
        "classify_workday",
        Arc::new(FieldMap::new(1, |day| {
            if day == json!("星期六") || day == json!("星期日") {
                json!("休息日")
            } else {
                json!("工作日")
            }
        })),
    );
    registry.insert(
        "peek",
        Arc::new(Tap::new(vec![
            Arc::new(Head::new(3)),
            Arc::new(StdoutSink::without_schema()),
        ])),
    );
    registry.insert("split", Arc::new(Partitioner::new(1)));
    registry.insert("merge", Arc::new(Collector::new()));
    registry.insert("show", Arc::new(StdoutSink::new()));
    registry
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let config_file = args.get(1).map(String::as_str).unwrap_or(DEFAULT_CONFIG);
    let data_file = args.get(2).map(String::as_str).unwrap_or(DEFAULT_DATA);

    println!("🌊 Tributary Pipeline Demo");
    println!("══════════════════════════");
    println!("Config: {}", config_file);
    println!("Data:   {}", data_file);
    println!();

    let config = load_config(config_file)?;
    let registry = demo_registry(data_file);
    let graph = build_graph(&config, &registry)?;

    println!("📋 Pipeline:");
    print!("{}", graph.render());
    println!();

    let started = Instant::now();
    Pipeline::new(graph).run().await?;

    println!();
    println!("🎉 Done in {:?}", started.elapsed());
    Ok(())
}
