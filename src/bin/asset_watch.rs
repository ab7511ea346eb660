// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Watch a project and log every asset notification.
//!
//! ```text
//! asset-watch <project-dir> [--config <file.json>] [--seconds <n>] [--trace <file.json>]
//! ```

#[cfg(feature = "profiling")]
use asset_pipeline::{AssetDatabase, DatabaseConfig, Result};
#[cfg(feature = "profiling")]
use std::time::{Duration, Instant};

#[cfg(feature = "profiling")]
struct Args {
    project: std::path::PathBuf,
    config: Option<std::path::PathBuf>,
    seconds: Option<u64>,
    trace: Option<std::path::PathBuf>,
}

#[cfg(feature = "profiling")]
fn parse_args() -> Option<Args> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        project: args.next()?.into(),
        config: None,
        seconds: None,
        trace: None,
    };
    while let Some(flag) = args.next() {
        let value = args.next()?;
        match flag.as_str() {
            "--config" => parsed.config = Some(value.into()),
            "--seconds" => parsed.seconds = Some(value.parse().ok()?),
            "--trace" => parsed.trace = Some(value.into()),
            _ => return None,
        }
    }
    Some(parsed)
}

#[cfg(feature = "profiling")]
fn main() -> Result<()> {
    let Some(args) = parse_args() else {
        eprintln!("usage: asset-watch <project-dir> [--config <file.json>] [--seconds <n>] [--trace <file.json>]");
        std::process::exit(2);
    };

    // Keep the guard alive so buffered trace lines are flushed on exit.
    let _guard = match &args.trace {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .json()
                .with_writer(non_blocking)
                .with_max_level(tracing::Level::TRACE)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_max_level(tracing::Level::INFO)
                .init();
            None
        }
    };

    let mut config = match &args.config {
        Some(path) => DatabaseConfig::from_json_file(path)?,
        None => DatabaseConfig::for_project(&args.project),
    };
    config.watch_file_system = true;

    let mut database = AssetDatabase::new(config);
    database.subscribe_fn(|notification| {
        println!("{:<10} {}", notification.kind(), notification.location());
        Ok(())
    });

    let start = Instant::now();
    database.initialize()?;
    println!(
        "Imported {} assets in {:?}",
        database.importer_count(),
        start.elapsed()
    );

    let deadline = args.seconds.map(|s| start + Duration::from_secs(s));
    while deadline.is_none_or(|deadline| Instant::now() < deadline) {
        database.update();
        std::thread::sleep(Duration::from_millis(100));
    }

    database.shutdown();
    Ok(())
}

#[cfg(not(feature = "profiling"))]
fn main() {
    println!("asset-watch binary requires --features profiling");
}
